// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Pack block message requests and responses and certify block payloads.
// Author: Lukas Bower

//! Block messages carry payloads too large for a single control word.
//!
//! A VF reads a block one byte per request, then asks for the CRC over the
//! bytes it received and compares it with [`BlockMessage::crc_over`] computed
//! on its own copy. Block types are grouped by window size:
//!
//! | Types    | Size   | Window | Request message                   |
//! |----------|--------|--------|-----------------------------------|
//! | 0..=15   | Small  | 32     | [`Vf2PfMsgType::SmallBlockReq`]   |
//! | 16..=23  | Medium | 64     | [`Vf2PfMsgType::MediumBlockReq`]  |
//! | 24..=27  | Large  | 128    | [`Vf2PfMsgType::LargeBlockReq`]   |

use core::fmt;

use log::Level;

use crate::crc::blkmsg_crc;
use crate::diag::DiagnosticSink;
use crate::error::PfvfError;
use crate::field::{set_value_on_csr, FieldFormat};
use crate::message::{Pf2VfMsgType, PfvfMessage, Vf2PfMsgType};

/// Size of the `{version, payload_size}` block header.
pub const BLKMSG_HEADER_SIZE: usize = 2;

/// Largest block message, header included.
pub const BLKMSG_MAX_SIZE: usize = 128;

/// Largest block payload.
pub const BLKMSG_MAX_PAYLOAD: usize = BLKMSG_MAX_SIZE - BLKMSG_HEADER_SIZE;

/// Highest block type accepted in a request.
pub const BLKMSG_TYPE_MAX: u8 = 27;

/// Ring pair to service map block.
pub const BLKMSG_REQ_RING_SVC_MAP: u8 = 0x03;

/// Capability summary block.
pub const BLKMSG_REQ_CAP_SUMMARY: u8 = 0x02;

const BLOCK_CRC_REQ: FieldFormat = FieldFormat::from_bits(9, 9);
const BLKMSG_RESP_TYPE: FieldFormat = FieldFormat::from_bits(1, 0);
const BLKMSG_RESP_DATA: FieldFormat = FieldFormat::from_bits(9, 2);

/// Block size category, selecting the request message type and data layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSize {
    /// 32 byte window.
    Small,
    /// 64 byte window.
    Medium,
    /// 128 byte window.
    Large,
}

impl BlockSize {
    /// Size category of `block_type`, if the type is in range.
    #[must_use]
    pub fn for_block_type(block_type: u8) -> Option<Self> {
        match block_type {
            0..=15 => Some(Self::Small),
            16..=23 => Some(Self::Medium),
            24..=BLKMSG_TYPE_MAX => Some(Self::Large),
            _ => None,
        }
    }

    /// Size category addressed by a request message type.
    #[must_use]
    pub fn for_msg_type(ty: u32) -> Option<Self> {
        match Vf2PfMsgType::try_from(ty).ok()? {
            Vf2PfMsgType::SmallBlockReq => Some(Self::Small),
            Vf2PfMsgType::MediumBlockReq => Some(Self::Medium),
            Vf2PfMsgType::LargeBlockReq => Some(Self::Large),
            _ => None,
        }
    }

    /// Request message type for this size.
    #[must_use]
    pub const fn msg_type(self) -> Vf2PfMsgType {
        match self {
            Self::Small => Vf2PfMsgType::SmallBlockReq,
            Self::Medium => Vf2PfMsgType::MediumBlockReq,
            Self::Large => Vf2PfMsgType::LargeBlockReq,
        }
    }

    /// First block type in this size category.
    #[must_use]
    pub const fn first_type(self) -> u8 {
        match self {
            Self::Small => 0,
            Self::Medium => 16,
            Self::Large => 24,
        }
    }

    /// Number of bytes addressable in a block of this size.
    #[must_use]
    pub const fn window(self) -> usize {
        match self {
            Self::Small => 32,
            Self::Medium => 64,
            Self::Large => 128,
        }
    }

    /// Largest byte index a data request may carry.
    #[must_use]
    pub const fn max_byte_index(self) -> u32 {
        self.byte_field().max()
    }

    /// Largest byte count a CRC request may carry. Counts go on the wire
    /// less one, so a full window can be certified.
    #[must_use]
    pub const fn max_crc_count(self) -> u32 {
        self.max_byte_index() + 1
    }

    const fn type_field(self) -> FieldFormat {
        match self {
            Self::Small => FieldFormat::from_bits(3, 0),
            Self::Medium => FieldFormat::from_bits(2, 0),
            Self::Large => FieldFormat::from_bits(1, 0),
        }
    }

    const fn byte_field(self) -> FieldFormat {
        match self {
            Self::Small => FieldFormat::from_bits(8, 4),
            Self::Medium => FieldFormat::from_bits(8, 3),
            Self::Large => FieldFormat::from_bits(8, 2),
        }
    }
}

/// VF request for one byte of a block, or for the CRC over its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRequest {
    /// Block type being read.
    pub block_type: u8,
    /// Byte index, or byte count (at least 1) when `crc` is set.
    pub index: u32,
    /// Request the CRC over the first `index` bytes instead of a data byte.
    pub crc: bool,
}

impl BlockRequest {
    /// Request the byte at `index`.
    #[must_use]
    pub const fn data(block_type: u8, index: u32) -> Self {
        Self {
            block_type,
            index,
            crc: false,
        }
    }

    /// Request the CRC over the first `count` bytes. A count of zero is
    /// rejected when the request is packed.
    #[must_use]
    pub const fn crc(block_type: u8, count: u32) -> Self {
        Self {
            block_type,
            index: count,
            crc: true,
        }
    }

    /// Size category of the requested block.
    pub fn size(&self) -> Result<BlockSize, PfvfError> {
        BlockSize::for_block_type(self.block_type)
            .ok_or(PfvfError::InvalidBlockType(self.block_type))
    }

    /// Value carried in the byte field, if the index or count is in range.
    fn wire_index(&self, size: BlockSize) -> Option<u32> {
        let wire = if self.crc {
            self.index.checked_sub(1)?
        } else {
            self.index
        };
        (wire <= size.max_byte_index()).then_some(wire)
    }

    /// Pack into a block request message.
    pub fn to_message<S>(&self, sink: &S) -> Result<PfvfMessage, PfvfError>
    where
        S: DiagnosticSink + ?Sized,
    {
        let size = self.size().map_err(|err| {
            sink.report(
                Level::Error,
                format_args!("Invalid PFVF block type {}", self.block_type),
            );
            err
        })?;

        let Some(wire) = self.wire_index(size) else {
            sink.report(
                Level::Error,
                format_args!(
                    "Invalid byte {} {} for PFVF block of type {}",
                    if self.crc { "count" } else { "index" },
                    self.index,
                    self.block_type
                ),
            );
            return Err(PfvfError::InvalidByteIndex {
                block_type: self.block_type,
                index: self.index,
                max: if self.crc {
                    size.max_crc_count()
                } else {
                    size.max_byte_index()
                },
            });
        };

        let mut data = 0;
        let relative = u32::from(self.block_type - size.first_type());
        set_value_on_csr(&mut data, relative, size.type_field(), sink)?;
        set_value_on_csr(&mut data, wire, size.byte_field(), sink)?;
        set_value_on_csr(&mut data, u32::from(self.crc), BLOCK_CRC_REQ, sink)?;

        Ok(PfvfMessage::new(size.msg_type().into(), data))
    }

    /// Unpack a block request message.
    pub fn from_message(msg: &PfvfMessage) -> Result<Self, PfvfError> {
        let size = BlockSize::for_msg_type(msg.ty).ok_or(PfvfError::UnexpectedMessage(msg.ty))?;
        // Type fields are at most four bits wide.
        let relative = size.type_field().extract(msg.data) as u8;
        let wire = size.byte_field().extract(msg.data);
        let crc = BLOCK_CRC_REQ.extract(msg.data) != 0;
        Ok(Self {
            block_type: size.first_type() + relative,
            index: if crc { wire + 1 } else { wire },
            crc,
        })
    }
}

/// Error codes a PF returns instead of block data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockError {
    /// Block type unknown to the PF.
    InvalidBlockType = 0x01,
    /// Byte index or count out of range for the block size.
    InvalidByteNumReq = 0x02,
    /// Request addressed bytes past the end of the block.
    PayloadTruncated = 0x03,
    /// Any other failure.
    Unspecified = 0x04,
}

impl From<u8> for BlockError {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::InvalidBlockType,
            0x02 => Self::InvalidByteNumReq,
            0x03 => Self::PayloadTruncated,
            _ => Self::Unspecified,
        }
    }
}

/// PF answer to a [`BlockRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockResponse {
    /// Requested data byte.
    Data(u8),
    /// CRC over the requested byte count.
    Crc(u8),
    /// Request refused.
    Error(BlockError),
}

impl BlockResponse {
    /// Pack into a block response message.
    #[must_use]
    pub fn to_message(self) -> PfvfMessage {
        let (kind, value) = match self {
            Self::Data(byte) => (0u32, byte),
            Self::Crc(crc) => (1, crc),
            Self::Error(err) => (2, err as u8),
        };
        let data = (kind << BLKMSG_RESP_TYPE.offset())
            | (u32::from(value) << BLKMSG_RESP_DATA.offset());
        PfvfMessage::new(Pf2VfMsgType::BlkMsgResp.into(), data)
    }

    /// Unpack a block response message. Unknown error codes map to
    /// [`BlockError::Unspecified`].
    pub fn from_message(msg: &PfvfMessage) -> Result<Self, PfvfError> {
        if msg.ty != u32::from(Pf2VfMsgType::BlkMsgResp) {
            return Err(PfvfError::UnexpectedMessage(msg.ty));
        }
        // The value field is eight bits wide.
        let value = BLKMSG_RESP_DATA.extract(msg.data) as u8;
        match BLKMSG_RESP_TYPE.extract(msg.data) {
            0 => Ok(Self::Data(value)),
            1 => Ok(Self::Crc(value)),
            2 => Ok(Self::Error(BlockError::from(value))),
            other => Err(PfvfError::UnknownBlockResponse(other)),
        }
    }
}

/// Block message buffer: two header bytes followed by the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockMessage {
    buf: [u8; BLKMSG_MAX_SIZE],
    len: usize,
}

impl BlockMessage {
    /// Build a block message from a protocol version and payload.
    pub fn new(version: u8, payload: &[u8]) -> Result<Self, PfvfError> {
        if payload.len() > BLKMSG_MAX_PAYLOAD {
            return Err(PfvfError::BlockTooLarge(payload.len()));
        }
        let len = BLKMSG_HEADER_SIZE + payload.len();
        let mut buf = [0u8; BLKMSG_MAX_SIZE];
        buf[0] = version;
        // Bounded by BLKMSG_MAX_PAYLOAD above.
        buf[1] = payload.len() as u8;
        buf[BLKMSG_HEADER_SIZE..len].copy_from_slice(payload);
        Ok(Self { buf, len })
    }

    /// Parse a received block. Bytes past the declared payload are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PfvfError> {
        if bytes.len() < BLKMSG_HEADER_SIZE {
            return Err(PfvfError::Truncated);
        }
        let payload_size = usize::from(bytes[1]);
        let total = BLKMSG_HEADER_SIZE + payload_size;
        if total > BLKMSG_MAX_SIZE {
            return Err(PfvfError::BlockTooLarge(payload_size));
        }
        let payload = bytes
            .get(BLKMSG_HEADER_SIZE..total)
            .ok_or(PfvfError::Truncated)?;
        Self::new(bytes[0], payload)
    }

    /// Protocol version recorded in the header.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.buf[0]
    }

    /// Payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buf[BLKMSG_HEADER_SIZE..self.len]
    }

    /// Header and payload as transmitted.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of bytes on the wire, header included.
    #[must_use]
    pub fn msg_size(&self) -> usize {
        self.len
    }

    /// Byte at `index` of the transmitted form.
    #[must_use]
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.as_bytes().get(index).copied()
    }

    /// CRC over the whole message.
    #[must_use]
    pub fn crc(&self) -> u8 {
        blkmsg_crc(self.as_bytes())
    }

    /// CRC over the first `count` bytes, if the message is that long.
    #[must_use]
    pub fn crc_over(&self, count: usize) -> Option<u8> {
        self.as_bytes().get(..count).map(blkmsg_crc)
    }

    /// Compare a peer-supplied CRC with the one recomputed locally.
    pub fn verify_crc(&self, expected: u8) -> Result<(), PfvfError> {
        let actual = self.crc();
        if actual != expected {
            return Err(PfvfError::CrcMismatch { expected, actual });
        }
        Ok(())
    }
}

impl fmt::Debug for BlockMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockMessage")
            .field("version", &self.version())
            .field("payload", &hex::encode(self.payload()))
            .finish()
    }
}

/// Answer one block request from `msg`, as the PF does.
#[must_use]
pub fn serve_block_request(req: &BlockRequest, msg: &BlockMessage) -> BlockResponse {
    let Ok(size) = req.size() else {
        return BlockResponse::Error(BlockError::InvalidBlockType);
    };
    if req.wire_index(size).is_none() {
        return BlockResponse::Error(BlockError::InvalidByteNumReq);
    }

    let index = req.index as usize;
    let answer = if req.crc {
        msg.crc_over(index).map(BlockResponse::Crc)
    } else {
        msg.byte(index).map(BlockResponse::Data)
    };
    answer.unwrap_or(BlockResponse::Error(BlockError::PayloadTruncated))
}
