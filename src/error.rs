// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define the error taxonomy shared by the PF/VF codec modules.
// Author: Lukas Bower

//! Errors surfaced by the PF/VF codec, checksum and configuration layers.

/// Possible errors produced while encoding, decoding or configuring PF/VF messages.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PfvfError {
    /// Value sets bits outside the field it is written to.
    #[error("PFVF message value {value:#X} out of range, {mask} max allowed")]
    FieldOutOfRange {
        /// Raw value supplied by the caller.
        value: u32,
        /// Unshifted mask of the target field.
        mask: u32,
    },
    /// Message type 0 is reserved and never encoded.
    #[error("PFVF message type 0 is reserved")]
    ReservedType,
    /// Field descriptor does not describe a contiguous field inside a 32-bit word.
    #[error("invalid field descriptor: offset {offset} mask {mask:#X}")]
    InvalidField {
        /// Bit offset of the field.
        offset: u8,
        /// Unshifted field mask.
        mask: u32,
    },
    /// Word format fields overlap each other or the reserved protocol bits.
    #[error("overlapping CSR fields: {overlap:#010X}")]
    OverlappingFields {
        /// Bits claimed more than once.
        overlap: u32,
    },
    /// Word format has no origin tag, so an encoded word could equal the failure sentinel.
    #[error("CSR format has no origin tag")]
    MissingOriginTag,
    /// Hardware generation name not recognised.
    #[error("unknown hardware generation {0:?}")]
    UnknownGeneration(String),
    /// Message type outside the known protocol vocabulary.
    #[error("unknown PFVF message type {0:#X}")]
    UnknownMessageType(u32),
    /// Message carried a type the caller did not expect.
    #[error("unexpected PFVF message type {0:#X}")]
    UnexpectedMessage(u32),
    /// Compatibility result code outside the protocol vocabulary.
    #[error("unknown compatibility response {0}")]
    UnknownCompatResponse(u32),
    /// Block type does not map to a small, medium or large block.
    #[error("invalid block type {0}")]
    InvalidBlockType(u8),
    /// Byte index or count outside the range accepted for the block size.
    #[error("invalid byte index {index} for block type {block_type}, {max} max allowed")]
    InvalidByteIndex {
        /// Requested block type.
        block_type: u8,
        /// Requested byte index or count.
        index: u32,
        /// Largest index, or count for CRC requests, accepted for the block size.
        max: u32,
    },
    /// Block response type not defined by the protocol.
    #[error("unknown block response type {0}")]
    UnknownBlockResponse(u32),
    /// Block payload exceeds the maximum block message size.
    #[error("block payload of {0} bytes exceeds the block message limit")]
    BlockTooLarge(usize),
    /// Block buffer shorter than its header claims.
    #[error("truncated block message")]
    Truncated,
    /// Checksum recomputed over a block did not match the transmitted value.
    #[error("block CRC mismatch: expected {expected:#04X} actual {actual:#04X}")]
    CrcMismatch {
        /// Checksum received from the peer.
        expected: u8,
        /// Checksum recomputed locally.
        actual: u8,
    },
    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}
