// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define logical PF/VF messages and the protocol message vocabulary.
// Author: Lukas Bower

//! Logical PF/VF messages and the type codes exchanged over the mailbox.

use crate::error::PfvfError;
use crate::field::FieldFormat;

/// One control-plane message between a physical and a virtual function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PfvfMessage {
    /// Message type code; 0 is reserved.
    pub ty: u32,
    /// Type-specific payload.
    pub data: u32,
}

impl PfvfMessage {
    /// Construct a message from raw type and data values.
    #[must_use]
    pub const fn new(ty: u32, data: u32) -> Self {
        Self { ty, data }
    }

    /// Check whether the message carries a non-reserved type.
    #[must_use]
    pub const fn is_typed(&self) -> bool {
        self.ty != 0
    }

    /// VF request asking the PF to check compatibility with `version`.
    #[must_use]
    pub fn compat_version_request(version: CompatVersion) -> Self {
        Self::new(Vf2PfMsgType::CompatVerReq.into(), u32::from(version as u8))
    }
}

impl From<Pf2VfMsgType> for PfvfMessage {
    fn from(ty: Pf2VfMsgType) -> Self {
        Self::new(ty.into(), 0)
    }
}

impl From<Vf2PfMsgType> for PfvfMessage {
    fn from(ty: Vf2PfMsgType) -> Self {
        Self::new(ty.into(), 0)
    }
}

/// Messages sent from the PF to a VF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Pf2VfMsgType {
    /// PF is about to reset the device.
    Restarting = 0x01,
    /// Reply to a version or compatibility request.
    VersionResp = 0x02,
    /// Reply to a block message request.
    BlkMsgResp = 0x03,
    /// Reply to a ring pair reset request. Gen4 only.
    RpResetResp = 0x10,
}

impl TryFrom<u32> for Pf2VfMsgType {
    type Error = PfvfError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::Restarting,
            0x02 => Self::VersionResp,
            0x03 => Self::BlkMsgResp,
            0x10 => Self::RpResetResp,
            other => return Err(PfvfError::UnknownMessageType(other)),
        })
    }
}

impl From<Pf2VfMsgType> for u32 {
    fn from(value: Pf2VfMsgType) -> Self {
        value as u32
    }
}

/// Messages sent from a VF to the PF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Vf2PfMsgType {
    /// VF driver finished initialisation.
    Init = 0x03,
    /// VF driver is shutting down.
    Shutdown = 0x04,
    /// Legacy version request.
    VersionReq = 0x05,
    /// Compatibility version request.
    CompatVerReq = 0x06,
    /// Read from a large (128 byte) block message.
    LargeBlockReq = 0x07,
    /// Read from a medium (64 byte) block message.
    MediumBlockReq = 0x08,
    /// Read from a small (32 byte) block message.
    SmallBlockReq = 0x09,
    /// Ring pair reset request. Gen4 only.
    RpReset = 0x10,
}

impl TryFrom<u32> for Vf2PfMsgType {
    type Error = PfvfError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use Vf2PfMsgType::*;
        Ok(match value {
            0x03 => Init,
            0x04 => Shutdown,
            0x05 => VersionReq,
            0x06 => CompatVerReq,
            0x07 => LargeBlockReq,
            0x08 => MediumBlockReq,
            0x09 => SmallBlockReq,
            0x10 => RpReset,
            other => return Err(PfvfError::UnknownMessageType(other)),
        })
    }
}

impl From<Vf2PfMsgType> for u32 {
    fn from(value: Vf2PfMsgType) -> Self {
        value as u32
    }
}

/// PF/VF protocol compatibility levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum CompatVersion {
    /// Original protocol.
    Base = 1,
    /// PF acknowledges requests without a delay.
    FastAck = 2,
    /// Ring to service map available as a block message.
    RingToSvcMap = 3,
}

impl CompatVersion {
    /// Level implemented by this crate.
    pub const CURRENT: CompatVersion = CompatVersion::RingToSvcMap;
}

/// PF verdict on a VF compatibility request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompatResponse {
    /// VF may proceed.
    Compatible = 0x01,
    /// VF must not use the device.
    Incompatible = 0x02,
    /// PF cannot tell; the VF decides.
    Unknown = 0x03,
}

impl TryFrom<u32> for CompatResponse {
    type Error = PfvfError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Compatible),
            0x02 => Ok(Self::Incompatible),
            0x03 => Ok(Self::Unknown),
            other => Err(PfvfError::UnknownCompatResponse(other)),
        }
    }
}

const VERSION_RESP_VERS: FieldFormat = FieldFormat::from_bits(7, 0);
const VERSION_RESP_RESULT: FieldFormat = FieldFormat::from_bits(9, 8);

/// Payload of a [`Pf2VfMsgType::VersionResp`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionResponse {
    /// Compatibility level reported by the PF.
    pub version: u8,
    /// PF verdict.
    pub result: CompatResponse,
}

impl VersionResponse {
    /// Pack into a version response message.
    #[must_use]
    pub fn to_message(self) -> PfvfMessage {
        let data = (u32::from(self.version) << VERSION_RESP_VERS.offset())
            | (u32::from(self.result as u8) << VERSION_RESP_RESULT.offset());
        PfvfMessage::new(Pf2VfMsgType::VersionResp.into(), data)
    }

    /// Unpack a version response message.
    pub fn from_message(msg: &PfvfMessage) -> Result<Self, PfvfError> {
        if msg.ty != u32::from(Pf2VfMsgType::VersionResp) {
            return Err(PfvfError::UnexpectedMessage(msg.ty));
        }
        // The version field is eight bits wide.
        let version = VERSION_RESP_VERS.extract(msg.data) as u8;
        let result = CompatResponse::try_from(VERSION_RESP_RESULT.extract(msg.data))?;
        Ok(Self { version, result })
    }
}
