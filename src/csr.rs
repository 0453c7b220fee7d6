// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Encode and decode PF/VF messages to and from hardware control words.
// Author: Lukas Bower

//! Register-word codec for the PF/VF mailbox.
//!
//! A control word carries `[origin tag][type field][data field]`, with the
//! field positions supplied per hardware generation by a [`CsrFormat`].

use core::fmt;
use core::str::FromStr;

use log::Level;

use crate::diag::{DiagnosticSink, LogSink};
use crate::error::PfvfError;
use crate::field::{set_value_on_csr, FieldFormat};
use crate::message::PfvfMessage;

/// Doorbell bit raised by the transport when a word is posted.
pub const PFVF_INT: u32 = 1 << 0;

/// Origin tag marking a word as sent by the privileged (system) side.
pub const PFVF_MSGORIGIN_SYSTEM: u32 = 1 << 1;

/// Word returned in place of an encoded message when encoding fails.
pub const PFVF_MSG_NO_RESPONSE: u32 = 0;

/// Layout of one hardware control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsrFormat {
    /// Message type field.
    pub ty: FieldFormat,
    /// Message data field.
    pub data: FieldFormat,
    /// Origin tag OR'd into every encoded word.
    pub origin: u32,
}

impl CsrFormat {
    /// Pair a type and data field under the system origin tag.
    #[must_use]
    pub const fn new(ty: FieldFormat, data: FieldFormat) -> Self {
        Self {
            ty,
            data,
            origin: PFVF_MSGORIGIN_SYSTEM,
        }
    }

    /// Replace the origin tag.
    #[must_use]
    pub const fn with_origin(self, origin: u32) -> Self {
        Self { origin, ..self }
    }

    /// Check that both fields are well formed and that the type field, data
    /// field and origin tag claim disjoint bits.
    ///
    /// A non-zero origin tag guarantees no valid encoding equals
    /// [`PFVF_MSG_NO_RESPONSE`].
    pub fn validate(&self) -> Result<(), PfvfError> {
        self.ty.validate()?;
        self.data.validate()?;
        if self.origin == 0 {
            return Err(PfvfError::MissingOriginTag);
        }
        let ty = self.ty.placed_mask();
        let data = self.data.placed_mask();
        let overlap = (ty & data) | ((ty | data) & self.origin);
        if overlap != 0 {
            return Err(PfvfError::OverlappingFields { overlap });
        }
        Ok(())
    }
}

/// Control word layout used by Gen2 devices (4-bit type, 10-bit data).
pub const CSR_GEN2_FMT: CsrFormat =
    CsrFormat::new(FieldFormat::new(2, 0x0F), FieldFormat::new(6, 0x3FF));

/// Control word layout used by Gen4 devices (6-bit type, 24-bit data).
pub const CSR_GEN4_FMT: CsrFormat =
    CsrFormat::new(FieldFormat::new(2, 0x3F), FieldFormat::new(8, 0xFF_FFFF));

/// Hardware generations with a known control word layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HwGeneration {
    /// Gen2 devices.
    #[default]
    Gen2,
    /// Gen4 devices.
    Gen4,
}

impl HwGeneration {
    /// Every supported generation.
    pub const ALL: [HwGeneration; 2] = [HwGeneration::Gen2, HwGeneration::Gen4];

    /// Control word layout for this generation.
    #[must_use]
    pub const fn csr_format(self) -> CsrFormat {
        match self {
            Self::Gen2 => CSR_GEN2_FMT,
            Self::Gen4 => CSR_GEN4_FMT,
        }
    }
}

impl FromStr for HwGeneration {
    type Err = PfvfError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gen2" | "2" => Ok(Self::Gen2),
            "gen4" | "4" => Ok(Self::Gen4),
            _ => Err(PfvfError::UnknownGeneration(value.to_owned())),
        }
    }
}

impl fmt::Display for HwGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gen2 => "gen2",
            Self::Gen4 => "gen4",
        };
        write!(f, "{name}")
    }
}

/// Encode `msg` into a control word.
///
/// The type is validated before the data; the first failure aborts the call.
/// Type 0 is reserved and rejected.
pub fn csr_msg_of<S>(msg: PfvfMessage, fmt: &CsrFormat, sink: &S) -> Result<u32, PfvfError>
where
    S: DiagnosticSink + ?Sized,
{
    let mut csr_msg = 0;

    if !msg.is_typed() {
        sink.report(
            Level::Error,
            format_args!("PFVF message with reserved type 0 not sent"),
        );
        return Err(PfvfError::ReservedType);
    }
    set_value_on_csr(&mut csr_msg, msg.ty, fmt.ty, sink)?;
    set_value_on_csr(&mut csr_msg, msg.data, fmt.data, sink)?;

    Ok(csr_msg | fmt.origin)
}

/// Encode `msg`, returning [`PFVF_MSG_NO_RESPONSE`] on failure.
#[must_use]
pub fn csr_msg_or_sentinel<S>(msg: PfvfMessage, fmt: &CsrFormat, sink: &S) -> u32
where
    S: DiagnosticSink + ?Sized,
{
    csr_msg_of(msg, fmt, sink).unwrap_or(PFVF_MSG_NO_RESPONSE)
}

/// Decode a control word. Never fails; a zero type is reported, not rejected.
pub fn message_of<S>(csr_msg: u32, fmt: &CsrFormat, sink: &S) -> PfvfMessage
where
    S: DiagnosticSink + ?Sized,
{
    let msg = PfvfMessage::new(fmt.ty.extract(csr_msg), fmt.data.extract(csr_msg));

    if !msg.is_typed() {
        sink.report(
            Level::Warn,
            format_args!("Invalid PFVF msg with no type received"),
        );
    }

    msg
}

/// A control word format bundled with the sink that receives its diagnostics.
#[derive(Debug, Clone)]
pub struct CsrCodec<S = LogSink> {
    format: CsrFormat,
    sink: S,
}

impl CsrCodec {
    /// Codec reporting through the `log` facade.
    #[must_use]
    pub fn new(format: CsrFormat) -> Self {
        Self::with_sink(format, LogSink)
    }

    /// Codec for a known hardware generation.
    #[must_use]
    pub fn for_generation(generation: HwGeneration) -> Self {
        Self::new(generation.csr_format())
    }
}

impl<S: DiagnosticSink> CsrCodec<S> {
    /// Codec reporting through a caller-supplied sink.
    #[must_use]
    pub fn with_sink(format: CsrFormat, sink: S) -> Self {
        Self { format, sink }
    }

    /// Word layout used by this codec.
    #[must_use]
    pub fn format(&self) -> &CsrFormat {
        &self.format
    }

    /// Sink receiving diagnostics.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Encode a message into a control word.
    pub fn encode(&self, msg: PfvfMessage) -> Result<u32, PfvfError> {
        csr_msg_of(msg, &self.format, &self.sink)
    }

    /// Encode a message, returning [`PFVF_MSG_NO_RESPONSE`] on failure.
    #[must_use]
    pub fn encode_or_sentinel(&self, msg: PfvfMessage) -> u32 {
        csr_msg_or_sentinel(msg, &self.format, &self.sink)
    }

    /// Decode a control word.
    #[must_use]
    pub fn decode(&self, csr_msg: u32) -> PfvfMessage {
        message_of(csr_msg, &self.format, &self.sink)
    }
}
