// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Expose the PF/VF control-word codec and block message checksum.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! PF/VF mailbox primitives for virtualised accelerators.
//!
//! Two independent, stateless pieces make up the wire format: the register
//! word codec in [`csr`], which packs a `{type, data}` message into a single
//! 32-bit control word, and the CRC-8 engine in [`crc`], which certifies the
//! multi-byte block messages described in [`blkmsg`]. Neither calls the other.

pub mod blkmsg;
pub mod config;
pub mod crc;
pub mod csr;
pub mod diag;
pub mod error;
pub mod field;
pub mod message;

pub use blkmsg::{
    serve_block_request, BlockError, BlockMessage, BlockRequest, BlockResponse, BlockSize,
};
pub use config::PfvfConfig;
pub use crc::{blkmsg_crc, crc8_update, PFVF_CRC8_INIT, PFVF_CRC8_TABLE};
pub use csr::{
    csr_msg_of, csr_msg_or_sentinel, message_of, CsrCodec, CsrFormat, HwGeneration,
    CSR_GEN2_FMT, CSR_GEN4_FMT, PFVF_INT, PFVF_MSGORIGIN_SYSTEM, PFVF_MSG_NO_RESPONSE,
};
pub use diag::{DiagnosticSink, LogSink, NullSink};
pub use error::PfvfError;
pub use field::{set_value_on_csr, FieldFormat};
pub use message::{
    CompatResponse, CompatVersion, Pf2VfMsgType, PfvfMessage, Vf2PfMsgType, VersionResponse,
};
