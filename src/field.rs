// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Describe bit fields inside PF/VF control words and pack values into them.
// Author: Lukas Bower

//! Field descriptors for fixed-width PF/VF control words.

use log::Level;

use crate::diag::DiagnosticSink;
use crate::error::PfvfError;

/// Width of a PF/VF control word in bits.
pub const CSR_WORD_BITS: u32 = u32::BITS;

/// Location of one sub-value inside a control word.
///
/// `mask` is unshifted: a raw value `v` fits iff `v & mask == v`, and the
/// field is read back as `(word >> offset) & mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldFormat {
    offset: u8,
    mask: u32,
}

impl FieldFormat {
    /// Construct a descriptor from a bit offset and an unshifted mask.
    #[must_use]
    pub const fn new(offset: u8, mask: u32) -> Self {
        Self { offset, mask }
    }

    /// Construct a descriptor covering the inclusive bit range `lo..=hi`.
    ///
    /// # Panics
    ///
    /// Panics unless `lo <= hi < 32`. In a constant this is a compile error.
    #[must_use]
    pub const fn from_bits(hi: u8, lo: u8) -> Self {
        assert!(lo <= hi && (hi as u32) < CSR_WORD_BITS, "bit range outside control word");
        let width = hi - lo + 1;
        let mask = if width as u32 >= CSR_WORD_BITS {
            u32::MAX
        } else {
            (1u32 << (width as u32)) - 1
        };
        Self { offset: lo, mask }
    }

    /// Bit offset of the least significant bit of the field.
    #[must_use]
    pub const fn offset(self) -> u8 {
        self.offset
    }

    /// Unshifted field mask.
    #[must_use]
    pub const fn mask(self) -> u32 {
        self.mask
    }

    /// Number of bits spanned by the mask.
    #[must_use]
    pub const fn width(self) -> u32 {
        CSR_WORD_BITS - self.mask.leading_zeros()
    }

    /// Largest raw value the field can carry.
    #[must_use]
    pub const fn max(self) -> u32 {
        self.mask
    }

    /// Check whether `value` sets no bit outside the field.
    #[must_use]
    pub const fn fits(self, value: u32) -> bool {
        value & self.mask == value
    }

    /// Read the field out of `word`.
    #[must_use]
    pub fn extract(self, word: u32) -> u32 {
        word.checked_shr(u32::from(self.offset)).unwrap_or(0) & self.mask
    }

    /// Mask shifted into its final position within the word.
    #[must_use]
    pub fn placed_mask(self) -> u32 {
        self.mask.checked_shl(u32::from(self.offset)).unwrap_or(0)
    }

    /// Reject empty or non-contiguous masks and fields that spill past bit 31.
    pub fn validate(self) -> Result<(), PfvfError> {
        let contiguous = self.mask & self.mask.wrapping_add(1) == 0;
        let end = u32::from(self.offset) + self.width();
        if self.mask == 0 || !contiguous || end > CSR_WORD_BITS {
            return Err(PfvfError::InvalidField {
                offset: self.offset,
                mask: self.mask,
            });
        }
        Ok(())
    }
}

/// Merge `value` into `csr_msg` at the position described by `field`.
///
/// Bits are only ever set, never cleared. An out-of-range value, or one whose
/// high bits would be shifted past bit 31, is reported to `sink` and leaves
/// `csr_msg` untouched.
pub fn set_value_on_csr<S>(
    csr_msg: &mut u32,
    value: u32,
    field: FieldFormat,
    sink: &S,
) -> Result<(), PfvfError>
where
    S: DiagnosticSink + ?Sized,
{
    if !field.fits(value) {
        sink.report(
            Level::Error,
            format_args!(
                "PFVF message value {value:#X} out of range, {} max allowed",
                field.mask()
            ),
        );
        return Err(PfvfError::FieldOutOfRange {
            value,
            mask: field.mask(),
        });
    }

    let offset = u32::from(field.offset());
    let Some(shifted) = value.checked_shl(offset).filter(|s| s >> offset == value) else {
        sink.report(
            Level::Error,
            format_args!("PFVF message value {value:#X} does not fit at bit offset {offset}"),
        );
        return Err(PfvfError::InvalidField {
            offset: field.offset(),
            mask: field.mask(),
        });
    };
    *csr_msg |= shifted;
    Ok(())
}
