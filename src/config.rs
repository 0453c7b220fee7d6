// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load the PF/VF control word layout from TOML configuration.
// Author: Lukas Bower

//! Control word layout configuration.
//!
//! ```toml
//! generation = "gen4"
//!
//! # Optional custom layout; both fields must be given together.
//! [type_field]
//! offset = 2
//! mask = 0x3F
//!
//! [data_field]
//! offset = 8
//! mask = 0xFFFFFF
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

use crate::csr::{CsrFormat, HwGeneration};
use crate::error::PfvfError;
use crate::field::FieldFormat;

/// Config file read by [`PfvfConfig::load_active`] when `PFVF_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pfvf.toml";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PFVF_CONFIG";

/// Environment variable overriding the configured generation.
pub const GENERATION_ENV: &str = "PFVF_GENERATION";

/// Field descriptor as written in the config file.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Bit offset of the field.
    pub offset: u8,
    /// Unshifted field mask.
    pub mask: u32,
}

impl From<FieldConfig> for FieldFormat {
    fn from(value: FieldConfig) -> Self {
        FieldFormat::new(value.offset, value.mask)
    }
}

/// PF/VF codec configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PfvfConfig {
    /// Hardware generation name, e.g. `gen2`.
    pub generation: Option<String>,
    /// Custom type field.
    pub type_field: Option<FieldConfig>,
    /// Custom data field.
    pub data_field: Option<FieldConfig>,
    /// Bit position of the origin tag for custom layouts.
    pub origin_bit: Option<u8>,
}

impl PfvfConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(data: &str) -> Result<Self, PfvfError> {
        toml::from_str(data).map_err(|e| PfvfError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, PfvfError> {
        let data = fs::read_to_string(path)
            .map_err(|e| PfvfError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&data)
    }

    /// Load the config named by `PFVF_CONFIG` (or the default path), falling
    /// back to defaults, then apply `PFVF_GENERATION`.
    pub fn load_active() -> Self {
        let path = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut cfg = match Self::load(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("[pfvf] using default config: {e}");
                Self::default()
            }
        };
        if let Ok(generation) = env::var(GENERATION_ENV) {
            cfg.generation = Some(generation);
        }
        cfg
    }

    /// Configured hardware generation, defaulting to Gen2.
    pub fn hw_generation(&self) -> Result<HwGeneration, PfvfError> {
        self.generation
            .as_deref()
            .map_or(Ok(HwGeneration::default()), str::parse::<HwGeneration>)
    }

    /// Resolve the control word layout.
    pub fn csr_format(&self) -> Result<CsrFormat, PfvfError> {
        match (self.type_field, self.data_field) {
            (Some(ty), Some(data)) => {
                let mut fmt = CsrFormat::new(ty.into(), data.into());
                if let Some(bit) = self.origin_bit {
                    let origin = 1u32.checked_shl(u32::from(bit)).ok_or_else(|| {
                        PfvfError::Config(format!("origin_bit {bit} outside the control word"))
                    })?;
                    fmt = fmt.with_origin(origin);
                }
                fmt.validate()?;
                Ok(fmt)
            }
            (None, None) => Ok(self.hw_generation()?.csr_format()),
            _ => Err(PfvfError::Config(
                "type_field and data_field must be given together".into(),
            )),
        }
    }
}
