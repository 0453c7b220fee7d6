// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Share diagnostic capture helpers across PF/VF integration tests.
// Author: Lukas Bower
#![allow(dead_code)]

use std::cell::RefCell;
use std::fmt;

use cohesix_pfvf::DiagnosticSink;
use log::Level;

/// Sink that keeps every diagnostic for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    entries: RefCell<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, level: Level, args: fmt::Arguments<'_>) {
        self.entries.borrow_mut().push((level, args.to_string()));
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
