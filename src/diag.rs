// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Provide the diagnostic sink used by the PF/VF codec to report anomalies.
// Author: Lukas Bower

//! Diagnostic sinks receive human-readable reports from the codec. They never
//! influence control flow.

use core::fmt;

use log::Level;

/// Log target used by [`LogSink`].
pub const PFVF_LOG_TARGET: &str = "pfvf";

/// Receiver for codec diagnostics.
pub trait DiagnosticSink {
    /// Record a single diagnostic line.
    fn report(&self, level: Level, args: fmt::Arguments<'_>);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: PFVF_LOG_TARGET, level, "{}", args);
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _level: Level, _args: fmt::Arguments<'_>) {}
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn report(&self, level: Level, args: fmt::Arguments<'_>) {
        (**self).report(level, args);
    }
}
