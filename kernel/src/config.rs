// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Data structure for storing compile-time configuration options.
//!
//! Configuration is a typed `const` object rather than scattered
//! `#[cfg(feature = ..)]` blocks. Code that is disabled by configuration is
//! still type-checked, and the compiler folds the constant so a disabled
//! `if CONFIG.x { .. }` block costs nothing in the resulting binary.
//!
//! Chip crates read [`CONFIG`] directly; they never test the Cargo features
//! themselves.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, enable the matching Cargo feature on the
/// kernel crate.
pub struct Config {
    /// Whether every firmware property exchange is traced to the debug
    /// output.
    ///
    /// If enabled, each request prints its tag and the request and response
    /// words. This is useful when bringing up a new firmware revision whose
    /// replies are not what the driver expects.
    pub trace_firmware_property: bool,

    /// Whether clock drivers print per-operation diagnostics.
    ///
    /// If enabled, reads of clock state and rate, enable/disable requests
    /// and the rate firmware actually applied after a set are all printed.
    /// Failures are printed regardless of this option.
    pub debug_clock_ops: bool,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined. Notably, this is the only location where `cfg!(feature = ..)` is
/// used to configure code.
pub const CONFIG: Config = Config {
    trace_firmware_property: cfg!(feature = "trace_firmware_property"),
    debug_clock_ops: cfg!(feature = "debug_clock_ops"),
};
