// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Firmware-managed clocks for BCM2835-family SoCs (Raspberry Pi).
//!
//! The clock generator on these chips is owned by the VideoCore firmware. The
//! ARM cores have no access to its registers, so every enable, disable and
//! rate change is a property request sent to firmware through the mailbox.
//! Firmware only reports a minimum and a maximum rate per clock; the actual
//! rate is whatever firmware programs after a request.
//!
//! This crate provides:
//!
//! - [`clocks`]: the fixed table of firmware clocks and the per-clock
//!   operations.
//! - [`clk_provider`]: the provider that registers clocks with the clock
//!   framework the first time a consumer asks for them.
//! - [`cpufreq`]: a two-level frequency-scaling driver for the ARM clock.
//! - [`firmware`]: the property tags and packet layout shared by the above.

#![no_std]

pub mod clk_provider;
pub mod clocks;
pub mod cpufreq;
mod error;
pub mod firmware;

pub use self::error::ClockError;

// This is used to run the tests on a host
#[cfg(test)]
#[macro_use]
extern crate std;
