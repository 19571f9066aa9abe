// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Core kernel support for firmware-managed clocks.
//!
//! The kernel crate holds the code that chip crates share: the standard
//! [`ErrorCode`], debug output, compile-time configuration, and the Hardware
//! Interface Layer (HIL) definitions for the collaborators a clock driver
//! talks to (the firmware property channel, the clock framework and the
//! CPU frequency-scaling framework).
//!
//! The generic framework helpers that every frequency-scaling driver relies
//! on (table initialization and verification) also live here, next to the
//! HIL they belong to.

#![no_std]

pub mod config;
pub mod debug;
pub mod errorcode;
pub mod hil;
pub mod utilities;

pub use crate::errorcode::ErrorCode;
