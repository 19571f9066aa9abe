// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Public traits for interfaces between clock drivers and the rest of the
//! system.

pub mod clk;
pub mod cpufreq;
pub mod firmware;
