// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interfaces for CPU frequency-scaling drivers.
//!
//! A frequency-scaling driver describes the operating points of a CPU clock
//! as a frequency table and lets the governor framework move between them by
//! table index. Frequencies in this module are in kHz.
//!
//! The framework side is represented by [`CpufreqRegistrar`]; the generic
//! table helpers that most drivers delegate to ([`generic_init()`],
//! [`frequency_table_verify()`]) are provided here as free functions.

use crate::ErrorCode;

/// Frequency value marking the end of a frequency table.
pub const TABLE_END: u32 = !0;

/// Frequency value of an entry that must be skipped.
pub const ENTRY_INVALID: u32 = !0 - 1;

/// One operating point of a frequency table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyEntry {
    /// Frequency in kHz, or one of [`TABLE_END`] / [`ENTRY_INVALID`].
    pub frequency: u32,
}

impl FrequencyEntry {
    /// The table terminator.
    pub const END: FrequencyEntry = FrequencyEntry {
        frequency: TABLE_END,
    };

    pub const fn new(frequency_khz: u32) -> FrequencyEntry {
        FrequencyEntry {
            frequency: frequency_khz,
        }
    }

    pub const fn is_end(&self) -> bool {
        self.frequency == TABLE_END
    }

    pub const fn is_valid(&self) -> bool {
        self.frequency != TABLE_END && self.frequency != ENTRY_INVALID
    }
}

/// Iterate over the `(index, frequency)` pairs of the usable entries of
/// `table`, stopping at the terminator.
pub fn valid_entries(table: &[FrequencyEntry]) -> impl Iterator<Item = (usize, u32)> + '_ {
    table
        .iter()
        .take_while(|entry| !entry.is_end())
        .enumerate()
        .filter(|(_, entry)| entry.is_valid())
        .map(|(index, entry)| (index, entry.frequency))
}

/// Hardware limits of a CPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuInfo {
    /// Lowest supported frequency, kHz.
    pub min_freq: u32,
    /// Highest supported frequency, kHz.
    pub max_freq: u32,
    /// Time to switch between two frequencies, ns.
    pub transition_latency: u32,
}

/// Per-CPU scaling policy shared between the framework and the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Policy {
    pub cpu: usize,
    /// Frequency the CPU is running at, as last reported by the driver.
    pub cur: u32,
    /// Lower bound the governor may select.
    pub min: u32,
    /// Upper bound the governor may select.
    pub max: u32,
    pub cpuinfo: CpuInfo,
}

impl Policy {
    pub const fn new(cpu: usize) -> Policy {
        Policy {
            cpu,
            cur: 0,
            min: 0,
            max: 0,
            cpuinfo: CpuInfo {
                min_freq: 0,
                max_freq: 0,
                transition_latency: 0,
            },
        }
    }
}

/// A frequency-scaling driver.
pub trait CpufreqDriver: Sync {
    /// Driver name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Fill in `policy` for a CPU the driver manages.
    fn init(&self, policy: &mut Policy) -> Result<(), ErrorCode>;

    /// Adjust `policy.min` and `policy.max` so the range contains at least
    /// one frequency the driver supports.
    fn verify(&self, policy: &mut Policy) -> Result<(), ErrorCode>;

    /// Switch to the table entry at `index`, updating `policy.cur`.
    fn target_index(&self, policy: &mut Policy, index: usize) -> Result<(), ErrorCode>;

    /// Current frequency of `cpu` in kHz, 0 if unknown.
    fn get(&self, cpu: usize) -> u32;
}

/// The registration half of the frequency-scaling framework.
pub trait CpufreqRegistrar {
    fn register_driver(&self, driver: &dyn CpufreqDriver) -> Result<(), ErrorCode>;

    fn unregister_driver(&self, driver: &dyn CpufreqDriver) -> Result<(), ErrorCode>;
}

/// Initialize `policy` from a frequency table.
///
/// Sets the hardware limits and the initial policy range to the lowest and
/// highest valid frequencies of `table`. Fails with `INVAL` if the table has
/// no valid entry.
pub fn generic_init(
    policy: &mut Policy,
    table: &[FrequencyEntry],
    transition_latency: u32,
) -> Result<(), ErrorCode> {
    let mut min = u32::MAX;
    let mut max = 0;
    let mut found = false;
    for (_, frequency) in valid_entries(table) {
        found = true;
        min = min.min(frequency);
        max = max.max(frequency);
    }
    if !found {
        return Err(ErrorCode::INVAL);
    }

    policy.cpuinfo.min_freq = min;
    policy.cpuinfo.max_freq = max;
    policy.cpuinfo.transition_latency = transition_latency;
    policy.min = min;
    policy.max = max;
    Ok(())
}

/// Clamp the policy range into the CPU's hardware limits.
pub fn verify_within_cpu_limits(policy: &mut Policy) {
    let (lo, hi) = (policy.cpuinfo.min_freq, policy.cpuinfo.max_freq);
    policy.max = policy.max.clamp(lo, hi.max(lo));
    policy.min = policy.min.clamp(lo, policy.max);
}

/// Make sure the policy range contains at least one frequency of `table`.
///
/// The range is first clamped to the hardware limits. If no valid table
/// frequency then falls inside `[min, max]`, `max` is raised to the smallest
/// table frequency above it.
pub fn frequency_table_verify(
    policy: &mut Policy,
    table: &[FrequencyEntry],
) -> Result<(), ErrorCode> {
    verify_within_cpu_limits(policy);

    let mut next_larger = u32::MAX;
    let mut found = false;
    for (_, frequency) in valid_entries(table) {
        if frequency >= policy.min && frequency <= policy.max {
            found = true;
            break;
        }
        if frequency > policy.max && frequency < next_larger {
            next_larger = frequency;
        }
    }

    if !found {
        if next_larger == u32::MAX {
            return Err(ErrorCode::INVAL);
        }
        policy.max = next_larger;
        verify_within_cpu_limits(policy);
    }
    Ok(())
}
