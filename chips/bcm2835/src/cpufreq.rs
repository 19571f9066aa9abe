// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Two-level frequency scaling for the ARM clock.
//!
//! Firmware only exposes a minimum and a maximum ARM rate, so the frequency
//! table has exactly two entries. Firmware also reports a measured rather
//! than programmed rate, which floats around the nominal values; the current
//! level is therefore found by comparing the measured rate against the
//! midpoint of the two entries.

use kernel::debug;
use kernel::hil::clk::{Clk, ClockProvider};
use kernel::hil::cpufreq::{self, CpufreqDriver, CpufreqRegistrar, FrequencyEntry, Policy};
use kernel::hil::firmware::{FirmwareDevice, PropertyChannel};
use kernel::utilities::sync::Once;
use kernel::ErrorCode;

use crate::clocks::ClockId;
use crate::firmware::{ClockPacket, PropertyTag};
use crate::ClockError;

pub const DRIVER_NAME: &str = "rpi cpufreq";

/// Time to switch between the two levels, in ns.
pub const TRANSITION_LATENCY_NS: u32 = 355_000;

/// Index of the low (minimum) level.
pub const LEVEL_LOW: usize = 0;
/// Index of the high (maximum) level.
pub const LEVEL_HIGH: usize = 1;

const TABLE_LEN: usize = 3;

/// The level a measured rate belongs to. Rates below the midpoint of `low`
/// and `high` are low; the midpoint itself and everything above it is high.
pub fn classify(low_khz: u32, high_khz: u32, rate_khz: u32) -> usize {
    let mean = (u64::from(low_khz) + u64::from(high_khz)) / 2;
    if u64::from(rate_khz) < mean {
        LEVEL_LOW
    } else {
        LEVEL_HIGH
    }
}

/// The two-entry frequency table. It is filled in one step and never
/// changes afterwards.
pub struct FrequencyTable {
    entries: Once<[FrequencyEntry; TABLE_LEN]>,
}

impl FrequencyTable {
    pub const fn new() -> FrequencyTable {
        FrequencyTable {
            entries: Once::new(),
        }
    }

    /// Fill the table from firmware's bounds in Hz. The first call wins.
    pub(crate) fn populate(&self, min_hz: u32, max_hz: u32) {
        self.entries.call_once(|| {
            [
                FrequencyEntry::new(min_hz / 1000),
                FrequencyEntry::new(max_hz / 1000),
                FrequencyEntry::END,
            ]
        });
    }

    pub fn is_populated(&self) -> bool {
        self.entries.is_completed()
    }

    /// The table including its terminator, once populated.
    pub fn entries(&self) -> Option<&[FrequencyEntry]> {
        self.entries.get().map(|entries| &entries[..])
    }

    /// Frequency of level `index` in kHz.
    pub fn frequency(&self, index: usize) -> Option<u32> {
        match index {
            LEVEL_LOW | LEVEL_HIGH => self.entries.get().map(|entries| entries[index].frequency),
            _ => None,
        }
    }

    /// The level `rate_khz` belongs to; see [`classify`].
    pub fn level_of(&self, rate_khz: u32) -> Option<usize> {
        self.entries.get().map(|entries| {
            classify(
                entries[LEVEL_LOW].frequency,
                entries[LEVEL_HIGH].frequency,
                rate_khz,
            )
        })
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Frequency-scaling driver for the ARM clock of a firmware-managed SoC.
pub struct FirmwareCpufreq<'a> {
    table: FrequencyTable,
    arm_clk: Once<Clk<'a>>,
}

impl<'a> FirmwareCpufreq<'a> {
    pub const fn new() -> FirmwareCpufreq<'a> {
        FirmwareCpufreq {
            table: FrequencyTable::new(),
            arm_clk: Once::new(),
        }
    }

    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }

    /// Set the driver up and register it with the frequency-scaling
    /// framework.
    ///
    /// `device` is the cpufreq device, which must reference the firmware
    /// node. The ARM clock is looked up by name through `clocks`.
    ///
    /// ### Return Values
    ///
    /// - `Ok(())`: the driver is registered.
    /// - `Err(ClockError)`:
    ///   - `DeferredRetry`: the ARM clock is not registered yet, or the
    ///     device does not reference the firmware node.
    ///   - `RangeQueryFailed`: firmware did not report a usable rate range.
    ///     The table stays empty.
    ///   - `RegistrationFailed`: the framework refused the driver.
    ///
    /// The table and the ARM clock are fixed by the first probe that gets
    /// past the range query. A probe retried after a refused registration
    /// queries firmware again but keeps the first range.
    pub fn probe(
        &self,
        device: &'a dyn FirmwareDevice,
        clocks: &'a dyn ClockProvider,
        registrar: &dyn CpufreqRegistrar,
    ) -> Result<(), ClockError> {
        let arm_name = ClockId::Arm.descriptor().name;
        let arm_clk = match clocks.lookup(arm_name) {
            Some(clk) => clk,
            None => {
                debug!("{}: failed to get the '{}' clock", device.name(), arm_name);
                return Err(ClockError::DeferredRetry);
            }
        };

        let firmware = match device.firmware() {
            Some(firmware) => firmware,
            None => {
                debug!("{}: failed to get the firmware node", device.name());
                return Err(ClockError::DeferredRetry);
            }
        };

        let (min, max) = match query_range(firmware.channel()) {
            Ok(range) => range,
            Err(e) => {
                debug!("{}: failed to get clock range from firmware: {:?}", device.name(), e);
                return Err(e);
            }
        };

        self.table.populate(min, max);
        self.arm_clk.call_once(|| arm_clk);

        registrar.register_driver(self).map_err(|e| {
            debug!("{}: failed to register {}: {:?}", device.name(), DRIVER_NAME, e);
            ClockError::RegistrationFailed(e)
        })
    }

    /// Unregister the driver from the frequency-scaling framework.
    pub fn remove(&self, registrar: &dyn CpufreqRegistrar) -> Result<(), ClockError> {
        registrar.unregister_driver(self).map_err(|e| {
            debug!("{}: failed to unregister: {:?}", DRIVER_NAME, e);
            ClockError::RegistrationFailed(e)
        })
    }

    /// The level the ARM clock currently runs at, from its measured rate.
    /// `None` before a successful probe.
    pub fn current_level(&self) -> Option<usize> {
        let clk = self.arm_clk.get()?;
        self.table.level_of(clk.get_rate() / 1000)
    }

    /// Request level `index` for the ARM clock.
    ///
    /// On success `policy.cur` holds the nominal frequency of the level, not
    /// the rate firmware actually applied.
    pub fn set_level(&self, policy: &mut Policy, index: usize) -> Result<(), ErrorCode> {
        let clk = self.arm_clk.get().ok_or(ErrorCode::OFF)?;
        let frequency = self.table.frequency(index).ok_or(ErrorCode::INVAL)?;
        let rate = frequency.checked_mul(1000).ok_or(ErrorCode::INVAL)?;

        clk.set_rate(rate)?;
        policy.cur = frequency;
        Ok(())
    }
}

impl Default for FirmwareCpufreq<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ask firmware for the minimum and maximum rate of the ARM clock, in Hz.
fn query_range(channel: &dyn PropertyChannel) -> Result<(u32, u32), ClockError> {
    let arm = ClockId::Arm.descriptor().firmware_id.raw();

    let min = ClockPacket::new(arm, 0)
        .exchange(channel, PropertyTag::GetMinClockRate)
        .map_err(ClockError::RangeQueryFailed)?
        .value;
    let max = ClockPacket::new(arm, 0)
        .exchange(channel, PropertyTag::GetMaxClockRate)
        .map_err(ClockError::RangeQueryFailed)?
        .value;

    if min > max {
        return Err(ClockError::RangeQueryFailed(ErrorCode::INVAL));
    }
    Ok((min, max))
}

impl CpufreqDriver for FirmwareCpufreq<'_> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn init(&self, policy: &mut Policy) -> Result<(), ErrorCode> {
        let table = self.table.entries().ok_or(ErrorCode::OFF)?;
        cpufreq::generic_init(policy, table, TRANSITION_LATENCY_NS)
    }

    fn verify(&self, policy: &mut Policy) -> Result<(), ErrorCode> {
        let table = self.table.entries().ok_or(ErrorCode::OFF)?;
        cpufreq::frequency_table_verify(policy, table)
    }

    fn target_index(&self, policy: &mut Policy, index: usize) -> Result<(), ErrorCode> {
        self.set_level(policy, index)
    }

    fn get(&self, _cpu: usize) -> u32 {
        self.current_level()
            .and_then(|level| self.table.frequency(level))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_is_high() {
        assert_eq!(classify(600_000, 1_200_000, 700_000), LEVEL_LOW);
        assert_eq!(classify(600_000, 1_200_000, 899_999), LEVEL_LOW);
        assert_eq!(classify(600_000, 1_200_000, 900_000), LEVEL_HIGH);
        assert_eq!(classify(600_000, 1_200_000, 1_000_000), LEVEL_HIGH);
    }

    #[test]
    fn classify_does_not_overflow() {
        assert_eq!(classify(u32::MAX - 1, u32::MAX, u32::MAX), LEVEL_HIGH);
        assert_eq!(classify(u32::MAX - 2, u32::MAX, u32::MAX - 2), LEVEL_LOW);
    }

    #[test]
    fn equal_levels_split_at_the_level() {
        assert_eq!(classify(700_000, 700_000, 0), LEVEL_LOW);
        assert_eq!(classify(700_000, 700_000, 700_000), LEVEL_HIGH);
    }

    #[test]
    fn table_is_empty_until_populated() {
        let table = FrequencyTable::new();
        assert!(!table.is_populated());
        assert_eq!(table.entries(), None);
        assert_eq!(table.frequency(LEVEL_LOW), None);
        assert_eq!(table.level_of(1), None);

        table.populate(600_000_000, 1_200_000_000);
        assert!(table.is_populated());
        assert_eq!(
            table.entries(),
            Some(
                &[
                    FrequencyEntry::new(600_000),
                    FrequencyEntry::new(1_200_000),
                    FrequencyEntry::END
                ][..]
            )
        );
        assert_eq!(table.frequency(LEVEL_HIGH), Some(1_200_000));
        assert_eq!(table.frequency(2), None);

        // Populated tables never change.
        table.populate(1, 2);
        assert_eq!(table.frequency(LEVEL_LOW), Some(600_000));
    }
}
