// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Clock provider for the firmware clocks.
//!
//! Clocks are not registered with the framework up front. The first time a
//! consumer asks for a clock, [`FirmwareClocks::resolve`] binds it to the
//! firmware channel and registers it. Because the firmware driver may still be
//! probing at that point, resolution can fail with
//! [`ClockError::DeferredRetry`]; the consumer retries later and nothing has
//! changed in between.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let clocks = FirmwareClocks::new(&CLK_DEVICE, &CLK_FRAMEWORK);
//!
//! let uart_clk = clocks.get_clock(&ClockSpec::new(&[1]))?;
//! uart_clk.prepare()?;
//! ```

use kernel::debug;
use kernel::hil::clk::{Clk, ClockInitData, ClockProvider, ClockRegistrar, ClockSpec};
use kernel::hil::firmware::FirmwareDevice;
use kernel::utilities::sync::Mutex;
use kernel::ErrorCode;

use crate::clocks::{ClockId, FirmwareClock, DESCRIPTORS, NUM_CLOCKS};
use crate::ClockError;

/// The firmware clocks of one device, registered on first use.
pub struct FirmwareClocks<'a> {
    device: &'a dyn FirmwareDevice,
    registrar: &'a dyn ClockRegistrar,
    clocks: [FirmwareClock<'a>; NUM_CLOCKS],
    /// Serializes binding and registration. Reads of registered clocks do
    /// not take it.
    registration_lock: Mutex<()>,
}

impl<'a> FirmwareClocks<'a> {
    /// `device` is the device the provider is installed for; clocks resolved
    /// through [`ClockProvider::get_clock`] are bound to it.
    pub fn new(
        device: &'a dyn FirmwareDevice,
        registrar: &'a dyn ClockRegistrar,
    ) -> FirmwareClocks<'a> {
        FirmwareClocks {
            device,
            registrar,
            clocks: core::array::from_fn(|index| FirmwareClock::new(&DESCRIPTORS[index])),
            registration_lock: Mutex::new(()),
        }
    }

    pub fn clock(&self, id: ClockId) -> &FirmwareClock<'a> {
        &self.clocks[id.index()]
    }

    /// Turn a clock index into its clock object, registering the clock with
    /// the framework if this is the first successful request for it.
    ///
    /// ### Return Values
    ///
    /// - `Ok(&FirmwareClock)`: the clock, registered. Every caller asking for
    ///   the same index gets the same object.
    /// - `Err(ClockError)`:
    ///   - `InvalidSpecifier`: `index` is outside the clock table.
    ///   - `MissingDependency`: `device` does not reference a firmware node.
    ///   - `DeferredRetry`: the firmware driver has not probed yet.
    ///   - `RegistrationFailed`: the registrar refused the clock. The clock
    ///     stays unregistered; a later call tries again, binding the clock to
    ///     the device of that call.
    pub fn resolve(
        &self,
        index: u32,
        device: &'a dyn FirmwareDevice,
    ) -> Result<&FirmwareClock<'a>, ClockError> {
        let id = match ClockId::from_index(index) {
            Some(id) => id,
            None => {
                debug!("{}: invalid clock index {}", device.name(), index);
                return Err(ClockError::InvalidSpecifier);
            }
        };
        let clock = &self.clocks[id.index()];

        if clock.is_registered() {
            return Ok(clock);
        }

        let firmware = match device.firmware() {
            Some(firmware) => firmware,
            None => {
                debug!("{}: {}: no firmware node", device.name(), clock.name());
                return Err(ClockError::MissingDependency);
            }
        };
        if !firmware.is_probed() {
            debug!(
                "{}: {}: firmware not probed, deferring",
                device.name(),
                clock.name()
            );
            return Err(ClockError::DeferredRetry);
        }

        let _guard = self.registration_lock.lock();
        // Another caller may have registered the clock while we waited.
        if clock.is_registered() {
            return Ok(clock);
        }

        // Rebinds on every attempt until registration succeeds.
        clock.bind(device, firmware.channel());

        let descriptor = clock.descriptor();
        let init = ClockInitData {
            name: descriptor.name,
            flags: descriptor.flags,
            ops: clock,
        };
        match self.registrar.register(device.name(), &init) {
            Ok(handle) => {
                clock.set_registered(handle);
                debug!("{}: clock {} registered", device.name(), clock.name());
                Ok(clock)
            }
            Err(e) => {
                debug!(
                    "{}: failed to register clock {}: {:?}",
                    device.name(),
                    clock.name(),
                    e
                );
                Err(ClockError::RegistrationFailed(e))
            }
        }
    }
}

fn registered_clk<'c>(clock: &'c FirmwareClock<'_>) -> Option<Clk<'c>> {
    clock
        .handle()
        .map(|handle| Clk::new(handle, clock.name(), clock))
}

impl ClockProvider for FirmwareClocks<'_> {
    fn get_clock(&self, spec: &ClockSpec) -> Result<Clk<'_>, ErrorCode> {
        let index = match spec.args() {
            [index] => *index,
            args => {
                debug!(
                    "{}: expected one clock argument, got {}",
                    self.device.name(),
                    args.len()
                );
                return Err(ClockError::InvalidSpecifier.into());
            }
        };

        let clock = self.resolve(index, self.device)?;
        registered_clk(clock).ok_or(ErrorCode::FAIL)
    }

    fn lookup(&self, name: &str) -> Option<Clk<'_>> {
        ClockId::from_name(name).and_then(|id| registered_clk(self.clock(id)))
    }
}
