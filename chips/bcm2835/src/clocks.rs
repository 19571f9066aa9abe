// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Firmware clock table and per-clock operations.
//!
//! Two numbering spaces meet here. [`ClockId`] is the index consumers use to
//! name a clock of this provider. [`FirmwareClockId`] is the id firmware
//! expects in property packets. They are separate types so one can never be
//! passed where the other is expected.
//!
//! A [`FirmwareClock`] does not cache anything: every query is a round trip
//! to firmware. Reads fail open (off / 0 Hz) because the framework has no way
//! to recover from a failed read, enabling and setting a rate fail closed,
//! and disabling never fails.

use core::fmt;

use kernel::config;
use kernel::debug;
use kernel::hil::clk::{ClockFlags, ClockHandle, ClockOps};
use kernel::hil::firmware::{FirmwareDevice, PropertyChannel};
use kernel::utilities::sync::{Mutex, Once};
use kernel::ErrorCode;

use crate::firmware::{ClockPacket, ClockState, PropertyTag};
use crate::ClockError;

/// Number of clocks in the table.
pub const NUM_CLOCKS: usize = 10;

/// Index of a clock within this provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ClockId {
    Emmc = 0,
    Uart0 = 1,
    Arm = 2,
    Core = 3,
    V3d = 4,
    H264 = 5,
    Isp = 6,
    Sdram = 7,
    Pixel = 8,
    Pwm = 9,
}

impl ClockId {
    pub const fn from_index(index: u32) -> Option<ClockId> {
        match index {
            0 => Some(ClockId::Emmc),
            1 => Some(ClockId::Uart0),
            2 => Some(ClockId::Arm),
            3 => Some(ClockId::Core),
            4 => Some(ClockId::V3d),
            5 => Some(ClockId::H264),
            6 => Some(ClockId::Isp),
            7 => Some(ClockId::Sdram),
            8 => Some(ClockId::Pixel),
            9 => Some(ClockId::Pwm),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<ClockId> {
        DESCRIPTORS
            .iter()
            .find(|descriptor| descriptor.name == name)
            .map(|descriptor| descriptor.id)
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn descriptor(self) -> &'static ClockDescriptor {
        &DESCRIPTORS[self.index()]
    }
}

/// Clock id as understood by firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FirmwareClockId(u32);

impl FirmwareClockId {
    pub const fn new(id: u32) -> FirmwareClockId {
        FirmwareClockId(id)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Static description of one firmware clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockDescriptor {
    pub id: ClockId,
    pub firmware_id: FirmwareClockId,
    pub name: &'static str,
    pub flags: ClockFlags,
}

impl ClockDescriptor {
    const fn new(
        id: ClockId,
        firmware_id: u32,
        name: &'static str,
        flags: ClockFlags,
    ) -> ClockDescriptor {
        ClockDescriptor {
            id,
            firmware_id: FirmwareClockId::new(firmware_id),
            name,
            flags,
        }
    }
}

const ROOT: ClockFlags = ClockFlags::IS_ROOT;
const ROOT_KEEP: ClockFlags = ClockFlags::IS_ROOT.union(ClockFlags::IGNORE_UNUSED);

const DESCRIPTOR_TABLE: [ClockDescriptor; NUM_CLOCKS] = [
    ClockDescriptor::new(ClockId::Emmc, 1, "emmc", ROOT_KEEP),
    ClockDescriptor::new(ClockId::Uart0, 2, "uart0", ROOT_KEEP),
    ClockDescriptor::new(ClockId::Arm, 3, "arm", ROOT_KEEP),
    ClockDescriptor::new(ClockId::Core, 4, "core", ROOT_KEEP),
    ClockDescriptor::new(ClockId::V3d, 5, "v3d", ROOT),
    ClockDescriptor::new(ClockId::H264, 6, "h264", ROOT),
    ClockDescriptor::new(ClockId::Isp, 7, "isp", ROOT),
    ClockDescriptor::new(ClockId::Sdram, 8, "sdram", ROOT_KEEP),
    ClockDescriptor::new(ClockId::Pixel, 9, "pixel", ROOT_KEEP),
    ClockDescriptor::new(ClockId::Pwm, 10, "pwm", ROOT),
];

/// Every table entry sits at its own index, and no two entries share a
/// firmware id.
const fn descriptors_are_consistent(table: &[ClockDescriptor; NUM_CLOCKS]) -> bool {
    let mut i = 0;
    while i < NUM_CLOCKS {
        if table[i].id as usize != i {
            return false;
        }
        let mut j = i + 1;
        while j < NUM_CLOCKS {
            if table[i].firmware_id.0 == table[j].firmware_id.0 {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    descriptors_are_consistent(&DESCRIPTOR_TABLE),
    "clock descriptor table is out of order or reuses a firmware id"
);

/// The firmware clocks, indexed by [`ClockId`].
pub static DESCRIPTORS: [ClockDescriptor; NUM_CLOCKS] = DESCRIPTOR_TABLE;

/// Where a clock is in its one-way lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationState {
    /// No device or firmware channel known yet.
    Unbound,
    /// Bound to a device and channel, not (yet) known to the framework.
    Bound,
    /// Registered with the framework. Final.
    Registered,
}

#[derive(Clone, Copy)]
struct Binding<'a> {
    device: &'a dyn FirmwareDevice,
    channel: &'a dyn PropertyChannel,
}

/// Runtime state and operations of one firmware clock.
///
/// Until the clock is registered its binding lives in `pending`, which the
/// provider replaces on every registration attempt. Registration moves it
/// into `binding`, after which it never changes and is read without locking.
pub struct FirmwareClock<'a> {
    descriptor: &'static ClockDescriptor,
    pending: Mutex<Option<Binding<'a>>>,
    binding: Once<Binding<'a>>,
    handle: Once<ClockHandle>,
}

impl<'a> FirmwareClock<'a> {
    pub const fn new(descriptor: &'static ClockDescriptor) -> FirmwareClock<'a> {
        FirmwareClock {
            descriptor,
            pending: Mutex::new(None),
            binding: Once::new(),
            handle: Once::new(),
        }
    }

    pub fn descriptor(&self) -> &'static ClockDescriptor {
        self.descriptor
    }

    pub fn id(&self) -> ClockId {
        self.descriptor.id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn state(&self) -> RegistrationState {
        if self.handle.is_completed() {
            RegistrationState::Registered
        } else if self.current_binding().is_some() {
            RegistrationState::Bound
        } else {
            RegistrationState::Unbound
        }
    }

    pub fn is_registered(&self) -> bool {
        self.handle.is_completed()
    }

    /// The handle the framework assigned, once registered.
    pub fn handle(&self) -> Option<ClockHandle> {
        self.handle.get().copied()
    }

    /// Attach the clock to a device and its firmware channel, replacing any
    /// earlier binding. Has no effect once the clock is registered.
    pub(crate) fn bind(&self, device: &'a dyn FirmwareDevice, channel: &'a dyn PropertyChannel) {
        if !self.binding.is_completed() {
            *self.pending.lock() = Some(Binding { device, channel });
        }
    }

    /// Freeze the current binding and record the framework's handle.
    pub(crate) fn set_registered(&self, handle: ClockHandle) {
        if let Some(binding) = *self.pending.lock() {
            self.binding.call_once(|| binding);
        }
        self.handle.call_once(|| handle);
    }

    fn current_binding(&self) -> Option<Binding<'a>> {
        match self.binding.get() {
            Some(binding) => Some(*binding),
            None => *self.pending.lock(),
        }
    }

    fn device_name(&self) -> &'static str {
        self.current_binding()
            .map_or("bcm2835-clk", |binding| binding.device.name())
    }

    fn request(&self, tag: PropertyTag, value: u32) -> Result<ClockPacket, ErrorCode> {
        let binding = match self.current_binding() {
            Some(binding) => binding,
            None => {
                debug!("{}: clock used before it was bound", self.name());
                return Err(ErrorCode::OFF);
            }
        };
        ClockPacket::new(self.descriptor.firmware_id.raw(), value)
            .exchange(binding.channel, tag)
    }

    /// Whether firmware reports the clock as running. Reports `false` if the
    /// state cannot be read.
    pub fn is_on(&self) -> bool {
        match self.request(PropertyTag::GetClockState, 0) {
            Ok(packet) => {
                let on = packet.value != 0;
                if config::CONFIG.debug_clock_ops {
                    debug!(
                        "{}: {}: {}",
                        self.device_name(),
                        self.name(),
                        if on { "on" } else { "off" }
                    );
                }
                on
            }
            Err(e) => {
                debug!(
                    "{}: {}: failed to get clock state: {:?}",
                    self.device_name(),
                    self.name(),
                    e
                );
                false
            }
        }
    }

    fn set_enable(&self, enable: bool) -> Result<(), ClockError> {
        if config::CONFIG.debug_clock_ops {
            debug!(
                "{}: setting {} {}",
                self.device_name(),
                self.name(),
                if enable { "on" } else { "off" }
            );
        }

        let result = self
            .request(PropertyTag::SetClockState, u32::from(enable))
            .and_then(|packet| {
                if packet.state().is_set(ClockState::ERROR) {
                    Err(ErrorCode::FAIL)
                } else {
                    Ok(())
                }
            });

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(
                    "{}: {}: failed to set clock state: {:?}",
                    self.device_name(),
                    self.name(),
                    e
                );
                Err(ClockError::Protocol(e))
            }
        }
    }

    /// Ask firmware to start the clock.
    pub fn turn_on(&self) -> Result<(), ClockError> {
        self.set_enable(true)?;
        // Read the state back for the diagnostic log; the request already
        // succeeded.
        let _ = self.is_on();
        Ok(())
    }

    /// Ask firmware to stop the clock. Failures are logged, never returned.
    pub fn turn_off(&self) {
        let _ = self.set_enable(false);
    }

    /// Rate firmware reports for the clock in Hz, or 0 if it cannot be read.
    pub fn get_rate(&self) -> u32 {
        match self.request(PropertyTag::GetClockRate, 0) {
            Ok(packet) => {
                if config::CONFIG.debug_clock_ops {
                    debug!("{}: {} rate: {}", self.device_name(), self.name(), packet.value);
                }
                packet.value
            }
            Err(e) => {
                debug!(
                    "{}: {}: failed to get clock rate: {:?}",
                    self.device_name(),
                    self.name(),
                    e
                );
                0
            }
        }
    }

    /// Request `rate` Hz.
    ///
    /// Firmware may apply a different rate than requested. The applied rate
    /// is not returned; call [`get_rate()`](FirmwareClock::get_rate) to learn
    /// it.
    pub fn set_rate(&self, rate: u32) -> Result<(), ClockError> {
        match self.request(PropertyTag::SetClockRate, rate) {
            Ok(packet) => {
                if packet.value != rate || config::CONFIG.debug_clock_ops {
                    debug!(
                        "{}: set {} clock rate to {} (requested {})",
                        self.device_name(),
                        self.name(),
                        packet.value,
                        rate
                    );
                }
                Ok(())
            }
            Err(e) => {
                debug!(
                    "{}: {}: failed to set clock rate: {:?}",
                    self.device_name(),
                    self.name(),
                    e
                );
                Err(ClockError::Protocol(e))
            }
        }
    }

    /// Firmware offers no way to ask which rate it would pick, so the
    /// requested rate is returned unchanged.
    pub fn round_rate(&self, rate: u32) -> u32 {
        rate
    }
}

impl ClockOps for FirmwareClock<'_> {
    fn is_prepared(&self) -> bool {
        self.is_on()
    }

    fn prepare(&self) -> Result<(), ErrorCode> {
        self.turn_on().map_err(ErrorCode::from)
    }

    fn unprepare(&self) {
        self.turn_off()
    }

    fn recalc_rate(&self, _parent_rate: u32) -> u32 {
        self.get_rate()
    }

    fn set_rate(&self, rate: u32, _parent_rate: u32) -> Result<(), ErrorCode> {
        FirmwareClock::set_rate(self, rate).map_err(ErrorCode::from)
    }

    fn round_rate(&self, rate: u32, _parent_rate: &mut u32) -> u32 {
        FirmwareClock::round_rate(self, rate)
    }
}

impl fmt::Debug for FirmwareClock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FirmwareClock")
            .field("name", &self.name())
            .field("firmware_id", &self.descriptor.firmware_id)
            .field("state", &self.state())
            .field("handle", &self.handle())
            .finish()
    }
}
