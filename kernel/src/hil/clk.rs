// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interfaces between clock drivers and the generic clock framework.
//!
//! The clock framework owns the bookkeeping for every clock in the system.
//! Drivers plug into it at three points:
//!
//! - A driver implements [`ClockOps`] for each clock it controls. The
//!   framework calls these operations on behalf of consumers.
//! - A driver hands each clock to a [`ClockRegistrar`] exactly once, and
//!   receives an opaque [`ClockHandle`] in return.
//! - A driver that builds its clocks lazily implements [`ClockProvider`], so
//!   the framework can turn a consumer's [`ClockSpec`] into a [`Clk`].
//!
//! Consumers only ever see [`Clk`], which routes the standard
//! get/set/prepare calls to the driver's operations.

use core::fmt;

use crate::ErrorCode;

/// Framework flags attached to a clock at registration time.
///
/// The flags are advisory; they change how the framework treats the clock,
/// not how the driver talks to hardware.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ClockFlags(u32);

impl ClockFlags {
    /// No flags.
    pub const NONE: ClockFlags = ClockFlags(0);
    /// Do not gate the clock even if it appears unused at the end of boot.
    pub const IGNORE_UNUSED: ClockFlags = ClockFlags(1 << 3);
    /// The clock has no parent.
    pub const IS_ROOT: ClockFlags = ClockFlags(1 << 4);

    pub const fn from_bits(bits: u32) -> ClockFlags {
        ClockFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// The flags set in either `self` or `other`.
    pub const fn union(self, other: ClockFlags) -> ClockFlags {
        ClockFlags(self.0 | other.0)
    }

    /// Whether every flag in `other` is also set in `self`.
    pub const fn contains(self, other: ClockFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Debug for ClockFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut list = f.debug_set();
        if self.contains(ClockFlags::IS_ROOT) {
            list.entry(&"IS_ROOT");
        }
        if self.contains(ClockFlags::IGNORE_UNUSED) {
            list.entry(&"IGNORE_UNUSED");
        }
        list.finish()
    }
}

/// Operations the framework performs on a single clock.
///
/// Rates are in Hz. Drivers of root clocks ignore `parent_rate`.
pub trait ClockOps: Sync {
    /// Whether the clock is currently prepared (running).
    ///
    /// This is a diagnostic read: implementations that cannot determine the
    /// state report `false` rather than failing.
    fn is_prepared(&self) -> bool;

    /// Prepare (start) the clock.
    fn prepare(&self) -> Result<(), ErrorCode>;

    /// Unprepare (stop) the clock. This cannot fail: it is called on
    /// teardown paths that have no way to recover.
    fn unprepare(&self);

    /// Current rate of the clock. Returns 0 if the rate is unknown.
    fn recalc_rate(&self, parent_rate: u32) -> u32;

    /// Request a new rate. The hardware may apply a different rate; the
    /// framework learns the applied rate through
    /// [`recalc_rate`](ClockOps::recalc_rate).
    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode>;

    /// The rate the clock would run at if `rate` were requested.
    fn round_rate(&self, rate: u32, parent_rate: &mut u32) -> u32;
}

/// Opaque identifier the framework assigns to a registered clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockHandle(usize);

impl ClockHandle {
    pub const fn new(id: usize) -> ClockHandle {
        ClockHandle(id)
    }

    pub const fn id(&self) -> usize {
        self.0
    }
}

/// Description of a clock handed to the framework at registration.
#[derive(Clone, Copy)]
pub struct ClockInitData<'a> {
    pub name: &'static str,
    pub flags: ClockFlags,
    pub ops: &'a dyn ClockOps,
}

/// The registration half of the clock framework.
pub trait ClockRegistrar: Sync {
    /// Register a clock owned by `device`.
    ///
    /// The framework may call into `init.ops` while registering.
    ///
    /// ### Return Values
    ///
    /// - `Ok(ClockHandle)`: the clock is now known to the framework.
    /// - `Err(ErrorCode)`: registration failed and the framework kept no
    ///   record of the clock; the driver may retry later.
    fn register(
        &self,
        device: &'static str,
        init: &ClockInitData,
    ) -> Result<ClockHandle, ErrorCode>;
}

/// A consumer's reference to a clock within a provider.
///
/// The arguments are provider-specific; single-table providers expect one
/// argument holding the table index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockSpec<'s> {
    args: &'s [u32],
}

impl<'s> ClockSpec<'s> {
    pub const fn new(args: &'s [u32]) -> ClockSpec<'s> {
        ClockSpec { args }
    }

    pub fn args(&self) -> &'s [u32] {
        self.args
    }
}

/// A registered clock as seen by its consumers.
#[derive(Clone, Copy)]
pub struct Clk<'a> {
    handle: ClockHandle,
    name: &'static str,
    ops: &'a dyn ClockOps,
}

impl<'a> Clk<'a> {
    pub fn new(handle: ClockHandle, name: &'static str, ops: &'a dyn ClockOps) -> Clk<'a> {
        Clk { handle, name, ops }
    }

    pub fn handle(&self) -> ClockHandle {
        self.handle
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn prepare(&self) -> Result<(), ErrorCode> {
        self.ops.prepare()
    }

    pub fn unprepare(&self) {
        self.ops.unprepare()
    }

    pub fn is_prepared(&self) -> bool {
        self.ops.is_prepared()
    }

    /// Current rate in Hz, 0 if unknown.
    pub fn get_rate(&self) -> u32 {
        self.ops.recalc_rate(0)
    }

    /// Round `rate` with the driver and request the result.
    pub fn set_rate(&self, rate: u32) -> Result<(), ErrorCode> {
        let mut parent_rate = 0;
        let rounded = self.ops.round_rate(rate, &mut parent_rate);
        self.ops.set_rate(rounded, parent_rate)
    }
}

impl fmt::Debug for Clk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Clk")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}

/// A driver that hands out its clocks on demand.
pub trait ClockProvider {
    /// Resolve a consumer's clock specifier.
    ///
    /// ### Return Values
    ///
    /// - `Ok(Clk)`: the clock, registered with the framework.
    /// - `Err(ErrorCode)`:
    ///   - `INVAL`: the specifier does not name a clock of this provider.
    ///   - `NODEVICE`: a dependency of the provider is missing.
    ///   - `BUSY`: a dependency is not ready yet; retry the lookup later.
    ///   - Any error reported by the registrar.
    fn get_clock(&self, spec: &ClockSpec) -> Result<Clk<'_>, ErrorCode>;

    /// Find an already-registered clock by name.
    fn lookup(&self, name: &str) -> Option<Clk<'_>>;
}
