// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Interfaces for talking to a firmware service over a property channel.
//!
//! Some SoCs keep peripherals such as the clock generator behind a
//! co-processor that runs its own firmware. The application processor has no
//! register access to those blocks; instead it sends tagged property requests
//! through a mailbox and reads the firmware's reply out of the same buffer.
//!
//! ```text
//! +-----------------------+
//! |  Clock / cpufreq      |
//! |  driver               |
//! +-----------------------+
//!
//!    hil::firmware::PropertyChannel (this file)
//!
//! +-----------------------+
//! |  Mailbox transport    |
//! +-----------------------+
//! ```
//!
//! Drivers locate the channel through the device they were instantiated for:
//! a [`FirmwareDevice`] declares a link to a [`FirmwareNode`], and the node
//! reports whether the firmware driver behind it has finished probing.

use crate::ErrorCode;

/// Synchronous firmware property exchange.
pub trait PropertyChannel: Sync {
    /// Send the property request identified by `tag`.
    ///
    /// On entry `buffer` holds the request words. On successful return it
    /// holds the firmware's response words, which overwrite the request in
    /// place. The call blocks until firmware answers or the transport gives
    /// up.
    ///
    /// ### Return Values
    ///
    /// - `Ok(())`: firmware answered; `buffer` holds the response.
    /// - `Err(ErrorCode)`: the exchange failed and the contents of `buffer`
    ///   are unspecified. Valid `ErrorCode`s depend on the transport, commonly:
    ///   - `SIZE`: `buffer` does not match the size firmware expects for `tag`.
    ///   - `NOACK`: firmware did not acknowledge the request.
    ///   - `FAIL`: the transport failed for another reason.
    fn property(&self, tag: u32, buffer: &mut [u32]) -> Result<(), ErrorCode>;
}

/// A firmware endpoint that other devices may reference.
pub trait FirmwareNode: Sync {
    /// Name of the firmware device, for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether the firmware driver behind this node has completed its own
    /// initialization. Property requests must not be issued before this
    /// returns `true`.
    fn is_probed(&self) -> bool;

    /// The property channel served by this node.
    fn channel(&self) -> &dyn PropertyChannel;
}

/// A device that may declare a link to a firmware node.
pub trait FirmwareDevice: Sync {
    /// Name of the device, for diagnostics.
    fn name(&self) -> &'static str;

    /// The firmware node this device references, if its description
    /// declares one.
    fn firmware(&self) -> Option<&dyn FirmwareNode>;
}
