// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Utility re-exports provided by the kernel crate.

/// The Tock Register Interface.
///
/// This is a re-export of the `tock-registers` crate provided for
/// convenience. Drivers use it to decode words returned by firmware with the
/// same bitfield definitions they would use for memory-mapped registers.
pub mod registers {
    pub use tock_registers::{register_bitfields, LocalRegisterCopy};
}

/// Synchronization primitives usable without `std`.
///
/// This is a re-export of the `spin` crate provided for convenience.
///
/// To use `Once`, for example, users should use:
///
///     use kernel::utilities::sync::Once;
pub mod sync {
    pub use spin::{Mutex, Once};
}
