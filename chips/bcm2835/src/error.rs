// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

use kernel::ErrorCode;

/// Failures of the firmware clock driver.
///
/// Read-only operations never return these: a failed state read reports the
/// clock as off and a failed rate read reports 0 Hz. Disabling a clock never
/// fails. Everything else propagates one of these variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockError {
    /// The clock specifier does not name a clock in the table. Permanent.
    InvalidSpecifier,
    /// The device has no firmware node to talk to. Permanent.
    MissingDependency,
    /// A dependency has not finished probing yet. Retry later; repeated
    /// attempts do not change any state.
    DeferredRetry,
    /// The property exchange failed, or firmware flagged the request as
    /// failed.
    Protocol(ErrorCode),
    /// The framework refused to register the clock or driver. The clock
    /// stays unregistered and a later attempt may succeed.
    RegistrationFailed(ErrorCode),
    /// Firmware did not report a usable minimum/maximum rate.
    RangeQueryFailed(ErrorCode),
}

impl ClockError {
    /// Whether the operation may succeed if attempted again later.
    pub fn is_deferred(&self) -> bool {
        matches!(self, ClockError::DeferredRetry)
    }
}

impl From<ClockError> for ErrorCode {
    fn from(err: ClockError) -> ErrorCode {
        match err {
            ClockError::InvalidSpecifier => ErrorCode::INVAL,
            ClockError::MissingDependency => ErrorCode::NODEVICE,
            ClockError::DeferredRetry => ErrorCode::BUSY,
            ClockError::Protocol(e) => e,
            ClockError::RegistrationFailed(e) => e,
            ClockError::RangeQueryFailed(e) => e,
        }
    }
}
