// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Support for in-kernel debugging.
//!
//! The `debug!` macro formats a message and hands it to the registered
//! [`DebugWriter`]. Until a board installs a writer with
//! [`set_debug_writer()`] all output is silently dropped, so drivers can log
//! unconditionally.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! use kernel::debug;
//!
//! debug!("clock {} registered", name);
//! debug_verbose!("rate now {} Hz", rate);
//! ```
//!
//! Example output:
//!
//! ```text
//! clock arm registered
//! TOCK_DEBUG(3): chips/bcm2835/src/clocks.rs:140: rate now 600000000 Hz
//! ```

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Once;

/// Sink for formatted debug output.
///
/// Implementations must be safe to call from any thread; the kernel does not
/// serialize writers.
pub trait DebugWriter: Sync {
    /// Write a fragment of a debug message. A message may arrive as several
    /// fragments and always ends with `"\r\n"`.
    fn write_str(&self, s: &str);
}

static DEBUG_WRITER: Once<&'static dyn DebugWriter> = Once::new();

static DEBUG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Install the board's debug writer.
///
/// Only the first call has an effect. Returns `true` if `writer` was
/// installed.
pub fn set_debug_writer(writer: &'static dyn DebugWriter) -> bool {
    let mut installed = false;
    DEBUG_WRITER.call_once(|| {
        installed = true;
        writer
    });
    installed
}

struct DebugWriterWrapper {
    writer: &'static dyn DebugWriter,
}

impl Write for DebugWriterWrapper {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_str(s);
        Ok(())
    }
}

fn with_writer<F: FnOnce(&mut DebugWriterWrapper)>(f: F) {
    if let Some(writer) = DEBUG_WRITER.get() {
        f(&mut DebugWriterWrapper { writer: *writer });
    }
}

/// Write a debug message followed by a newline.
pub fn debug_println(args: fmt::Arguments) {
    with_writer(|writer| {
        let _ = writer.write_fmt(args);
        let _ = writer.write_str("\r\n");
    });
}

/// Write a debug message prefixed with a sequence number and the source
/// location it came from.
pub fn debug_verbose_println(args: fmt::Arguments, file_line: &(&'static str, u32)) {
    let count = DEBUG_COUNT.fetch_add(1, Ordering::Relaxed) + 1;
    let (file, line) = *file_line;
    with_writer(|writer| {
        let _ = writer.write_fmt(format_args!("TOCK_DEBUG({}): {}:{}: ", count, file, line));
        let _ = writer.write_fmt(args);
        let _ = writer.write_str("\r\n");
    });
}

/// In-kernel `println()` debugging.
#[macro_export]
macro_rules! debug {
    () => ({
        $crate::debug!("")
    });
    ($($arg:tt)+) => ({
        $crate::debug::debug_println(format_args!($($arg)+))
    });
}

/// In-kernel `println()` debugging that includes the source location.
#[macro_export]
macro_rules! debug_verbose {
    () => ({
        // Allow an empty debug_verbose!() to print the location when hit
        $crate::debug_verbose!("")
    });
    ($($arg:tt)+) => ({
        $crate::debug::debug_verbose_println(format_args!($($arg)+), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
}
