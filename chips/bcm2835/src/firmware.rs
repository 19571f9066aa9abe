// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Firmware property tags and the clock packet layout.
//!
//! Every clock request in this crate is a two-word packet: the firmware clock
//! id followed by a value. Firmware answers in the same two words, keeping
//! the id and replacing the value.

use kernel::config;
use kernel::debug;
use kernel::hil::firmware::PropertyChannel;
use kernel::utilities::registers::{register_bitfields, LocalRegisterCopy};
use kernel::ErrorCode;

/// Property tags of the firmware mailbox interface used for clocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum PropertyTag {
    GetClockState = 0x0003_0001,
    SetClockState = 0x0003_8001,
    GetClockRate = 0x0003_0002,
    SetClockRate = 0x0003_8002,
    GetMaxClockRate = 0x0003_0004,
    GetMinClockRate = 0x0003_0007,
}

impl PropertyTag {
    pub const fn value(self) -> u32 {
        self as u32
    }
}

register_bitfields![u32,
    /// Value word of a SET_CLOCK_STATE response
    pub ClockState [
        /// Clock is running
        ON OFFSET(0) NUMBITS(1) [],

        /// Firmware could not apply the request (for example, no such clock)
        ERROR OFFSET(1) NUMBITS(1) [],
    ]
];

/// Decoded value word of a SET_CLOCK_STATE response.
pub type ClockStateVal = LocalRegisterCopy<u32, ClockState::Register>;

/// Number of words in a clock property packet.
pub const CLOCK_PACKET_WORDS: usize = 2;

/// A clock property request or response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockPacket {
    /// Firmware clock id.
    pub id: u32,
    pub value: u32,
}

impl ClockPacket {
    pub const fn new(id: u32, value: u32) -> ClockPacket {
        ClockPacket { id, value }
    }

    pub const fn to_words(self) -> [u32; CLOCK_PACKET_WORDS] {
        [self.id, self.value]
    }

    pub const fn from_words(words: [u32; CLOCK_PACKET_WORDS]) -> ClockPacket {
        ClockPacket {
            id: words[0],
            value: words[1],
        }
    }

    /// The value word interpreted as a SET_CLOCK_STATE response.
    pub fn state(&self) -> ClockStateVal {
        LocalRegisterCopy::new(self.value)
    }

    /// Send this packet with `tag` and return firmware's response.
    pub fn exchange(
        self,
        channel: &dyn PropertyChannel,
        tag: PropertyTag,
    ) -> Result<ClockPacket, ErrorCode> {
        let mut words = self.to_words();
        let result = channel.property(tag.value(), &mut words);

        if config::CONFIG.trace_firmware_property {
            debug!(
                "[FW] {:?} {:#x} <- [{}, {}]: {:?} [{}, {}]",
                tag,
                tag.value(),
                self.id,
                self.value,
                result,
                words[0],
                words[1]
            );
        }

        result.map(|()| ClockPacket::from_words(words))
    }
}
