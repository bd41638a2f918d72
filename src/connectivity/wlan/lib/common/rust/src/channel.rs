// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::fmt;

// IEEE Std 802.11-2016, Annex E
const VALID_5GHZ_CHANNELS: &[u8] = &[
    36, 40, 44, 48, 52, 56, 60, 64, 100, 104, 108, 112, 116, 120, 124, 128, 132, 136, 140, 144,
    149, 153, 157, 161, 165,
];

/// A 20 MHz primary channel the radio can be tuned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel {
    pub primary: u8,
}

impl Channel {
    pub fn new(primary: u8) -> Self {
        Channel { primary }
    }

    pub fn is_2ghz(&self) -> bool {
        self.primary >= 1 && self.primary <= 14
    }

    pub fn is_5ghz(&self) -> bool {
        VALID_5GHZ_CHANNELS.contains(&self.primary)
    }

    pub fn is_valid(&self) -> bool {
        self.is_2ghz() || self.is_5ghz()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)
    }
}

impl From<u8> for Channel {
    fn from(primary: u8) -> Self {
        Channel { primary }
    }
}
