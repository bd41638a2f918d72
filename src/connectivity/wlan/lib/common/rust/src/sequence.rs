// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::mac::MacAddr, std::collections::HashMap};

// IEEE Std 802.11-2016, 9.2.4.4.2
const SEQ_NUM_SPACE: u32 = 1 << 12;

/// Hands out 802.11 sequence numbers, one modulo-4096 counter per receiver address.
/// The first number handed out for an address is 1.
#[derive(Debug, Default)]
pub struct SequenceManager {
    sns1: HashMap<MacAddr, u32>,
}

impl SequenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number space shared by management and non-QoS data frames.
    pub fn next_sns1(&mut self, addr: &MacAddr) -> u32 {
        let seq = self.sns1.entry(*addr).or_insert(0);
        *seq = (*seq + 1) % SEQ_NUM_SPACE;
        *seq
    }
}
