// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {std::time::Duration, wlan_common::TimeUnit};

/// Counts the time the associated BSS has gone unheard. Time the radio spends off-channel
/// scanning is never added, since no beacon could have been received then.
#[derive(Debug)]
pub struct LostBssCounter {
    /// Silence after which the BSS is declared lost.
    full_timeout: Duration,

    /// Reset to zero as soon as a beacon arrives.
    time_since_last_beacon: Duration,
}

/// Ticks add the time elapsed since the previous tick. To avoid declaring the BSS lost on the
/// same tick a beacon could still have arrived in, call should_disassociate() before add_time().
impl LostBssCounter {
    pub fn start(beacon_period: TimeUnit, full_timeout_beacon_count: u32) -> Self {
        let beacon_period = Duration::from(beacon_period);
        Self {
            full_timeout: beacon_period * full_timeout_beacon_count,
            time_since_last_beacon: Duration::from_secs(0),
        }
    }

    pub fn reset(&mut self) {
        self.time_since_last_beacon = Duration::from_secs(0);
    }

    pub fn should_disassociate(&self) -> bool {
        self.time_since_last_beacon >= self.full_timeout
    }

    pub fn add_time(&mut self, time: Duration) {
        self.time_since_last_beacon += time;
    }

    pub fn time_since_last_beacon(&self) -> Duration {
        self.time_since_last_beacon
    }
}
