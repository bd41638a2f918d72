// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::{
    convert::TryFrom,
    ops::{Add, AddAssign, Sub},
    time::Duration,
};

/// A point on the platform's monotonic microsecond clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u64);

impl Time {
    pub const fn from_micros(micros: u64) -> Self {
        Time(micros)
    }

    pub fn into_micros(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` lies in the future.
    pub fn saturating_since(self, earlier: Time) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, d: Duration) -> Time {
        let micros = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
        Time(self.0.saturating_add(micros))
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, d: Duration) {
        *self = *self + d;
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, other: Time) -> Duration {
        self.saturating_since(other)
    }
}

/// IEEE Std 802.11-2016, 3.1: a time unit equals 1024 microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeUnit(pub u16);

impl TimeUnit {
    pub const DEFAULT_BEACON_INTERVAL: Self = Self(100);

    pub fn into_micros(self) -> u64 {
        self.0 as u64 * 1024
    }
}

impl From<TimeUnit> for Duration {
    fn from(tu: TimeUnit) -> Duration {
        Duration::from_micros(tu.into_micros())
    }
}
