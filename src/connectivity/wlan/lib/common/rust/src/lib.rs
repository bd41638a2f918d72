// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Crate wlan-common hosts the IEEE 802.11 framing layer shared by the station MAC: header
//! layouts, information elements, frame writers, sequence numbers and the monotonic time
//! types the MAC core schedules against.

pub mod appendable;
pub mod buffer_reader;
pub mod buffer_writer;
pub mod channel;
pub mod data_writer;
pub mod error;
pub mod ie;
pub mod mac;
pub mod mgmt_writer;
pub mod sequence;
pub mod time;

pub use time::{Time, TimeUnit};

/// Asserts that `$test` matches the given pattern and evaluates to the expression following
/// `=>`, if any. Panics with the matched value otherwise.
#[macro_export]
macro_rules! assert_variant {
    // Use custom formatting when panicking.
    ($test:expr, $variant:pat $( | $others:pat)* => $e:expr, $fmt:expr $(, $args:tt)* $(,)?) => {
        match $test {
            $variant $(| $others)* => $e,
            _ => panic!($fmt, $($args,)*),
        }
    };
    // Use default message when panicking.
    ($test:expr, $variant:pat $( | $others:pat)* => $e:expr $(,)?) => {
        match $test {
            $variant $(| $others)* => $e,
            other => panic!("unexpected variant: {:?}", other),
        }
    };
    // Custom error message.
    ($test:expr, $variant:pat $( | $others:pat)* , $fmt:expr $(, $args:tt)* $(,)?) => {
        $crate::assert_variant!($test, $variant $( | $others)* => {}, $fmt $(, $args)*)
    };
    // Default error message.
    ($test:expr, $variant:pat $( | $others:pat)* $(,)?) => {
        $crate::assert_variant!($test, $variant $( | $others)* => {})
    };
}
