// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::appendable::BufferTooSmall, thiserror::Error};

#[derive(Error, Debug, PartialEq, Eq)]
#[error("error parsing frame: {0}")]
pub struct FrameParseError(pub String);

impl FrameParseError {
    pub fn new(debug_message: impl Into<String>) -> Self {
        FrameParseError(debug_message.into())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameWriteError {
    #[error("buffer is too small")]
    BufferTooSmall,
    #[error("attempted to write an invalid frame: {0}")]
    InvalidData(String),
}

impl FrameWriteError {
    pub fn new_invalid_data(debug_message: impl Into<String>) -> Self {
        FrameWriteError::InvalidData(debug_message.into())
    }
}

impl From<BufferTooSmall> for FrameWriteError {
    fn from(_: BufferTooSmall) -> Self {
        FrameWriteError::BufferTooSmall
    }
}
