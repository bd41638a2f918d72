// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{client::QueueId, config::ConfigError},
    thiserror::Error,
    wlan_common::{
        appendable::BufferTooSmall,
        error::{FrameParseError, FrameWriteError},
    },
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("tx queue {0:?} is full")]
    QueueFull(QueueId),
    #[error("station is not associated")]
    NotAssociated,
    #[error("busy: {0}")]
    Busy(&'static str),
    #[error("invalid station config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("{0}")]
    ParsingFrame(#[from] FrameParseError),
    #[error("error writing frame: {0}")]
    WritingFrame(#[from] FrameWriteError),
    #[error("device error: {0}")]
    Device(String),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BufferTooSmall> for Error {
    fn from(e: BufferTooSmall) -> Self {
        Error::WritingFrame(e.into())
    }
}
