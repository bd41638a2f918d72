// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::mem::size_of,
    zerocopy::{ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

/// Cursor over a byte slice handing out zero-copy views of the bytes it consumes.
pub struct BufferReader<B> {
    buffer: Option<B>,
    bytes_read: usize,
}

impl<B: ByteSlice> BufferReader<B> {
    pub fn new(bytes: B) -> Self {
        BufferReader { buffer: Some(bytes), bytes_read: 0 }
    }

    pub fn peek<T: FromBytes + Unaligned>(&self) -> Option<LayoutVerified<&[u8], T>> {
        let bytes = self.buffer.as_ref()?;
        LayoutVerified::new_unaligned_from_prefix(&bytes[..]).map(|(view, _)| view)
    }

    pub fn read<T: FromBytes + Unaligned>(&mut self) -> Option<LayoutVerified<B, T>> {
        let bytes = self.read_bytes(size_of::<T>())?;
        LayoutVerified::new_unaligned(bytes)
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<B> {
        let remaining = self.buffer.take()?;
        if remaining.len() < len {
            self.buffer = Some(remaining);
            return None;
        }
        let (head, tail) = remaining.split_at(len);
        self.buffer = Some(tail);
        self.bytes_read += len;
        Some(head)
    }

    pub fn skip(&mut self, len: usize) -> Option<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn bytes_remaining(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.len())
    }

    pub fn into_remaining(self) -> B {
        // The buffer is only taken transiently inside `read_bytes()` and always put back.
        match self.buffer {
            Some(b) => b,
            None => unreachable!("buffer reader lost its buffer"),
        }
    }
}
