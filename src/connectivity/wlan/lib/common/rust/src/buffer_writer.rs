// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::appendable::{Appendable, BufferTooSmall};

/// Fixed-capacity `Appendable` over a caller-provided buffer.
pub struct BufferWriter<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> BufferWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }

    pub fn into_written(self) -> &'a mut [u8] {
        let Self { buf, written } = self;
        &mut buf[..written]
    }
}

impl<'a> Appendable for BufferWriter<'a> {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall> {
        self.append_bytes_zeroed(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall> {
        if !self.can_append(len) {
            return Err(BufferTooSmall);
        }
        let start = self.written;
        self.written += len;
        let slice = &mut self.buf[start..self.written];
        for b in slice.iter_mut() {
            *b = 0;
        }
        Ok(slice)
    }

    fn bytes_written(&self) -> usize {
        self.written
    }

    fn can_append(&self, bytes: usize) -> bool {
        self.remaining() >= bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_up_and_rejects_overflow() {
        let mut buf = [7u8; 4];
        let mut w = BufferWriter::new(&mut buf[..]);
        w.append_bytes(&[1, 2]).expect("fits");
        assert_eq!(w.append_bytes(&[3, 4, 5]), Err(BufferTooSmall));
        w.append_bytes_zeroed(1).expect("fits");
        assert_eq!(w.remaining(), 1);
        assert_eq!(w.into_written(), &[1, 2, 0]);
    }
}
