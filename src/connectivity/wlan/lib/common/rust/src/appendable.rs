// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::mem::size_of,
    zerocopy::{AsBytes, FromBytes, LayoutVerified, Unaligned},
};

#[derive(Debug, PartialEq, Eq)]
pub struct BufferTooSmall;

/// A sink frames are serialized into, either growable or of fixed capacity.
pub trait Appendable {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall>;

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall>;

    fn bytes_written(&self) -> usize;

    fn can_append(&self, bytes: usize) -> bool;

    fn append_value<T: AsBytes + ?Sized>(&mut self, value: &T) -> Result<(), BufferTooSmall> {
        self.append_bytes(value.as_bytes())
    }

    fn append_byte(&mut self, byte: u8) -> Result<(), BufferTooSmall> {
        self.append_bytes(&[byte])
    }

    fn append_value_zeroed<T: FromBytes + Unaligned>(
        &mut self,
    ) -> Result<LayoutVerified<&mut [u8], T>, BufferTooSmall> {
        let bytes = self.append_bytes_zeroed(size_of::<T>())?;
        LayoutVerified::new_unaligned(bytes).ok_or(BufferTooSmall)
    }
}

impl Appendable for Vec<u8> {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall> {
        let old_len = self.len();
        self.resize(old_len + len, 0);
        Ok(&mut self[old_len..])
    }

    fn bytes_written(&self) -> usize {
        self.len()
    }

    fn can_append(&self, _bytes: usize) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(FromBytes, AsBytes, Unaligned)]
    #[repr(C)]
    struct Foo {
        a: u8,
        b: [u8; 2],
    }

    #[test]
    fn vec_appends() {
        let mut buf = vec![];
        buf.append_byte(1).expect("append byte");
        buf.append_value(&Foo { a: 2, b: [3, 4] }).expect("append value");
        {
            let mut foo = buf.append_value_zeroed::<Foo>().expect("append zeroed");
            foo.a = 5;
        }
        buf.append_bytes(&[6, 7]).expect("append bytes");
        assert_eq!(buf.bytes_written(), 9);
        assert_eq!(&buf[..], &[1, 2, 3, 4, 5, 0, 0, 6, 7]);
    }
}
