// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::mac::MacAddr,
    byteorder::{BigEndian, ByteOrder},
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

// RFC 704, Appendix B.2
// https://www.iana.org/assignments/ieee-802-numbers/ieee-802-numbers.xhtml
pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_EAPOL: u16 = 0x888E;

/// EtherType values below this are IEEE 802.3 length fields rather than protocol ids.
pub const MIN_ETHER_TYPE: u16 = 0x0600;

pub const MAX_ETH_FRAME_LEN: usize = 2048;

// IEEE Std 802.3-2015, 3.1.1
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C, packed)]
pub struct EthernetIIHdr {
    pub da: MacAddr,
    pub sa: MacAddr,
    pub ether_type_be: [u8; 2], // In network byte order (big endian).
}

impl EthernetIIHdr {
    pub fn ether_type(&self) -> u16 {
        BigEndian::read_u16(&self.ether_type_be)
    }

    pub fn set_ether_type(&mut self, val: u16) {
        BigEndian::write_u16(&mut self.ether_type_be, val)
    }
}

#[derive(Debug)]
pub struct EthernetFrame<B: ByteSlice> {
    pub hdr: LayoutVerified<B, EthernetIIHdr>,
    pub body: B,
}

impl<B: ByteSlice> EthernetFrame<B> {
    /// Rejects frames too short for a header and 802.3 frames whose type field is a length.
    pub fn parse(bytes: B) -> Option<Self> {
        let (hdr, body) = LayoutVerified::<B, EthernetIIHdr>::new_unaligned_from_prefix(bytes)?;
        if hdr.ether_type() < MIN_ETHER_TYPE {
            return None;
        }
        Some(Self { hdr, body })
    }
}
