// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    byteorder::{BigEndian, ByteOrder},
    zerocopy::{AsBytes, ByteSlice, FromBytes, LayoutVerified, Unaligned},
};

// RFC 1042
pub const LLC_SNAP_EXTENSION: u8 = 0xAA;
pub const LLC_SNAP_UNNUMBERED_INFO: u8 = 0x03;
pub const LLC_SNAP_OUI: [u8; 3] = [0, 0, 0];

// IEEE Std 802.2-1998, 3.2
// IETF RFC 1042
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C, packed)]
pub struct LlcHdr {
    pub dsap: u8,
    pub ssap: u8,
    pub control: u8,
    pub oui: [u8; 3],
    pub protocol_id_be: [u8; 2], // In network byte order (big endian).
}

impl LlcHdr {
    pub fn new_snap(protocol_id: u16) -> Self {
        let mut hdr = LlcHdr {
            dsap: LLC_SNAP_EXTENSION,
            ssap: LLC_SNAP_EXTENSION,
            control: LLC_SNAP_UNNUMBERED_INFO,
            oui: LLC_SNAP_OUI,
            protocol_id_be: [0; 2],
        };
        hdr.set_protocol_id(protocol_id);
        hdr
    }

    pub fn protocol_id(&self) -> u16 {
        BigEndian::read_u16(&self.protocol_id_be)
    }

    pub fn set_protocol_id(&mut self, val: u16) {
        BigEndian::write_u16(&mut self.protocol_id_be, val);
    }
}

#[derive(Debug)]
pub struct LlcFrame<B: ByteSlice> {
    pub hdr: LayoutVerified<B, LlcHdr>,
    pub body: B,
}

impl<B: ByteSlice> LlcFrame<B> {
    /// Only SNAP encapsulated MSDUs carry an EtherType the bridge can deliver; anything else is
    /// rejected along with bodies too short for the header.
    pub fn parse(bytes: B) -> Option<Self> {
        let (hdr, body) = LayoutVerified::<B, LlcHdr>::new_unaligned_from_prefix(bytes)?;
        if hdr.dsap != LLC_SNAP_EXTENSION || hdr.ssap != LLC_SNAP_EXTENSION {
            return None;
        }
        Some(Self { hdr, body })
    }
}
