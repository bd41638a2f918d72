// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::buffer_reader::BufferReader,
    bitflags::bitflags,
    byteorder::{ByteOrder, LittleEndian},
    zerocopy::{ByteSlice, LayoutVerified},
};

mod data;
mod eth;
mod fields;
mod mgmt;

pub use {data::*, eth::*, fields::*, mgmt::*};

pub type MacAddr = [u8; 6];
pub type Bssid = MacAddr;

pub const BCAST_ADDR: MacAddr = [0xFF; 6];
pub const NULL_ADDR: MacAddr = [0x00; 6];

/// Group addresses have the I/G bit, the least significant bit of the first octet, set.
pub fn is_multicast(addr: &MacAddr) -> bool {
    addr[0] & 0x01 != 0
}

pub fn is_null(addr: &MacAddr) -> bool {
    *addr == NULL_ADDR
}

/// Formats an address the way it is commonly written, e.g. `01:02:03:0a:0b:0c`.
pub fn format_addr(addr: &MacAddr) -> String {
    addr.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(":")
}

// IEEE Std 802.11-2016, 9.2.4.1.3
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameType(pub u16);

impl FrameType {
    pub const MGMT: Self = Self(0);
    pub const CTRL: Self = Self(1);
    pub const DATA: Self = Self(2);
    pub const EXT: Self = Self(3);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MgmtSubtype(pub u16);

impl MgmtSubtype {
    pub const ASSOC_REQ: Self = Self(0b0000);
    pub const ASSOC_RESP: Self = Self(0b0001);
    pub const REASSOC_REQ: Self = Self(0b0010);
    pub const REASSOC_RESP: Self = Self(0b0011);
    pub const PROBE_REQ: Self = Self(0b0100);
    pub const PROBE_RESP: Self = Self(0b0101);
    pub const BEACON: Self = Self(0b1000);
    pub const ATIM: Self = Self(0b1001);
    pub const DISASSOC: Self = Self(0b1010);
    pub const AUTH: Self = Self(0b1011);
    pub const DEAUTH: Self = Self(0b1100);
    pub const ACTION: Self = Self(0b1101);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataSubtype(pub u16);

impl DataSubtype {
    pub const DATA: Self = Self(0b0000);
    pub const NULL: Self = Self(0b0100);
    pub const QOS_DATA: Self = Self(0b1000);
    pub const QOS_NULL: Self = Self(0b1100);

    // IEEE Std 802.11-2016, 9.2.4.1.3, Table 9-1
    const BITMASK_NULL: u16 = 1 << 2;
    const BITMASK_QOS: u16 = 1 << 3;

    pub fn null(&self) -> bool {
        self.0 & Self::BITMASK_NULL != 0
    }

    pub fn qos(&self) -> bool {
        self.0 & Self::BITMASK_QOS != 0
    }
}

macro_rules! flag_bits {
    ($ty:ident { $( $get:ident, $set:ident, $with:ident: $bit:literal; )* }) => {
        impl $ty {
            $(
                pub fn $get(&self) -> bool {
                    self.0 & (1 << $bit) != 0
                }

                pub fn $set(&mut self, value: bool) {
                    if value {
                        self.0 |= 1 << $bit;
                    } else {
                        self.0 &= !(1 << $bit);
                    }
                }

                pub fn $with(mut self, value: bool) -> Self {
                    self.$set(value);
                    self
                }
            )*
        }
    };
}

// IEEE Std 802.11-2016, 9.2.4.1.1
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameControl(pub u16);

impl FrameControl {
    const TYPE_SHIFT: u16 = 2;
    const TYPE_MASK: u16 = 0b11 << Self::TYPE_SHIFT;
    const SUBTYPE_SHIFT: u16 = 4;
    const SUBTYPE_MASK: u16 = 0b1111 << Self::SUBTYPE_SHIFT;

    pub fn from_le_bytes(raw: [u8; 2]) -> Self {
        FrameControl(LittleEndian::read_u16(&raw[..]))
    }

    pub fn to_le_bytes(&self) -> [u8; 2] {
        let mut raw = [0u8; 2];
        LittleEndian::write_u16(&mut raw[..], self.0);
        raw
    }

    pub fn protocol_version(&self) -> u16 {
        self.0 & 0b11
    }

    pub fn frame_type(&self) -> FrameType {
        FrameType((self.0 & Self::TYPE_MASK) >> Self::TYPE_SHIFT)
    }

    pub fn with_frame_type(mut self, frame_type: FrameType) -> Self {
        self.0 = (self.0 & !Self::TYPE_MASK)
            | ((frame_type.0 << Self::TYPE_SHIFT) & Self::TYPE_MASK);
        self
    }

    pub fn frame_subtype(&self) -> u16 {
        (self.0 & Self::SUBTYPE_MASK) >> Self::SUBTYPE_SHIFT
    }

    fn with_frame_subtype(mut self, subtype: u16) -> Self {
        self.0 = (self.0 & !Self::SUBTYPE_MASK)
            | ((subtype << Self::SUBTYPE_SHIFT) & Self::SUBTYPE_MASK);
        self
    }

    pub fn mgmt_subtype(&self) -> MgmtSubtype {
        MgmtSubtype(self.frame_subtype())
    }

    pub fn with_mgmt_subtype(self, subtype: MgmtSubtype) -> Self {
        self.with_frame_subtype(subtype.0)
    }

    pub fn data_subtype(&self) -> DataSubtype {
        DataSubtype(self.frame_subtype())
    }

    pub fn with_data_subtype(self, subtype: DataSubtype) -> Self {
        self.with_frame_subtype(subtype.0)
    }
}

flag_bits!(FrameControl {
    to_ds, set_to_ds, with_to_ds: 8;
    from_ds, set_from_ds, with_from_ds: 9;
    more_fragments, set_more_fragments, with_more_fragments: 10;
    retry, set_retry, with_retry: 11;
    power_mgmt, set_power_mgmt, with_power_mgmt: 12;
    more_data, set_more_data, with_more_data: 13;
    protected, set_protected, with_protected: 14;
    htc_order, set_htc_order, with_htc_order: 15;
});

// IEEE Std 802.11-2016, 9.2.4.4
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceControl(pub u16);

impl SequenceControl {
    pub fn frag_num(&self) -> u16 {
        self.0 & 0x000F
    }

    pub fn seq_num(&self) -> u16 {
        self.0 >> 4
    }

    pub fn with_seq_num(self, seq_num: u16) -> Self {
        SequenceControl((self.0 & 0x000F) | (seq_num << 4))
    }

    pub fn with_frag_num(self, frag_num: u16) -> Self {
        SequenceControl((self.0 & 0xFFF0) | (frag_num & 0x000F))
    }
}

bitflags! {
    /// IEEE Std 802.11-2016, 9.4.1.4
    #[derive(Default)]
    pub struct CapabilityInfo: u16 {
        const ESS = 1 << 0;
        const IBSS = 1 << 1;
        const CF_POLLABLE = 1 << 2;
        const CF_POLL_REQ = 1 << 3;
        const PRIVACY = 1 << 4;
        const SHORT_PREAMBLE = 1 << 5;
        const SPECTRUM_MGMT = 1 << 8;
        const QOS = 1 << 9;
        const SHORT_SLOT_TIME = 1 << 10;
        const APSD = 1 << 11;
        const RADIO_MEASUREMENT = 1 << 12;
        const DELAYED_BLOCK_ACK = 1 << 14;
        const IMMEDIATE_BLOCK_ACK = 1 << 15;
    }
}

// IEEE Std 802.11-2016, 9.2.4.6
const HT_CONTROL_LEN: usize = 4;
// IEEE Std 802.11-2016, 9.2.4.5
const QOS_CONTROL_LEN: usize = 2;

#[derive(Debug)]
pub enum MacFrame<B: ByteSlice> {
    Mgmt {
        mgmt_hdr: LayoutVerified<B, MgmtHdr>,
        body: B,
    },
    Data {
        data_hdr: LayoutVerified<B, DataHdr>,
        addr4: Option<MacAddr>,
        qos_ctrl: Option<u16>,
        body: B,
    },
    /// Control and extension frames; the station core has no use for them.
    Unsupported {
        frame_ctrl: FrameControl,
    },
}

impl<B: ByteSlice> MacFrame<B> {
    /// Parses the MAC header and splits off the frame body. The FCS is expected to be stripped
    /// by the radio. Returns None if the frame is too short for its advertised header.
    pub fn parse(bytes: B) -> Option<MacFrame<B>> {
        let mut reader = BufferReader::new(bytes);
        let fc = FrameControl::from_le_bytes(*reader.peek::<[u8; 2]>()?);
        match fc.frame_type() {
            FrameType::MGMT => {
                let mgmt_hdr = reader.read::<MgmtHdr>()?;
                if fc.htc_order() {
                    reader.skip(HT_CONTROL_LEN)?;
                }
                Some(MacFrame::Mgmt { mgmt_hdr, body: reader.into_remaining() })
            }
            FrameType::DATA => {
                let data_hdr = reader.read::<DataHdr>()?;
                let addr4 = if fc.to_ds() && fc.from_ds() {
                    Some(*reader.read::<MacAddr>()?)
                } else {
                    None
                };
                let qos_ctrl = if fc.data_subtype().qos() {
                    Some(LittleEndian::read_u16(&reader.read_bytes(QOS_CONTROL_LEN)?[..]))
                } else {
                    None
                };
                if fc.htc_order() {
                    reader.skip(HT_CONTROL_LEN)?;
                }
                Some(MacFrame::Data { data_hdr, addr4, qos_ctrl, body: reader.into_remaining() })
            }
            _ => Some(MacFrame::Unsupported { frame_ctrl: fc }),
        }
    }
}
