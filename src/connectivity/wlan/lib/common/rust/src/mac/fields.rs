// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        mac::{CapabilityInfo, FrameControl, MacAddr, ReasonCode, SequenceControl, StatusCode},
        TimeUnit,
    },
    byteorder::{ByteOrder, LittleEndian},
    zerocopy::{AsBytes, FromBytes, Unaligned},
};

// Multi-byte fields are kept as raw little-endian arrays so every header stays byte aligned
// and can be viewed in place over a received buffer.
macro_rules! le_u16_field {
    ($field:ident, $setter:ident) => {
        pub fn $field(&self) -> u16 {
            LittleEndian::read_u16(&self.$field)
        }

        pub fn $setter(&mut self, val: u16) {
            LittleEndian::write_u16(&mut self.$field, val)
        }
    };
}

macro_rules! common_hdr_fields {
    () => {
        pub fn frame_ctrl(&self) -> FrameControl {
            FrameControl::from_le_bytes(self.frame_ctrl)
        }

        pub fn set_frame_ctrl(&mut self, fc: FrameControl) {
            self.frame_ctrl = fc.to_le_bytes();
        }

        pub fn seq_ctrl(&self) -> SequenceControl {
            SequenceControl(LittleEndian::read_u16(&self.seq_ctrl))
        }

        pub fn set_seq_ctrl(&mut self, sc: SequenceControl) {
            LittleEndian::write_u16(&mut self.seq_ctrl, sc.0)
        }

        le_u16_field!(duration, set_duration);
    };
}

// IEEE Std 802.11-2016, 9.3.3.2
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub struct MgmtHdr {
    pub frame_ctrl: [u8; 2],
    pub duration: [u8; 2],
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: [u8; 2],
}

impl MgmtHdr {
    common_hdr_fields!();
}

// IEEE Std 802.11-2016, 9.3.2.1
#[derive(FromBytes, AsBytes, Unaligned, PartialEq, Eq, Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub struct DataHdr {
    pub frame_ctrl: [u8; 2],
    pub duration: [u8; 2],
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: [u8; 2],
}

impl DataHdr {
    common_hdr_fields!();
}

// IEEE Std 802.11-2016, 9.4.1.1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthAlgorithmNumber(pub u16);

impl AuthAlgorithmNumber {
    pub const OPEN: Self = Self(0);
    pub const SHARED_KEY: Self = Self(1);
    pub const FAST_BSS_TRANSITION: Self = Self(2);
    pub const SAE: Self = Self(3);
}

// IEEE Std 802.11-2016, 9.3.3.3 and 9.3.3.11; beacons and probe responses share a layout.
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub struct BeaconHdr {
    pub timestamp: [u8; 8],
    pub beacon_interval: [u8; 2],
    pub capabilities: [u8; 2],
}

impl BeaconHdr {
    pub fn timestamp(&self) -> u64 {
        LittleEndian::read_u64(&self.timestamp)
    }

    pub fn beacon_interval(&self) -> TimeUnit {
        TimeUnit(LittleEndian::read_u16(&self.beacon_interval))
    }

    pub fn capabilities(&self) -> CapabilityInfo {
        CapabilityInfo::from_bits_truncate(LittleEndian::read_u16(&self.capabilities))
    }

    pub fn set_beacon_interval(&mut self, interval: TimeUnit) {
        LittleEndian::write_u16(&mut self.beacon_interval, interval.0)
    }

    pub fn set_capabilities(&mut self, cap: CapabilityInfo) {
        LittleEndian::write_u16(&mut self.capabilities, cap.bits())
    }
}

// IEEE Std 802.11-2016, 9.3.3.12
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub struct AuthHdr {
    pub auth_alg_num: [u8; 2],
    pub auth_txn_seq_num: [u8; 2],
    pub status_code: [u8; 2],
}

impl AuthHdr {
    pub fn auth_alg_num(&self) -> AuthAlgorithmNumber {
        AuthAlgorithmNumber(LittleEndian::read_u16(&self.auth_alg_num))
    }

    pub fn set_auth_alg_num(&mut self, alg: AuthAlgorithmNumber) {
        LittleEndian::write_u16(&mut self.auth_alg_num, alg.0)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode(LittleEndian::read_u16(&self.status_code))
    }

    pub fn set_status_code(&mut self, status: StatusCode) {
        LittleEndian::write_u16(&mut self.status_code, status.0)
    }

    le_u16_field!(auth_txn_seq_num, set_auth_txn_seq_num);
}

// IEEE Std 802.11-2016, 9.3.3.6
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub struct AssocReqHdr {
    pub capabilities: [u8; 2],
    pub listen_interval: [u8; 2],
}

impl AssocReqHdr {
    pub fn capabilities(&self) -> CapabilityInfo {
        CapabilityInfo::from_bits_truncate(LittleEndian::read_u16(&self.capabilities))
    }

    pub fn set_capabilities(&mut self, cap: CapabilityInfo) {
        LittleEndian::write_u16(&mut self.capabilities, cap.bits())
    }

    le_u16_field!(listen_interval, set_listen_interval);
}

// IEEE Std 802.11-2016, 9.3.3.7
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub struct AssocRespHdr {
    pub capabilities: [u8; 2],
    pub status_code: [u8; 2],
    pub aid: [u8; 2],
}

impl AssocRespHdr {
    // IEEE Std 802.11-2016, 9.4.1.8: the two most significant bits of the AID field are set.
    const AID_MASK: u16 = 0x3FFF;

    pub fn capabilities(&self) -> CapabilityInfo {
        CapabilityInfo::from_bits_truncate(LittleEndian::read_u16(&self.capabilities))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode(LittleEndian::read_u16(&self.status_code))
    }

    pub fn aid(&self) -> u16 {
        LittleEndian::read_u16(&self.aid) & Self::AID_MASK
    }

    pub fn set_status_code(&mut self, status: StatusCode) {
        LittleEndian::write_u16(&mut self.status_code, status.0)
    }

    pub fn set_capabilities(&mut self, cap: CapabilityInfo) {
        LittleEndian::write_u16(&mut self.capabilities, cap.bits())
    }

    pub fn set_aid(&mut self, aid: u16) {
        LittleEndian::write_u16(&mut self.aid, aid | !Self::AID_MASK)
    }
}

// IEEE Std 802.11-2016, 9.3.3.13 and 9.3.3.5; deauthentication and disassociation share a body.
#[derive(FromBytes, AsBytes, Unaligned, Clone, Copy, Debug, Default)]
#[repr(C, packed)]
pub struct ReasonHdr {
    pub reason_code: [u8; 2],
}

impl ReasonHdr {
    pub fn new(reason: ReasonCode) -> Self {
        let mut hdr = Self::default();
        hdr.set_reason_code(reason);
        hdr
    }

    pub fn reason_code(&self) -> ReasonCode {
        ReasonCode(LittleEndian::read_u16(&self.reason_code))
    }

    pub fn set_reason_code(&mut self, reason: ReasonCode) {
        LittleEndian::write_u16(&mut self.reason_code, reason.0)
    }
}

pub type DeauthHdr = ReasonHdr;
pub type DisassocHdr = ReasonHdr;
