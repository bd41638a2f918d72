// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::mac::{AssocReqHdr, AssocRespHdr, AuthHdr, BeaconHdr, MgmtSubtype, ReasonHdr},
    zerocopy::{ByteSlice, LayoutVerified},
};

/// IEEE Std 802.11-2016, 9.4.1.9
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const SUCCESS: Self = Self(0);
    pub const REFUSED_REASON_UNSPECIFIED: Self = Self(1);
    pub const UNSUPPORTED_AUTH_ALGORITHM: Self = Self(13);
    pub const TRANSACTION_SEQUENCE_ERROR: Self = Self(14);
    pub const REFUSED_TEMPORARILY: Self = Self(30);
    pub const DENIED_NO_MORE_STAS: Self = Self(17);
    pub const DENIED_RATES_NOT_SUPPORTED: Self = Self(18);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }
}

/// IEEE Std 802.11-2016, 9.4.1.7
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReasonCode(pub u16);

impl ReasonCode {
    pub const UNSPECIFIED_REASON: Self = Self(1);
    pub const INVALID_AUTHENTICATION: Self = Self(2);
    pub const LEAVING_NETWORK_DEAUTH: Self = Self(3);
    pub const REASON_INACTIVITY: Self = Self(4);
    pub const NO_MORE_STAS: Self = Self(5);
    pub const INVALID_CLASS2FRAME: Self = Self(6);
    pub const INVALID_CLASS3FRAME: Self = Self(7);
    pub const LEAVING_NETWORK_DISASSOC: Self = Self(8);
    pub const NOT_AUTHENTICATED: Self = Self(9);
}

/// Body of a management frame, split into its fixed fields and trailing elements.
#[derive(Debug)]
pub enum MgmtBody<B: ByteSlice> {
    Beacon { bcn_hdr: LayoutVerified<B, BeaconHdr>, elements: B },
    ProbeResp { probe_resp_hdr: LayoutVerified<B, BeaconHdr>, elements: B },
    ProbeReq { elements: B },
    Authentication { auth_hdr: LayoutVerified<B, AuthHdr>, elements: B },
    AssociationReq { assoc_req_hdr: LayoutVerified<B, AssocReqHdr>, elements: B },
    AssociationResp { assoc_resp_hdr: LayoutVerified<B, AssocRespHdr>, elements: B },
    Deauthentication { deauth_hdr: LayoutVerified<B, ReasonHdr>, elements: B },
    Disassociation { disassoc_hdr: LayoutVerified<B, ReasonHdr>, elements: B },
    Unsupported { subtype: MgmtSubtype },
}

impl<B: ByteSlice> MgmtBody<B> {
    /// Returns None if the body is too short for the subtype's fixed fields.
    pub fn parse(subtype: MgmtSubtype, bytes: B) -> Option<Self> {
        match subtype {
            MgmtSubtype::BEACON => {
                let (bcn_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Beacon { bcn_hdr, elements })
            }
            MgmtSubtype::PROBE_RESP => {
                let (probe_resp_hdr, elements) =
                    LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::ProbeResp { probe_resp_hdr, elements })
            }
            MgmtSubtype::PROBE_REQ => Some(MgmtBody::ProbeReq { elements: bytes }),
            MgmtSubtype::AUTH => {
                let (auth_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Authentication { auth_hdr, elements })
            }
            MgmtSubtype::ASSOC_REQ => {
                let (assoc_req_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::AssociationReq { assoc_req_hdr, elements })
            }
            MgmtSubtype::ASSOC_RESP => {
                let (assoc_resp_hdr, elements) =
                    LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::AssociationResp { assoc_resp_hdr, elements })
            }
            MgmtSubtype::DEAUTH => {
                let (deauth_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Deauthentication { deauth_hdr, elements })
            }
            MgmtSubtype::DISASSOC => {
                let (disassoc_hdr, elements) = LayoutVerified::new_unaligned_from_prefix(bytes)?;
                Some(MgmtBody::Disassociation { disassoc_hdr, elements })
            }
            subtype => Some(MgmtBody::Unsupported { subtype }),
        }
    }
}
