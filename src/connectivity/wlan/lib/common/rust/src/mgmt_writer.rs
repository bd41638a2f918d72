// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    appendable::Appendable,
    error::FrameWriteError,
    mac::{Bssid, FrameControl, FrameType, MacAddr, MgmtHdr, SequenceControl, BCAST_ADDR},
};

pub fn mgmt_hdr_to_ap(
    frame_ctrl: FrameControl,
    bssid: Bssid,
    client_addr: MacAddr,
    seq_ctrl: SequenceControl,
) -> MgmtHdr {
    let mut hdr = MgmtHdr { addr1: bssid, addr2: client_addr, addr3: bssid, ..Default::default() };
    hdr.set_frame_ctrl(frame_ctrl);
    hdr.set_seq_ctrl(seq_ctrl);
    hdr
}

/// Header for frames addressed to every AP in range, e.g. a wildcard probe request.
pub fn mgmt_hdr_broadcast(
    frame_ctrl: FrameControl,
    client_addr: MacAddr,
    seq_ctrl: SequenceControl,
) -> MgmtHdr {
    mgmt_hdr_to_ap(frame_ctrl, BCAST_ADDR, client_addr, seq_ctrl)
}

pub fn write_mgmt_hdr<B: Appendable>(buf: &mut B, hdr: MgmtHdr) -> Result<(), FrameWriteError> {
    let fc = hdr.frame_ctrl();
    if fc.frame_type() != FrameType::MGMT {
        return Err(FrameWriteError::new_invalid_data("mgmt header with non-mgmt frame type"));
    }
    if fc.htc_order() {
        return Err(FrameWriteError::new_invalid_data(
            "htc_order bit set while HT-Control is absent",
        ));
    }
    buf.append_value(&hdr)?;
    Ok(())
}
