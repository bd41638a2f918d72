// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{
    appendable::Appendable,
    error::FrameWriteError,
    mac::{self, Bssid, DataHdr, FrameControl, FrameType, MacAddr, SequenceControl},
};

/// Header of a frame a station sends into its BSS: addressed to the AP, destined to `dst`.
pub fn data_hdr_client_to_ap(
    mut frame_ctrl: FrameControl,
    bssid: Bssid,
    client_addr: MacAddr,
    dst: MacAddr,
    seq_ctrl: SequenceControl,
) -> DataHdr {
    frame_ctrl.set_to_ds(true);
    frame_ctrl.set_from_ds(false);
    let mut hdr = DataHdr { addr1: bssid, addr2: client_addr, addr3: dst, ..Default::default() };
    hdr.set_frame_ctrl(frame_ctrl);
    hdr.set_seq_ctrl(seq_ctrl);
    hdr
}

pub fn write_data_hdr<B: Appendable>(buf: &mut B, hdr: DataHdr) -> Result<(), FrameWriteError> {
    if hdr.frame_ctrl().frame_type() != FrameType::DATA {
        return Err(FrameWriteError::new_invalid_data("data header with non-data frame type"));
    }
    buf.append_value(&hdr)?;
    Ok(())
}

pub fn write_snap_llc_hdr<B: Appendable>(
    buf: &mut B,
    protocol_id: u16,
) -> Result<(), FrameWriteError> {
    buf.append_value(&mac::LlcHdr::new_snap(protocol_id))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_to_ap() {
        let got = data_hdr_client_to_ap(
            FrameControl(0b00110000_00101000),
            [1; 6],
            [2; 6],
            [3; 6],
            SequenceControl(4321),
        );
        assert_eq!(got.frame_ctrl(), FrameControl(0b00110001_00101000));
        assert_eq!(got.addr1, [1; 6]);
        assert_eq!(got.addr2, [2; 6]);
        assert_eq!(got.addr3, [3; 6]);
        assert_eq!(got.seq_ctrl(), SequenceControl(4321));
        assert_eq!(got.duration(), 0);
    }

    #[test]
    fn rejects_non_data_header() {
        let hdr = DataHdr::default();
        assert!(write_data_hdr(&mut vec![], hdr).is_err());
    }

    #[test]
    fn snap_llc() {
        let mut buf = vec![];
        write_snap_llc_hdr(&mut buf, 0xABCD).expect("writing LLC header");
        assert_eq!(&buf[..], &[0xAA, 0xAA, 0x03, 0, 0, 0, 0xAB, 0xCD]);
    }
}
