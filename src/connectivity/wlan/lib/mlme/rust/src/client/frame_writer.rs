// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::error::Error,
    wlan_common::{
        appendable::Appendable,
        data_writer, ie,
        mac::{self, Bssid, MacAddr},
        mgmt_writer,
        sequence::SequenceManager,
    },
};

fn mgmt_frame_ctrl(subtype: mac::MgmtSubtype) -> mac::FrameControl {
    mac::FrameControl(0).with_frame_type(mac::FrameType::MGMT).with_mgmt_subtype(subtype)
}

fn next_seq_ctrl(seq_mgr: &mut SequenceManager, addr: &MacAddr) -> mac::SequenceControl {
    mac::SequenceControl(0).with_seq_num(seq_mgr.next_sns1(addr) as u16)
}

pub fn write_open_auth_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    let frame_ctrl = mgmt_frame_ctrl(mac::MgmtSubtype::AUTH);
    let seq_ctrl = next_seq_ctrl(seq_mgr, &bssid);
    mgmt_writer::write_mgmt_hdr(
        buf,
        mgmt_writer::mgmt_hdr_to_ap(frame_ctrl, bssid, client_addr, seq_ctrl),
    )?;

    let mut auth_hdr = buf.append_value_zeroed::<mac::AuthHdr>()?;
    auth_hdr.set_auth_alg_num(mac::AuthAlgorithmNumber::OPEN);
    auth_hdr.set_auth_txn_seq_num(1);
    auth_hdr.set_status_code(mac::StatusCode::SUCCESS);
    Ok(())
}

pub fn write_assoc_req_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    capabilities: mac::CapabilityInfo,
    listen_interval: u16,
    ssid: &[u8],
    rates: &[u8],
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    let frame_ctrl = mgmt_frame_ctrl(mac::MgmtSubtype::ASSOC_REQ);
    let seq_ctrl = next_seq_ctrl(seq_mgr, &bssid);
    mgmt_writer::write_mgmt_hdr(
        buf,
        mgmt_writer::mgmt_hdr_to_ap(frame_ctrl, bssid, client_addr, seq_ctrl),
    )?;

    let mut assoc_req_hdr = mac::AssocReqHdr::default();
    assoc_req_hdr.set_capabilities(capabilities);
    assoc_req_hdr.set_listen_interval(listen_interval);
    buf.append_value(&assoc_req_hdr)?;

    ie::write_ssid(buf, ssid)?;
    ie::write_rates(buf, rates)?;
    Ok(())
}

/// Writes a broadcast probe request. An empty `ssid` is the wildcard SSID.
pub fn write_probe_req_frame<B: Appendable>(
    buf: &mut B,
    client_addr: MacAddr,
    ssid: &[u8],
    rates: &[u8],
    channel: u8,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    let frame_ctrl = mgmt_frame_ctrl(mac::MgmtSubtype::PROBE_REQ);
    let seq_ctrl = next_seq_ctrl(seq_mgr, &mac::BCAST_ADDR);
    mgmt_writer::write_mgmt_hdr(
        buf,
        mgmt_writer::mgmt_hdr_broadcast(frame_ctrl, client_addr, seq_ctrl),
    )?;

    ie::write_ssid(buf, ssid)?;
    ie::write_rates(buf, rates)?;
    ie::write_dsss_param_set(buf, channel)?;
    Ok(())
}

pub fn write_deauth_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    reason_code: mac::ReasonCode,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_reason_frame(buf, mac::MgmtSubtype::DEAUTH, bssid, client_addr, reason_code, seq_mgr)
}

pub fn write_disassoc_frame<B: Appendable>(
    buf: &mut B,
    bssid: Bssid,
    client_addr: MacAddr,
    reason_code: mac::ReasonCode,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    write_reason_frame(buf, mac::MgmtSubtype::DISASSOC, bssid, client_addr, reason_code, seq_mgr)
}

fn write_reason_frame<B: Appendable>(
    buf: &mut B,
    subtype: mac::MgmtSubtype,
    bssid: Bssid,
    client_addr: MacAddr,
    reason_code: mac::ReasonCode,
    seq_mgr: &mut SequenceManager,
) -> Result<(), Error> {
    let frame_ctrl = mgmt_frame_ctrl(subtype);
    let seq_ctrl = next_seq_ctrl(seq_mgr, &bssid);
    mgmt_writer::write_mgmt_hdr(
        buf,
        mgmt_writer::mgmt_hdr_to_ap(frame_ctrl, bssid, client_addr, seq_ctrl),
    )?;
    buf.append_value(&mac::ReasonHdr::new(reason_code))?;
    Ok(())
}

/// Writes a to-DS data frame carrying `payload` as an LLC/SNAP encapsulated MSDU.
pub fn write_data_frame<B: Appendable>(
    buf: &mut B,
    seq_mgr: &mut SequenceManager,
    bssid: Bssid,
    src: MacAddr,
    dst: MacAddr,
    ether_type: u16,
    payload: &[u8],
) -> Result<(), Error> {
    let frame_ctrl = mac::FrameControl(0)
        .with_frame_type(mac::FrameType::DATA)
        .with_data_subtype(mac::DataSubtype::DATA);
    let seq_ctrl = next_seq_ctrl(seq_mgr, &bssid);
    data_writer::write_data_hdr(
        buf,
        data_writer::data_hdr_client_to_ap(frame_ctrl, bssid, src, dst, seq_ctrl),
    )?;
    data_writer::write_snap_llc_hdr(buf, ether_type)?;
    buf.append_bytes(payload)?;
    Ok(())
}

pub fn write_eth_frame<B: Appendable>(
    buf: &mut B,
    dst_addr: MacAddr,
    src_addr: MacAddr,
    protocol_id: u16,
    body: &[u8],
) -> Result<(), Error> {
    let mut eth_hdr = buf.append_value_zeroed::<mac::EthernetIIHdr>()?;
    eth_hdr.da = dst_addr;
    eth_hdr.sa = src_addr;
    eth_hdr.set_ether_type(protocol_id);

    buf.append_bytes(body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, wlan_common::buffer_writer::BufferWriter};

    #[test]
    fn open_auth_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_open_auth_frame(&mut buf, [1; 6], [2; 6], &mut seq_mgr)
            .expect("failed writing frame");
        #[rustfmt::skip]
        assert_eq!(&[
            // Mgmt header
            0b10110000, 0, // Frame Control
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0x10, 0, // Sequence Control
            // Auth body
            0, 0, // Auth Algorithm Number
            1, 0, // Auth Txn Seq Number
            0, 0, // Status code
        ][..], &buf[..]);
    }

    #[test]
    fn assoc_req_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        seq_mgr.next_sns1(&[1; 6]);
        write_assoc_req_frame(
            &mut buf,
            [1; 6],
            [2; 6],
            mac::CapabilityInfo::ESS | mac::CapabilityInfo::SHORT_PREAMBLE,
            1,
            b"foo",
            &[0x82, 0x84, 0x0b],
            &mut seq_mgr,
        )
        .expect("failed writing frame");
        #[rustfmt::skip]
        assert_eq!(&[
            // Mgmt header
            0b00000000, 0, // Frame Control
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            1, 1, 1, 1, 1, 1, // addr3
            0x20, 0, // Sequence Control
            // Assoc request body
            0x21, 0, // Capabilities
            1, 0, // Listen interval
            0, 3, b'f', b'o', b'o', // SSID
            1, 3, 0x82, 0x84, 0x0b, // Supported rates
        ][..], &buf[..]);
    }

    #[test]
    fn wildcard_probe_req_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_probe_req_frame(&mut buf, [2; 6], &[], &[0x82, 0x84], 6, &mut seq_mgr)
            .expect("failed writing frame");
        #[rustfmt::skip]
        assert_eq!(&[
            // Mgmt header
            0b01000000, 0, // Frame Control
            0, 0, // Duration
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // addr3
            0x10, 0, // Sequence Control
            0, 0, // wildcard SSID
            1, 2, 0x82, 0x84, // Supported rates
            3, 1, 6, // DSSS Parameter Set
        ][..], &buf[..]);
    }

    #[test]
    fn deauth_and_disassoc_frames() {
        let mut seq_mgr = SequenceManager::new();
        let mut buf = vec![];
        write_deauth_frame(
            &mut buf,
            [1; 6],
            [2; 6],
            mac::ReasonCode::LEAVING_NETWORK_DEAUTH,
            &mut seq_mgr,
        )
        .expect("failed writing frame");
        assert_eq!(&buf[..2], &[0b11000000, 0]);
        assert_eq!(&buf[22..], &[0x10, 0, 3, 0]);

        let mut buf = vec![];
        write_disassoc_frame(
            &mut buf,
            [1; 6],
            [2; 6],
            mac::ReasonCode::LEAVING_NETWORK_DISASSOC,
            &mut seq_mgr,
        )
        .expect("failed writing frame");
        assert_eq!(&buf[..2], &[0b10100000, 0]);
        assert_eq!(&buf[22..], &[0x20, 0, 8, 0]);
    }

    #[test]
    fn data_frame() {
        let mut buf = vec![];
        let mut seq_mgr = SequenceManager::new();
        write_data_frame(&mut buf, &mut seq_mgr, [1; 6], [2; 6], [3; 6], 0xABCD, &[4, 5, 6])
            .expect("failed writing frame");
        #[rustfmt::skip]
        assert_eq!(&[
            // Data header
            0b00001000, 0b00000001, // Frame Control
            0, 0, // Duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x10, 0, // Sequence Control
            // LLC header
            0xAA, 0xAA, 0x03, // DSAP, SSAP, Control
            0, 0, 0, // OUI
            0xAB, 0xCD, // Protocol ID
            // Payload
            4, 5, 6,
        ][..], &buf[..]);
    }

    #[test]
    fn eth_frame() {
        let mut buf = [0u8; 16];
        let mut writer = BufferWriter::new(&mut buf[..]);
        write_eth_frame(&mut writer, [1; 6], [2; 6], 0x0800, &[9, 9])
            .expect("failed writing frame");
        assert_eq!(writer.bytes_written(), 16);
        #[rustfmt::skip]
        assert_eq!(&[
            1, 1, 1, 1, 1, 1, // dst
            2, 2, 2, 2, 2, 2, // src
            0x08, 0x00, // ether type
            9, 9, // body
        ], &buf);
    }

    #[test]
    fn eth_frame_buffer_too_small() {
        let mut buf = [0u8; 15];
        let mut writer = BufferWriter::new(&mut buf[..]);
        let result = write_eth_frame(&mut writer, [1; 6], [2; 6], 0x0800, &[9, 9]);
        assert!(matches!(result, Err(Error::WritingFrame(_))));
    }
}
