// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        client::{frame_writer::write_eth_frame, NetworkInfo, Station, StationEvent},
        device::{DeviceOps, RxInfo},
    },
    log::{debug, trace, warn},
    wlan_common::{
        ie::BssElements,
        mac::{self, BeaconHdr, DataHdr, LlcFrame, MacFrame, MgmtBody, MgmtHdr},
        Time,
    },
    zerocopy::ByteSlice,
};

/// What became of a received frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RxDisposition {
    /// Beacon or probe response recorded in the network catalog.
    Catalog,
    /// Handed to the association state machine.
    Handshake,
    /// Data frame converted and passed to the data bridge.
    Delivered,
    /// Null data frame; only the peer's activity was refreshed.
    Activity,
    Duplicate,
    /// Not from, or not for, the BSS the station is associated with.
    ForeignBss,
    Unrecognized,
    Malformed,
    /// Well formed but of no interest to a station.
    Ignored,
}

impl RxDisposition {
    fn consumed(self) -> bool {
        match self {
            RxDisposition::Catalog
            | RxDisposition::Handshake
            | RxDisposition::Delivered
            | RxDisposition::Activity => true,
            _ => false,
        }
    }
}

/// One entry of the platform's receive log, filled in by `mpdu_rx_process()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RxLogEntry {
    pub timestamp: Time,
    pub length: usize,
    pub channel: u8,
    pub rssi_dbm: i8,
    pub disposition: Option<RxDisposition>,
}

/// Frames dropped by the receive path, by reason, and frames delivered to the data bridge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RxCounters {
    pub malformed: u64,
    pub unrecognized: u64,
    pub duplicate: u64,
    pub foreign_bss: u64,
    pub delivered: u64,
}

impl<D: DeviceOps> Station<D> {
    /// Classifies one received MPDU and routes it. Returns the number of bytes consumed: the
    /// full frame length when it was used, zero when it was dropped. Nothing is retained past
    /// the call.
    pub fn mpdu_rx_process(
        &mut self,
        frame: &[u8],
        rx_info: RxInfo,
        log_slot: &mut RxLogEntry,
    ) -> usize {
        let disposition = self.handle_mac_frame_rx(frame, rx_info);
        *log_slot = RxLogEntry {
            timestamp: self.ctx.now(),
            length: frame.len(),
            channel: rx_info.channel,
            rssi_dbm: rx_info.rssi_dbm,
            disposition: Some(disposition),
        };
        if disposition.consumed() {
            frame.len()
        } else {
            0
        }
    }

    pub fn handle_mac_frame_rx<B: ByteSlice>(
        &mut self,
        frame: B,
        rx_info: RxInfo,
    ) -> RxDisposition {
        let disposition = match MacFrame::parse(frame) {
            Some(MacFrame::Mgmt { mgmt_hdr, body }) => {
                let subtype = mgmt_hdr.frame_ctrl().mgmt_subtype();
                match MgmtBody::parse(subtype, body) {
                    Some(mgmt_body) => self.on_mgmt_frame(*mgmt_hdr, mgmt_body, rx_info),
                    None => RxDisposition::Malformed,
                }
            }
            Some(MacFrame::Data { data_hdr, body, .. }) => self.on_data_frame(*data_hdr, body),
            Some(MacFrame::Unsupported { frame_ctrl }) => {
                trace!("unsupported frame type {:?}", frame_ctrl.frame_type());
                RxDisposition::Unrecognized
            }
            None => RxDisposition::Malformed,
        };
        let counters = &mut self.rx_counters;
        match disposition {
            RxDisposition::Malformed => counters.malformed += 1,
            RxDisposition::Unrecognized => counters.unrecognized += 1,
            RxDisposition::Duplicate => counters.duplicate += 1,
            RxDisposition::ForeignBss => counters.foreign_bss += 1,
            RxDisposition::Delivered => counters.delivered += 1,
            _ => (),
        }
        disposition
    }

    fn on_mgmt_frame<B: ByteSlice>(
        &mut self,
        mgmt_hdr: MgmtHdr,
        body: MgmtBody<B>,
        rx_info: RxInfo,
    ) -> RxDisposition {
        let (dst, src, bssid) = (mgmt_hdr.addr1, mgmt_hdr.addr2, mgmt_hdr.addr3);
        let for_us = dst == self.ctx.sta_addr();
        let outcome = match body {
            MgmtBody::Beacon { bcn_hdr, elements } => {
                return self.on_bss_frame(bssid, &bcn_hdr, &elements[..], rx_info, true);
            }
            MgmtBody::ProbeResp { probe_resp_hdr, elements } => {
                return self.on_bss_frame(bssid, &probe_resp_hdr, &elements[..], rx_info, false);
            }
            MgmtBody::Authentication { auth_hdr, .. } if for_us => {
                self.assoc.on_auth_frame(&mut self.ctx, src, &auth_hdr)
            }
            MgmtBody::AssociationResp { assoc_resp_hdr, .. } if for_us => {
                self.assoc.on_assoc_resp(&mut self.ctx, src, &assoc_resp_hdr)
            }
            MgmtBody::Deauthentication { deauth_hdr, .. } if for_us || dst == mac::BCAST_ADDR => {
                self.assoc.on_deauth(&mut self.ctx, src, deauth_hdr.reason_code())
            }
            MgmtBody::Disassociation { disassoc_hdr, .. } if for_us || dst == mac::BCAST_ADDR => {
                self.assoc.on_disassoc(&mut self.ctx, src, disassoc_hdr.reason_code())
            }
            MgmtBody::Authentication { .. }
            | MgmtBody::AssociationResp { .. }
            | MgmtBody::Deauthentication { .. }
            | MgmtBody::Disassociation { .. } => return RxDisposition::ForeignBss,
            MgmtBody::ProbeReq { .. }
            | MgmtBody::AssociationReq { .. }
            | MgmtBody::Unsupported { .. } => return RxDisposition::Ignored,
        };
        if let Some(outcome) = outcome {
            self.handle_assoc_outcome(outcome);
        }
        RxDisposition::Handshake
    }

    fn on_bss_frame(
        &mut self,
        bssid: mac::Bssid,
        bcn_hdr: &BeaconHdr,
        elements: &[u8],
        rx_info: RxInfo,
        is_beacon: bool,
    ) -> RxDisposition {
        let elements = BssElements::parse(elements);
        let now = self.ctx.now();
        // Hidden networks beacon an empty SSID; keep the one a probe response revealed.
        let ssid = match elements.ssid {
            Some(ref ssid) if !ssid.is_empty() => ssid.clone(),
            _ => self.catalog.get(&bssid).map(|n| n.ssid.clone()).unwrap_or_default(),
        };
        let channel = elements.dsss_channel.unwrap_or(rx_info.channel);

        if is_beacon && self.assoc.peer().map(|peer| peer.addr) == Some(bssid) {
            if let Some(counter) = self.lost_bss.as_mut() {
                counter.reset();
            }
            if let Some(peer) = self.assoc.peer_mut() {
                peer.last_activity = now;
            }
        }

        let event = StationEvent::NetworkFound { bssid, ssid: ssid.clone(), channel };
        let network = NetworkInfo {
            bssid,
            ssid,
            channel,
            capabilities: bcn_hdr.capabilities(),
            beacon_interval: bcn_hdr.beacon_interval(),
            basic_rates: elements.basic_rates(),
            last_seen: now,
            rssi_dbm: rx_info.rssi_dbm,
        };
        let protected = self.assoc.target().map(|target| target.bssid);
        if self.catalog.update(network, protected) {
            self.ctx.send_event(event);
        }
        self.join_scan_result();
        RxDisposition::Catalog
    }

    fn on_data_frame<B: ByteSlice>(&mut self, data_hdr: DataHdr, body: B) -> RxDisposition {
        let frame_ctrl = data_hdr.frame_ctrl();
        let seq_ctrl = data_hdr.seq_ctrl();
        // From-DS frames: addr1 is the receiver, addr2 the BSSID and addr3 the original sender.
        let (dst, bssid, src) = (data_hdr.addr1, data_hdr.addr2, data_hdr.addr3);
        let sta_addr = self.ctx.sta_addr();
        let now = self.ctx.now();

        let peer = match self.assoc.peer_mut() {
            Some(peer) if frame_ctrl.from_ds() && !frame_ctrl.to_ds() && peer.addr == bssid => {
                peer
            }
            _ => return RxDisposition::ForeignBss,
        };
        let multicast = mac::is_multicast(&dst);
        if dst != sta_addr && !multicast {
            return RxDisposition::ForeignBss;
        }
        if !multicast {
            if frame_ctrl.retry() && peer.last_rx_seq == Some(seq_ctrl) {
                debug!("dropping duplicate of seq {}", seq_ctrl.seq_num());
                return RxDisposition::Duplicate;
            }
            peer.last_rx_seq = Some(seq_ctrl);
        }
        peer.last_activity = now;
        peer.stats.rx_frames += 1;
        peer.stats.rx_bytes += body.len() as u64;

        if frame_ctrl.data_subtype().null() {
            return RxDisposition::Activity;
        }
        if frame_ctrl.protected() {
            // No keys are ever installed.
            return RxDisposition::Unrecognized;
        }
        let llc = match LlcFrame::parse(body) {
            Some(llc) => llc,
            None => return RxDisposition::Malformed,
        };
        let mut buf = vec![];
        if let Err(e) = write_eth_frame(&mut buf, dst, src, llc.hdr.protocol_id(), &llc.body[..]) {
            warn!("failed to convert data frame: {}", e);
            return RxDisposition::Malformed;
        }
        match self.ctx.device.deliver_eth_frame(&buf[..]) {
            Ok(()) => RxDisposition::Delivered,
            Err(e) => {
                warn!("data bridge refused frame: {}", e);
                RxDisposition::Ignored
            }
        }
    }
}
