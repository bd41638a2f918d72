// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! The station (client) role: discovers networks, joins one BSS and moves frames between the
//! radio and the data bridge. Everything runs on one thread; the platform calls in through
//! `handle_tick()`, `mpdu_rx_process()` and the request methods below.

mod bss_config;
mod frame_writer;
mod lost_bss;
mod ltg;
mod network_catalog;
mod rx;
mod scanner;
mod state;
mod tx_queue;

pub use {
    bss_config::{
        ActiveNetworkInfo, BssConfig, BssConfigError, ConfigureBssResult, JoinParams, JoinStatus,
        UpdateMask,
    },
    ltg::{LtgConfig, LtgStats, LTG_ETHER_TYPE},
    network_catalog::{NetworkCatalog, NetworkInfo, MAX_NETWORKS},
    rx::{RxCounters, RxDisposition, RxLogEntry},
    scanner::{ScanParams, ScanState},
    state::{HandshakeFailure, LeaveReason, PeerInfo, PeerStats},
    tx_queue::{QueueId, QueuedFrame, TxGate, TxQueueManager},
};

use {
    crate::{
        config::StationConfig,
        device::{DeviceOps, DisplayStatus, Role, TxStatus},
        error::Error,
        sink::EventSink,
        timer::{EventId, Timer},
    },
    frame_writer::write_data_frame,
    log::{debug, error, info, warn},
    lost_bss::LostBssCounter,
    ltg::Ltg,
    scanner::{ScanNotification, Scanner},
    state::{AssocOutcome, AssocStateMachine},
    std::time::Duration,
    wlan_common::{
        error::FrameParseError,
        mac::{format_addr, Bssid, EthernetFrame, MacAddr},
        sequence::SequenceManager,
        Time, TimeUnit,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimedEvent {
    AuthTimeout,
    AssocTimeout,
    /// Next probe or end of dwell while scanning; start of the next cycle between cycles.
    Scan,
}

/// Notifications for the policy layer above the station.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StationEvent {
    ScanStateChanged(ScanState),
    ScanComplete { networks_found: usize },
    NetworkFound { bssid: Bssid, ssid: Vec<u8>, channel: u8 },
    Associated { bssid: Bssid, aid: u16 },
    HandshakeFailed { bssid: Bssid, reason: HandshakeFailure },
    Disassociated { bssid: Bssid, reason: LeaveReason },
    BssLost { bssid: Bssid },
}

/// State shared by every part of the station: the platform, its clock and timer, and the
/// transmit path.
pub struct Context<D> {
    device: D,
    config: StationConfig,
    timer: Timer<TimedEvent>,
    seq_mgr: SequenceManager,
    tx_queues: TxQueueManager,
    event_sink: EventSink,
}

impl<D> Context<D> {
    pub fn new(device: D, config: StationConfig, event_sink: EventSink) -> Self {
        let tx_queues = TxQueueManager::new(config.max_tx_queue_len);
        Self {
            device,
            config,
            timer: Timer::new(),
            seq_mgr: SequenceManager::new(),
            tx_queues,
            event_sink,
        }
    }

    pub fn send_event(&self, event: StationEvent) {
        self.event_sink.send(event)
    }
}

impl<D: DeviceOps> Context<D> {
    pub fn now(&self) -> Time {
        self.device.now()
    }

    pub fn sta_addr(&self) -> MacAddr {
        self.device.mac_addr()
    }

    pub fn schedule_after(&mut self, duration: Duration, event: TimedEvent) -> EventId {
        let now = self.now();
        self.timer.schedule_after(now, duration, event)
    }

    /// Queues a frame for the radio. `dst` is the frame's receiver address.
    pub fn enqueue(
        &mut self,
        queue_id: QueueId,
        dst: MacAddr,
        bytes: Vec<u8>,
    ) -> Result<(), Error> {
        let frame = QueuedFrame {
            queue_id,
            dst,
            bytes,
            max_retries: self.config.tx_max_retries,
            enqueued_at: self.now(),
        };
        self.tx_queues.enqueue(frame)
    }

    pub fn enqueue_mgmt(&mut self, dst: MacAddr, bytes: Vec<u8>) -> Result<(), Error> {
        self.enqueue(QueueId::Management, dst, bytes)
    }
}

pub struct Station<D> {
    ctx: Context<D>,
    catalog: NetworkCatalog,
    scanner: Scanner,
    assoc: AssocStateMachine,
    /// Set while the scanner holds the radio off the BSS channel.
    tx_suspended: bool,
    lost_bss: Option<LostBssCounter>,
    /// A join waiting for its network to show up in a scan.
    pending_join: Option<JoinParams>,
    ltg: Option<Ltg>,
    rx_counters: RxCounters,
    last_tick: Time,
}

impl<D: DeviceOps> Station<D> {
    pub fn new(device: D, config: StationConfig, event_sink: EventSink) -> Result<Self, Error> {
        config.validate()?;
        let mut ctx = Context::new(device, config, event_sink);
        ctx.device.display_status(DisplayStatus::ApplicationRole(Role::Station));
        ctx.device.display_status(DisplayStatus::ManagementConfigured);
        let last_tick = ctx.now();
        info!("station {} ready", format_addr(&ctx.sta_addr()));
        Ok(Self {
            ctx,
            catalog: NetworkCatalog::new(),
            scanner: Scanner::new(),
            assoc: AssocStateMachine::new(),
            tx_suspended: false,
            lost_bss: None,
            pending_join: None,
            ltg: None,
            rx_counters: RxCounters::default(),
            last_tick,
        })
    }

    pub fn config(&self) -> &StationConfig {
        &self.ctx.config
    }

    /// Replaces the station's tunables. A scan in progress is stopped since its channel plan
    /// may no longer apply; handshakes and queued frames carry on under the new values.
    pub fn apply_config(&mut self, config: StationConfig) -> Result<(), Error> {
        config.validate()?;
        self.stop_scan();
        self.ctx.tx_queues.set_max_len(config.max_tx_queue_len);
        self.ctx.config = config;
        self.ctx.device.display_status(DisplayStatus::ManagementConfigured);
        info!("station config applied");
        Ok(())
    }

    pub fn identify(&mut self) {
        self.ctx.device.display_status(DisplayStatus::Identify);
    }

    /// Shows a fatal error on the status display. The station should not be driven afterwards.
    pub fn report_cpu_error(&mut self, code: u32) {
        error!("station halted with error code {}", code);
        self.ctx.device.display_status(DisplayStatus::CpuError(code));
    }

    pub fn assoc_state_name(&self) -> &'static str {
        self.assoc.state_name()
    }

    pub fn is_associated(&self) -> bool {
        self.assoc.is_associated()
    }

    pub fn scan_state(&self) -> ScanState {
        self.scanner.state()
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkInfo> {
        self.catalog.iter()
    }

    pub fn rx_counters(&self) -> &RxCounters {
        &self.rx_counters
    }

    pub fn tx_queue_len(&self, queue_id: QueueId) -> usize {
        self.ctx.tx_queues.len(queue_id)
    }

    /// Periodic entry point. Expired timeouts run first, then lost-BSS detection, catalog
    /// aging and the traffic generator; at most one queued frame goes to the radio last.
    pub fn handle_tick(&mut self) {
        let now = self.ctx.now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;

        self.handle_timeouts(now);
        self.check_lost_bss(elapsed);
        let protected = self.assoc.target().map(|t| t.bssid);
        self.catalog.remove_stale(now, self.ctx.config.network_retention, protected);
        self.ltg_tick(now);
        if let Err(e) = self.poll_tx_queues() {
            debug!("tx poll failed: {}", e);
        }
    }

    fn handle_timeouts(&mut self, now: Time) {
        // Handling one event can arm another that is already due when ticks are far apart.
        loop {
            let expired = self.ctx.timer.drain_expired(now);
            if expired.is_empty() {
                break;
            }
            for (event_id, event) in expired {
                match event {
                    TimedEvent::AuthTimeout | TimedEvent::AssocTimeout => {
                        if let Some(outcome) =
                            self.assoc.handle_timeout(&mut self.ctx, event_id, event)
                        {
                            self.handle_assoc_outcome(outcome);
                        }
                    }
                    TimedEvent::Scan => {
                        let notifications = self.scanner.handle_timeout(&mut self.ctx, event_id);
                        self.process_scan_notifications(notifications);
                    }
                }
            }
        }
    }

    fn restart_lost_bss_counter(&mut self) {
        let beacon_interval = match self.assoc.target().map(|t| t.beacon_interval) {
            Some(TimeUnit(0)) | None => TimeUnit::DEFAULT_BEACON_INTERVAL,
            Some(interval) => interval,
        };
        self.lost_bss =
            Some(LostBssCounter::start(beacon_interval, self.ctx.config.lost_bss_beacon_count));
    }

    fn check_lost_bss(&mut self, elapsed: Duration) {
        // No beacon can be heard while tuned away.
        if !self.assoc.is_associated() || self.scanner.is_scanning() {
            return;
        }
        let silence = match self.lost_bss.as_mut() {
            Some(counter) if counter.should_disassociate() => {
                Some(counter.time_since_last_beacon())
            }
            Some(counter) => {
                counter.add_time(elapsed);
                None
            }
            None => None,
        };
        if let Some(silence) = silence {
            let periods = self.ctx.config.lost_bss_beacon_count;
            warn!("no beacon from the BSS for {:?} ({} beacon periods)", silence, periods);
            if let Some(outcome) = self.assoc.on_bss_lost() {
                self.handle_assoc_outcome(outcome);
            }
        }
    }

    /// Hands at most one frame to the radio, honoring scan suspension and association state.
    pub fn poll_tx_queues(&mut self) -> Result<Option<QueueId>, Error> {
        let gate = TxGate { scanning: self.tx_suspended, associated: self.assoc.is_associated() };
        self.ctx.tx_queues.poll_tx_queues(&mut self.ctx.device, gate)
    }

    pub fn handle_tx_status(&mut self, status: TxStatus) {
        let peer = match self.assoc.peer_mut() {
            Some(peer) if peer.addr == status.dst => peer,
            _ => {
                debug!("tx status for {} outside the BSS", format_addr(&status.dst));
                return;
            }
        };
        peer.stats.tx_frames += 1;
        if !status.success {
            peer.stats.tx_failures += 1;
        }
        peer.stats.tx_retries += u64::from(status.attempts.saturating_sub(1));
    }

    /// Wraps an Ethernet II frame from the data bridge into a data frame for the AP.
    pub fn ethernet_receive(&mut self, frame: &[u8]) -> Result<(), Error> {
        let bssid = self.assoc.peer().map(|peer| peer.addr).ok_or(Error::NotAssociated)?;
        let eth = EthernetFrame::parse(frame)
            .ok_or_else(|| FrameParseError::new("ethernet frame too short"))?;
        let mut buf = vec![];
        let sta_addr = self.ctx.sta_addr();
        write_data_frame(
            &mut buf,
            &mut self.ctx.seq_mgr,
            bssid,
            sta_addr,
            eth.hdr.da,
            eth.hdr.ether_type(),
            eth.body,
        )?;
        self.ctx.enqueue(QueueId::for_data(&eth.hdr.da), bssid, buf)
    }

    /// Leaves the current BSS and drops any pending join. Calling it again is harmless.
    pub fn sta_disassociate(&mut self) {
        if self.pending_join.take().is_some() {
            info!("pending join cancelled");
            self.stop_scan();
        }
        if let Some(outcome) = self.assoc.disassociate(&mut self.ctx) {
            self.handle_assoc_outcome(outcome);
        }
    }

    fn handle_assoc_outcome(&mut self, outcome: AssocOutcome) {
        match outcome {
            AssocOutcome::Associated { bssid, aid } => {
                self.ctx.device.display_status(DisplayStatus::MemberListUpdate { aid });
                self.restart_lost_bss_counter();
                self.ctx.send_event(StationEvent::Associated { bssid, aid });
            }
            AssocOutcome::HandshakeFailed { bssid, reason } => {
                self.ctx.send_event(StationEvent::HandshakeFailed { bssid, reason });
            }
            AssocOutcome::Left { bssid, reason, peer } => {
                self.ctx.tx_queues.purge_all_data_tx_queue();
                self.lost_bss = None;
                self.ctx.device.display_status(DisplayStatus::MemberListUpdate { aid: 0 });
                info!("peer stats at teardown: {:?}", peer.stats);
                let event = match reason {
                    LeaveReason::BssLost => StationEvent::BssLost { bssid },
                    reason => StationEvent::Disassociated { bssid, reason },
                };
                self.ctx.send_event(event);
            }
        }
    }

    /// Starts an explicit scan. Refused while a handshake is in flight since the radio has to
    /// stay on the target's channel; replaces a join scan.
    pub fn start_scan(&mut self, params: ScanParams) -> Result<(), Error> {
        if self.assoc.in_handshake() {
            return Err(Error::Busy("handshake in progress"));
        }
        params.validate(&self.ctx.config)?;
        if self.pending_join.take().is_some() {
            info!("pending join superseded by scan request");
        }
        let notifications = self.scanner.start(&mut self.ctx, params);
        self.process_scan_notifications(notifications);
        Ok(())
    }

    pub fn stop_scan(&mut self) {
        let notifications = self.scanner.stop(&mut self.ctx);
        self.process_scan_notifications(notifications);
    }

    fn process_scan_notifications(&mut self, notifications: Vec<ScanNotification>) {
        for notification in notifications {
            match notification {
                ScanNotification::StateChanged(state) => self.process_scan_state_change(state),
                ScanNotification::CycleComplete => {
                    let networks_found = self.catalog.len();
                    info!("scan cycle complete, {} networks known", networks_found);
                    self.ctx.send_event(StationEvent::ScanComplete { networks_found });
                }
            }
        }
    }

    /// Suspends the transmit queues while the radio is off-channel and resumes them once the
    /// scanner gives it back.
    fn process_scan_state_change(&mut self, state: ScanState) {
        let suspend = match state {
            ScanState::Scanning { .. } => true,
            ScanState::Inactive => false,
        };
        if suspend != self.tx_suspended {
            debug!("tx {}", if suspend { "suspended" } else { "resumed" });
            self.tx_suspended = suspend;
        }
        self.ctx.send_event(StationEvent::ScanStateChanged(state));
    }
}


#[cfg(test)]
mod tests {
    use {
        super::{test_utils::*, *},
        crate::{
            config::{ConfigError, StationConfig},
            device::test_utils::{FakeDevice, FAKE_STA_ADDR},
        },
        wlan_common::{
            assert_variant,
            mac::{self, MacFrame, MgmtSubtype, ReasonCode, StatusCode},
        },
    };

    fn mgmt_subtypes(frames: &[(QueueId, Vec<u8>, crate::device::TxParams)]) -> Vec<MgmtSubtype> {
        frames
            .iter()
            .filter_map(|(_, bytes, _)| match MacFrame::parse(&bytes[..]) {
                Some(MacFrame::Mgmt { mgmt_hdr, .. }) => Some(mgmt_hdr.frame_ctrl().mgmt_subtype()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_station_reports_role() {
        let fake = FakeDevice::new();
        let (station, _receiver) = fake_station(&fake, StationConfig::default());
        assert_eq!(
            fake.state().display_log,
            vec![
                DisplayStatus::ApplicationRole(Role::Station),
                DisplayStatus::ManagementConfigured
            ]
        );
        assert_eq!(station.assoc_state_name(), "Idle");
        assert_eq!(station.scan_state(), ScanState::Inactive);
    }

    #[test]
    fn invalid_config_rejected() {
        let fake = FakeDevice::new();
        let (sender, _) = futures::channel::mpsc::unbounded();
        let config = StationConfig::default().with_scan_channels(vec![]);
        assert_variant!(
            Station::new(fake.clone(), config, EventSink::new(sender)).err(),
            Some(Error::InvalidConfig(_))
        );
    }

    #[test]
    fn configure_bss_from_idle_starts_authenticating() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = fake_station(&fake, StationConfig::default());
        let now = fake.state().now;

        assert_eq!(
            station.configure_bss(&bss_config(), UpdateMask::ALL),
            ConfigureBssResult::Accepted
        );
        assert_eq!(station.assoc_state_name(), "Authenticating");
        assert_eq!(fake.state().channel, CHANNEL);
        assert_eq!(station.ctx.timer.next_deadline(), Some(now + Duration::from_millis(100)));

        station.handle_tick();
        let frames = fake.take_wlan_frames();
        assert_eq!(mgmt_subtypes(&frames[..]), vec![MgmtSubtype::AUTH]);
    }

    #[test]
    fn full_handshake_reports_association() {
        let fake = FakeDevice::new();
        let (station, _receiver) = associated_station(&fake);
        assert_eq!(station.assoc_state_name(), "Associated");
        assert!(fake
            .state()
            .display_log
            .contains(&DisplayStatus::MemberListUpdate { aid: 1 }));
    }

    #[test]
    fn handshake_events() {
        let fake = FakeDevice::new();
        let (mut station, mut receiver) = fake_station(&fake, StationConfig::default());
        station.configure_bss(&bss_config(), UpdateMask::ALL);
        station.handle_mac_frame_rx(&auth_resp_frame(BSSID, StatusCode::SUCCESS)[..], rx_info());
        let frame = assoc_resp_frame(BSSID, StatusCode::SUCCESS, 5);
        station.handle_mac_frame_rx(&frame[..], rx_info());
        assert_eq!(
            drain_events(&mut receiver),
            vec![StationEvent::Associated { bssid: BSSID, aid: 5 }]
        );
    }

    #[test]
    fn auth_timeouts_surface_one_failure() {
        let fake = FakeDevice::new();
        let (mut station, mut receiver) = fake_station(&fake, StationConfig::default());
        station.configure_bss(&bss_config(), UpdateMask::ALL);
        for _ in 0..5 {
            station.handle_tick();
            fake.advance(Duration::from_millis(100));
        }
        station.handle_tick();
        assert_eq!(station.assoc_state_name(), "Idle");
        assert_eq!(
            drain_events(&mut receiver),
            vec![StationEvent::HandshakeFailed {
                bssid: BSSID,
                reason: HandshakeFailure::AuthTimeout
            }]
        );
        assert_eq!(mgmt_subtypes(&fake.take_wlan_frames()[..]), vec![MgmtSubtype::AUTH; 5]);
    }

    #[test]
    fn deauth_while_associated_purges_data_only() {
        let fake = FakeDevice::new();
        let (mut station, mut receiver) = associated_station(&fake);
        for i in 0..3 {
            station.ethernet_receive(&eth_frame([2, 0, 0, 0, 0, i], b"hello")[..])
                .expect("queue data frame");
        }
        station.ethernet_receive(&eth_frame(mac::BCAST_ADDR, b"hello")[..]).expect("queue bcast");
        station.ctx.enqueue_mgmt([9; 6], vec![0u8; 24]).expect("queue mgmt frame");

        station.handle_mac_frame_rx(
            &deauth_frame(BSSID, ReasonCode::LEAVING_NETWORK_DEAUTH)[..],
            rx_info(),
        );
        assert_eq!(station.assoc_state_name(), "Idle");
        assert!(station.assoc.peer().is_none());
        assert_eq!(station.tx_queue_len(QueueId::Unicast), 0);
        assert_eq!(station.tx_queue_len(QueueId::Multicast), 0);
        assert_eq!(station.tx_queue_len(QueueId::Management), 1);
        assert_eq!(
            drain_events(&mut receiver),
            vec![StationEvent::Disassociated {
                bssid: BSSID,
                reason: LeaveReason::Deauthenticated(ReasonCode::LEAVING_NETWORK_DEAUTH)
            }]
        );
        assert_eq!(
            fake.state().display_log.last(),
            Some(&DisplayStatus::MemberListUpdate { aid: 0 })
        );
    }

    #[test]
    fn management_serviced_before_unicast() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = associated_station(&fake);
        for i in 0..5 {
            station.ethernet_receive(&eth_frame([2, 0, 0, 0, 0, i], b"data")[..])
                .expect("queue data frame");
        }
        station.ctx.enqueue_mgmt(BSSID, vec![0u8; 24]).expect("queue mgmt frame");

        assert_eq!(station.poll_tx_queues().expect("poll"), Some(QueueId::Management));
        assert_eq!(station.poll_tx_queues().expect("poll"), Some(QueueId::Unicast));
    }

    #[test]
    fn ethernet_receive_requires_association() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = fake_station(&fake, StationConfig::default());
        assert_variant!(
            station.ethernet_receive(&eth_frame([2; 6], b"data")[..]),
            Err(Error::NotAssociated)
        );
    }

    #[test]
    fn ethernet_receive_wraps_frame() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = associated_station(&fake);
        assert_variant!(station.ethernet_receive(&[0u8; 5][..]), Err(Error::ParsingFrame(_)));

        station.ethernet_receive(&eth_frame([2; 6], b"data")[..]).expect("queue data frame");
        station.handle_tick();
        let frames = fake.take_wlan_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, QueueId::Unicast);
        let (data_hdr, body) = assert_variant!(
            MacFrame::parse(&frames[0].1[..]),
            Some(MacFrame::Data { data_hdr, body, .. }) => (data_hdr, body)
        );
        assert!(data_hdr.frame_ctrl().to_ds());
        assert_eq!(data_hdr.addr1, BSSID);
        assert_eq!(data_hdr.addr2, FAKE_STA_ADDR);
        assert_eq!(data_hdr.addr3, [2; 6]);
        assert_eq!(&body[8..], b"data");
    }

    #[test]
    fn queue_full_surfaces_error() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = associated_station(&fake);
        for _ in 0..150 {
            station.ethernet_receive(&eth_frame([2; 6], b"x")[..]).expect("queue data frame");
        }
        assert_variant!(
            station.ethernet_receive(&eth_frame([2; 6], b"x")[..]),
            Err(Error::QueueFull(QueueId::Unicast))
        );
        station.handle_tick();
        station.ethernet_receive(&eth_frame([2; 6], b"x")[..]).expect("room after dequeue");
    }

    #[test]
    fn tx_status_updates_peer_stats() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = associated_station(&fake);
        station.handle_tx_status(TxStatus {
            queue_id: QueueId::Unicast,
            dst: BSSID,
            success: true,
            attempts: 3,
        });
        station.handle_tx_status(TxStatus {
            queue_id: QueueId::Unicast,
            dst: BSSID,
            success: false,
            attempts: 8,
        });
        station.handle_tx_status(TxStatus {
            queue_id: QueueId::Unicast,
            dst: [9; 6],
            success: false,
            attempts: 8,
        });
        let stats = station.assoc.peer().expect("associated").stats;
        assert_eq!(stats.tx_frames, 2);
        assert_eq!(stats.tx_failures, 1);
        assert_eq!(stats.tx_retries, 9);
    }

    #[test]
    fn sta_disassociate_is_idempotent() {
        let fake = FakeDevice::new();
        let (mut station, mut receiver) = associated_station(&fake);
        station.ethernet_receive(&eth_frame([2; 6], b"x")[..]).expect("queue data frame");

        station.sta_disassociate();
        assert_eq!(station.assoc_state_name(), "Idle");
        assert_eq!(station.tx_queue_len(QueueId::Unicast), 0);
        assert_eq!(
            drain_events(&mut receiver),
            vec![StationEvent::Disassociated { bssid: BSSID, reason: LeaveReason::Requested }]
        );
        station.handle_tick();
        assert_eq!(mgmt_subtypes(&fake.take_wlan_frames()[..]), vec![MgmtSubtype::DISASSOC]);

        for _ in 0..2 {
            station.sta_disassociate();
            station.handle_tick();
            assert_eq!(station.assoc_state_name(), "Idle");
            assert!(drain_events(&mut receiver).is_empty());
            assert!(fake.take_wlan_frames().is_empty());
        }
    }

    #[test]
    fn bss_lost_after_silence() {
        let fake = FakeDevice::new();
        let (mut station, mut receiver) = associated_station(&fake);
        station.handle_tick();
        // 100 beacon periods of 102.4ms each.
        let full_timeout = Duration::from_micros(100 * 102_400);

        fake.advance(full_timeout / 2);
        station.handle_tick();
        station.handle_mac_frame_rx(&beacon_frame(BSSID, SSID, CHANNEL)[..], rx_info());
        fake.advance(full_timeout / 2);
        station.handle_tick();
        fake.advance(full_timeout / 2);
        station.handle_tick();
        assert!(station.is_associated());

        fake.advance(Duration::from_millis(1));
        station.handle_tick();
        assert!(!station.is_associated());
        let events = drain_events(&mut receiver);
        assert!(events.contains(&StationEvent::BssLost { bssid: BSSID }));
    }

    #[test]
    fn scan_suspends_tx() {
        let fake = FakeDevice::new();
        let config = StationConfig::default().with_scan_channels(vec![1, 11]);
        let (mut station, _receiver) = fake_station(&fake, config);
        station.ctx.enqueue_mgmt([9; 6], vec![0u8; 24]).expect("queue mgmt frame");

        station.start_scan(ScanParams::wildcard()).expect("scan starts");
        fake.take_wlan_frames();
        station.handle_tick();
        // Only the probes the scanner sends directly.
        assert!(fake.take_wlan_frames().is_empty());
        assert_eq!(station.tx_queue_len(QueueId::Management), 1);

        fake.advance(Duration::from_millis(100));
        station.handle_tick();
        fake.take_wlan_frames();
        fake.advance(Duration::from_millis(100));
        station.handle_tick();
        assert_eq!(station.scan_state(), ScanState::Inactive);
        assert_eq!(station.tx_queue_len(QueueId::Management), 0);
        // Channel 1 was home; the scan ends back on it.
        assert_eq!(fake.state().channel, 1);
    }

    #[test]
    fn scan_refused_during_handshake() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = fake_station(&fake, StationConfig::default());
        station.configure_bss(&bss_config(), UpdateMask::ALL);
        assert_variant!(station.start_scan(ScanParams::wildcard()), Err(Error::Busy(_)));
    }

    #[test]
    fn scan_events() {
        let fake = FakeDevice::new();
        let config = StationConfig::default().with_scan_channels(vec![1]);
        let (mut station, mut receiver) = fake_station(&fake, config);
        station.start_scan(ScanParams::wildcard()).expect("scan starts");
        station.handle_mac_frame_rx(&probe_resp_frame(BSSID, SSID, 1)[..], rx_info());
        fake.advance(Duration::from_millis(100));
        station.handle_tick();
        let probing = |probes_sent| {
            StationEvent::ScanStateChanged(ScanState::Scanning { channel_idx: 0, probes_sent })
        };
        assert_eq!(
            drain_events(&mut receiver),
            vec![
                probing(1),
                StationEvent::NetworkFound { bssid: BSSID, ssid: SSID.to_vec(), channel: 1 },
                probing(2),
                probing(3),
                probing(4),
                probing(5),
                StationEvent::ScanComplete { networks_found: 1 },
                StationEvent::ScanStateChanged(ScanState::Inactive),
            ]
        );
    }

    #[test]
    fn scan_channels_checked_before_tuning() {
        let fake = FakeDevice::new();
        let (mut station, mut receiver) = fake_station(&fake, StationConfig::default());
        let home = fake.state().channel;

        let params = ScanParams { ssid: SSID.to_vec(), channels: vec![0; 60] };
        assert_variant!(
            station.start_scan(params),
            Err(Error::InvalidConfig(ConfigError::InvalidScanChannel(0)))
        );
        // 60 dwells of 100ms overrun the 5s update rate.
        let params = ScanParams { ssid: SSID.to_vec(), channels: vec![1; 60] };
        assert_variant!(
            station.start_scan(params),
            Err(Error::InvalidConfig(ConfigError::ScanCycleTooLong { .. }))
        );

        assert_eq!(station.scan_state(), ScanState::Inactive);
        assert_eq!(fake.state().channel, home);
        assert!(fake.state().channel_history.is_empty());
        assert!(fake.take_wlan_frames().is_empty());
        assert!(drain_events(&mut receiver).is_empty());
    }

    #[test]
    fn targeted_scan_gives_radio_back_between_cycles() {
        let fake = FakeDevice::new();
        let config = StationConfig::default().with_scan_channels(vec![1, 11]);
        let (mut station, _receiver) = fake_station(&fake, config);
        fake.state().channel = CHANNEL;

        let params = ScanParams { ssid: SSID.to_vec(), channels: vec![1; 49] };
        station.start_scan(params).expect("a 4.9s cycle fits");
        let mut home_ticks = 0;
        for _ in 0..1500 {
            fake.advance(Duration::from_millis(20));
            station.handle_tick();
            if station.scan_state() == ScanState::Inactive {
                assert_eq!(fake.state().channel, CHANNEL);
                home_ticks += 1;
            }
        }
        assert!(home_ticks > 0);
    }

    #[test]
    fn stale_networks_age_out_except_joined() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = associated_station(&fake);
        station.handle_mac_frame_rx(&beacon_frame(BSSID, SSID, CHANNEL)[..], rx_info());
        station.handle_mac_frame_rx(&beacon_frame([8; 6], b"bar", 1)[..], rx_info());
        assert_eq!(station.networks().count(), 2);

        fake.advance(Duration::from_secs(11));
        station.handle_tick();
        let left: Vec<_> = station.networks().map(|n| n.bssid).collect();
        assert_eq!(left, vec![BSSID]);
    }

    #[test]
    fn apply_config_displays_and_validates() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = fake_station(&fake, StationConfig::default());
        fake.state().display_log.clear();

        assert_variant!(
            station.apply_config(StationConfig::default().with_max_tx_queue_len(0)),
            Err(Error::InvalidConfig(_))
        );
        assert!(fake.state().display_log.is_empty());

        station
            .apply_config(StationConfig::default().with_max_tx_queue_len(10))
            .expect("valid config");
        assert_eq!(station.config().max_tx_queue_len, 10);
        assert_eq!(fake.state().display_log, vec![DisplayStatus::ManagementConfigured]);
    }

    #[test]
    fn identify() {
        let fake = FakeDevice::new();
        let (mut station, _receiver) = fake_station(&fake, StationConfig::default());
        station.identify();
        assert_eq!(fake.state().display_log.last(), Some(&DisplayStatus::Identify));
    }
}
