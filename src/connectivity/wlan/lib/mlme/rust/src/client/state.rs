// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        client::{bss_config::BssConfig, frame_writer, Context, TimedEvent},
        device::DeviceOps,
        error::Error,
        timer::EventId,
    },
    log::{debug, info, warn},
    wlan_common::{
        ie::BASIC_RATE_BIT,
        mac::{
            format_addr, AssocRespHdr, AuthAlgorithmNumber, AuthHdr, Bssid, CapabilityInfo,
            MacAddr, ReasonCode, SequenceControl, StatusCode,
        },
        Time,
    },
};

// IEEE Std 802.11-2016, 12.3.3.2: the AP answers open system authentication with the
// second frame of the exchange.
const OPEN_AUTH_RESP_TXN_SEQ_NUM: u16 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeerStats {
    pub rx_frames: u64,
    pub rx_bytes: u64,
    pub tx_frames: u64,
    pub tx_failures: u64,
    pub tx_retries: u64,
}

/// The access point the station is associated with. Exists only while associated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerInfo {
    pub addr: MacAddr,
    pub aid: u16,
    pub capabilities: CapabilityInfo,
    pub last_activity: Time,
    pub stats: PeerStats,
    /// Sequence control of the last data frame accepted from the peer.
    pub last_rx_seq: Option<SequenceControl>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeFailure {
    AuthTimeout,
    AssocTimeout,
    AuthRejected(StatusCode),
    AssocRejected(StatusCode),
    Deauthenticated(ReasonCode),
    Disassociated(ReasonCode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveReason {
    Requested,
    Deauthenticated(ReasonCode),
    Disassociated(ReasonCode),
    BssLost,
}

/// Transitions the station has to react to beyond the state machine itself.
#[derive(Debug, PartialEq, Eq)]
pub enum AssocOutcome {
    Associated { bssid: Bssid, aid: u16 },
    HandshakeFailed { bssid: Bssid, reason: HandshakeFailure },
    Left { bssid: Bssid, reason: LeaveReason, peer: PeerInfo },
}

#[derive(Debug)]
pub enum AssocState {
    Idle,
    Authenticating { target: BssConfig, attempt: u8, timeout: EventId },
    Associating { target: BssConfig, attempt: u8, timeout: EventId },
    Associated { target: BssConfig, peer: PeerInfo },
}

/// Authenticate-then-associate handshake with a single target BSS. Only one request is ever
/// outstanding: a retry first withdraws the previous copy from the management queue.
#[derive(Debug)]
pub struct AssocStateMachine {
    state: AssocState,
}

impl Default for AssocStateMachine {
    fn default() -> Self {
        Self { state: AssocState::Idle }
    }
}

impl AssocStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AssocState {
        &self.state
    }

    pub fn state_name(&self) -> &'static str {
        match self.state {
            AssocState::Idle => "Idle",
            AssocState::Authenticating { .. } => "Authenticating",
            AssocState::Associating { .. } => "Associating",
            AssocState::Associated { .. } => "Associated",
        }
    }

    pub fn is_idle(&self) -> bool {
        match self.state {
            AssocState::Idle => true,
            _ => false,
        }
    }

    pub fn is_associated(&self) -> bool {
        match self.state {
            AssocState::Associated { .. } => true,
            _ => false,
        }
    }

    pub fn in_handshake(&self) -> bool {
        match self.state {
            AssocState::Authenticating { .. } | AssocState::Associating { .. } => true,
            _ => false,
        }
    }

    /// The BSS the station is joining or joined to.
    pub fn target(&self) -> Option<&BssConfig> {
        match &self.state {
            AssocState::Idle => None,
            AssocState::Authenticating { target, .. }
            | AssocState::Associating { target, .. }
            | AssocState::Associated { target, .. } => Some(target),
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut BssConfig> {
        match &mut self.state {
            AssocState::Idle => None,
            AssocState::Authenticating { target, .. }
            | AssocState::Associating { target, .. }
            | AssocState::Associated { target, .. } => Some(target),
        }
    }

    pub fn peer(&self) -> Option<&PeerInfo> {
        match &self.state {
            AssocState::Associated { peer, .. } => Some(peer),
            _ => None,
        }
    }

    pub fn peer_mut(&mut self) -> Option<&mut PeerInfo> {
        match &mut self.state {
            AssocState::Associated { peer, .. } => Some(peer),
            _ => None,
        }
    }

    /// Sends the first authentication request to `target`. Any handshake in progress is
    /// abandoned; the caller tears down an existing association first.
    pub fn start_handshake<D: DeviceOps>(&mut self, ctx: &mut Context<D>, target: BssConfig) {
        self.abort_handshake(ctx);
        info!("authenticating with {}", format_addr(&target.bssid));
        send_auth_req(ctx, &target);
        let timeout = ctx.schedule_after(ctx.config.auth_timeout, TimedEvent::AuthTimeout);
        self.state = AssocState::Authenticating { target, attempt: 1, timeout };
    }

    /// Cancels an authentication or association exchange without notifying anyone.
    pub fn abort_handshake<D>(&mut self, ctx: &mut Context<D>) {
        let (bssid, timeout) = match &self.state {
            AssocState::Authenticating { target, timeout, .. }
            | AssocState::Associating { target, timeout, .. } => (target.bssid, *timeout),
            _ => return,
        };
        debug!("{} aborted", self.state_name());
        ctx.timer.cancel_event(timeout);
        ctx.tx_queues.purge_mgmt_to(&bssid);
        self.state = AssocState::Idle;
    }

    pub fn handle_timeout<D: DeviceOps>(
        &mut self,
        ctx: &mut Context<D>,
        event_id: EventId,
        event: TimedEvent,
    ) -> Option<AssocOutcome> {
        let state_name = self.state_name();
        let exhausted = match (&mut self.state, event) {
            (
                AssocState::Authenticating { target, attempt, timeout },
                TimedEvent::AuthTimeout,
            ) if *timeout == event_id => {
                if *attempt < ctx.config.auth_max_tries {
                    *attempt += 1;
                    info!("auth timeout, retrying ({}/{})", attempt, ctx.config.auth_max_tries);
                    ctx.tx_queues.purge_mgmt_to(&target.bssid);
                    send_auth_req(ctx, target);
                    *timeout = ctx.schedule_after(ctx.config.auth_timeout, event);
                    None
                } else {
                    Some((target.bssid, HandshakeFailure::AuthTimeout))
                }
            }
            (
                AssocState::Associating { target, attempt, timeout },
                TimedEvent::AssocTimeout,
            ) if *timeout == event_id => {
                if *attempt < ctx.config.assoc_max_tries {
                    *attempt += 1;
                    info!("assoc timeout, retrying ({}/{})", attempt, ctx.config.assoc_max_tries);
                    ctx.tx_queues.purge_mgmt_to(&target.bssid);
                    send_assoc_req(ctx, target);
                    *timeout = ctx.schedule_after(ctx.config.assoc_timeout, event);
                    None
                } else {
                    Some((target.bssid, HandshakeFailure::AssocTimeout))
                }
            }
            _ => {
                debug!("ignoring stale {:?} in state {}", event, state_name);
                None
            }
        };
        exhausted.map(|(bssid, reason)| self.fail(ctx, bssid, reason))
    }

    pub fn on_auth_frame<D: DeviceOps>(
        &mut self,
        ctx: &mut Context<D>,
        src: MacAddr,
        auth_hdr: &AuthHdr,
    ) -> Option<AssocOutcome> {
        let (bssid, timeout) = match &self.state {
            AssocState::Authenticating { target, timeout, .. } if target.bssid == src => {
                (target.bssid, *timeout)
            }
            _ => {
                let src = format_addr(&src);
                debug!("ignoring auth frame from {} in state {}", src, self.state_name());
                return None;
            }
        };
        if auth_hdr.auth_alg_num() != AuthAlgorithmNumber::OPEN
            || auth_hdr.auth_txn_seq_num() != OPEN_AUTH_RESP_TXN_SEQ_NUM
        {
            debug!("ignoring unexpected auth frame {:?}", auth_hdr);
            return None;
        }
        ctx.timer.cancel_event(timeout);

        let status = auth_hdr.status_code();
        if !status.is_success() {
            return Some(self.fail(ctx, bssid, HandshakeFailure::AuthRejected(status)));
        }

        let target = match std::mem::replace(&mut self.state, AssocState::Idle) {
            AssocState::Authenticating { target, .. } => target,
            // Matched above.
            _ => return None,
        };
        info!("authenticated with {}, associating", format_addr(&bssid));
        send_assoc_req(ctx, &target);
        let timeout = ctx.schedule_after(ctx.config.assoc_timeout, TimedEvent::AssocTimeout);
        self.state = AssocState::Associating { target, attempt: 1, timeout };
        None
    }

    pub fn on_assoc_resp<D: DeviceOps>(
        &mut self,
        ctx: &mut Context<D>,
        src: MacAddr,
        assoc_resp_hdr: &AssocRespHdr,
    ) -> Option<AssocOutcome> {
        let (bssid, timeout) = match &self.state {
            AssocState::Associating { target, timeout, .. } if target.bssid == src => {
                (target.bssid, *timeout)
            }
            _ => {
                debug!("ignoring assoc response in state {}", self.state_name());
                return None;
            }
        };
        ctx.timer.cancel_event(timeout);

        let status = assoc_resp_hdr.status_code();
        if !status.is_success() {
            return Some(self.fail(ctx, bssid, HandshakeFailure::AssocRejected(status)));
        }

        let target = match std::mem::replace(&mut self.state, AssocState::Idle) {
            AssocState::Associating { target, .. } => target,
            _ => return None,
        };
        let aid = assoc_resp_hdr.aid();
        let peer = PeerInfo {
            addr: bssid,
            aid,
            capabilities: assoc_resp_hdr.capabilities(),
            last_activity: ctx.now(),
            stats: PeerStats::default(),
            last_rx_seq: None,
        };
        info!("associated with {} (aid {})", format_addr(&bssid), aid);
        self.state = AssocState::Associated { target, peer };
        Some(AssocOutcome::Associated { bssid, aid })
    }

    pub fn on_deauth<D>(
        &mut self,
        ctx: &mut Context<D>,
        src: MacAddr,
        reason: ReasonCode,
    ) -> Option<AssocOutcome> {
        self.on_peer_teardown(
            ctx,
            src,
            HandshakeFailure::Deauthenticated(reason),
            LeaveReason::Deauthenticated(reason),
        )
    }

    pub fn on_disassoc<D>(
        &mut self,
        ctx: &mut Context<D>,
        src: MacAddr,
        reason: ReasonCode,
    ) -> Option<AssocOutcome> {
        self.on_peer_teardown(
            ctx,
            src,
            HandshakeFailure::Disassociated(reason),
            LeaveReason::Disassociated(reason),
        )
    }

    fn on_peer_teardown<D>(
        &mut self,
        ctx: &mut Context<D>,
        src: MacAddr,
        failure: HandshakeFailure,
        leave_reason: LeaveReason,
    ) -> Option<AssocOutcome> {
        if self.target().map(|t| t.bssid) != Some(src) {
            debug!("ignoring teardown from {}", format_addr(&src));
            return None;
        }
        if self.in_handshake() {
            self.abort_handshake(ctx);
            warn!("handshake with {} ended by peer: {:?}", format_addr(&src), failure);
            return Some(AssocOutcome::HandshakeFailed { bssid: src, reason: failure });
        }
        self.leave(leave_reason)
    }

    /// Leaves the BSS on request. From `Associated` the AP is notified with a disassociation;
    /// a handshake in progress is abandoned silently and `Idle` is a no-op.
    pub fn disassociate<D: DeviceOps>(&mut self, ctx: &mut Context<D>) -> Option<AssocOutcome> {
        if self.in_handshake() {
            self.abort_handshake(ctx);
            return None;
        }
        let (bssid, peer_addr) = match &self.state {
            AssocState::Associated { target, peer } => (target.bssid, peer.addr),
            _ => return None,
        };
        info!("disassociating from {}", format_addr(&bssid));
        ctx.tx_queues.purge_mgmt_to(&peer_addr);
        if let Err(e) = send_disassoc(ctx, bssid) {
            warn!("failed to send disassociation to {}: {}", format_addr(&bssid), e);
        }
        self.leave(LeaveReason::Requested)
    }

    /// The associated BSS has gone silent. Nothing is sent since nobody would hear it.
    pub fn on_bss_lost(&mut self) -> Option<AssocOutcome> {
        self.leave(LeaveReason::BssLost)
    }

    fn leave(&mut self, reason: LeaveReason) -> Option<AssocOutcome> {
        match std::mem::replace(&mut self.state, AssocState::Idle) {
            AssocState::Associated { target, peer } => {
                info!("left {}: {:?}", format_addr(&target.bssid), reason);
                Some(AssocOutcome::Left { bssid: target.bssid, reason, peer })
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    fn fail<D>(
        &mut self,
        ctx: &mut Context<D>,
        bssid: Bssid,
        reason: HandshakeFailure,
    ) -> AssocOutcome {
        self.abort_handshake(ctx);
        warn!("handshake with {} failed: {:?}", format_addr(&bssid), reason);
        AssocOutcome::HandshakeFailed { bssid, reason }
    }
}

fn send_auth_req<D: DeviceOps>(ctx: &mut Context<D>, target: &BssConfig) {
    // The armed timeout retries a request that could not be queued.
    if let Err(e) = try_send_auth_req(ctx, target) {
        warn!("failed to queue auth request: {}", e);
    }
}

fn try_send_auth_req<D: DeviceOps>(ctx: &mut Context<D>, target: &BssConfig) -> Result<(), Error> {
    let mut buf = vec![];
    let sta_addr = ctx.sta_addr();
    frame_writer::write_open_auth_frame(&mut buf, target.bssid, sta_addr, &mut ctx.seq_mgr)?;
    ctx.enqueue_mgmt(target.bssid, buf)
}

fn send_assoc_req<D: DeviceOps>(ctx: &mut Context<D>, target: &BssConfig) {
    if let Err(e) = try_send_assoc_req(ctx, target) {
        warn!("failed to queue assoc request: {}", e);
    }
}

fn try_send_assoc_req<D: DeviceOps>(
    ctx: &mut Context<D>,
    target: &BssConfig,
) -> Result<(), Error> {
    let mut buf = vec![];
    let sta_addr = ctx.sta_addr();
    let shared = CapabilityInfo::SHORT_PREAMBLE | CapabilityInfo::SHORT_SLOT_TIME;
    let capabilities = CapabilityInfo::ESS | (target.capabilities & shared);
    let rates = assoc_rates(&ctx.config.supported_rates[..], &target.basic_rates[..]);
    frame_writer::write_assoc_req_frame(
        &mut buf,
        target.bssid,
        sta_addr,
        capabilities,
        ctx.config.listen_interval,
        &target.ssid[..],
        &rates[..],
        &mut ctx.seq_mgr,
    )?;
    ctx.enqueue_mgmt(target.bssid, buf)
}

fn send_disassoc<D: DeviceOps>(ctx: &mut Context<D>, bssid: Bssid) -> Result<(), Error> {
    let mut buf = vec![];
    let sta_addr = ctx.sta_addr();
    frame_writer::write_disassoc_frame(
        &mut buf,
        bssid,
        sta_addr,
        ReasonCode::LEAVING_NETWORK_DISASSOC,
        &mut ctx.seq_mgr,
    )?;
    ctx.enqueue_mgmt(bssid, buf)
}

/// Our supported rates, flagged basic wherever the BSS requires them.
fn assoc_rates(supported: &[u8], bss_basic: &[u8]) -> Vec<u8> {
    supported
        .iter()
        .map(|rate| {
            let rate = rate & !BASIC_RATE_BIT;
            if bss_basic.iter().any(|b| b & !BASIC_RATE_BIT == rate) {
                rate | BASIC_RATE_BIT
            } else {
                rate
            }
        })
        .collect()
}
