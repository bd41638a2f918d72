// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        client::{frame_writer::write_probe_req_frame, Context, QueueId, TimedEvent},
        config::{ConfigError, StationConfig},
        device::{DeviceOps, TxParams},
        error::Error,
        timer::EventId,
    },
    log::{debug, info, warn},
    wlan_common::{channel::Channel, Time},
};

/// State reported to the rest of the station whenever the engine moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// The radio is free for BSS traffic, either because no scan runs or because a repeating
    /// scan waits for its next cycle.
    Inactive,
    Scanning { channel_idx: usize, probes_sent: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanNotification {
    StateChanged(ScanState),
    CycleComplete,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanParams {
    /// SSID to probe for. Empty probes with the wildcard SSID.
    pub ssid: Vec<u8>,
    /// Channels to visit in order. Empty uses the configured scan channels.
    pub channels: Vec<u8>,
}

impl ScanParams {
    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn targeted(ssid: Vec<u8>) -> Self {
        Self { ssid, channels: vec![] }
    }

    /// Scans for a specific SSID repeat until the network is found or the scan is stopped;
    /// wildcard scans make a single pass.
    pub fn is_targeted(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Checks an explicit channel list the way the configured one is checked: every channel
    /// must exist and one pass over all of them must end before the next cycle is due.
    pub fn validate(&self, config: &StationConfig) -> Result<(), ConfigError> {
        if let Some(chan) = self.channels.iter().find(|c| !Channel::new(**c).is_valid()) {
            return Err(ConfigError::InvalidScanChannel(*chan));
        }
        let cycle = config.cycle_duration(self.channels.len());
        if cycle >= config.active_scan_update_rate {
            return Err(ConfigError::ScanCycleTooLong {
                cycle,
                update_rate: config.active_scan_update_rate,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScanCursor {
    channel_idx: usize,
    probes_sent: u8,
    dwell_start: Time,
    cycle_start: Time,
    timeout: EventId,
}

#[derive(Debug)]
enum Phase {
    Inactive,
    Scanning(ScanCursor),
    /// A targeted scan finished a cycle and waits for the update rate to elapse.
    Waiting { timeout: EventId },
}

/// Active scan engine. Visits each channel for one dwell window, spreading probe requests
/// evenly across it, and leaves the radio on the BSS channel between cycles.
#[derive(Debug)]
pub struct Scanner {
    phase: Phase,
    params: ScanParams,
    home_channel: Option<u8>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self { phase: Phase::Inactive, params: ScanParams::default(), home_channel: None }
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        match &self.phase {
            Phase::Scanning(cursor) => ScanState::Scanning {
                channel_idx: cursor.channel_idx,
                probes_sent: cursor.probes_sent,
            },
            _ => ScanState::Inactive,
        }
    }

    /// True while the radio is tuned away from the BSS channel.
    pub fn is_scanning(&self) -> bool {
        match self.phase {
            Phase::Scanning(_) => true,
            _ => false,
        }
    }

    /// True from start() until the scan completes or is stopped, including between cycles.
    pub fn is_active(&self) -> bool {
        match self.phase {
            Phase::Inactive => false,
            _ => true,
        }
    }

    pub fn target_ssid(&self) -> Option<&[u8]> {
        if self.is_active() && self.params.is_targeted() {
            Some(&self.params.ssid[..])
        } else {
            None
        }
    }

    /// Starts a new scan, replacing any scan in progress.
    pub fn start<D: DeviceOps>(
        &mut self,
        ctx: &mut Context<D>,
        mut params: ScanParams,
    ) -> Vec<ScanNotification> {
        if params.channels.is_empty() {
            params.channels = ctx.config.scan_channels.clone();
        }
        self.cancel_timeout(ctx);
        if !self.is_scanning() {
            self.home_channel = Some(ctx.device.channel());
        }
        info!(
            "starting {} scan over {} channels",
            if params.is_targeted() { "targeted" } else { "wildcard" },
            params.channels.len()
        );
        self.params = params;
        let now = ctx.now();
        vec![self.enter_channel(ctx, 0, now)]
    }

    /// Stops scanning and returns the radio to the BSS channel.
    pub fn stop<D: DeviceOps>(&mut self, ctx: &mut Context<D>) -> Vec<ScanNotification> {
        if !self.is_active() {
            return vec![];
        }
        let was_scanning = self.is_scanning();
        self.cancel_timeout(ctx);
        self.phase = Phase::Inactive;
        self.restore_home_channel(ctx);
        info!("scan stopped");
        if was_scanning {
            vec![ScanNotification::StateChanged(ScanState::Inactive)]
        } else {
            vec![]
        }
    }

    pub fn handle_timeout<D: DeviceOps>(
        &mut self,
        ctx: &mut Context<D>,
        event_id: EventId,
    ) -> Vec<ScanNotification> {
        match self.phase {
            Phase::Scanning(cursor) if cursor.timeout == event_id => self.advance(ctx, cursor),
            Phase::Waiting { timeout } if timeout == event_id => {
                let now = ctx.now();
                vec![self.enter_channel(ctx, 0, now)]
            }
            _ => {
                debug!("ignoring stale scan timeout");
                vec![]
            }
        }
    }

    fn advance<D: DeviceOps>(
        &mut self,
        ctx: &mut Context<D>,
        mut cursor: ScanCursor,
    ) -> Vec<ScanNotification> {
        if cursor.probes_sent < ctx.config.num_probe_req {
            self.send_probe(ctx, cursor.channel_idx);
            cursor.probes_sent += 1;
            cursor.timeout = schedule_next(ctx, cursor.dwell_start, cursor.probes_sent);
            self.phase = Phase::Scanning(cursor);
            return vec![ScanNotification::StateChanged(ScanState::Scanning {
                channel_idx: cursor.channel_idx,
                probes_sent: cursor.probes_sent,
            })];
        }

        // Dwell over.
        let next_idx = cursor.channel_idx + 1;
        if next_idx < self.params.channels.len() {
            return vec![self.enter_channel(ctx, next_idx, cursor.cycle_start)];
        }

        self.restore_home_channel_keep(ctx);
        let mut notifications = vec![ScanNotification::CycleComplete];
        if self.params.is_targeted() {
            // The BSS channel gets at least one dwell before the next cycle, even when the
            // cycle overran the update rate.
            let earliest = ctx.now() + ctx.config.active_scan_dwell;
            let deadline =
                std::cmp::max(cursor.cycle_start + ctx.config.active_scan_update_rate, earliest);
            let timeout = ctx.timer.schedule_at(deadline, TimedEvent::Scan);
            debug!("scan cycle complete, next cycle at {:?}", deadline);
            self.phase = Phase::Waiting { timeout };
        } else {
            info!("scan complete");
            self.phase = Phase::Inactive;
            self.home_channel = None;
        }
        notifications.push(ScanNotification::StateChanged(ScanState::Inactive));
        notifications
    }

    fn enter_channel<D: DeviceOps>(
        &mut self,
        ctx: &mut Context<D>,
        channel_idx: usize,
        cycle_start: Time,
    ) -> ScanNotification {
        let channel = self.params.channels[channel_idx];
        if let Err(e) = ctx.device.set_channel(channel) {
            warn!("failed to tune to scan channel {}: {}", channel, e);
        }
        self.send_probe(ctx, channel_idx);
        let dwell_start = ctx.now();
        let timeout = schedule_next(ctx, dwell_start, 1);
        self.phase = Phase::Scanning(ScanCursor {
            channel_idx,
            probes_sent: 1,
            dwell_start,
            cycle_start,
            timeout,
        });
        ScanNotification::StateChanged(ScanState::Scanning { channel_idx, probes_sent: 1 })
    }

    fn send_probe<D: DeviceOps>(&self, ctx: &mut Context<D>, channel_idx: usize) {
        if let Err(e) = self.try_send_probe(ctx, channel_idx) {
            warn!("failed to send probe request: {}", e);
        }
    }

    fn try_send_probe<D: DeviceOps>(
        &self,
        ctx: &mut Context<D>,
        channel_idx: usize,
    ) -> Result<(), Error> {
        let mut buf = vec![];
        let sta_addr = ctx.device.mac_addr();
        write_probe_req_frame(
            &mut buf,
            sta_addr,
            &self.params.ssid[..],
            &ctx.config.supported_rates[..],
            self.params.channels[channel_idx],
            &mut ctx.seq_mgr,
        )?;
        // Probes bypass the queues, which are suspended while the radio is off-channel.
        ctx.device.send_wlan_frame(QueueId::Management, &buf[..], TxParams { max_retries: 0 })
    }

    fn cancel_timeout<D>(&mut self, ctx: &mut Context<D>) {
        match self.phase {
            Phase::Scanning(ScanCursor { timeout, .. }) | Phase::Waiting { timeout } => {
                ctx.timer.cancel_event(timeout)
            }
            Phase::Inactive => (),
        }
    }

    fn restore_home_channel<D: DeviceOps>(&mut self, ctx: &mut Context<D>) {
        self.restore_home_channel_keep(ctx);
        self.home_channel = None;
    }

    /// Returns to the BSS channel but remembers it for the next cycle.
    fn restore_home_channel_keep<D: DeviceOps>(&mut self, ctx: &mut Context<D>) {
        if let Some(channel) = self.home_channel {
            if ctx.device.channel() != channel {
                if let Err(e) = ctx.device.set_channel(channel) {
                    warn!("failed to return to channel {}: {}", channel, e);
                }
            }
        }
    }
}

/// Probes are spaced evenly over the dwell window; the deadline after the last probe is the end
/// of the dwell.
fn schedule_next<D>(ctx: &mut Context<D>, dwell_start: Time, probes_sent: u8) -> EventId {
    let interval = ctx.config.active_scan_dwell / ctx.config.num_probe_req as u32;
    ctx.timer.schedule_at(dwell_start + interval * probes_sent as u32, TimedEvent::Scan)
}
