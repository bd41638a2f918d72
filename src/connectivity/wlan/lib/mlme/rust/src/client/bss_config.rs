// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        client::{NetworkInfo, PeerInfo, ScanParams, Station},
        device::DeviceOps,
    },
    bitflags::bitflags,
    log::{info, warn},
    wlan_common::{
        channel::Channel,
        ie::{BASIC_RATE_BIT, IE_MAX_LEN, SSID_MAX_LEN, SUPPORTED_RATES_MAX_LEN},
        mac::{self, format_addr, Bssid, CapabilityInfo},
        TimeUnit,
    },
};

// Beacon intervals below this are reserved (IEEE Std 802.11-2016, 9.4.1.3). Zero means the
// interval is not known yet.
const MIN_BEACON_INTERVAL: TimeUnit = TimeUnit(10);

bitflags! {
    /// Selects which fields of a `BssConfig` an update carries.
    pub struct UpdateMask: u32 {
        const BSSID = 1 << 0;
        const CHANNEL = 1 << 1;
        const SSID = 1 << 2;
        const BASIC_RATES = 1 << 3;
        const BEACON_INTERVAL = 1 << 4;
        const CAPABILITIES = 1 << 5;
        const ALL = Self::BSSID.bits
            | Self::CHANNEL.bits
            | Self::SSID.bits
            | Self::BASIC_RATES.bits
            | Self::BEACON_INTERVAL.bits
            | Self::CAPABILITIES.bits;
    }
}

bitflags! {
    /// Every reason an update was rejected.
    pub struct BssConfigError: u32 {
        const INVALID_BSSID = 1 << 0;
        const INSUFFICIENT_ARGUMENTS = 1 << 1;
        const INVALID_CHANNEL = 1 << 2;
        const INVALID_SSID = 1 << 3;
        const INVALID_BASIC_RATES = 1 << 4;
        const INVALID_BEACON_INTERVAL = 1 << 5;
        const INVALID_CAPABILITIES = 1 << 6;
    }
}

/// Identity and parameters of the BSS the station joins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BssConfig {
    pub bssid: Bssid,
    pub channel: u8,
    pub ssid: Vec<u8>,
    pub basic_rates: Vec<u8>,
    pub beacon_interval: TimeUnit,
    pub capabilities: CapabilityInfo,
}

impl Default for BssConfig {
    fn default() -> Self {
        Self {
            bssid: mac::NULL_ADDR,
            channel: 0,
            ssid: vec![],
            basic_rates: vec![],
            beacon_interval: TimeUnit(0),
            capabilities: CapabilityInfo::ESS,
        }
    }
}

impl BssConfig {
    pub fn from_network(network: &NetworkInfo) -> Self {
        Self {
            bssid: network.bssid,
            channel: network.channel,
            ssid: network.ssid.clone(),
            basic_rates: network.basic_rates.clone(),
            beacon_interval: network.beacon_interval,
            capabilities: network.capabilities,
        }
    }

    /// Copy of `self` with the fields selected by `mask` taken from `update`.
    pub fn merge(&self, update: &BssConfig, mask: UpdateMask) -> BssConfig {
        let mut merged = self.clone();
        if mask.contains(UpdateMask::BSSID) {
            merged.bssid = update.bssid;
        }
        if mask.contains(UpdateMask::CHANNEL) {
            merged.channel = update.channel;
        }
        if mask.contains(UpdateMask::SSID) {
            merged.ssid = update.ssid.clone();
        }
        if mask.contains(UpdateMask::BASIC_RATES) {
            merged.basic_rates = update.basic_rates.clone();
        }
        if mask.contains(UpdateMask::BEACON_INTERVAL) {
            merged.beacon_interval = update.beacon_interval;
        }
        if mask.contains(UpdateMask::CAPABILITIES) {
            merged.capabilities = update.capabilities;
        }
        merged
    }
}

/// Checks the fields of `update` selected by `mask`. A new BSSID must come with the channel and
/// SSID to join it on.
pub fn validate(update: &BssConfig, mask: UpdateMask) -> Result<(), BssConfigError> {
    let mut errors = BssConfigError::empty();
    let joining = mask.contains(UpdateMask::BSSID) && !mac::is_null(&update.bssid);
    if mask.contains(UpdateMask::BSSID) {
        if mac::is_multicast(&update.bssid) {
            errors |= BssConfigError::INVALID_BSSID;
        }
        if joining && !mask.contains(UpdateMask::CHANNEL | UpdateMask::SSID) {
            errors |= BssConfigError::INSUFFICIENT_ARGUMENTS;
        }
    }
    if mask.contains(UpdateMask::CHANNEL) && !Channel::new(update.channel).is_valid() {
        errors |= BssConfigError::INVALID_CHANNEL;
    }
    if mask.contains(UpdateMask::SSID)
        && (update.ssid.len() > SSID_MAX_LEN || (joining && update.ssid.is_empty()))
    {
        errors |= BssConfigError::INVALID_SSID;
    }
    if mask.contains(UpdateMask::BASIC_RATES)
        && (update.basic_rates.len() > SUPPORTED_RATES_MAX_LEN + IE_MAX_LEN
            || update.basic_rates.iter().any(|r| r & !BASIC_RATE_BIT == 0))
    {
        errors |= BssConfigError::INVALID_BASIC_RATES;
    }
    if mask.contains(UpdateMask::BEACON_INTERVAL)
        && update.beacon_interval != TimeUnit(0)
        && update.beacon_interval < MIN_BEACON_INTERVAL
    {
        errors |= BssConfigError::INVALID_BEACON_INTERVAL;
    }
    if mask.contains(UpdateMask::CAPABILITIES) && update.capabilities.contains(CapabilityInfo::IBSS)
    {
        errors |= BssConfigError::INVALID_CAPABILITIES;
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigureBssResult {
    Accepted,
    Rejected(BssConfigError),
    /// Nothing changed under the mask.
    NoChange,
}

/// A request to join a network by name, optionally pinned to a BSSID or channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JoinParams {
    pub ssid: Vec<u8>,
    pub bssid: Option<Bssid>,
    pub channel: Option<u8>,
}

impl JoinParams {
    fn matches(&self, config: &BssConfig) -> bool {
        self.ssid == config.ssid
            && self.bssid.map_or(true, |bssid| bssid == config.bssid)
            && self.channel.map_or(true, |channel| channel == config.channel)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinStatus {
    Accepted,
    InvalidParameters,
    ScanRequiredAndStarted,
    AlreadyConfigured,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveNetworkInfo {
    pub bss: BssConfig,
    pub peer: PeerInfo,
    /// Signal of the most recent beacon, if the BSS is in the catalog.
    pub rssi_dbm: Option<i8>,
}

impl<D: DeviceOps> Station<D> {
    /// Applies the fields of `update` selected by `mask`. A different BSSID tears down the
    /// current association and starts a handshake with the new BSS; a null BSSID only leaves.
    /// Other fields update the current target in place.
    pub fn configure_bss(&mut self, update: &BssConfig, mask: UpdateMask) -> ConfigureBssResult {
        if let Err(errors) = validate(update, mask) {
            warn!("rejected BSS config {:?}: {:?}", mask, errors);
            return ConfigureBssResult::Rejected(errors);
        }

        if mask.contains(UpdateMask::BSSID) && mac::is_null(&update.bssid) {
            if self.assoc.is_idle() && self.pending_join.is_none() {
                return ConfigureBssResult::NoChange;
            }
            self.sta_disassociate();
            return ConfigureBssResult::Accepted;
        }

        let current = match self.assoc.target() {
            Some(target) => target.clone(),
            None if mask.contains(UpdateMask::BSSID) => {
                return self.configure_new_bss(update, mask);
            }
            None => return self.configure_idle_channel(update, mask),
        };
        if mask.contains(UpdateMask::BSSID) && update.bssid != current.bssid {
            return self.configure_new_bss(update, mask);
        }

        let merged = current.merge(update, mask);
        if merged == current {
            return ConfigureBssResult::NoChange;
        }
        if merged.channel != current.channel {
            self.stop_scan();
            self.switch_channel(merged.channel);
        }
        let beacon_interval_changed = merged.beacon_interval != current.beacon_interval;
        if let Some(target) = self.assoc.target_mut() {
            *target = merged;
        }
        if beacon_interval_changed && self.assoc.is_associated() {
            self.restart_lost_bss_counter();
        }
        info!("BSS {} config updated", format_addr(&current.bssid));
        ConfigureBssResult::Accepted
    }

    fn configure_new_bss(&mut self, update: &BssConfig, mask: UpdateMask) -> ConfigureBssResult {
        // Fields the caller leaves out come from the catalog when the BSS was heard before.
        let base = self.catalog.get(&update.bssid).map(BssConfig::from_network).unwrap_or_default();
        let target = base.merge(update, mask);
        info!("joining {} on channel {}", format_addr(&target.bssid), target.channel);

        self.pending_join = None;
        self.stop_scan();
        if let Some(outcome) = self.assoc.disassociate(&mut self.ctx) {
            self.handle_assoc_outcome(outcome);
        }
        self.ctx.tx_queues.purge_all_data_tx_queue();
        self.switch_channel(target.channel);
        self.assoc.start_handshake(&mut self.ctx, target);
        ConfigureBssResult::Accepted
    }

    fn configure_idle_channel(
        &mut self,
        update: &BssConfig,
        mask: UpdateMask,
    ) -> ConfigureBssResult {
        if !mask.contains(UpdateMask::CHANNEL) || self.ctx.device.channel() == update.channel {
            return ConfigureBssResult::NoChange;
        }
        self.stop_scan();
        self.switch_channel(update.channel);
        ConfigureBssResult::Accepted
    }

    fn switch_channel(&mut self, channel: u8) {
        if self.ctx.device.channel() == channel {
            return;
        }
        info!("switching to channel {}", channel);
        if let Err(e) = self.ctx.device.set_channel(channel) {
            warn!("failed to switch to channel {}: {}", channel, e);
        }
    }

    /// Joins the best known network matching `params`, scanning for it first when neither the
    /// catalog nor the parameters identify a BSS.
    pub fn join(&mut self, params: JoinParams) -> JoinStatus {
        if params.ssid.is_empty()
            || params.ssid.len() > SSID_MAX_LEN
            || params.bssid.map_or(false, |b| mac::is_multicast(&b) || mac::is_null(&b))
            || params.channel.map_or(false, |c| !Channel::new(c).is_valid())
        {
            return JoinStatus::InvalidParameters;
        }
        if self.assoc.target().map_or(false, |target| params.matches(target)) {
            return JoinStatus::AlreadyConfigured;
        }

        let candidate = self
            .catalog
            .find_candidate(&params.ssid[..], params.bssid, params.channel)
            .map(BssConfig::from_network);
        let result = match (candidate, params.bssid, params.channel) {
            (Some(config), _, _) => self.configure_bss(&config, UpdateMask::ALL),
            (None, Some(bssid), Some(channel)) => {
                let config =
                    BssConfig { bssid, channel, ssid: params.ssid.clone(), ..Default::default() };
                let mask = UpdateMask::BSSID | UpdateMask::CHANNEL | UpdateMask::SSID;
                self.configure_bss(&config, mask)
            }
            _ => {
                self.start_join_scan(params);
                return JoinStatus::ScanRequiredAndStarted;
            }
        };
        match result {
            ConfigureBssResult::Rejected(_) => JoinStatus::InvalidParameters,
            _ => JoinStatus::Accepted,
        }
    }

    fn start_join_scan(&mut self, params: JoinParams) {
        info!("{} not in catalog, scanning", String::from_utf8_lossy(&params.ssid[..]));
        // A join replaces whatever network the station was on.
        if let Some(outcome) = self.assoc.disassociate(&mut self.ctx) {
            self.handle_assoc_outcome(outcome);
        }
        let scan_params = ScanParams {
            ssid: params.ssid.clone(),
            channels: params.channel.map(|channel| vec![channel]).unwrap_or_default(),
        };
        let notifications = self.scanner.start(&mut self.ctx, scan_params);
        self.pending_join = Some(params);
        self.process_scan_notifications(notifications);
    }

    /// Called after every catalog update. A targeted scan stops once its network shows up,
    /// and a pending join proceeds with it.
    pub(super) fn join_scan_result(&mut self) {
        let ssid = match self.scanner.target_ssid() {
            Some(ssid) => ssid.to_vec(),
            None => return,
        };
        let (bssid, channel) = match &self.pending_join {
            Some(params) => (params.bssid, params.channel),
            None => (None, None),
        };
        let config = match self.catalog.find_candidate(&ssid[..], bssid, channel) {
            Some(network) => BssConfig::from_network(network),
            None => return,
        };
        info!("scan found {}", format_addr(&config.bssid));
        self.stop_scan();
        if self.pending_join.take().is_some() {
            if let ConfigureBssResult::Rejected(errors) =
                self.configure_bss(&config, UpdateMask::ALL)
            {
                warn!("cannot join {}: {:?}", format_addr(&config.bssid), errors);
            }
        }
    }

    /// The network the station is associated with, if any.
    pub fn active_network_info(&self) -> Option<ActiveNetworkInfo> {
        let peer = self.assoc.peer()?.clone();
        let bss = self.assoc.target()?.clone();
        let rssi_dbm = self.catalog.get(&bss.bssid).map(|network| network.rssi_dbm);
        Some(ActiveNetworkInfo { bss, peer, rssi_dbm })
    }
}
