// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    log::debug,
    std::{collections::HashMap, time::Duration},
    wlan_common::{
        mac::{format_addr, Bssid, CapabilityInfo},
        Time, TimeUnit,
    },
};

/// Upper bound on tracked networks; the least recently seen entry makes room for a new one.
pub const MAX_NETWORKS: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkInfo {
    pub bssid: Bssid,
    pub ssid: Vec<u8>,
    pub channel: u8,
    pub capabilities: CapabilityInfo,
    pub beacon_interval: TimeUnit,
    pub basic_rates: Vec<u8>,
    pub last_seen: Time,
    pub rssi_dbm: i8,
}

/// Networks discovered through beacons and probe responses, keyed by BSSID.
#[derive(Debug, Default)]
pub struct NetworkCatalog {
    networks: HashMap<Bssid, NetworkInfo>,
}

impl NetworkCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sighting. Returns true if the BSS was not in the catalog before.
    pub fn update(&mut self, info: NetworkInfo, protected: Option<Bssid>) -> bool {
        if let Some(existing) = self.networks.get_mut(&info.bssid) {
            *existing = info;
            return false;
        }
        if self.networks.len() >= MAX_NETWORKS {
            self.evict_oldest(protected);
        }
        debug!("new network {} on channel {}", format_addr(&info.bssid), info.channel);
        self.networks.insert(info.bssid, info);
        true
    }

    fn evict_oldest(&mut self, protected: Option<Bssid>) {
        let oldest = self
            .networks
            .values()
            .filter(|n| Some(n.bssid) != protected)
            .min_by_key(|n| n.last_seen)
            .map(|n| n.bssid);
        if let Some(bssid) = oldest {
            self.networks.remove(&bssid);
        }
    }

    pub fn get(&self, bssid: &Bssid) -> Option<&NetworkInfo> {
        self.networks.get(bssid)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkInfo> {
        self.networks.values()
    }

    /// Drops entries unseen for longer than `retention`. The `protected` entry, the BSS the
    /// station is joined to, is kept regardless of age.
    pub fn remove_stale(
        &mut self,
        now: Time,
        retention: Duration,
        protected: Option<Bssid>,
    ) -> usize {
        let before = self.networks.len();
        self.networks
            .retain(|bssid, n| Some(*bssid) == protected || now - n.last_seen <= retention);
        let removed = before - self.networks.len();
        if removed > 0 {
            debug!("aged out {} networks", removed);
        }
        removed
    }

    /// Best candidate to join: matching SSID and, when given, BSSID and channel. Ties go to
    /// the strongest signal.
    pub fn find_candidate(
        &self,
        ssid: &[u8],
        bssid: Option<Bssid>,
        channel: Option<u8>,
    ) -> Option<&NetworkInfo> {
        self.networks
            .values()
            .filter(|n| n.ssid == ssid)
            .filter(|n| bssid.map_or(true, |b| n.bssid == b))
            .filter(|n| channel.map_or(true, |c| n.channel == c))
            .max_by_key(|n| n.rssi_dbm)
    }
}
