// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    serde::{Deserialize, Serialize},
    std::time::Duration,
    thiserror::Error,
    wlan_common::channel::Channel,
};

pub const MAX_TX_QUEUE_LEN: usize = 150;
pub const NUM_PROBE_REQ: u8 = 5;
pub const ACTIVE_SCAN_DWELL: Duration = Duration::from_millis(100);
pub const ACTIVE_SCAN_UPDATE_RATE: Duration = Duration::from_secs(5);
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(100);
pub const HANDSHAKE_MAX_TRIES: u8 = 5;

// 802.11b/g rates in units of 500 kb/s.
const DEFAULT_SUPPORTED_RATES: [u8; 12] = [2, 4, 11, 22, 12, 18, 24, 36, 48, 72, 96, 108];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tx queues must hold at least one frame")]
    ZeroQueueLength,
    #[error("no scan channels configured")]
    NoScanChannels,
    #[error("invalid scan channel {0}")]
    InvalidScanChannel(u8),
    #[error("at least one probe request per channel is required")]
    ZeroProbes,
    #[error("handshake needs at least one try per step")]
    ZeroTries,
    #[error("scan cycle of {cycle:?} does not fit in update rate {update_rate:?}")]
    ScanCycleTooLong { cycle: Duration, update_rate: Duration },
    #[error("no supported rates configured")]
    NoSupportedRates,
    #[error("traffic generator interval must be at least one microsecond")]
    ZeroLtgInterval,
    #[error("traffic generator payload of {0} bytes does not fit in a frame")]
    LtgPayloadTooLong(usize),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Tunables of the station MAC. Every field has a default, so a JSON document only needs to
/// name the fields it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    pub max_tx_queue_len: usize,
    #[serde(rename = "auth_timeout_ms", with = "duration_millis")]
    pub auth_timeout: Duration,
    pub auth_max_tries: u8,
    #[serde(rename = "assoc_timeout_ms", with = "duration_millis")]
    pub assoc_timeout: Duration,
    pub assoc_max_tries: u8,
    pub num_probe_req: u8,
    #[serde(rename = "active_scan_dwell_ms", with = "duration_millis")]
    pub active_scan_dwell: Duration,
    #[serde(rename = "active_scan_update_rate_ms", with = "duration_millis")]
    pub active_scan_update_rate: Duration,
    pub scan_channels: Vec<u8>,
    /// Retry budget handed to the radio with every transmitted frame.
    pub tx_max_retries: u8,
    #[serde(rename = "network_retention_ms", with = "duration_millis")]
    pub network_retention: Duration,
    pub lost_bss_beacon_count: u32,
    pub supported_rates: Vec<u8>,
    pub listen_interval: u16,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            max_tx_queue_len: MAX_TX_QUEUE_LEN,
            auth_timeout: HANDSHAKE_TIMEOUT,
            auth_max_tries: HANDSHAKE_MAX_TRIES,
            assoc_timeout: HANDSHAKE_TIMEOUT,
            assoc_max_tries: HANDSHAKE_MAX_TRIES,
            num_probe_req: NUM_PROBE_REQ,
            active_scan_dwell: ACTIVE_SCAN_DWELL,
            active_scan_update_rate: ACTIVE_SCAN_UPDATE_RATE,
            scan_channels: (1..=11).collect(),
            tx_max_retries: 7,
            network_retention: Duration::from_secs(10),
            lost_bss_beacon_count: 100,
            supported_rates: DEFAULT_SUPPORTED_RATES.to_vec(),
            listen_interval: 1,
        }
    }
}

impl StationConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tx_queue_len == 0 {
            return Err(ConfigError::ZeroQueueLength);
        }
        if self.scan_channels.is_empty() {
            return Err(ConfigError::NoScanChannels);
        }
        if let Some(chan) = self.scan_channels.iter().find(|c| !Channel::new(**c).is_valid()) {
            return Err(ConfigError::InvalidScanChannel(*chan));
        }
        if self.num_probe_req == 0 {
            return Err(ConfigError::ZeroProbes);
        }
        if self.auth_max_tries == 0 || self.assoc_max_tries == 0 {
            return Err(ConfigError::ZeroTries);
        }
        if self.supported_rates.is_empty() {
            return Err(ConfigError::NoSupportedRates);
        }
        let cycle = self.scan_cycle_duration();
        if cycle >= self.active_scan_update_rate {
            return Err(ConfigError::ScanCycleTooLong {
                cycle,
                update_rate: self.active_scan_update_rate,
            });
        }
        Ok(())
    }

    /// Time one pass over every scan channel keeps the radio off the BSS channel.
    pub fn scan_cycle_duration(&self) -> Duration {
        self.cycle_duration(self.scan_channels.len())
    }

    /// Time a pass over `channels` channels keeps the radio off the BSS channel.
    pub fn cycle_duration(&self, channels: usize) -> Duration {
        let channels = channels as u32;
        self.active_scan_dwell.checked_mul(channels).unwrap_or(Duration::from_secs(u64::MAX))
    }

    pub fn with_scan_channels(mut self, channels: Vec<u8>) -> Self {
        self.scan_channels = channels;
        self
    }

    pub fn with_active_scan(
        mut self,
        dwell: Duration,
        num_probe_req: u8,
        update_rate: Duration,
    ) -> Self {
        self.active_scan_dwell = dwell;
        self.num_probe_req = num_probe_req;
        self.active_scan_update_rate = update_rate;
        self
    }

    pub fn with_max_tx_queue_len(mut self, len: usize) -> Self {
        self.max_tx_queue_len = len;
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration, max_tries: u8) -> Self {
        self.auth_timeout = timeout;
        self.auth_max_tries = max_tries;
        self
    }

    pub fn with_assoc_timeout(mut self, timeout: Duration, max_tries: u8) -> Self {
        self.assoc_timeout = timeout;
        self.assoc_max_tries = max_tries;
        self
    }

    pub fn with_network_retention(mut self, retention: Duration) -> Self {
        self.network_retention = retention;
        self
    }

    pub fn with_lost_bss_beacon_count(mut self, count: u32) -> Self {
        self.lost_bss_beacon_count = count;
        self
    }
}

mod duration_millis {
    use {
        serde::{Deserialize, Deserializer, Serializer},
        std::{convert::TryFrom, time::Duration},
    };

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
