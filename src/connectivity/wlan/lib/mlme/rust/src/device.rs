// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{client::QueueId, error::Error},
    wlan_common::{mac::MacAddr, Time},
};

/// Parameters the radio applies to a single transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxParams {
    /// Number of retransmissions the radio may attempt before giving up on an acknowledgment.
    pub max_retries: u8,
}

/// Per-frame metadata the radio reports alongside a received MPDU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RxInfo {
    pub channel: u8,
    pub rssi_dbm: i8,
}

/// Outcome of one frame handed to the radio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxStatus {
    pub queue_id: QueueId,
    pub dst: MacAddr,
    pub success: bool,
    /// Transmissions the radio made, including the first one.
    pub attempts: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Station,
}

/// Status codes shown on the platform's status display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayStatus {
    Identify,
    ApplicationRole(Role),
    /// The association id assigned by the AP; zero once the station has left its BSS.
    MemberListUpdate { aid: u16 },
    ManagementConfigured,
    CpuError(u32),
}

/// The platform collaborator the station MAC drives. Every call is fire-and-forget: completions
/// come back later as driver events.
pub trait DeviceOps {
    /// Current time on the platform's monotonic microsecond counter.
    fn now(&self) -> Time;

    fn mac_addr(&self) -> MacAddr;

    fn channel(&self) -> u8;

    fn set_channel(&mut self, channel: u8) -> Result<(), Error>;

    fn send_wlan_frame(
        &mut self,
        queue_id: QueueId,
        bytes: &[u8],
        params: TxParams,
    ) -> Result<(), Error>;

    /// Hands a decoded Ethernet II frame to the data bridge.
    fn deliver_eth_frame(&mut self, bytes: &[u8]) -> Result<(), Error>;

    fn display_status(&mut self, status: DisplayStatus);
}
