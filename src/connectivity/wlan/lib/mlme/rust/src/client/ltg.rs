// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Local traffic generator: constant-rate data frames to a fixed destination, used to load the
//! link while associated.

use {
    crate::{
        client::{frame_writer::write_data_frame, Context, QueueId, Station},
        device::DeviceOps,
        config::ConfigError,
        error::Error,
    },
    byteorder::{BigEndian, ByteOrder},
    log::{debug, info},
    std::{mem::size_of, time::Duration},
    wlan_common::{
        mac::{format_addr, Bssid, EthernetIIHdr, MacAddr, MAX_ETH_FRAME_LEN},
        Time,
    },
};

/// Local experimental ethertype (IEEE Std 802-2014, 9.2.4).
pub const LTG_ETHER_TYPE: u16 = 0x88B5;

const SEQ_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LtgConfig {
    pub dst: MacAddr,
    pub payload_len: usize,
    pub interval: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LtgStats {
    pub sent: u64,
    /// Frames that found their queue full, or were due while the station was not associated.
    pub dropped: u64,
}

#[derive(Debug)]
pub struct Ltg {
    config: LtgConfig,
    next_at: Time,
    stats: LtgStats,
    seq: u32,
}

impl Ltg {
    pub fn new(config: LtgConfig, now: Time) -> Self {
        Self { config, next_at: now + config.interval, stats: LtgStats::default(), seq: 0 }
    }

    /// Number of frames due at `now`. Slots missed between two ticks are all counted so the
    /// long-term rate holds.
    fn due(&mut self, now: Time) -> u64 {
        if now < self.next_at {
            return 0;
        }
        let interval = self.config.interval.as_micros() as u64;
        let slots = 1 + (now - self.next_at).as_micros() as u64 / interval;
        self.next_at = Time::from_micros(self.next_at.into_micros() + slots * interval);
        slots
    }

    /// Payload of the next frame: a big-endian sequence number padded with a byte pattern.
    fn next_payload(&mut self) -> Vec<u8> {
        let mut payload = vec![0u8; self.config.payload_len.max(SEQ_LEN)];
        BigEndian::write_u32(&mut payload[..SEQ_LEN], self.seq);
        for (i, byte) in payload[SEQ_LEN..].iter_mut().enumerate() {
            *byte = i as u8;
        }
        payload.truncate(self.config.payload_len);
        self.seq = self.seq.wrapping_add(1);
        payload
    }
}

fn send_ltg_frame<D: DeviceOps>(
    ctx: &mut Context<D>,
    bssid: Bssid,
    dst: MacAddr,
    payload: &[u8],
) -> Result<(), Error> {
    let src = ctx.sta_addr();
    let mut buf = vec![];
    write_data_frame(&mut buf, &mut ctx.seq_mgr, bssid, src, dst, LTG_ETHER_TYPE, payload)?;
    ctx.enqueue(QueueId::for_data(&dst), bssid, buf)
}

impl<D: DeviceOps> Station<D> {
    /// Starts the traffic generator, replacing one already running. The first frame is due one
    /// interval from now. Intervals are kept in whole microseconds, so anything shorter than
    /// one is rejected.
    pub fn ltg_start(&mut self, config: LtgConfig) -> Result<(), Error> {
        if config.interval < Duration::from_micros(1) {
            return Err(ConfigError::ZeroLtgInterval.into());
        }
        if config.payload_len > MAX_ETH_FRAME_LEN - size_of::<EthernetIIHdr>() {
            return Err(ConfigError::LtgPayloadTooLong(config.payload_len).into());
        }
        info!(
            "ltg started: {} bytes to {} every {:?}",
            config.payload_len,
            format_addr(&config.dst),
            config.interval
        );
        self.ltg = Some(Ltg::new(config, self.ctx.now()));
        Ok(())
    }

    /// Stops the traffic generator and returns what it did.
    pub fn ltg_stop(&mut self) -> Option<LtgStats> {
        let stats = self.ltg.take().map(|ltg| ltg.stats);
        if let Some(stats) = stats.as_ref() {
            info!("ltg stopped: {:?}", stats);
        }
        stats
    }

    pub fn ltg_stats(&self) -> Option<LtgStats> {
        self.ltg.as_ref().map(|ltg| ltg.stats)
    }

    pub(super) fn ltg_tick(&mut self, now: Time) {
        let ltg = match self.ltg.as_mut() {
            Some(ltg) => ltg,
            None => return,
        };
        let due = ltg.due(now);
        if due == 0 {
            return;
        }
        let bssid = match self.assoc.peer() {
            Some(peer) => peer.addr,
            None => {
                debug!("ltg: {} frames due while not associated", due);
                ltg.stats.dropped += due;
                return;
            }
        };
        let dst = ltg.config.dst;
        for _ in 0..due {
            let payload = ltg.next_payload();
            match send_ltg_frame(&mut self.ctx, bssid, dst, &payload[..]) {
                Ok(()) => ltg.stats.sent += 1,
                Err(e) => {
                    debug!("ltg frame dropped: {}", e);
                    ltg.stats.dropped += 1;
                }
            }
        }
    }
}
