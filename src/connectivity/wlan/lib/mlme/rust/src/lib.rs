// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! This crate implements the control plane of an IEEE Std 802.11-2016 infrastructure station
//! for a SoftMAC radio: scanning, the network catalog, the authentication and association
//! handshake, transmit queueing and receive classification. See the [`client`] module.
//!
//! The station is single-threaded. Every input arrives as a [`DriverEvent`] and is handled to
//! completion by [`sta_main_loop`] before the next one is looked at.
//!
//! [`client`]: crate::client

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod sink;
pub mod timer;

pub use wlan_common as common;

use {
    crate::{
        client::{
            ActiveNetworkInfo, BssConfig, ConfigureBssResult, JoinParams, JoinStatus, LtgConfig,
            LtgStats, ScanParams, Station, UpdateMask,
        },
        config::StationConfig,
        device::{DeviceOps, RxInfo, TxStatus},
    },
    anyhow::{bail, format_err},
    futures::{
        channel::{mpsc, oneshot},
        StreamExt,
    },
    log::{debug, error, info},
};

/// Error code shown on the status display when the main loop dies.
const MAIN_LOOP_CPU_ERROR: u32 = 1;

/// Operations requested by the layer above the station. Each carries a responder for its
/// result; a dropped receiver is not an error.
#[derive(Debug)]
pub enum StationRequest {
    Join { params: JoinParams, responder: oneshot::Sender<JoinStatus> },
    ConfigureBss {
        config: BssConfig,
        mask: UpdateMask,
        responder: oneshot::Sender<ConfigureBssResult>,
    },
    Disassociate { responder: oneshot::Sender<()> },
    Scan { params: ScanParams, responder: oneshot::Sender<Result<(), error::Error>> },
    StopScan,
    ActiveNetworkInfo { responder: oneshot::Sender<Option<ActiveNetworkInfo>> },
    ApplyConfig { config: StationConfig, responder: oneshot::Sender<Result<(), error::Error>> },
    Identify,
    LtgStart { config: LtgConfig, responder: oneshot::Sender<Result<(), error::Error>> },
    LtgStop { responder: oneshot::Sender<Option<LtgStats>> },
}

#[derive(Debug)]
pub enum DriverEvent {
    // Indicates that the device is being removed and our main loop should exit.
    Stop,
    // Periodic tick from the platform timer. Drives timeouts and transmission.
    Tick,
    // Indicates receipt of a MAC frame from a peer.
    MacFrameRx { bytes: Vec<u8>, rx_info: RxInfo },
    // Requests transmission of an ethernet frame over the air.
    EthFrameTx { bytes: Vec<u8> },
    // Reports the result of an attempted frame transmission.
    TxStatusReport { tx_status: TxStatus },
    Request(StationRequest),
}

// DriverEventSink is used by the platform to feed our main loop. Interrupt handlers, the data
// bridge and the layer above all convert their input to DriverEvents and send them through a
// copy of this sink, where they are handled serially.
#[derive(Clone, Debug)]
pub struct DriverEventSink(pub mpsc::UnboundedSender<DriverEvent>);

impl DriverEventSink {
    pub fn send(&self, event: DriverEvent) -> Result<(), anyhow::Error> {
        self.0.unbounded_send(event).map_err(|e| format_err!("main loop is gone: {}", e))
    }

    pub fn tick(&self) -> Result<(), anyhow::Error> {
        self.send(DriverEvent::Tick)
    }

    pub fn mac_frame_rx(&self, bytes: &[u8], rx_info: RxInfo) -> Result<(), anyhow::Error> {
        self.send(DriverEvent::MacFrameRx { bytes: bytes.to_vec(), rx_info })
    }

    pub fn eth_frame_tx(&self, bytes: &[u8]) -> Result<(), anyhow::Error> {
        self.send(DriverEvent::EthFrameTx { bytes: bytes.to_vec() })
    }

    pub fn request(&self, request: StationRequest) -> Result<(), anyhow::Error> {
        self.send(DriverEvent::Request(request))
    }
}

/// Runs the station until `DriverEvent::Stop`. Returns an error, after showing it on the status
/// display, if the event stream ends without one.
pub async fn sta_main_loop<D: DeviceOps>(
    mut station: Station<D>,
    driver_event_stream: mpsc::UnboundedReceiver<DriverEvent>,
) -> Result<(), anyhow::Error> {
    let result = main_loop_impl(&mut station, driver_event_stream).await;
    match &result {
        Ok(()) => info!("station event loop exited gracefully."),
        Err(e) => {
            error!("station event loop exited with error: {:?}", e);
            station.report_cpu_error(MAIN_LOOP_CPU_ERROR);
        }
    }
    result
}

async fn main_loop_impl<D: DeviceOps>(
    station: &mut Station<D>,
    mut driver_event_stream: mpsc::UnboundedReceiver<DriverEvent>,
) -> Result<(), anyhow::Error> {
    while let Some(event) = driver_event_stream.next().await {
        match event {
            // DriverEvent::Stop indicates a safe shutdown.
            DriverEvent::Stop => return Ok(()),
            DriverEvent::Tick => {
                // Whatever is already queued happened before this tick.
                loop {
                    match driver_event_stream.try_next() {
                        Ok(Some(DriverEvent::Stop)) => return Ok(()),
                        Ok(Some(DriverEvent::Tick)) => (),
                        Ok(Some(event)) => handle_driver_event(station, event),
                        Ok(None) | Err(_) => break,
                    }
                }
                station.handle_tick();
            }
            event => handle_driver_event(station, event),
        }
    }
    bail!("Driver event stream terminated unexpectedly.")
}

fn handle_driver_event<D: DeviceOps>(station: &mut Station<D>, event: DriverEvent) {
    match event {
        DriverEvent::MacFrameRx { bytes, rx_info } => {
            let disposition = station.handle_mac_frame_rx(&bytes[..], rx_info);
            debug!("rx {} bytes: {:?}", bytes.len(), disposition);
        }
        DriverEvent::EthFrameTx { bytes } => {
            if let Err(e) = station.ethernet_receive(&bytes[..]) {
                info!("Failed to handle eth frame: {}", e);
            }
        }
        DriverEvent::TxStatusReport { tx_status } => station.handle_tx_status(tx_status),
        DriverEvent::Request(request) => handle_request(station, request),
        DriverEvent::Stop | DriverEvent::Tick => (),
    }
}

fn respond<T>(responder: oneshot::Sender<T>, value: T) {
    if responder.send(value).is_err() {
        debug!("requester went away before the response");
    }
}

fn handle_request<D: DeviceOps>(station: &mut Station<D>, request: StationRequest) {
    match request {
        StationRequest::Join { params, responder } => respond(responder, station.join(params)),
        StationRequest::ConfigureBss { config, mask, responder } => {
            respond(responder, station.configure_bss(&config, mask))
        }
        StationRequest::Disassociate { responder } => {
            station.sta_disassociate();
            respond(responder, ());
        }
        StationRequest::Scan { params, responder } => {
            respond(responder, station.start_scan(params))
        }
        StationRequest::StopScan => station.stop_scan(),
        StationRequest::ActiveNetworkInfo { responder } => {
            respond(responder, station.active_network_info())
        }
        StationRequest::ApplyConfig { config, responder } => {
            respond(responder, station.apply_config(config))
        }
        StationRequest::Identify => station.identify(),
        StationRequest::LtgStart { config, responder } => {
            respond(responder, station.ltg_start(config))
        }
        StationRequest::LtgStop { responder } => respond(responder, station.ltg_stop()),
    }
}
