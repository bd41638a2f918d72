// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{
        device::{DeviceOps, TxParams},
        error::Error,
    },
    log::{debug, warn},
    std::collections::VecDeque,
    wlan_common::{
        mac::{is_multicast, MacAddr},
        Time,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueId {
    Multicast = 0,
    Management = 1,
    Unicast = 2,
}

impl QueueId {
    /// Strict priority: management frames are never starved by a data backlog.
    pub const SERVICE_ORDER: [QueueId; 3] =
        [QueueId::Management, QueueId::Unicast, QueueId::Multicast];

    /// Queue a data frame for `da` belongs on.
    pub fn for_data(da: &MacAddr) -> Self {
        if is_multicast(da) {
            QueueId::Multicast
        } else {
            QueueId::Unicast
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn is_data(self) -> bool {
        self != QueueId::Management
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedFrame {
    pub queue_id: QueueId,
    /// Receiver address of the frame, used to purge frames addressed to a departing peer.
    pub dst: MacAddr,
    pub bytes: Vec<u8>,
    pub max_retries: u8,
    pub enqueued_at: Time,
}

/// What the station's state allows the scheduler to send right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxGate {
    pub scanning: bool,
    pub associated: bool,
}

impl TxGate {
    fn permits(&self, queue_id: QueueId) -> bool {
        !self.scanning && (self.associated || !queue_id.is_data())
    }
}

/// Three bounded FIFO queues feeding the radio, one frame at a time.
#[derive(Debug)]
pub struct TxQueueManager {
    queues: [VecDeque<QueuedFrame>; 3],
    max_len: usize,
}

impl TxQueueManager {
    pub fn new(max_len: usize) -> Self {
        Self { queues: [VecDeque::new(), VecDeque::new(), VecDeque::new()], max_len }
    }

    pub fn enqueue(&mut self, frame: QueuedFrame) -> Result<(), Error> {
        let queue_id = frame.queue_id;
        let queue = &mut self.queues[queue_id.index()];
        if queue.len() >= self.max_len {
            debug!("tx queue {:?} full, dropping frame to {:02x?}", queue_id, frame.dst);
            return Err(Error::QueueFull(queue_id));
        }
        queue.push_back(frame);
        Ok(())
    }

    /// Frames already queued beyond a lowered bound stay; only new frames are refused.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
    }

    pub fn len(&self, queue_id: QueueId) -> usize {
        self.queues[queue_id.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }

    pub fn is_full(&self, queue_id: QueueId) -> bool {
        self.len(queue_id) >= self.max_len
    }

    /// Removes the frame the scheduler would service next under `gate`.
    pub fn dequeue_next(&mut self, gate: TxGate) -> Option<QueuedFrame> {
        let queue_id = QueueId::SERVICE_ORDER
            .iter()
            .cloned()
            .find(|id| gate.permits(*id) && !self.queues[id.index()].is_empty())?;
        self.queues[queue_id.index()].pop_front()
    }

    /// Hands at most one frame to the radio. The frame leaves its queue whether or not the
    /// radio accepts it; delivery results arrive later as tx status reports.
    pub fn poll_tx_queues<D: DeviceOps>(
        &mut self,
        device: &mut D,
        gate: TxGate,
    ) -> Result<Option<QueueId>, Error> {
        let frame = match self.dequeue_next(gate) {
            Some(frame) => frame,
            None => return Ok(None),
        };
        let params = TxParams { max_retries: frame.max_retries };
        device.send_wlan_frame(frame.queue_id, &frame.bytes[..], params).map_err(|e| {
            warn!("radio refused frame from queue {:?}: {}", frame.queue_id, e);
            e
        })?;
        Ok(Some(frame.queue_id))
    }

    /// Empties the unicast and multicast queues. Management frames stay so that an in-flight
    /// handshake is not disrupted.
    pub fn purge_all_data_tx_queue(&mut self) -> usize {
        let purged = self.len(QueueId::Unicast) + self.len(QueueId::Multicast);
        self.queues[QueueId::Unicast.index()].clear();
        self.queues[QueueId::Multicast.index()].clear();
        if purged > 0 {
            debug!("purged {} queued data frames", purged);
        }
        purged
    }

    /// Drops queued management frames addressed to `peer`.
    pub fn purge_mgmt_to(&mut self, peer: &MacAddr) -> usize {
        let queue = &mut self.queues[QueueId::Management.index()];
        let before = queue.len();
        queue.retain(|frame| frame.dst != *peer);
        before - queue.len()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::device::test_utils::FakeDevice,
        test_case::test_case,
        wlan_common::assert_variant,
    };

    const ASSOCIATED: TxGate = TxGate { scanning: false, associated: true };
    const IDLE: TxGate = TxGate { scanning: false, associated: false };
    const SCANNING: TxGate = TxGate { scanning: true, associated: true };

    fn frame(queue_id: QueueId, tag: u8) -> QueuedFrame {
        QueuedFrame {
            queue_id,
            dst: [tag; 6],
            bytes: vec![tag],
            max_retries: 7,
            enqueued_at: Time::from_micros(0),
        }
    }

    #[test_case([0x02, 0, 0, 0, 0, 1], QueueId::Unicast; "unicast")]
    #[test_case([0x01, 0, 0x5e, 0, 0, 1], QueueId::Multicast; "multicast")]
    #[test_case([0xff; 6], QueueId::Multicast; "broadcast")]
    fn data_queue_by_destination(da: MacAddr, expected: QueueId) {
        assert_eq!(QueueId::for_data(&da), expected);
    }

    #[test]
    fn lowered_bound_applies_to_new_frames() {
        let mut queues = TxQueueManager::new(3);
        for i in 0..3 {
            queues.enqueue(frame(QueueId::Unicast, i)).expect("queue has room");
        }
        queues.set_max_len(1);
        assert_eq!(queues.len(QueueId::Unicast), 3);
        assert!(queues.enqueue(frame(QueueId::Unicast, 4)).is_err());
        queues.enqueue(frame(QueueId::Management, 5)).expect("mgmt queue has room");
        assert!(queues.enqueue(frame(QueueId::Management, 6)).is_err());
    }

    #[test]
    fn enqueue_fails_when_full() {
        let mut queues = TxQueueManager::new(150);
        for i in 0..150 {
            queues.enqueue(frame(QueueId::Unicast, i as u8)).expect("queue has room");
        }
        assert!(queues.is_full(QueueId::Unicast));
        assert_variant!(
            queues.enqueue(frame(QueueId::Unicast, 0)),
            Err(Error::QueueFull(QueueId::Unicast))
        );
        // Other queues are independent.
        queues.enqueue(frame(QueueId::Management, 0)).expect("mgmt queue has room");

        let first = queues.dequeue_next(ASSOCIATED);
        assert_eq!(first.map(|f| f.queue_id), Some(QueueId::Management));
        assert_variant!(
            queues.enqueue(frame(QueueId::Unicast, 0)),
            Err(Error::QueueFull(QueueId::Unicast))
        );
        assert_eq!(queues.dequeue_next(ASSOCIATED).map(|f| f.bytes), Some(vec![0]));
        queues.enqueue(frame(QueueId::Unicast, 0)).expect("room after dequeue");
    }

    #[test]
    fn management_served_before_data() {
        let mut queues = TxQueueManager::new(150);
        for i in 0..5 {
            queues.enqueue(frame(QueueId::Unicast, i)).expect("enqueue unicast");
        }
        queues.enqueue(frame(QueueId::Multicast, 9)).expect("enqueue multicast");
        queues.enqueue(frame(QueueId::Management, 42)).expect("enqueue mgmt");

        let order: Vec<_> =
            std::iter::from_fn(|| queues.dequeue_next(ASSOCIATED)).map(|f| f.bytes[0]).collect();
        assert_eq!(order, vec![42, 0, 1, 2, 3, 4, 9]);
    }

    #[test]
    fn data_held_until_associated() {
        let mut queues = TxQueueManager::new(10);
        queues.enqueue(frame(QueueId::Unicast, 1)).expect("enqueue unicast");
        queues.enqueue(frame(QueueId::Multicast, 2)).expect("enqueue multicast");
        assert!(queues.dequeue_next(IDLE).is_none());

        queues.enqueue(frame(QueueId::Management, 3)).expect("enqueue mgmt");
        assert_eq!(queues.dequeue_next(IDLE).map(|f| f.bytes[0]), Some(3));
        assert!(queues.dequeue_next(IDLE).is_none());
        assert_eq!(queues.len(QueueId::Unicast), 1);
    }

    #[test]
    fn nothing_served_while_scanning() {
        let mut queues = TxQueueManager::new(10);
        queues.enqueue(frame(QueueId::Management, 1)).expect("enqueue mgmt");
        assert!(queues.dequeue_next(SCANNING).is_none());
        assert_eq!(queues.len(QueueId::Management), 1);
    }

    #[test]
    fn poll_sends_one_frame() {
        let fake = FakeDevice::new();
        let mut device = fake.clone();
        let mut queues = TxQueueManager::new(10);
        queues.enqueue(frame(QueueId::Unicast, 1)).expect("enqueue unicast");
        queues.enqueue(frame(QueueId::Management, 2)).expect("enqueue mgmt");

        let sent = queues.poll_tx_queues(&mut device, ASSOCIATED).expect("poll succeeds");
        assert_eq!(sent, Some(QueueId::Management));
        let frames = fake.take_wlan_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, QueueId::Management);
        assert_eq!(frames[0].1, vec![2]);
        assert_eq!(frames[0].2, TxParams { max_retries: 7 });

        let sent = queues.poll_tx_queues(&mut device, ASSOCIATED).expect("poll succeeds");
        assert_eq!(sent, Some(QueueId::Unicast));
        let sent = queues.poll_tx_queues(&mut device, ASSOCIATED).expect("poll succeeds");
        assert_eq!(sent, None);
    }

    #[test]
    fn refused_frame_is_not_kept() {
        let fake = FakeDevice::new();
        fake.state().fail_wlan_tx = true;
        let mut device = fake.clone();
        let mut queues = TxQueueManager::new(10);
        queues.enqueue(frame(QueueId::Management, 1)).expect("enqueue mgmt");
        assert!(queues.poll_tx_queues(&mut device, IDLE).is_err());
        assert!(queues.is_empty());
    }

    #[test]
    fn purge_data_keeps_management() {
        let mut queues = TxQueueManager::new(10);
        queues.enqueue(frame(QueueId::Unicast, 1)).expect("enqueue unicast");
        queues.enqueue(frame(QueueId::Unicast, 2)).expect("enqueue unicast");
        queues.enqueue(frame(QueueId::Multicast, 3)).expect("enqueue multicast");
        queues.enqueue(frame(QueueId::Management, 4)).expect("enqueue mgmt");

        assert_eq!(queues.purge_all_data_tx_queue(), 3);
        assert_eq!(queues.len(QueueId::Unicast), 0);
        assert_eq!(queues.len(QueueId::Multicast), 0);
        assert_eq!(queues.len(QueueId::Management), 1);
    }

    #[test]
    fn purge_mgmt_by_peer() {
        let mut queues = TxQueueManager::new(10);
        queues.enqueue(frame(QueueId::Management, 1)).expect("enqueue mgmt");
        queues.enqueue(frame(QueueId::Management, 2)).expect("enqueue mgmt");
        queues.enqueue(frame(QueueId::Management, 1)).expect("enqueue mgmt");
        assert_eq!(queues.purge_mgmt_to(&[1; 6]), 2);
        assert_eq!(queues.len(QueueId::Management), 1);
    }
}
