// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::client::StationEvent, futures::channel::mpsc};

#[derive(Debug)]
pub struct UnboundedSink<T> {
    sink: mpsc::UnboundedSender<T>,
}

impl<T> UnboundedSink<T> {
    pub fn new(sink: mpsc::UnboundedSender<T>) -> Self {
        UnboundedSink { sink }
    }

    pub fn send(&self, msg: T) {
        match self.sink.unbounded_send(msg) {
            Ok(()) => {}
            Err(e) => {
                if e.is_full() {
                    panic!("Did not expect an unbounded channel to be full: {:?}", e);
                }
                // Nobody listening for station events does not stop the station.
            }
        }
    }
}

pub type EventSink = UnboundedSink<StationEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_after_receiver_dropped() {
        let (sender, receiver) = mpsc::unbounded::<u8>();
        let sink = UnboundedSink::new(sender);
        sink.send(1);
        drop(receiver);
        sink.send(2);
    }

    #[test]
    fn send_delivers_in_order() {
        let (sender, mut receiver) = mpsc::unbounded::<u8>();
        let sink = UnboundedSink::new(sender);
        sink.send(1);
        sink.send(2);
        assert_eq!(receiver.try_next().expect("message pending"), Some(1));
        assert_eq!(receiver.try_next().expect("message pending"), Some(2));
        assert!(receiver.try_next().is_err());
    }
}
