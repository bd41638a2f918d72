// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {std::collections::HashMap, std::time::Duration, wlan_common::Time};

#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone, PartialOrd, Ord)]
pub struct EventId(u64);

/// A timer to schedule and cancel timeouts and retrieve expired events.
///
/// Deadlines are absolute points on the station's monotonic clock. Nothing fires on its own:
/// the owner collects expired events with `drain_expired()` whenever the platform ticks.
#[derive(Debug)]
pub struct Timer<E> {
    events: HashMap<EventId, (Time, E)>,
    next_id: u64,
}

impl<E> Default for Timer<E> {
    fn default() -> Self {
        Self { events: HashMap::default(), next_id: 0 }
    }
}

impl<E> Timer<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Time, event: E) -> EventId {
        self.next_id += 1;
        let event_id = EventId(self.next_id);
        self.events.insert(event_id, (deadline, event));
        event_id
    }

    pub fn schedule_after(&mut self, now: Time, duration: Duration, event: E) -> EventId {
        self.schedule_at(now + duration, event)
    }

    pub fn cancel_event(&mut self, event_id: EventId) {
        self.events.remove(&event_id);
    }

    /// Removes and returns every event whose deadline is at or before `now`, earliest deadline
    /// first. Events sharing a deadline come out in the order they were scheduled.
    pub fn drain_expired(&mut self, now: Time) -> Vec<(EventId, E)> {
        let mut expired: Vec<(Time, EventId)> = self
            .events
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now)
            .map(|(id, (deadline, _))| (*deadline, *id))
            .collect();
        expired.sort();
        expired
            .into_iter()
            .filter_map(|(_, id)| self.events.remove(&id).map(|(_, event)| (id, event)))
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Time> {
        self.events.values().map(|(deadline, _)| *deadline).min()
    }

    pub fn scheduled_event_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: u64) -> Time {
        Time::from_micros(millis * 1000)
    }

    #[test]
    fn schedule_cancel_event() {
        #[derive(PartialEq, Eq, Debug)]
        struct FooEvent(u8);

        // Verify event triggers no more than once.
        let mut timer = Timer::<FooEvent>::new();
        let event_id = timer.schedule_at(at(5), FooEvent(8));
        assert!(timer.drain_expired(at(4)).is_empty());
        assert_eq!(timer.drain_expired(at(5)), vec![(event_id, FooEvent(8))]);
        assert!(timer.drain_expired(at(6)).is_empty());

        // Verify event does not trigger if it was canceled.
        let event_id = timer.schedule_at(at(5), FooEvent(9));
        timer.cancel_event(event_id);
        assert!(timer.drain_expired(at(10)).is_empty());

        // Verify multiple events can be scheduled and canceled.
        let event_id_1 = timer.schedule_at(at(20), FooEvent(8));
        let event_id_2 = timer.schedule_at(at(20), FooEvent(9));
        let event_id_3 = timer.schedule_at(at(15), FooEvent(10));
        timer.cancel_event(event_id_2);
        assert_eq!(timer.scheduled_event_count(), 2);
        assert_eq!(
            timer.drain_expired(at(30)),
            vec![(event_id_3, FooEvent(10)), (event_id_1, FooEvent(8))]
        );
    }

    #[test]
    fn schedule_after() {
        let mut timer = Timer::new();
        let event_id = timer.schedule_after(at(100), Duration::from_millis(100), 7);
        assert_eq!(timer.next_deadline(), Some(at(200)));
        assert!(timer.drain_expired(at(199)).is_empty());
        assert_eq!(timer.drain_expired(at(200)), vec![(event_id, 7)]);
        assert_eq!(timer.next_deadline(), None);
    }

    #[test]
    fn same_deadline_keeps_schedule_order() {
        let mut timer = Timer::new();
        let ids: Vec<_> = (0..5).map(|i| timer.schedule_at(at(1), i)).collect();
        let fired: Vec<_> = timer.drain_expired(at(1)).into_iter().map(|(id, _)| id).collect();
        assert_eq!(fired, ids);
    }
}
