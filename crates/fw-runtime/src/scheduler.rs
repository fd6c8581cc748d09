//! Discrete-time timer scheduler.
//!
//! Each call to [`Scheduler::advance`] moves the clock forward one tick and
//! snapshots the batch of timers due at that tick, ordered by due tick and
//! then by registration order. The caller drains the batch with
//! [`Scheduler::next_due`] and dispatches each payload itself; the payload
//! handler may cancel or schedule timers in between pops. Cancellation is
//! checked when a timer is popped from the batch, so a timer cancelled by an
//! earlier timer of the same batch never fires. Timers registered while a
//! batch is being drained are not part of it, even with a delay of zero.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use tracing::trace;

use crate::clock::{Tick, TickClock};

/// Opaque identifier of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Whether a timer fires once or keeps re-arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Fires once, then is dropped.
    Once,
    /// Re-arms for `now + period` each time it fires.
    Every(Tick),
}

#[derive(Debug)]
struct Timer<T> {
    due: Tick,
    recurrence: Recurrence,
    payload: T,
}

/// Owns every pending timer. Callers only ever hold [`TimerHandle`]s.
pub struct Scheduler<T> {
    clock: TickClock,
    next_id: u64,
    timers: BTreeMap<u64, Timer<T>>,
    batch: VecDeque<u64>,
}

impl<T> fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tick", &self.clock.tick())
            .field("timers", &self.timers.len())
            .field("batch", &self.batch.len())
            .finish()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler at tick 0.
    pub fn new() -> Self {
        Self {
            clock: TickClock::new(),
            next_id: 0,
            timers: BTreeMap::new(),
            batch: VecDeque::new(),
        }
    }

    /// The current tick.
    pub fn now(&self) -> Tick {
        self.clock.tick()
    }

    /// The underlying clock.
    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Fire `payload` once, `delay` ticks from now.
    pub fn schedule_once(&mut self, delay: Tick, payload: T) -> TimerHandle {
        self.insert(delay, Recurrence::Once, payload)
    }

    /// Fire `payload` every `period` ticks, starting `period` ticks from now.
    ///
    /// A period of zero is treated as one.
    pub fn schedule_repeating(&mut self, period: Tick, payload: T) -> TimerHandle {
        self.schedule_repeating_after(period, period, payload)
    }

    /// Fire `payload` first after `delay` ticks, then every `period` ticks.
    pub fn schedule_repeating_after(&mut self, delay: Tick, period: Tick, payload: T) -> TimerHandle {
        self.insert(delay, Recurrence::Every(period.max(1)), payload)
    }

    /// Mark a timer inert. Returns false if it had already fired or been cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let removed = self.timers.remove(&handle.0).is_some();
        if removed {
            trace!(timer = %handle, "timer cancelled");
        }
        removed
    }

    /// Whether a timer will still fire.
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle.0)
    }

    /// The next tick a timer is due at.
    pub fn due_tick(&self, handle: TimerHandle) -> Option<Tick> {
        self.timers.get(&handle.0).map(|t| t.due)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Returns true if no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance one tick and snapshot the batch of due timers.
    ///
    /// Any undrained remainder of the previous batch is rebuilt, not lost:
    /// those timers are still due and are collected again.
    pub fn advance(&mut self) -> Tick {
        let now = self.clock.advance();
        self.batch.clear();

        let mut due: Vec<(Tick, u64)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= now)
            .map(|(id, t)| (t.due, *id))
            .collect();
        due.sort_unstable();
        self.batch.extend(due.into_iter().map(|(_, id)| id));
        now
    }

    /// Number of timers left in the current batch, cancelled ones included.
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    fn insert(&mut self, delay: Tick, recurrence: Recurrence, payload: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.insert(
            id,
            Timer {
                due: self.clock.tick() + delay,
                recurrence,
                payload,
            },
        );
        TimerHandle(id)
    }

    /// Pop the next live timer of the batch, re-arming it if it repeats.
    fn pop_live(&mut self) -> Option<(u64, Recurrence)> {
        let now = self.clock.tick();
        while let Some(id) = self.batch.pop_front() {
            let Some(timer) = self.timers.get_mut(&id) else {
                // Cancelled after the batch was built.
                continue;
            };
            let recurrence = timer.recurrence;
            if let Recurrence::Every(period) = recurrence {
                timer.due = now + period;
            }
            trace!(timer = id, tick = now, "timer fired");
            return Some((id, recurrence));
        }
        None
    }
}

impl<T: Clone> Scheduler<T> {
    /// Pop the next due payload of the current batch.
    ///
    /// One-shot timers are consumed; repeating timers are re-armed and
    /// yield a clone of their payload.
    pub fn next_due(&mut self) -> Option<(TimerHandle, T)> {
        loop {
            let (id, recurrence) = self.pop_live()?;
            let payload = match recurrence {
                Recurrence::Once => self.timers.remove(&id).map(|t| t.payload),
                Recurrence::Every(_) => self.timers.get(&id).map(|t| t.payload.clone()),
            };
            if let Some(payload) = payload {
                return Some((TimerHandle(id), payload));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type Fired = Vec<(Tick, &'static str)>;

    fn drain(sched: &mut Scheduler<&'static str>, fired: &mut Fired) {
        let now = sched.advance();
        while let Some((_, label)) = sched.next_due() {
            fired.push((now, label));
        }
    }

    #[test]
    fn one_shot_fires_once_at_due_tick() {
        let mut sched = Scheduler::new();
        let mut fired = Fired::new();
        sched.schedule_once(3, "a");
        for _ in 0..10 {
            drain(&mut sched, &mut fired);
        }
        assert_eq!(fired, vec![(3, "a")]);
        assert!(sched.is_empty());
    }

    #[test]
    fn zero_delay_fires_on_next_step() {
        let mut sched = Scheduler::new();
        let mut fired = Fired::new();
        sched.schedule_once(0, "now");
        drain(&mut sched, &mut fired);
        assert_eq!(fired, vec![(1, "now")]);
    }

    #[test]
    fn repeating_rearms_each_period() {
        let mut sched = Scheduler::new();
        let mut fired = Fired::new();
        sched.schedule_repeating(4, "r");
        for _ in 0..13 {
            drain(&mut sched, &mut fired);
        }
        let ticks: Vec<Tick> = fired.iter().map(|(t, _)| *t).collect();
        assert_eq!(ticks, vec![4, 8, 12]);
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn zero_period_is_clamped_to_one() {
        let mut sched = Scheduler::new();
        let mut fired = Fired::new();
        sched.schedule_repeating(0, "r");
        for _ in 0..3 {
            drain(&mut sched, &mut fired);
        }
        assert_eq!(fired.len(), 3);
    }

    #[test]
    fn same_tick_fires_in_registration_order() {
        let mut sched = Scheduler::new();
        let mut fired = Fired::new();
        sched.schedule_once(2, "first");
        sched.schedule_repeating(1, "second");
        sched.schedule_once(2, "third");
        drain(&mut sched, &mut fired);
        drain(&mut sched, &mut fired);
        assert_eq!(
            fired,
            vec![(1, "second"), (2, "first"), (2, "second"), (2, "third")]
        );
    }

    #[test]
    fn cancel_before_due_prevents_firing() {
        let mut sched = Scheduler::new();
        let mut fired = Fired::new();
        let handle = sched.schedule_once(5, "a");
        drain(&mut sched, &mut fired);
        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));
        for _ in 0..10 {
            drain(&mut sched, &mut fired);
        }
        assert!(fired.is_empty());
    }

    #[test]
    fn repeating_timer_can_cancel_itself() {
        let mut sched = Scheduler::new();
        sched.schedule_repeating(1, "tick");
        let mut fired = 0;
        for _ in 0..10 {
            sched.advance();
            while let Some((me, _)) = sched.next_due() {
                fired += 1;
                if fired == 3 {
                    sched.cancel(me);
                }
            }
        }
        assert_eq!(fired, 3);
        assert!(sched.is_empty());
    }

    #[test]
    fn earlier_timer_cancels_sibling_in_same_batch() {
        let mut sched = Scheduler::new();
        sched.schedule_once(2, "killer");
        let victim = sched.schedule_once(2, "victim");
        let mut fired = Vec::new();
        for _ in 0..5 {
            sched.advance();
            while let Some((_, label)) = sched.next_due() {
                fired.push(label);
                if label == "killer" {
                    sched.cancel(victim);
                }
            }
        }
        assert_eq!(fired, vec!["killer"]);
    }

    #[test]
    fn timers_scheduled_mid_batch_wait_for_next_step() {
        let mut sched = Scheduler::new();
        sched.schedule_once(1, "parent");
        let mut fired = Fired::new();
        for _ in 0..3 {
            let now = sched.advance();
            while let Some((_, label)) = sched.next_due() {
                fired.push((now, label));
                if label == "parent" {
                    sched.schedule_once(0, "child");
                }
            }
        }
        assert_eq!(fired, vec![(1, "parent"), (2, "child")]);
    }

    #[test]
    fn next_due_yields_payloads_and_skips_cancelled() {
        let mut sched = Scheduler::new();
        let a = sched.schedule_once(1, 'a');
        let b = sched.schedule_once(1, 'b');
        sched.schedule_repeating(1, 'r');
        sched.advance();

        assert_eq!(sched.next_due(), Some((a, 'a')));
        sched.cancel(b);
        let (_, r) = sched.next_due().unwrap();
        assert_eq!(r, 'r');
        assert_eq!(sched.next_due(), None);
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn undrained_batch_is_collected_again() {
        let mut sched = Scheduler::new();
        sched.schedule_once(1, 1u8);
        sched.schedule_once(1, 2u8);
        sched.advance();
        assert_eq!(sched.next_due().map(|(_, p)| p), Some(1));
        sched.advance();
        assert_eq!(sched.next_due().map(|(_, p)| p), Some(2));
        assert_eq!(sched.next_due(), None);
    }

    proptest! {
        #[test]
        fn one_shot_fires_exactly_once_at_or_after_delay(start in 0u64..20, delay in 0u64..50) {
            let mut sched = Scheduler::new();
            for _ in 0..start {
                sched.advance();
            }
            let t = sched.now();
            sched.schedule_once(delay, ());
            let mut fired_at = Vec::new();
            for _ in 0..(delay + 10) {
                let now = sched.advance();
                while sched.next_due().is_some() {
                    fired_at.push(now);
                }
            }
            prop_assert_eq!(fired_at.len(), 1);
            prop_assert!(fired_at[0] >= t + delay);
            prop_assert_eq!(fired_at[0], (t + delay).max(t + 1));
        }

        #[test]
        fn repeating_fires_on_every_period(delay in 1u64..20, period in 1u64..10, steps in 1u64..120) {
            let mut sched = Scheduler::new();
            sched.schedule_repeating_after(delay, period, ());
            let mut fired_at = Vec::new();
            for _ in 0..steps {
                let now = sched.advance();
                while sched.next_due().is_some() {
                    fired_at.push(now);
                }
            }
            let expected: Vec<Tick> = (0..)
                .map(|k| delay + k * period)
                .take_while(|t| *t <= steps)
                .collect();
            prop_assert_eq!(fired_at, expected);
        }

        #[test]
        fn cancelled_before_due_never_fires(delay in 2u64..40, cancel_at in 0u64..40) {
            let mut sched = Scheduler::new();
            let handle = sched.schedule_once(delay, ());
            let mut fired = 0;
            for _ in 0..(delay + 5) {
                if sched.now() == cancel_at.min(delay - 1) {
                    sched.cancel(handle);
                }
                sched.advance();
                while sched.next_due().is_some() {
                    fired += 1;
                }
            }
            prop_assert_eq!(fired, 0);
        }
    }
}
