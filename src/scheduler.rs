// CitySim - Bounded stochastic sensor simulation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Tick scheduling
//!
//! Every metric is updated from either a periodic timer or a per-frame
//! callback. [`TickScheduler`] implements both on top of a manual clock:
//! the caller decides how far time moves with [`TickScheduler::advance`],
//! which makes tests deterministic and lets the runner map it onto a real
//! frame loop.
//!
//! Registration hands back a [`Subscription`]. Dropping it cancels the
//! callback, so a fixture that goes out of scope can never keep mutating
//! state.

use crate::error::{CitySimError, Result};
use crate::metric::Cadence;
use log::trace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Context handed to a callback when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Clock time of this firing
    pub now: Duration,
    /// Time since this subscription last fired (or was registered)
    pub delta: Duration,
    /// Number of frames completed before this firing
    pub frame: u64,
}

/// Callback invoked on every firing
pub type TickCallback = Box<dyn FnMut(&Tick)>;

/// Registers periodic and per-frame callbacks.
pub trait Scheduler {
    /// Current clock time
    fn now(&self) -> Duration;

    /// Register a callback; it runs until the returned handle is dropped.
    ///
    /// Fails for a zero timer period, or one whose first deadline
    /// overflows the clock.
    fn register(&self, cadence: Cadence, callback: TickCallback) -> Result<Subscription>;
}

struct Entry {
    id: u64,
    cadence: Cadence,
    /// `None` once the next deadline would overflow the clock
    next_due: Option<Duration>,
    last_fired: Duration,
    active: Rc<Cell<bool>>,
    callback: Rc<RefCell<TickCallback>>,
}

#[derive(Default)]
struct Registry {
    now: Duration,
    frame: u64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    fn prune(&mut self) {
        self.entries.retain(|e| e.active.get());
    }

    /// Earliest due timer registered before `cutoff`, ties by registration order
    fn next_due_timer(&self, target: Duration, cutoff: u64) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.id < cutoff && e.active.get())
            .filter(|(_, e)| matches!(e.cadence, Cadence::Every(_)))
            .filter(|(_, e)| e.next_due.is_some_and(|due| due <= target))
            .min_by_key(|(_, e)| (e.next_due, e.id))
            .map(|(index, _)| index)
    }
}

/// Handle to a registered callback; cancels on drop.
pub struct Subscription {
    id: u64,
    active: Rc<Cell<bool>>,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    /// Registration identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the callback is still registered
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Cancel the callback now
    pub fn cancel(self) {
        drop(self);
    }

    fn release(&mut self) {
        if !self.active.replace(false) {
            return;
        }
        trace!("subscription {} cancelled", self.id);
        // During an advance the registry may be borrowed by the scheduler;
        // the cleared flag alone keeps the entry from firing and it is
        // pruned on the next advance.
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.entries.retain(|e| e.id != self.id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

/// Single-threaded scheduler driven by a manual clock.
///
/// Cloning yields another handle onto the same clock and registry.
#[derive(Clone, Default)]
pub struct TickScheduler {
    registry: Rc<RefCell<Registry>>,
}

impl TickScheduler {
    /// Create a scheduler with the clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames completed
    pub fn frame(&self) -> u64 {
        self.registry.borrow().frame
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|e| e.active.get())
            .count()
    }

    /// Advance the clock by `dt` and fire what is due.
    ///
    /// Timers fire in deadline order, once per elapsed period. The clock
    /// then settles on the target and every frame callback fires once.
    /// Callbacks registered while advancing first fire on a later advance.
    /// The clock saturates at `Duration::MAX`. Returns the number of callbacks invoked.
    pub fn advance(&self, dt: Duration) -> usize {
        let (target, cutoff) = {
            let mut registry = self.registry.borrow_mut();
            registry.prune();
            (registry.now.saturating_add(dt), registry.next_id)
        };

        let mut fired = 0;

        loop {
            let due = {
                let mut registry = self.registry.borrow_mut();
                let Some(index) = registry.next_due_timer(target, cutoff) else {
                    break;
                };
                let frame = registry.frame;
                let entry = &mut registry.entries[index];
                let period = entry.cadence.period().unwrap_or(dt);
                let Some(now) = entry.next_due else {
                    break;
                };
                let tick = Tick {
                    now,
                    delta: now - entry.last_fired,
                    frame,
                };
                entry.last_fired = now;
                entry.next_due = now.checked_add(period);
                let callback = Rc::clone(&entry.callback);
                let active = Rc::clone(&entry.active);
                registry.now = now;
                (tick, callback, active)
            };

            let (tick, callback, active) = due;
            if active.get() {
                (callback.borrow_mut().as_mut())(&tick);
                fired += 1;
            }
        }

        let frame_ids: Vec<u64> = {
            let mut registry = self.registry.borrow_mut();
            registry.now = target;
            registry
                .entries
                .iter()
                .filter(|e| e.id < cutoff && e.cadence == Cadence::EveryFrame)
                .map(|e| e.id)
                .collect()
        };

        for id in frame_ids {
            let due = {
                let mut registry = self.registry.borrow_mut();
                let frame = registry.frame;
                let entry = registry.entries.iter_mut().find(|e| e.id == id);
                match entry {
                    Some(entry) if entry.active.get() => {
                        let tick = Tick {
                            now: target,
                            delta: target - entry.last_fired,
                            frame,
                        };
                        entry.last_fired = target;
                        Some((tick, Rc::clone(&entry.callback)))
                    }
                    _ => None,
                }
            };

            if let Some((tick, callback)) = due {
                (callback.borrow_mut().as_mut())(&tick);
                fired += 1;
            }
        }

        self.registry.borrow_mut().frame += 1;
        fired
    }

    /// Advance `frames` times by `frame_dt`, returning the callbacks fired
    pub fn run_frames(&self, frame_dt: Duration, frames: u64) -> usize {
        (0..frames).map(|_| self.advance(frame_dt)).sum()
    }
}

impl Scheduler for TickScheduler {
    fn now(&self) -> Duration {
        self.registry.borrow().now
    }

    fn register(&self, cadence: Cadence, callback: TickCallback) -> Result<Subscription> {
        if let Cadence::Every(period) = cadence {
            if period.is_zero() {
                return Err(CitySimError::InvalidDuration(
                    "timer period must be non-zero".to_string(),
                ));
            }
        }

        let mut registry = self.registry.borrow_mut();
        let now = registry.now;
        let next_due = match cadence.period() {
            Some(period) => Some(now.checked_add(period).ok_or_else(|| {
                CitySimError::InvalidDuration(format!(
                    "timer period {:?} overflows the clock at {:?}",
                    period, now
                ))
            })?),
            None => None,
        };

        let id = registry.next_id;
        registry.next_id += 1;

        let active = Rc::new(Cell::new(true));
        registry.entries.push(Entry {
            id,
            cadence,
            next_due,
            last_fired: now,
            active: Rc::clone(&active),
            callback: Rc::new(RefCell::new(callback)),
        });
        trace!("subscription {} registered ({:?})", id, cadence);

        Ok(Subscription {
            id,
            active,
            registry: Rc::downgrade(&self.registry),
        })
    }
}

impl fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("TickScheduler")
            .field("now", &registry.now)
            .field("frame", &registry.frame)
            .field("subscriptions", &registry.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn recorder() -> (Rc<RefCell<Vec<Tick>>>, TickCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, Box::new(move |tick: &Tick| sink.borrow_mut().push(*tick)))
    }

    #[test]
    fn test_timer_fires_each_period() {
        let scheduler = TickScheduler::new();
        let (log, callback) = recorder();
        let _sub = scheduler.register(Cadence::every_ms(2000), callback).unwrap();

        scheduler.advance(ms(1999));
        assert!(log.borrow().is_empty());

        scheduler.advance(ms(1));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].now, ms(2000));
        assert_eq!(log.borrow()[0].delta, ms(2000));
    }

    #[test]
    fn test_timer_catches_up() {
        let scheduler = TickScheduler::new();
        let (log, callback) = recorder();
        let _sub = scheduler.register(Cadence::every_ms(100), callback).unwrap();

        assert_eq!(scheduler.advance(ms(350)), 3);
        let times: Vec<Duration> = log.borrow().iter().map(|t| t.now).collect();
        assert_eq!(times, vec![ms(100), ms(200), ms(300)]);
        assert_eq!(scheduler.now(), ms(350));
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let scheduler = TickScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let a = Rc::clone(&order);
        let _slow = scheduler
            .register(
                Cadence::every_ms(300),
                Box::new(move |t: &Tick| a.borrow_mut().push(("slow", t.now))),
            )
            .unwrap();
        let b = Rc::clone(&order);
        let _fast = scheduler
            .register(
                Cadence::every_ms(200),
                Box::new(move |t: &Tick| b.borrow_mut().push(("fast", t.now))),
            )
            .unwrap();

        scheduler.advance(ms(600));
        assert_eq!(
            *order.borrow(),
            vec![
                ("fast", ms(200)),
                ("slow", ms(300)),
                ("fast", ms(400)),
                ("slow", ms(600)),
                ("fast", ms(600)),
            ]
        );
    }

    #[test]
    fn test_frame_callbacks_once_per_advance() {
        let scheduler = TickScheduler::new();
        let (log, callback) = recorder();
        let _sub = scheduler.register(Cadence::EveryFrame, callback).unwrap();

        scheduler.run_frames(ms(16), 3);
        let ticks = log.borrow();
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[2].now, ms(48));
        assert_eq!(ticks[2].delta, ms(16));
        assert_eq!(ticks[2].frame, 2);
        assert_eq!(scheduler.frame(), 3);
    }

    #[test]
    fn test_drop_cancels() {
        let scheduler = TickScheduler::new();
        let (log, callback) = recorder();
        let sub = scheduler.register(Cadence::EveryFrame, callback).unwrap();

        scheduler.advance(ms(16));
        drop(sub);
        scheduler.run_frames(ms(16), 10);

        assert_eq!(log.borrow().len(), 1);
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn test_cancel_inside_callback_stops_later_firings() {
        let scheduler = TickScheduler::new();
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let counter = Rc::clone(&count);
        let own = Rc::clone(&slot);
        let sub = scheduler
            .register(
                Cadence::every_ms(10),
                Box::new(move |_| {
                    counter.set(counter.get() + 1);
                    own.borrow_mut().take();
                }),
            )
            .unwrap();
        *slot.borrow_mut() = Some(sub);

        // Five periods elapse, but the first firing cancels the rest
        scheduler.advance(ms(50));
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn test_registration_during_advance_waits() {
        let scheduler = TickScheduler::new();
        let inner_fired = Rc::new(Cell::new(0));
        let held: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let handle = scheduler.clone();
        let fired = Rc::clone(&inner_fired);
        let store = Rc::clone(&held);
        let _outer = scheduler
            .register(
                Cadence::EveryFrame,
                Box::new(move |_| {
                    if store.borrow().is_empty() {
                        let fired = Rc::clone(&fired);
                        let sub = handle
                            .register(
                                Cadence::EveryFrame,
                                Box::new(move |_| fired.set(fired.get() + 1)),
                            )
                            .unwrap();
                        store.borrow_mut().push(sub);
                    }
                }),
            )
            .unwrap();

        scheduler.advance(ms(16));
        assert_eq!(inner_fired.get(), 0);
        scheduler.advance(ms(16));
        assert_eq!(inner_fired.get(), 1);
    }

    #[test]
    fn test_zero_period_rejected() {
        let scheduler = TickScheduler::new();
        let (_, callback) = recorder();
        assert!(matches!(
            scheduler.register(Cadence::Every(Duration::ZERO), callback),
            Err(CitySimError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_overflowing_period_rejected() {
        let scheduler = TickScheduler::new();
        scheduler.advance(ms(1000));
        let (_, callback) = recorder();
        assert!(matches!(
            scheduler.register(Cadence::Every(Duration::MAX), callback),
            Err(CitySimError::InvalidDuration(_))
        ));
        assert_eq!(scheduler.subscription_count(), 0);
    }

    #[test]
    fn test_clock_saturates() {
        let scheduler = TickScheduler::new();
        let (timer_log, timer) = recorder();
        let _timer = scheduler.register(Cadence::Every(Duration::MAX), timer).unwrap();
        let (frame_log, frame) = recorder();
        let _frame = scheduler.register(Cadence::EveryFrame, frame).unwrap();

        assert_eq!(scheduler.advance(Duration::MAX), 2);
        assert_eq!(scheduler.now(), Duration::MAX);

        // The timer has no deadline left; the frame callback keeps firing
        assert_eq!(scheduler.advance(ms(16)), 1);
        assert_eq!(scheduler.now(), Duration::MAX);
        assert_eq!(timer_log.borrow().len(), 1);
        assert_eq!(frame_log.borrow().len(), 2);
        assert_eq!(frame_log.borrow()[1].delta, Duration::ZERO);
    }

    #[test]
    fn test_subscription_outlives_scheduler() {
        let scheduler = TickScheduler::new();
        let (_, callback) = recorder();
        let sub = scheduler.register(Cadence::EveryFrame, callback).unwrap();
        drop(scheduler);
        assert!(sub.is_active());
        sub.cancel();
    }
}
