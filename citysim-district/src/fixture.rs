// CitySim District - Smart-city fixtures and composition root
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixture lifecycle
//!
//! A fixture owns its metrics, actuators and random source. Mounting it
//! moves it behind a shared cell, publishes its initial readings and
//! registers its tick callback. The returned [`Mounted`] handle keeps the
//! subscription alive; dropping it unmounts the fixture.

use crate::error::Result;
use citysim::{Cadence, Scheduler, Subscription, Tick};
use log::info;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// A self-contained part of the scene driven by one scheduler subscription.
pub trait Fixture: 'static {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// How often the fixture ticks
    fn cadence(&self) -> Cadence;

    /// Write every reading into the store
    fn publish(&self);

    /// Advance by one scheduled firing
    fn tick(&mut self, tick: &Tick);
}

/// A fixture registered with a scheduler.
pub struct Mounted<F: Fixture> {
    fixture: Rc<RefCell<F>>,
    subscription: Option<Subscription>,
    name: &'static str,
}

impl<F: Fixture> Mounted<F> {
    /// Publish initial readings and start ticking
    pub fn mount(fixture: F, scheduler: &dyn Scheduler) -> Result<Self> {
        let name = fixture.name();
        let cadence = fixture.cadence();
        fixture.publish();

        let fixture = Rc::new(RefCell::new(fixture));
        let shared = Rc::clone(&fixture);
        let subscription =
            scheduler.register(cadence, Box::new(move |tick| shared.borrow_mut().tick(tick)))?;

        info!("mounted {} ({:?})", name, cadence);
        Ok(Self {
            fixture,
            subscription: Some(subscription),
            name,
        })
    }

    /// Borrow the fixture
    pub fn fixture(&self) -> Ref<'_, F> {
        self.fixture.borrow()
    }

    /// Borrow the fixture mutably, e.g. to force a street light
    pub fn fixture_mut(&self) -> RefMut<'_, F> {
        self.fixture.borrow_mut()
    }

    /// Whether the tick callback is still registered
    pub fn is_mounted(&self) -> bool {
        self.subscription
            .as_ref()
            .map_or(false, Subscription::is_active)
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop ticking; equivalent to dropping the handle
    pub fn unmount(self) {}
}

impl<F: Fixture> Drop for Mounted<F> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            info!("unmounted {}", self.name);
        }
    }
}
