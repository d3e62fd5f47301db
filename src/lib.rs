//! # CitySim - Bounded stochastic sensor simulation
//!
//! The readings behind an illustrative smart-city scene: soil moisture,
//! water quality, bin fill levels, parking occupancy. Each one is a bounded
//! random walk, sometimes paired with a two-state controller that reacts
//! when the walk crosses a threshold.
//!
//! ## Key Features
//!
//! - **Bounded walks**: values are clamped, never wrapped
//! - **Injectable randomness**: any `rand::RngCore`, or a scripted sequence
//! - **Threshold actuators**: min/max active windows, cooldown, compensating effect
//! - **Scoped scheduling**: subscriptions cancel when dropped
//! - **Typed display store**: no globals; publishers are handed down explicitly
//!
//! ## Quick Start
//!
//! ```rust
//! use citysim::{
//!     ActuatorConfig, Cadence, DisplayStore, MetricConfig, Scheduler, SimulatedMetric,
//!     ThresholdActuator, TickScheduler,
//! };
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! let scheduler = TickScheduler::new();
//! let store = DisplayStore::new();
//! let moisture = store.publisher::<f64>("garden.soil_moisture");
//!
//! let metric = SimulatedMetric::new(MetricConfig::new(20.0, 95.0, 35.0, 1.0).with_bias(0.8)).unwrap();
//! let actuator = ThresholdActuator::new(
//!     ActuatorConfig::below(40.0, 60.0)
//!         .with_active_window(Duration::from_secs(4), Duration::from_secs(60))
//!         .with_effect(2.0),
//! )
//! .unwrap();
//! let state = Rc::new(RefCell::new((metric, actuator, citysim::random::seeded(42))));
//!
//! let shared = Rc::clone(&state);
//! let subscription = scheduler
//!     .register(
//!         Cadence::every_ms(2000),
//!         Box::new(move |tick| {
//!             let (metric, actuator, rng) = &mut *shared.borrow_mut();
//!             metric.step(rng);
//!             actuator.evaluate(metric, tick.now);
//!             moisture.publish(actuator.apply_effect(metric));
//!         }),
//!     )
//!     .unwrap();
//!
//! scheduler.advance(Duration::from_secs(2));
//! assert!(state.borrow().1.is_active());
//!
//! // Unmount: no further changes
//! drop(subscription);
//! let revision = store.revision();
//! scheduler.advance(Duration::from_secs(60));
//! assert_eq!(store.revision(), revision);
//! ```
//!
//! ## Modules
//!
//! - [`metric`]: Bounded random walks
//! - [`actuator`]: Two-state threshold controllers
//! - [`scheduler`]: Timer and per-frame callbacks with scoped cancellation
//! - [`store`]: Typed display store
//! - [`random`]: Injectable random sources

// Modules
pub mod actuator;
pub mod error;
pub mod metric;
pub mod random;
pub mod scheduler;
pub mod store;

// Re-exports for convenient access
pub use actuator::{
    ActuatorConfig, ActuatorState, DeactivationReason, Polarity, ThresholdActuator, Transition,
};
pub use error::{CitySimError, Result};
pub use metric::{Cadence, DriftKind, MetricConfig, SimulatedMetric, DEFAULT_BIAS};
pub use random::{RandomSource, ScriptedSource};
pub use scheduler::{Scheduler, Subscription, Tick, TickCallback, TickScheduler};
pub use store::{DisplayStore, Publisher, Reading, StoreSnapshot, StoreValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
