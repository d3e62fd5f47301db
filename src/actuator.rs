//! Threshold actuators
//!
//! A two-state controller (idle/active) reacting to a [`SimulatedMetric`]
//! crossing a threshold. Auto-watering, waste collection and water
//! processing all share this state machine.

use crate::error::{CitySimError, Result};
use crate::metric::SimulatedMetric;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Direction of the triggering crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Activates when the value drops below the trigger
    Below,
    /// Activates when the value rises above the trigger
    Above,
}

/// Parameters of a threshold actuator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Crossing direction
    pub polarity: Polarity,
    /// Activation threshold
    pub trigger: f64,
    /// Completion threshold; `Below` completes at `value >= recovery`,
    /// `Above` at `value <= recovery`
    pub recovery: f64,
    /// Shortest time spent active once triggered
    pub min_active: Duration,
    /// Longest time spent active once triggered
    pub max_active: Duration,
    /// Time after deactivation during which activation is blocked
    #[serde(default)]
    pub cooldown: Duration,
    /// Delta applied to the linked metric on each active tick
    #[serde(default)]
    pub effect: Option<f64>,
}

impl ActuatorConfig {
    /// Actuator that activates when the value drops below `trigger`
    pub fn below(trigger: f64, recovery: f64) -> Self {
        Self::with_polarity(Polarity::Below, trigger, recovery)
    }

    /// Actuator that activates when the value rises above `trigger`
    pub fn above(trigger: f64, recovery: f64) -> Self {
        Self::with_polarity(Polarity::Above, trigger, recovery)
    }

    fn with_polarity(polarity: Polarity, trigger: f64, recovery: f64) -> Self {
        Self {
            polarity,
            trigger,
            recovery,
            min_active: Duration::ZERO,
            max_active: Duration::from_secs(60),
            cooldown: Duration::ZERO,
            effect: None,
        }
    }

    /// Set the active duration bounds
    pub fn with_active_window(mut self, min_active: Duration, max_active: Duration) -> Self {
        self.min_active = min_active;
        self.max_active = max_active;
        self
    }

    /// Set the cooldown after deactivation
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the compensating effect
    pub fn with_effect(mut self, delta: f64) -> Self {
        self.effect = Some(delta);
        self
    }

    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        if !self.trigger.is_finite() {
            return Err(CitySimError::parameter("trigger", "must be finite"));
        }
        if !self.recovery.is_finite() {
            return Err(CitySimError::parameter("recovery", "must be finite"));
        }
        if let Some(effect) = self.effect {
            if !effect.is_finite() {
                return Err(CitySimError::parameter("effect", "must be finite"));
            }
        }
        if self.max_active.is_zero() {
            return Err(CitySimError::InvalidDuration(
                "max_active must be non-zero".to_string(),
            ));
        }
        if self.min_active > self.max_active {
            return Err(CitySimError::InvalidDuration(format!(
                "min_active {:?} exceeds max_active {:?}",
                self.min_active, self.max_active
            )));
        }
        Ok(())
    }
}

/// Actuator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorState {
    /// Waiting for the trigger
    #[default]
    Idle,
    /// Triggered at the given clock time
    Active { since: Duration },
}

/// Why an actuator went idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationReason {
    /// The metric moved back past the recovery threshold
    Recovered,
    /// The maximum active duration elapsed
    MaxDurationElapsed,
    /// Stopped from outside, e.g. an exhausted supply
    Interrupted,
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No state change
    None,
    /// Idle → active
    Activated,
    /// Active → idle
    Deactivated(DeactivationReason),
}

/// A two-state controller reacting to a metric crossing a threshold.
#[derive(Debug, Clone)]
pub struct ThresholdActuator {
    config: ActuatorConfig,
    state: ActuatorState,
    last_deactivated: Option<Duration>,
    activations: u64,
}

impl ThresholdActuator {
    /// Create an idle actuator from validated parameters
    pub fn new(config: ActuatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: ActuatorState::Idle,
            last_deactivated: None,
            activations: 0,
        })
    }

    /// Whether the actuator is active
    pub fn is_active(&self) -> bool {
        matches!(self.state, ActuatorState::Active { .. })
    }

    /// Current state
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Parameters the actuator was built with
    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    /// Number of times the actuator has activated
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Time spent active so far, if active
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        match self.state {
            ActuatorState::Active { since } => Some(now.saturating_sub(since)),
            ActuatorState::Idle => None,
        }
    }

    /// Time left before the maximum active duration, if active
    pub fn time_remaining(&self, now: Duration) -> Option<Duration> {
        self.elapsed(now)
            .map(|elapsed| self.config.max_active.saturating_sub(elapsed))
    }

    /// Whether the cooldown blocks activation at `now`
    pub fn in_cooldown(&self, now: Duration) -> bool {
        match self.last_deactivated {
            Some(at) => now.saturating_sub(at) < self.config.cooldown,
            None => false,
        }
    }

    /// Evaluate the state machine against the observed metric
    pub fn evaluate(&mut self, metric: &SimulatedMetric, now: Duration) -> Transition {
        self.evaluate_permitted(metric, now, true)
    }

    /// Evaluate with an interlock that may block activation.
    ///
    /// `permitted` only gates the idle → active edge; an active actuator
    /// always runs its own completion rules.
    pub fn evaluate_permitted(
        &mut self,
        metric: &SimulatedMetric,
        now: Duration,
        permitted: bool,
    ) -> Transition {
        let value = metric.value();
        match self.state {
            ActuatorState::Idle => {
                if permitted && self.triggered(value) && !self.in_cooldown(now) {
                    self.state = ActuatorState::Active { since: now };
                    self.activations += 1;
                    debug!(
                        "actuator activated at {:?} (value {:.2}, trigger {:.2})",
                        now, value, self.config.trigger
                    );
                    Transition::Activated
                } else {
                    Transition::None
                }
            }
            ActuatorState::Active { since } => {
                let elapsed = now.saturating_sub(since);
                if elapsed < self.config.min_active {
                    return Transition::None;
                }

                let reason = if elapsed >= self.config.max_active {
                    DeactivationReason::MaxDurationElapsed
                } else if self.recovered(value) {
                    DeactivationReason::Recovered
                } else {
                    return Transition::None;
                };

                self.state = ActuatorState::Idle;
                self.last_deactivated = Some(now);
                debug!(
                    "actuator deactivated at {:?} after {:?}: {:?}",
                    now, elapsed, reason
                );
                Transition::Deactivated(reason)
            }
        }
    }

    /// Force an active actuator idle regardless of its active window.
    ///
    /// The cooldown starts from `now`, as for any other deactivation.
    pub fn interrupt(&mut self, now: Duration) -> Transition {
        if !self.is_active() {
            return Transition::None;
        }
        self.state = ActuatorState::Idle;
        self.last_deactivated = Some(now);
        debug!("actuator interrupted at {:?}", now);
        Transition::Deactivated(DeactivationReason::Interrupted)
    }

    /// Apply the compensating effect to the linked metric while active.
    ///
    /// Returns the metric value, unchanged when idle or without an effect.
    pub fn apply_effect(&self, metric: &mut SimulatedMetric) -> f64 {
        match (self.is_active(), self.config.effect) {
            (true, Some(delta)) => metric.nudge(delta),
            _ => metric.value(),
        }
    }

    /// Return to idle without recording a cooldown
    pub fn reset(&mut self) {
        self.state = ActuatorState::Idle;
        self.last_deactivated = None;
    }

    fn triggered(&self, value: f64) -> bool {
        match self.config.polarity {
            Polarity::Below => value < self.config.trigger,
            Polarity::Above => value > self.config.trigger,
        }
    }

    fn recovered(&self, value: f64) -> bool {
        match self.config.polarity {
            Polarity::Below => value >= self.config.recovery,
            Polarity::Above => value <= self.config.recovery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricConfig;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn moisture(value: f64) -> SimulatedMetric {
        SimulatedMetric::new(MetricConfig::new(20.0, 95.0, value, 1.0)).unwrap()
    }

    fn watering() -> ThresholdActuator {
        ThresholdActuator::new(
            ActuatorConfig::below(40.0, 60.0)
                .with_active_window(secs(4), secs(30))
                .with_effect(2.0),
        )
        .unwrap()
    }

    #[test]
    fn test_activates_below_trigger() {
        let mut actuator = watering();
        assert_eq!(actuator.evaluate(&moisture(45.0), secs(0)), Transition::None);
        assert_eq!(
            actuator.evaluate(&moisture(35.0), secs(2)),
            Transition::Activated
        );
        assert!(actuator.is_active());
        assert_eq!(actuator.state(), ActuatorState::Active { since: secs(2) });
        assert_eq!(actuator.activations(), 1);
    }

    #[test]
    fn test_activates_above_trigger() {
        let mut actuator = ThresholdActuator::new(ActuatorConfig::above(80.0, 5.0)).unwrap();
        let bin = SimulatedMetric::new(MetricConfig::new(0.0, 100.0, 85.0, 1.0)).unwrap();
        assert_eq!(actuator.evaluate(&bin, secs(0)), Transition::Activated);
    }

    #[test]
    fn test_min_active_prevents_flapping() {
        let mut actuator = watering();
        actuator.evaluate(&moisture(35.0), secs(0));

        // Recovered immediately, but the minimum window holds
        let wet = moisture(90.0);
        assert_eq!(actuator.evaluate(&wet, secs(1)), Transition::None);
        assert_eq!(actuator.evaluate(&wet, secs(3)), Transition::None);
        assert!(actuator.is_active());

        assert_eq!(
            actuator.evaluate(&wet, secs(4)),
            Transition::Deactivated(DeactivationReason::Recovered)
        );
        assert!(!actuator.is_active());
    }

    #[test]
    fn test_max_active_bounds_activity() {
        let mut actuator = watering();
        let dry = moisture(25.0);
        actuator.evaluate(&dry, secs(0));

        for t in 1..30 {
            assert_eq!(actuator.evaluate(&dry, secs(t)), Transition::None);
        }
        assert_eq!(
            actuator.evaluate(&dry, secs(30)),
            Transition::Deactivated(DeactivationReason::MaxDurationElapsed)
        );
    }

    #[test]
    fn test_max_wins_over_recovery_when_both_hold() {
        let mut actuator = watering();
        actuator.evaluate(&moisture(35.0), secs(0));
        assert_eq!(
            actuator.evaluate(&moisture(90.0), secs(31)),
            Transition::Deactivated(DeactivationReason::MaxDurationElapsed)
        );
    }

    #[test]
    fn test_cooldown_blocks_reactivation() {
        let mut actuator = ThresholdActuator::new(
            ActuatorConfig::below(40.0, 60.0)
                .with_active_window(secs(0), secs(10))
                .with_cooldown(secs(5)),
        )
        .unwrap();
        let dry = moisture(30.0);

        actuator.evaluate(&dry, secs(0));
        assert_eq!(
            actuator.evaluate(&dry, secs(10)),
            Transition::Deactivated(DeactivationReason::MaxDurationElapsed)
        );
        assert!(actuator.in_cooldown(secs(12)));
        assert_eq!(actuator.evaluate(&dry, secs(12)), Transition::None);
        assert_eq!(actuator.evaluate(&dry, secs(15)), Transition::Activated);
    }

    #[test]
    fn test_interlock_blocks_only_activation() {
        let mut actuator = watering();
        let dry = moisture(30.0);

        assert_eq!(
            actuator.evaluate_permitted(&dry, secs(0), false),
            Transition::None
        );
        assert_eq!(
            actuator.evaluate_permitted(&dry, secs(2), true),
            Transition::Activated
        );
        assert_eq!(
            actuator.evaluate_permitted(&moisture(70.0), secs(6), false),
            Transition::Deactivated(DeactivationReason::Recovered)
        );
    }

    #[test]
    fn test_interrupt_overrides_min_active() {
        let mut actuator = watering();
        assert_eq!(actuator.interrupt(secs(0)), Transition::None);

        actuator.evaluate(&moisture(35.0), secs(0));
        assert_eq!(
            actuator.interrupt(secs(1)),
            Transition::Deactivated(DeactivationReason::Interrupted)
        );
        assert!(!actuator.is_active());
    }

    #[test]
    fn test_effect_only_while_active() {
        let mut actuator = watering();
        let mut m = moisture(35.0);

        assert_eq!(actuator.apply_effect(&mut m), 35.0);
        actuator.evaluate(&m, secs(0));
        assert_eq!(actuator.apply_effect(&mut m), 37.0);

        let mut near_top = moisture(94.5);
        assert_eq!(actuator.apply_effect(&mut near_top), 95.0);
    }

    #[test]
    fn test_progress_reporting() {
        let mut actuator = watering();
        assert_eq!(actuator.elapsed(secs(1)), None);
        actuator.evaluate(&moisture(35.0), secs(10));
        assert_eq!(actuator.elapsed(secs(12)), Some(secs(2)));
        assert_eq!(actuator.time_remaining(secs(12)), Some(secs(28)));
        assert_eq!(actuator.time_remaining(secs(100)), Some(Duration::ZERO));
    }

    #[test]
    fn test_reset_clears_cooldown() {
        let mut actuator = ThresholdActuator::new(
            ActuatorConfig::below(40.0, 60.0)
                .with_active_window(secs(0), secs(1))
                .with_cooldown(secs(60)),
        )
        .unwrap();
        let dry = moisture(30.0);
        actuator.evaluate(&dry, secs(0));
        actuator.evaluate(&dry, secs(1));
        assert!(actuator.in_cooldown(secs(2)));

        actuator.reset();
        assert!(!actuator.in_cooldown(secs(2)));
        assert_eq!(actuator.evaluate(&dry, secs(2)), Transition::Activated);
    }

    #[test]
    fn test_validation() {
        let inverted = ActuatorConfig::below(40.0, 60.0).with_active_window(secs(10), secs(5));
        assert!(matches!(
            ThresholdActuator::new(inverted),
            Err(CitySimError::InvalidDuration(_))
        ));

        let zero_max = ActuatorConfig::below(40.0, 60.0).with_active_window(secs(0), secs(0));
        assert!(ThresholdActuator::new(zero_max).is_err());

        let nan = ActuatorConfig::above(f64::NAN, 0.0);
        assert!(matches!(
            ThresholdActuator::new(nan),
            Err(CitySimError::InvalidParameter {
                name: "trigger",
                ..
            })
        ));
    }
}
