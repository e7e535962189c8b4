//! Trigger gate: decides whether "now" falls inside the sunset window.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use serde::Serialize;

/// Width of the trigger window when none is configured.
pub const DEFAULT_WINDOW_SECS: i64 = 60;

/// Whether `now` lies in `[sunset, sunset + window)`.
///
/// Both instants are compared in UTC, so they may carry different offsets.
/// The upper bound is exclusive: at exactly `sunset + window` the gate is
/// closed.
#[must_use]
pub fn should_fire<A: TimeZone, B: TimeZone>(
    now: &DateTime<A>,
    sunset: &DateTime<B>,
    window: TimeDelta,
) -> bool {
    let now = now.with_timezone(&Utc);
    let sunset = sunset.with_timezone(&Utc);
    sunset <= now && now < sunset + window
}

/// Outcome of evaluating the gate for one device on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Fire,
    BeforeWindow,
    AfterWindow,
    AlreadyFired,
}

impl GateDecision {
    #[must_use]
    pub fn is_fire(self) -> bool {
        matches!(self, Self::Fire)
    }
}

/// Window check combined with the once-per-day rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerGate {
    window: TimeDelta,
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_WINDOW_SECS))
    }
}

impl TriggerGate {
    /// A zero or negative window never fires.
    #[must_use]
    pub fn new(window: TimeDelta) -> Self {
        Self { window }
    }

    #[must_use]
    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// Evaluate the gate.
    ///
    /// `last_fired` is the local date the device last fired on, `today` the
    /// device's current local date.
    #[must_use]
    pub fn evaluate<A: TimeZone, B: TimeZone>(
        &self,
        now: &DateTime<A>,
        sunset: &DateTime<B>,
        last_fired: Option<NaiveDate>,
        today: NaiveDate,
    ) -> GateDecision {
        if last_fired == Some(today) {
            return GateDecision::AlreadyFired;
        }
        if should_fire(now, sunset, self.window) {
            GateDecision::Fire
        } else if now.with_timezone(&Utc) < sunset.with_timezone(&Utc) {
            GateDecision::BeforeWindow
        } else {
            GateDecision::AfterWindow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn sunset() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 21, 19, 58, 0).unwrap()
    }

    fn window() -> TimeDelta {
        TimeDelta::seconds(DEFAULT_WINDOW_SECS)
    }

    #[test]
    fn should_fire_at_exact_sunset() {
        assert!(should_fire(&sunset(), &sunset(), window()));
    }

    #[test]
    fn should_fire_just_before_window_closes() {
        let now = sunset() + TimeDelta::seconds(59);
        assert!(should_fire(&now, &sunset(), window()));
    }

    #[test]
    fn should_not_fire_at_window_end() {
        let now = sunset() + TimeDelta::seconds(60);
        assert!(!should_fire(&now, &sunset(), window()));
    }

    #[test]
    fn should_not_fire_before_sunset() {
        let now = sunset() - TimeDelta::seconds(1);
        assert!(!should_fire(&now, &sunset(), window()));
    }

    #[test]
    fn should_compare_instants_across_offsets() {
        let paris = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = sunset().with_timezone(&paris) + TimeDelta::seconds(30);
        assert!(should_fire(&now, &sunset(), window()));
    }

    #[test]
    fn should_never_fire_with_empty_window() {
        assert!(!should_fire(&sunset(), &sunset(), TimeDelta::zero()));
    }

    #[test]
    fn should_report_already_fired_when_fired_today() {
        let gate = TriggerGate::default();
        let today = sunset().date_naive();
        assert_eq!(
            gate.evaluate(&sunset(), &sunset(), Some(today), today),
            GateDecision::AlreadyFired
        );
    }

    #[test]
    fn should_fire_again_on_next_day() {
        let gate = TriggerGate::default();
        let today = sunset().date_naive();
        let yesterday = today.pred_opt().unwrap();
        assert_eq!(
            gate.evaluate(&sunset(), &sunset(), Some(yesterday), today),
            GateDecision::Fire
        );
    }

    #[test]
    fn should_tell_before_from_after_window() {
        let gate = TriggerGate::default();
        let today = sunset().date_naive();
        let early = sunset() - TimeDelta::minutes(5);
        let late = sunset() + TimeDelta::minutes(5);
        assert_eq!(
            gate.evaluate(&early, &sunset(), None, today),
            GateDecision::BeforeWindow
        );
        assert_eq!(
            gate.evaluate(&late, &sunset(), None, today),
            GateDecision::AfterWindow
        );
    }
}
