//! Transition planner: turns a dusk profile into a concrete plan.
//!
//! Planning is pure: the caller supplies the time left until local midnight
//! and the random source, so the same inputs always give the same plan.

use std::time::Duration;

use chrono::TimeDelta;
use rand::Rng;

use crate::color::Kelvin;
use crate::command::{LightCommand, Power};
use crate::device::DeviceTarget;
use crate::dusk::{BETA_STEP_CAP, DuskProfile};
use crate::error::ProfileError;
use crate::plan::{DispatchOffset, DuskStrategy, PlannedCommand, TransitionPlan};

/// Colour the beta strategy's closing power-off is sent with.
pub const BETA_OFF_COLOR: Kelvin = Kelvin::new(2700);

/// Builds [`TransitionPlan`]s.
#[derive(Debug, Clone, Copy)]
pub struct Planner {
    default_color: Kelvin,
}

impl Planner {
    /// `default_color` is the colour remembered by the stepped power-off.
    #[must_use]
    pub fn new(default_color: Kelvin) -> Self {
        Self { default_color }
    }

    /// Build the plan for `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError`] when the profile violates its invariants;
    /// nothing is planned in that case.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        strategy: DuskStrategy,
        profile: &DuskProfile,
        target: &DeviceTarget,
        until_midnight: TimeDelta,
        rng: &mut R,
    ) -> Result<TransitionPlan, ProfileError> {
        profile.validate()?;
        let commands = match strategy {
            DuskStrategy::Stepped => self.stepped(profile, target, until_midnight, rng),
            DuskStrategy::Basic => basic(profile, target),
            DuskStrategy::Beta => beta(profile, target, until_midnight, rng),
        };
        Ok(TransitionPlan::new(strategy, target.id.clone(), commands))
    }

    fn stepped<R: Rng + ?Sized>(
        &self,
        profile: &DuskProfile,
        target: &DeviceTarget,
        until_midnight: TimeDelta,
        rng: &mut R,
    ) -> Vec<PlannedCommand> {
        let step_secs = profile.step_duration_secs();
        let mut commands = Vec::with_capacity(profile.steps as usize + 1);

        for n in 1..=profile.steps {
            let sleep_after = if n == profile.steps {
                final_dwell(until_midnight, profile.turn_off_jitter_minutes, rng)
            } else {
                Duration::from_secs(u64::from(step_secs))
            };
            commands.push(PlannedCommand {
                command: LightCommand::new(
                    target.id.clone(),
                    Power::On,
                    profile.kelvin_at(n),
                    stepped_brightness(n),
                    secs_f32(step_secs),
                    true,
                ),
                offset: DispatchOffset::Immediate { sleep_after },
            });
        }

        commands.push(PlannedCommand {
            command: LightCommand::power_off(target.id.clone(), self.default_color),
            offset: DispatchOffset::Immediate {
                sleep_after: Duration::ZERO,
            },
        });
        commands
    }
}

fn basic(profile: &DuskProfile, target: &DeviceTarget) -> Vec<PlannedCommand> {
    vec![PlannedCommand {
        command: LightCommand::new(
            target.id.clone(),
            Power::On,
            profile.color_end,
            1.0,
            secs_f32(profile.duration_secs()),
            true,
        ),
        offset: DispatchOffset::Immediate {
            sleep_after: Duration::ZERO,
        },
    }]
}

fn beta<R: Rng + ?Sized>(
    profile: &DuskProfile,
    target: &DeviceTarget,
    until_midnight: TimeDelta,
    rng: &mut R,
) -> Vec<PlannedCommand> {
    let step_secs = secs_f32(profile.step_duration_secs());
    let mut commands: Vec<LightCommand> = (1..=BETA_STEP_CAP)
        .map(|n| {
            LightCommand::new(
                target.id.clone(),
                Power::On,
                profile.kelvin_at(n),
                beta_brightness(n),
                step_secs,
                true,
            )
        })
        .collect();

    let dwell = final_dwell(until_midnight, profile.turn_off_jitter_minutes, rng);
    commands.push(LightCommand::new(
        target.id.clone(),
        Power::On,
        profile.color_end,
        beta_brightness(BETA_STEP_CAP),
        dwell.as_secs_f32(),
        true,
    ));
    commands.push(LightCommand::new(
        target.id.clone(),
        Power::Off,
        BETA_OFF_COLOR,
        0.0,
        0.0,
        true,
    ));

    commands
        .into_iter()
        .enumerate()
        .map(|(position, command)| PlannedCommand {
            command,
            offset: DispatchOffset::CyclePosition(position),
        })
        .collect()
}

/// Brightness of stepped step `n`: two percent per step.
fn stepped_brightness(n: u32) -> f32 {
    lossy_f32(2 * n) / 100.0
}

/// Brightness of beta step `n`: ten percent per step.
fn beta_brightness(n: u32) -> f32 {
    lossy_f32(n) / 10.0
}

/// Dwell before lights-off: time to local midnight, shifted back by half
/// the jitter range, plus a uniform random offset over the full range.
///
/// The result lies in `[m - j*30, m - j*30 + j*60)` seconds, where `m` is
/// `until_midnight` and `j` the jitter in minutes. Negative results (the
/// trigger fired right before midnight) are clamped to zero.
pub fn final_dwell<R: Rng + ?Sized>(
    until_midnight: TimeDelta,
    jitter_minutes: u32,
    rng: &mut R,
) -> Duration {
    let range = i64::from(jitter_minutes) * 60;
    let offset = if range > 0 {
        rng.gen_range(0..range)
    } else {
        0
    };
    let secs = until_midnight.num_seconds() - i64::from(jitter_minutes) * 30 + offset;
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}

fn secs_f32(secs: u32) -> f32 {
    lossy_f32(secs)
}

#[allow(clippy::cast_precision_loss)]
fn lossy_f32(value: u32) -> f32 {
    value as f32
}
