//! Virtual light: the simulated state of one selector.

use serde::Serialize;

use twilight_domain::color::Kelvin;
use twilight_domain::command::{LightCommand, Power, Selector};

/// Last known state of a simulated light.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualLight {
    pub id: Selector,
    pub power: Power,
    pub color: Kelvin,
    pub brightness: f32,
}

impl VirtualLight {
    /// A light that is off, remembering `color`.
    #[must_use]
    pub fn new(id: Selector, color: Kelvin) -> Self {
        Self {
            id,
            power: Power::Off,
            color,
            brightness: 0.0,
        }
    }

    /// Jump straight to the command's target state.
    pub fn apply(&mut self, command: &LightCommand) {
        self.power = command.power;
        self.color = command.color;
        self.brightness = command.brightness;
    }

    pub fn toggle(&mut self) {
        self.power = match self.power {
            Power::On => Power::Off,
            Power::Off => Power::On,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_switched_off() {
        let light = VirtualLight::new(Selector::new("id:1"), Kelvin::new(2700));
        assert_eq!(light.power, Power::Off);
    }

    #[test]
    fn should_take_command_state_when_applied() {
        let mut light = VirtualLight::new(Selector::new("id:1"), Kelvin::new(2700));
        light.apply(&LightCommand::power_on(Selector::new("id:1"), Kelvin::new(4000), 0.6));
        assert_eq!(light.power, Power::On);
        assert_eq!(light.color, Kelvin::new(4000));
        assert!((light.brightness - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn should_flip_power_when_toggled_twice() {
        let mut light = VirtualLight::new(Selector::new("id:1"), Kelvin::new(2700));
        light.toggle();
        assert_eq!(light.power, Power::On);
        light.toggle();
        assert_eq!(light.power, Power::Off);
    }
}
