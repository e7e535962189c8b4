//! Request bodies in the shape the LIFX API expects.

use serde::Serialize;

use twilight_domain::command::{LightCommand, Power};

/// Form fields of `PUT /lights/{selector}/state`.
#[derive(Debug, Serialize)]
pub(crate) struct StateForm {
    power: Power,
    color: String,
    brightness: f32,
    duration: f32,
    fast: bool,
}

impl From<&LightCommand> for StateForm {
    fn from(command: &LightCommand) -> Self {
        Self {
            power: command.power,
            color: command.color.to_string(),
            brightness: command.brightness,
            duration: command.duration_secs,
            fast: command.fast,
        }
    }
}

/// JSON body of `POST /lights/{selector}/cycle`.
#[derive(Debug, Serialize)]
pub(crate) struct CycleBody {
    states: Vec<StateForm>,
}

impl CycleBody {
    pub(crate) fn new(states: &[LightCommand]) -> Self {
        Self {
            states: states.iter().map(StateForm::from).collect(),
        }
    }
}
