//! Interactive prompts that write the lighting document.
//!
//! `twilightd init` asks for the token, the default colour and the dusk
//! profile. `twilightd add-device` appends one device to an existing
//! document. Invalid numbers are asked again instead of aborting.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use chrono_tz::Tz;

use twilight_domain::color::Kelvin;
use twilight_domain::command::Selector;
use twilight_domain::config::LightingConfig;
use twilight_domain::device::DeviceTarget;
use twilight_domain::dusk::DuskProfile;

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("terminal i/o failed")]
    Io(#[from] io::Error),
    #[error("input closed before the wizard finished")]
    Closed,
}

/// Line-oriented prompt over any reader/writer pair.
pub struct Wizard<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, label: &str) -> Result<String, WizardError> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(WizardError::Closed);
        }
        Ok(line.trim().to_string())
    }

    fn ask_non_empty(&mut self, label: &str) -> Result<String, WizardError> {
        loop {
            let answer = self.ask(label)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            writeln!(self.output, "a value is required")?;
        }
    }

    fn ask_parsed<T: FromStr>(&mut self, label: &str, what: &str) -> Result<T, WizardError> {
        loop {
            let answer = self.ask(label)?;
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(_) => writeln!(self.output, "{answer:?} is not {what}")?,
            }
        }
    }

    fn ask_kelvin(&mut self, label: &str) -> Result<Kelvin, WizardError> {
        loop {
            let kelvin = Kelvin::new(self.ask_parsed(label, "an integer")?);
            if kelvin.is_valid() {
                return Ok(kelvin);
            }
            writeln!(self.output, "{kelvin} is outside the supported range")?;
        }
    }

    /// Prompt for a whole new document without devices.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError`] when the terminal fails or input ends early.
    pub fn new_config(&mut self) -> Result<LightingConfig, WizardError> {
        let token = self.ask_non_empty("Enter LIFX token")?;
        let default_color = self.ask_kelvin("Enter default light color (Kelvins)")?;
        let color_start = self.ask_kelvin("Enter dusk light color to start with (Kelvins)")?;
        let color_end = self.ask_kelvin("Enter dusk light color to end with (Kelvins)")?;
        let steps = self.ask_parsed("Enter dusk steps", "a positive integer")?;
        let duration_minutes =
            self.ask_parsed("Enter dusk duration (minutes)", "a positive integer")?;
        let turn_off_jitter_minutes =
            self.ask_parsed("Enter dusk turn off range (minutes)", "a positive integer")?;

        Ok(LightingConfig {
            token,
            default_color,
            dusk: DuskProfile {
                color_start,
                color_end,
                steps,
                duration_minutes,
                turn_off_jitter_minutes,
            },
            devices: Vec::new(),
        })
    }

    /// Prompt for one device.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError`] when the terminal fails or input ends early.
    pub fn new_device(&mut self) -> Result<DeviceTarget, WizardError> {
        let name = self.ask_non_empty("Enter device or group name")?;
        let id = self.ask_non_empty("Enter device or group ID")?;
        let latitude = self.ask_parsed("Enter device or group latitude", "a number")?;
        let longitude = self.ask_parsed("Enter device or group longitude", "a number")?;

        let mut device = DeviceTarget::new(Selector::new(id), name).with_coordinates(latitude, longitude);
        loop {
            let zone = self.ask("Enter IANA time zone (empty for UTC)")?;
            if zone.is_empty() {
                break;
            }
            match zone.parse::<Tz>() {
                Ok(tz) => {
                    device = device.with_timezone(tz);
                    break;
                }
                Err(_) => writeln!(self.output, "{zone:?} is not a known time zone")?,
            }
        }
        Ok(device)
    }
}
