//! Range checks applied to user input before it reaches the calculator

use crate::error::SizingError;
use crate::models::{Equipment, SiteParameters};

const MAX_HOURS_PER_DAY: f64 = 24.0;
const MIN_IRRADIATION_HOURS: f64 = 1.0;
const EFFICIENCY_RANGE: (f64, f64) = (0.5, 0.9);
const DEPTH_OF_DISCHARGE_RANGE: (f64, f64) = (0.2, 1.0);
const MIN_PANEL_WATTS: f64 = 100.0;
const MIN_PANEL_SHORT_CIRCUIT_AMPS: f64 = 1.0;
const MIN_INVERTER_SAFETY_FACTOR: f64 = 1.0;

impl Equipment {
    pub fn validate(&self) -> Result<(), SizingError> {
        if self.name.trim().is_empty() {
            return Err(SizingError::InvalidEquipment("name must not be empty".to_string()));
        }
        if !self.power_watts.is_finite() || self.power_watts <= 0.0 {
            return Err(SizingError::InvalidEquipment(format!(
                "{}: power must be greater than 0 W, got {}",
                self.name, self.power_watts
            )));
        }
        if self.quantity < 1 {
            return Err(SizingError::InvalidEquipment(format!(
                "{}: quantity must be at least 1",
                self.name
            )));
        }
        if !(0.0..=MAX_HOURS_PER_DAY).contains(&self.hours_per_day) {
            return Err(SizingError::InvalidEquipment(format!(
                "{}: hours per day must be between 0 and 24, got {}",
                self.name, self.hours_per_day
            )));
        }
        Ok(())
    }
}

impl SiteParameters {
    pub fn validate(&self) -> Result<(), SizingError> {
        at_least("irradiation_hours", self.irradiation_hours, MIN_IRRADIATION_HOURS)?;
        within("system_efficiency", self.system_efficiency, EFFICIENCY_RANGE)?;
        if self.autonomy_days < 1 {
            return Err(SizingError::parameter("autonomy_days", "must be at least 1 day"));
        }
        within("depth_of_discharge", self.depth_of_discharge, DEPTH_OF_DISCHARGE_RANGE)?;
        at_least("panel_watts", self.panel_watts, MIN_PANEL_WATTS)?;
        at_least(
            "panel_short_circuit_amps",
            self.panel_short_circuit_amps,
            MIN_PANEL_SHORT_CIRCUIT_AMPS,
        )?;
        at_least(
            "inverter_safety_factor",
            self.inverter_safety_factor,
            MIN_INVERTER_SAFETY_FACTOR,
        )?;
        // system_voltage is an enum, so it is always one of the supported values
        Ok(())
    }
}

fn at_least(name: &'static str, value: f64, min: f64) -> Result<(), SizingError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(SizingError::parameter(name, format!("must be at least {min}, got {value}")))
    }
}

fn within(name: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), SizingError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SizingError::parameter(
            name,
            format!("must be between {min} and {max}, got {value}"),
        ))
    }
}
