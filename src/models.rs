//! Data models for loads, site parameters and sizing results

use std::fmt;
use std::str::FromStr;

use crate::error::SizingError;

pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// One line of the power balance
#[derive(Debug, Clone, PartialEq)]
pub struct Equipment {
    pub name: String,
    pub power_watts: f64,
    pub quantity: u32,
    pub hours_per_day: f64,
    pub runs_simultaneously: bool, // counts towards inverter sizing
}

impl Equipment {
    pub fn new(name: &str, power_watts: f64, quantity: u32, hours_per_day: f64) -> Self {
        Self {
            name: name.to_string(),
            power_watts,
            quantity,
            hours_per_day,
            runs_simultaneously: true,
        }
    }

    pub fn standalone(mut self) -> Self {
        self.runs_simultaneously = false;
        self
    }

    pub fn daily_energy_wh(&self) -> f64 {
        self.power_watts * f64::from(self.quantity) * self.hours_per_day
    }

    /// Power drawn when every unit of this load is on at once
    pub fn combined_power_watts(&self) -> f64 {
        self.power_watts * f64::from(self.quantity)
    }
}

/// DC bus voltage of the battery bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemVoltage {
    V12,
    #[default]
    V24,
    V48,
}

impl SystemVoltage {
    pub const ALL: [SystemVoltage; 3] = [SystemVoltage::V12, SystemVoltage::V24, SystemVoltage::V48];

    pub fn volts(self) -> u32 {
        match self {
            SystemVoltage::V12 => 12,
            SystemVoltage::V24 => 24,
            SystemVoltage::V48 => 48,
        }
    }
}

impl TryFrom<u32> for SystemVoltage {
    type Error = SizingError;

    fn try_from(volts: u32) -> Result<Self, Self::Error> {
        SystemVoltage::ALL
            .into_iter()
            .find(|v| v.volts() == volts)
            .ok_or_else(|| {
                SizingError::parameter("system_voltage", format!("{volts} V is not one of 12, 24, 48"))
            })
    }
}

impl FromStr for SystemVoltage {
    type Err = SizingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('V')
            .or_else(|| trimmed.strip_suffix('v'))
            .unwrap_or(trimmed)
            .trim();
        let volts: u32 = digits
            .parse()
            .map_err(|_| SizingError::parameter("system_voltage", format!("'{s}' is not a voltage")))?;
        SystemVoltage::try_from(volts)
    }
}

impl fmt::Display for SystemVoltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}V", self.volts())
    }
}

/// Site and system parameters feeding the sizing
#[derive(Debug, Clone, PartialEq)]
pub struct SiteParameters {
    pub irradiation_hours: f64, // peak sun hours per day
    pub system_efficiency: f64,
    pub system_voltage: SystemVoltage,
    pub autonomy_days: u32,
    pub depth_of_discharge: f64,
    pub panel_watts: f64,
    pub panel_short_circuit_amps: f64,
    pub inverter_safety_factor: f64,
}

impl Default for SiteParameters {
    fn default() -> Self {
        Self {
            irradiation_hours: 4.5,
            system_efficiency: 0.70,
            system_voltage: SystemVoltage::V24,
            autonomy_days: 2,
            depth_of_discharge: 0.8,
            panel_watts: 400.0,
            panel_short_circuit_amps: 10.0,
            inverter_safety_factor: 1.25,
        }
    }
}

/// Daily energy and peak power of an equipment list
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadBalance {
    pub total_daily_energy_wh: f64,
    pub peak_simultaneous_power_w: f64,
}

/// Result of a sizing calculation
#[derive(Debug, Clone, PartialEq)]
pub struct SizingResult {
    pub total_daily_energy_wh: f64,
    pub peak_simultaneous_power_w: f64,
    pub required_peak_watts: f64,
    pub stored_energy_wh: f64,
    pub battery_capacity_ah: f64,
    pub panel_count: u32,
    pub min_controller_amps: f64,
    pub required_inverter_va: f64,
    // Echoed so the result can be rendered without the parameter set
    pub panel_watts: f64,
    pub system_voltage: SystemVoltage,
    pub inverter_safety_factor: f64,
}

/// A sizing project: the list the user builds up plus its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub equipment: Vec<Equipment>,
    pub parameters: SiteParameters,
}

impl Project {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            equipment: Vec::new(),
            parameters: SiteParameters::default(),
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new(DEFAULT_PROJECT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12", SystemVoltage::V12)]
    #[case("24V", SystemVoltage::V24)]
    #[case(" 48 v ", SystemVoltage::V48)]
    fn parses_supported_voltages(#[case] input: &str, #[case] expected: SystemVoltage) {
        assert_eq!(input.parse::<SystemVoltage>().unwrap(), expected);
    }

    #[rstest]
    #[case("36")]
    #[case("0")]
    #[case("twelve")]
    fn rejects_unsupported_voltages(#[case] input: &str) {
        assert!(matches!(
            input.parse::<SystemVoltage>(),
            Err(SizingError::InvalidParameter { name: "system_voltage", .. })
        ));
    }

    #[test]
    fn daily_energy_multiplies_power_quantity_and_hours() {
        let fridge = Equipment::new("Fridge", 150.0, 2, 8.0);
        assert_eq!(fridge.daily_energy_wh(), 2400.0);
        assert_eq!(fridge.combined_power_watts(), 300.0);
    }

    #[test]
    fn default_project_starts_empty() {
        let project = Project::default();
        assert_eq!(project.name, DEFAULT_PROJECT_NAME);
        assert!(project.equipment.is_empty());
        assert_eq!(project.parameters, SiteParameters::default());
    }

    #[test]
    fn standalone_clears_simultaneous_flag() {
        assert!(Equipment::new("Lamp", 10.0, 4, 5.0).runs_simultaneously);
        assert!(!Equipment::new("Pump", 250.0, 1, 2.0).standalone().runs_simultaneously);
    }
}
