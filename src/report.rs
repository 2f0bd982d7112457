//! Printable sizing report

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::models::{Equipment, Project, SiteParameters, SizingResult};

/// Everything needed to print a report without re-deriving any figure
#[derive(Debug, Clone)]
pub struct Report {
    pub project_name: String,
    pub equipment: Vec<Equipment>,
    pub parameters: SiteParameters,
    pub result: SizingResult,
    pub generated_on: NaiveDate,
}

impl Report {
    pub fn new(project: &Project, result: SizingResult, generated_on: NaiveDate) -> Self {
        Self {
            project_name: project.name.clone(),
            equipment: project.equipment.clone(),
            parameters: project.parameters.clone(),
            result,
            generated_on,
        }
    }

    pub fn default_file_name(&self) -> String {
        format!(
            "solar_sizing_{}_{}.txt",
            self.generated_on.format("%Y-%m-%d"),
            self.project_name.replace(' ', "_")
        )
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
        Ok(())
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(title.chars().count()))
}

fn block(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "[ {title} ]")
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.parameters;
        let r = &self.result;

        writeln!(f, "SOLAR SIZING REPORT")?;
        writeln!(f, "Project: {}", self.project_name)?;

        section(f, "1. Power Balance")?;
        writeln!(
            f,
            "{:<28} {:>5} {:>10} {:>6} {:>12}",
            "Equipment", "Qty", "Power (W)", "H/day", "Energy (Wh)"
        )?;
        writeln!(f, "{}", "-".repeat(65))?;
        for e in &self.equipment {
            writeln!(
                f,
                "{:<28} {:>5} {:>10} {:>6.1} {:>12.0}",
                e.name,
                e.quantity,
                e.power_watts,
                e.hours_per_day,
                e.daily_energy_wh()
            )?;
        }
        writeln!(f)?;
        writeln!(f, "TOTAL DAILY ENERGY: {:.0} Wh/day", r.total_daily_energy_wh)?;
        writeln!(f, "PEAK SIMULTANEOUS POWER (P_max): {:.0} W", r.peak_simultaneous_power_w)?;

        section(f, "2. Design Assumptions")?;
        writeln!(f, "- Irradiation (PSH): {} h/day", p.irradiation_hours)?;
        writeln!(f, "- System efficiency (PR): {:.2}", p.system_efficiency)?;
        writeln!(f, "- System voltage: {} V", p.system_voltage.volts())?;
        writeln!(f, "- Autonomy: {} days", p.autonomy_days)?;
        writeln!(f, "- Depth of discharge (DoD): {:.0}%", p.depth_of_discharge * 100.0)?;
        writeln!(f, "- Panel rating: {} Wc", p.panel_watts)?;
        writeln!(f, "- Panel short-circuit current (Icc): {:.1} A", p.panel_short_circuit_amps)?;
        writeln!(f, "- Inverter safety factor: {:.2}", p.inverter_safety_factor)?;

        section(f, "3. Results and Recommendations")?;

        block(f, "PV ARRAY")?;
        writeln!(f, "Total peak power to install: {:.0} Wc", r.required_peak_watts)?;
        writeln!(f, "Number of panels ({} Wc): {} units", r.panel_watts, r.panel_count)?;

        block(f, "CHARGE CONTROLLER")?;
        writeln!(f, "Minimum charge current: {:.0} A", r.min_controller_amps)?;
        writeln!(f, "Recommendation: choose an MPPT controller rated above this current.")?;

        block(f, "BATTERY BANK")?;
        writeln!(
            f,
            "Total capacity required (C10) at {}: {:.0} Ah",
            r.system_voltage, r.battery_capacity_ah
        )?;
        writeln!(f, "Gross stored energy: {:.0} Wh", r.stored_energy_wh)?;

        block(f, "INVERTER")?;
        writeln!(f, "Peak simultaneous power to cover: {:.0} W", r.peak_simultaneous_power_w)?;
        writeln!(
            f,
            "Rated power required (margin {:.2}): {:.0} VA",
            r.inverter_safety_factor, r.required_inverter_va
        )?;
        writeln!(f, "Recommendation: choose an inverter with a rated power above this value.")?;

        writeln!(f)?;
        writeln!(f, "Generated automatically on {}", self.generated_on.format("%Y-%m-%d"))
    }
}
