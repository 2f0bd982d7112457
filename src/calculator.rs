//! Sizing calculator logic

use std::fmt;

use tracing::debug;

use crate::error::SizingError;
use crate::models::{Equipment, LoadBalance, SiteParameters, SizingResult};

/// Margin on the photovoltaic array peak power (25%)
pub const PV_DESIGN_MARGIN: f64 = 1.25;

/// Oversizing applied to the array short-circuit current for the charge controller
pub const CONTROLLER_MARGIN: f64 = 1.25;

/// Total daily energy and the peak power of everything that can run at once
pub fn load_balance(equipment: &[Equipment]) -> LoadBalance {
    let total_daily_energy_wh = equipment.iter().map(Equipment::daily_energy_wh).sum();
    let peak_simultaneous_power_w = equipment
        .iter()
        .filter(|e| e.runs_simultaneously)
        .map(Equipment::combined_power_watts)
        .sum();

    LoadBalance {
        total_daily_energy_wh,
        peak_simultaneous_power_w,
    }
}

/// Size the PV array, battery bank, charge controller and inverter for a load list
///
/// Parameters are expected to be validated already. Fails only when the
/// equipment list has no daily energy to supply.
pub fn compute(equipment: &[Equipment], params: &SiteParameters) -> Result<SizingResult, SizingError> {
    let balance = load_balance(equipment);
    if balance.total_daily_energy_wh == 0.0 {
        return Err(SizingError::NoLoadDefined);
    }
    let energy = balance.total_daily_energy_wh;

    let required_peak_watts =
        (energy * PV_DESIGN_MARGIN) / (params.irradiation_hours * params.system_efficiency);

    let stored_energy_wh = (energy * f64::from(params.autonomy_days)) / params.depth_of_discharge;
    let battery_capacity_ah = stored_energy_wh / f64::from(params.system_voltage.volts());

    let panel_count = panel_count(required_peak_watts, params.panel_watts);
    let min_controller_amps =
        (f64::from(panel_count) * params.panel_short_circuit_amps) * CONTROLLER_MARGIN;

    let required_inverter_va = balance.peak_simultaneous_power_w * params.inverter_safety_factor;

    debug!(
        energy,
        required_peak_watts, panel_count, battery_capacity_ah, "sizing computed"
    );

    Ok(SizingResult {
        total_daily_energy_wh: energy,
        peak_simultaneous_power_w: balance.peak_simultaneous_power_w,
        required_peak_watts,
        stored_energy_wh,
        battery_capacity_ah,
        panel_count,
        min_controller_amps,
        required_inverter_va,
        panel_watts: params.panel_watts,
        system_voltage: params.system_voltage,
        inverter_safety_factor: params.inverter_safety_factor,
    })
}

/// Whole panels needed to reach the peak power, never fewer than one
fn panel_count(required_peak_watts: f64, panel_watts: f64) -> u32 {
    let panels = (required_peak_watts / panel_watts).ceil();
    // NaN and negatives fall through to the floor of one panel
    if panels >= 1.0 { panels as u32 } else { 1 }
}

/// Format the equipment list as a text table
pub fn format_equipment_table(equipment: &[Equipment]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<28} {:>5} {:>10} {:>6} {:>12} {:>6}\n",
        "Equipment", "Qty", "Power (W)", "H/day", "Energy (Wh)", "Simul."
    ));
    output.push_str(&format!("{}\n", "-".repeat(72)));

    for e in equipment {
        output.push_str(&format!(
            "{:<28} {:>5} {:>10} {:>6.1} {:>12.0} {:>6}\n",
            e.name,
            e.quantity,
            e.power_watts,
            e.hours_per_day,
            e.daily_energy_wh(),
            if e.runs_simultaneously { "yes" } else { "no" }
        ));
    }

    output
}

impl fmt::Display for LoadBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total daily energy:      {:.0} Wh/day", self.total_daily_energy_wh)?;
        write!(f, "Peak simultaneous power: {:.0} W", self.peak_simultaneous_power_w)
    }
}

impl fmt::Display for SizingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Sizing Results ===")?;
        writeln!(f, "Total daily energy:      {:.0} Wh/day", self.total_daily_energy_wh)?;
        writeln!(f, "Peak simultaneous power: {:.0} W", self.peak_simultaneous_power_w)?;
        writeln!(f)?;

        writeln!(f, "PV array:")?;
        writeln!(f, "  Minimum peak power:    {:.0} Wc", self.required_peak_watts)?;
        writeln!(f, "  Panels ({} Wc):       {}", self.panel_watts, self.panel_count)?;
        writeln!(f)?;

        writeln!(f, "Battery bank ({}):", self.system_voltage)?;
        writeln!(f, "  Minimum capacity (C10): {:.0} Ah", self.battery_capacity_ah)?;
        writeln!(f, "  Stored energy:          {:.0} Wh", self.stored_energy_wh)?;
        writeln!(f)?;

        writeln!(f, "Charge controller:")?;
        writeln!(f, "  Minimum current:       {:.0} A", self.min_controller_amps)?;
        writeln!(f, "  System:                {}", self.system_voltage)?;
        writeln!(f)?;

        writeln!(f, "Inverter:")?;
        writeln!(f, "  Required power:        {:.0} VA", self.required_inverter_va)?;
        writeln!(f, "  Safety factor:         {:.2}", self.inverter_safety_factor)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SystemVoltage;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scenario_a() -> (Vec<Equipment>, SiteParameters) {
        (
            vec![Equipment::new("Load", 100.0, 2, 5.0)],
            SiteParameters {
                irradiation_hours: 4.5,
                system_efficiency: 0.70,
                system_voltage: SystemVoltage::V24,
                autonomy_days: 2,
                depth_of_discharge: 0.8,
                panel_watts: 400.0,
                panel_short_circuit_amps: 10.0,
                inverter_safety_factor: 1.25,
            },
        )
    }

    #[rstest]
    fn sizes_single_load(scenario_a: (Vec<Equipment>, SiteParameters)) {
        let (equipment, params) = scenario_a;
        let result = compute(&equipment, &params).unwrap();

        assert_relative_eq!(result.total_daily_energy_wh, 1000.0);
        assert_relative_eq!(result.peak_simultaneous_power_w, 200.0);
        assert_relative_eq!(result.required_peak_watts, 396.825, max_relative = 1e-5);
        assert_eq!(result.panel_count, 1);
        assert_relative_eq!(result.stored_energy_wh, 2500.0);
        assert_relative_eq!(result.battery_capacity_ah, 104.1667, max_relative = 1e-5);
        assert_relative_eq!(result.min_controller_amps, 12.5);
        assert_relative_eq!(result.required_inverter_va, 250.0);
    }

    #[rstest]
    fn empty_list_has_no_load(scenario_a: (Vec<Equipment>, SiteParameters)) {
        let (_, params) = scenario_a;
        assert_eq!(compute(&[], &params), Err(SizingError::NoLoadDefined));
    }

    #[rstest]
    fn zero_hour_loads_have_no_load(scenario_a: (Vec<Equipment>, SiteParameters)) {
        let (_, params) = scenario_a;
        let equipment = vec![Equipment::new("Spare pump", 500.0, 1, 0.0)];
        assert_eq!(compute(&equipment, &params), Err(SizingError::NoLoadDefined));
    }

    #[rstest]
    fn oversized_panel_still_counts_one(scenario_a: (Vec<Equipment>, SiteParameters)) {
        let (equipment, mut params) = scenario_a;
        params.panel_watts = 1.0e9;
        assert_eq!(compute(&equipment, &params).unwrap().panel_count, 1);
    }

    #[rstest]
    fn standalone_loads_do_not_size_inverter(scenario_a: (Vec<Equipment>, SiteParameters)) {
        let (mut equipment, params) = scenario_a;
        equipment.push(Equipment::new("Water heater", 2000.0, 1, 1.0).standalone());
        let result = compute(&equipment, &params).unwrap();

        assert_relative_eq!(result.total_daily_energy_wh, 3000.0);
        assert_relative_eq!(result.peak_simultaneous_power_w, 200.0);
        assert_relative_eq!(result.required_inverter_va, 250.0);
    }

    #[rstest]
    fn multiple_panels_scale_controller(scenario_a: (Vec<Equipment>, SiteParameters)) {
        let (_, params) = scenario_a;
        // 3000 Wh * 1.25 / (4.5 * 0.7) = 1190.5 Wc -> 3 panels of 400 Wc
        let equipment = vec![Equipment::new("Freezer", 250.0, 1, 12.0)];
        let result = compute(&equipment, &params).unwrap();

        assert_eq!(result.panel_count, 3);
        assert_relative_eq!(result.min_controller_amps, 37.5);
    }

    #[rstest]
    #[case(0.0, 400.0, 1)]
    #[case(-50.0, 400.0, 1)]
    #[case(f64::NAN, 400.0, 1)]
    #[case(400.0, 400.0, 1)]
    #[case(400.1, 400.0, 2)]
    #[case(1199.0, 400.0, 3)]
    fn panel_count_rounds_up_with_floor(#[case] peak: f64, #[case] panel: f64, #[case] expected: u32) {
        assert_eq!(panel_count(peak, panel), expected);
    }

    #[rstest]
    fn summary_uses_display_rounding(scenario_a: (Vec<Equipment>, SiteParameters)) {
        let (equipment, params) = scenario_a;
        let summary = compute(&equipment, &params).unwrap().to_string();

        assert!(summary.contains("1000 Wh/day"));
        assert!(summary.contains("397 Wc"));
        assert!(summary.contains("104 Ah"));
        assert!(summary.contains("2500 Wh"));
        assert!(summary.contains("250 VA"));
        assert!(summary.contains("Safety factor:         1.25"));
        assert!(summary.contains("Battery bank (24V)"));
    }

    #[test]
    fn table_lists_every_entry() {
        let table = format_equipment_table(&[
            Equipment::new("Lamp", 10.0, 4, 5.0),
            Equipment::new("Pump", 250.0, 1, 2.0).standalone(),
        ]);

        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("Lamp"));
        assert!(lines[2].contains("200"));
        assert!(lines[3].starts_with("Pump"));
        assert!(lines[3].ends_with("no"));
    }

    fn equipment_strategy() -> impl Strategy<Value = Equipment> {
        ("[a-z]{1,8}", 1.0f64..3000.0, 1u32..10, 0.0f64..=24.0, any::<bool>()).prop_map(
            |(name, power_watts, quantity, hours_per_day, runs_simultaneously)| Equipment {
                name,
                power_watts,
                quantity,
                hours_per_day,
                runs_simultaneously,
            },
        )
    }

    fn params_strategy() -> impl Strategy<Value = SiteParameters> {
        (
            1.0f64..8.0,
            0.5f64..=0.9,
            prop::sample::select(SystemVoltage::ALL.to_vec()),
            1u32..7,
            0.2f64..=1.0,
            100.0f64..800.0,
            1.0f64..20.0,
            1.0f64..2.0,
        )
            .prop_map(|(psh, eff, voltage, days, dod, panel, icc, factor)| SiteParameters {
                irradiation_hours: psh,
                system_efficiency: eff,
                system_voltage: voltage,
                autonomy_days: days,
                depth_of_discharge: dod,
                panel_watts: panel,
                panel_short_circuit_amps: icc,
                inverter_safety_factor: factor,
            })
    }

    proptest! {
        #[test]
        fn total_energy_is_order_independent(
            mut equipment in prop::collection::vec(equipment_strategy(), 0..12),
        ) {
            let expected: f64 = equipment
                .iter()
                .map(|e| e.power_watts * f64::from(e.quantity) * e.hours_per_day)
                .sum();
            let forward = load_balance(&equipment).total_daily_energy_wh;
            equipment.reverse();
            let reversed = load_balance(&equipment).total_daily_energy_wh;

            prop_assert!((forward - expected).abs() <= 1e-9 * expected.max(1.0));
            prop_assert!((forward - reversed).abs() <= 1e-9 * expected.max(1.0));
        }

        #[test]
        fn peak_power_counts_only_simultaneous_loads(
            equipment in prop::collection::vec(equipment_strategy(), 0..12),
        ) {
            let expected: f64 = equipment
                .iter()
                .filter(|e| e.runs_simultaneously)
                .map(|e| e.power_watts * f64::from(e.quantity))
                .sum();
            prop_assert_eq!(load_balance(&equipment).peak_simultaneous_power_w, expected);
        }

        #[test]
        fn derived_figures_follow_formulas(
            equipment in prop::collection::vec(equipment_strategy(), 1..8),
            params in params_strategy(),
        ) {
            let balance = load_balance(&equipment);
            prop_assume!(balance.total_daily_energy_wh > 0.0);
            let result = compute(&equipment, &params).unwrap();

            let expected_panels = ((result.required_peak_watts / params.panel_watts).ceil() as u32).max(1);
            prop_assert_eq!(result.panel_count, expected_panels);

            let expected_ah = (result.total_daily_energy_wh * f64::from(params.autonomy_days)
                / params.depth_of_discharge)
                / f64::from(params.system_voltage.volts());
            prop_assert!((result.battery_capacity_ah - expected_ah).abs() <= 1e-9 * expected_ah);

            prop_assert!(result.required_peak_watts > 0.0);
            prop_assert!(result.min_controller_amps > 0.0);
            prop_assert!(result.required_inverter_va >= 0.0);
        }

        #[test]
        fn compute_is_idempotent(
            equipment in prop::collection::vec(equipment_strategy(), 0..8),
            params in params_strategy(),
        ) {
            prop_assert_eq!(compute(&equipment, &params), compute(&equipment, &params));
        }
    }
}
