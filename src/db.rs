//! Project store schema and operations

use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::models::{DEFAULT_PROJECT_NAME, Equipment, Project, SiteParameters, SystemVoltage};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Single project per store
        CREATE TABLE IF NOT EXISTS project (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            name TEXT NOT NULL
        );

        -- Power balance entries, kept in insertion order
        CREATE TABLE IF NOT EXISTS equipment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            power_watts REAL NOT NULL,
            quantity INTEGER NOT NULL,
            hours_per_day REAL NOT NULL,
            runs_simultaneously INTEGER NOT NULL
        );

        -- Site and system parameters
        CREATE TABLE IF NOT EXISTS parameters (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            irradiation_hours REAL NOT NULL,
            system_efficiency REAL NOT NULL,
            system_voltage INTEGER NOT NULL,
            autonomy_days INTEGER NOT NULL,
            depth_of_discharge REAL NOT NULL,
            panel_watts REAL NOT NULL,
            panel_short_circuit_amps REAL NOT NULL,
            inverter_safety_factor REAL NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Set the project name used to label reports
pub fn set_project_name(conn: &Connection, name: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO project (id, name) VALUES (1, ?1)",
        [name],
    )?;
    info!(name, "project renamed");
    Ok(())
}

/// Get the project name, falling back to the default label
pub fn get_project_name(conn: &Connection) -> Result<String> {
    let name = conn
        .query_row("SELECT name FROM project WHERE id = 1", [], |row| row.get(0))
        .optional()?;
    Ok(name.unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()))
}

/// Append an equipment entry
pub fn insert_equipment(conn: &Connection, equipment: &Equipment) -> Result<()> {
    conn.execute(
        "INSERT INTO equipment (name, power_watts, quantity, hours_per_day, runs_simultaneously)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &equipment.name,
            equipment.power_watts,
            equipment.quantity,
            equipment.hours_per_day,
            equipment.runs_simultaneously,
        ),
    )?;
    debug!(name = %equipment.name, "equipment added");
    Ok(())
}

/// List equipment in the order it was added
pub fn list_equipment(conn: &Connection) -> Result<Vec<Equipment>> {
    let mut stmt = conn.prepare(
        "SELECT name, power_watts, quantity, hours_per_day, runs_simultaneously
         FROM equipment
         ORDER BY id",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Equipment {
            name: row.get(0)?,
            power_watts: row.get(1)?,
            quantity: row.get(2)?,
            hours_per_day: row.get(3)?,
            runs_simultaneously: row.get(4)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Remove every equipment entry
pub fn clear_equipment(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM equipment", [])?;
    info!(removed, "equipment list cleared");
    Ok(removed)
}

/// Store the parameter set, replacing any previous one
pub fn save_parameters(conn: &Connection, params: &SiteParameters) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO parameters (
            id, irradiation_hours, system_efficiency, system_voltage, autonomy_days,
            depth_of_discharge, panel_watts, panel_short_circuit_amps, inverter_safety_factor
         ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            params.irradiation_hours,
            params.system_efficiency,
            params.system_voltage.volts(),
            params.autonomy_days,
            params.depth_of_discharge,
            params.panel_watts,
            params.panel_short_circuit_amps,
            params.inverter_safety_factor,
        ),
    )?;
    Ok(())
}

/// Load the stored parameter set, or the defaults when none was saved
pub fn load_parameters(conn: &Connection) -> Result<SiteParameters> {
    let params = conn
        .query_row(
            "SELECT irradiation_hours, system_efficiency, system_voltage, autonomy_days,
                    depth_of_discharge, panel_watts, panel_short_circuit_amps, inverter_safety_factor
             FROM parameters WHERE id = 1",
            [],
            |row| {
                let volts: u32 = row.get(2)?;
                let system_voltage = SystemVoltage::try_from(volts)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(e)))?;
                Ok(SiteParameters {
                    irradiation_hours: row.get(0)?,
                    system_efficiency: row.get(1)?,
                    system_voltage,
                    autonomy_days: row.get(3)?,
                    depth_of_discharge: row.get(4)?,
                    panel_watts: row.get(5)?,
                    panel_short_circuit_amps: row.get(6)?,
                    inverter_safety_factor: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(params.unwrap_or_default())
}

/// Load the whole project: name, equipment list and parameters
pub fn load_project(conn: &Connection) -> Result<Project> {
    let mut project = Project::new(&get_project_name(conn)?);
    project.equipment = list_equipment(conn)?;
    project.parameters = load_parameters(conn)?;
    Ok(project)
}
