//! Solar Sizer
//!
//! A sizing calculator for small off-grid solar installations.

mod calculator;
mod db;
mod error;
mod import;
mod models;
mod report;
mod validation;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use tracing::{Level, debug};

use crate::error::SizingError;
use crate::models::{Equipment, Project, SiteParameters, SystemVoltage};
use crate::report::Report;

#[derive(Parser)]
#[command(name = "solar-sizer")]
#[command(about = "Sizing calculator for small off-grid solar installations")]
struct Cli {
    /// Path to the project database
    #[arg(short, long, default_value = "solar_sizer.db")]
    database: PathBuf,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an empty project database
    Init,

    /// Show or set the project name used on reports
    Project {
        /// New project name
        name: Option<String>,
    },

    /// Add an equipment entry to the power balance
    Add {
        /// Equipment name (e.g., "Fridge")
        name: String,

        /// Rated power of one unit in W
        #[arg(short, long)]
        power: f64,

        /// Number of identical units
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Daily usage in hours
        #[arg(long, default_value_t = 0.0)]
        hours: f64,

        /// Load never runs together with others (excluded from inverter sizing)
        #[arg(long)]
        standalone: bool,
    },

    /// List the power balance
    List,

    /// Remove all equipment entries
    Clear,

    /// Show the stored parameters, or update them with the given values
    Params {
        #[command(flatten)]
        overrides: ParamOverrides,
    },

    /// Size the installation for the current power balance
    Calc {
        #[command(flatten)]
        overrides: ParamOverrides,
    },

    /// Write the sizing report document
    Report {
        /// Output file (defaults to a dated name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ParamOverrides,
    },

    /// Import equipment from a load sheet or a directory of *.loads files
    Import {
        /// Load sheet file or directory
        path: PathBuf,

        /// Clear the existing equipment list first
        #[arg(long)]
        clear: bool,
    },

    /// Replace the equipment list with a sample household
    LoadSample,
}

/// Per-invocation values layered over the stored parameters
#[derive(Args, Debug, Default)]
struct ParamOverrides {
    /// Daily irradiation in peak sun hours
    #[arg(long)]
    psh: Option<f64>,

    /// Overall system efficiency (performance ratio)
    #[arg(long)]
    efficiency: Option<f64>,

    /// System voltage: 12, 24 or 48
    #[arg(long)]
    voltage: Option<SystemVoltage>,

    /// Days of autonomy
    #[arg(long)]
    autonomy: Option<u32>,

    /// Maximum depth of discharge (0.2 - 1.0)
    #[arg(long)]
    dod: Option<f64>,

    /// Rated power of one panel in Wc
    #[arg(long)]
    panel_watts: Option<f64>,

    /// Short-circuit current of one panel in A
    #[arg(long)]
    panel_icc: Option<f64>,

    /// Inverter safety factor applied to the peak power
    #[arg(long)]
    inverter_factor: Option<f64>,
}

impl ParamOverrides {
    fn is_empty(&self) -> bool {
        self.psh.is_none()
            && self.efficiency.is_none()
            && self.voltage.is_none()
            && self.autonomy.is_none()
            && self.dod.is_none()
            && self.panel_watts.is_none()
            && self.panel_icc.is_none()
            && self.inverter_factor.is_none()
    }

    fn apply(&self, mut params: SiteParameters) -> Result<SiteParameters, SizingError> {
        if let Some(v) = self.psh {
            params.irradiation_hours = v;
        }
        if let Some(v) = self.efficiency {
            params.system_efficiency = v;
        }
        if let Some(v) = self.voltage {
            params.system_voltage = v;
        }
        if let Some(v) = self.autonomy {
            params.autonomy_days = v;
        }
        if let Some(v) = self.dod {
            params.depth_of_discharge = v;
        }
        if let Some(v) = self.panel_watts {
            params.panel_watts = v;
        }
        if let Some(v) = self.panel_icc {
            params.panel_short_circuit_amps = v;
        }
        if let Some(v) = self.inverter_factor {
            params.inverter_safety_factor = v;
        }
        params.validate()?;
        Ok(params)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;
    debug!(database = %cli.database.display(), "store opened");

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Project { name } => {
            if let Some(name) = name {
                db::set_project_name(&conn, &name)?;
            }
            println!("Project: {}", db::get_project_name(&conn)?);
        }

        Commands::Add {
            name,
            power,
            quantity,
            hours,
            standalone,
        } => {
            let equipment = Equipment {
                name,
                power_watts: power,
                quantity,
                hours_per_day: hours,
                runs_simultaneously: !standalone,
            };
            equipment.validate()?;
            db::insert_equipment(&conn, &equipment)?;
            println!("{} added!", equipment.name);
        }

        Commands::List => {
            let equipment = db::list_equipment(&conn)?;
            if equipment.is_empty() {
                println!("No equipment yet. Run 'add', 'import' or 'load-sample' first.");
            } else {
                println!("{}", calculator::format_equipment_table(&equipment));
                println!("{}", calculator::load_balance(&equipment));
            }
        }

        Commands::Clear => {
            let removed = db::clear_equipment(&conn)?;
            println!("Removed {} equipment entries", removed);
        }

        Commands::Params { overrides } => {
            let stored = db::load_parameters(&conn)?;
            if overrides.is_empty() {
                print_parameters(&stored);
            } else {
                let params = overrides.apply(stored)?;
                db::save_parameters(&conn, &params)?;
                println!("Parameters saved.\n");
                print_parameters(&params);
            }
        }

        Commands::Calc { overrides } => {
            let project = project_with_overrides(&conn, &overrides)?;
            match calculator::compute(&project.equipment, &project.parameters) {
                Ok(result) => println!("{}", result),
                Err(SizingError::NoLoadDefined) => print_no_load_prompt(),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Report { output, overrides } => {
            let project = project_with_overrides(&conn, &overrides)?;
            match calculator::compute(&project.equipment, &project.parameters) {
                Ok(result) => {
                    let today = chrono::Local::now().date_naive();
                    let report = Report::new(&project, result, today);
                    let path = output.unwrap_or_else(|| PathBuf::from(report.default_file_name()));
                    report.write_to(&path)?;
                    println!("Report written to {}", path.display());
                }
                Err(SizingError::NoLoadDefined) => print_no_load_prompt(),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Import { path, clear } => {
            let stats = import::import_to_database(&conn, &path, clear)?;
            println!("{}", stats);
        }

        Commands::LoadSample => {
            let count = load_sample_data(&conn)?;
            println!("Loaded {} sample equipment entries", count);
        }
    }

    Ok(())
}

fn project_with_overrides(conn: &Connection, overrides: &ParamOverrides) -> Result<Project> {
    let mut project = db::load_project(conn)?;
    project.parameters = overrides.apply(project.parameters)?;
    Ok(project)
}

fn print_no_load_prompt() {
    println!("No load defined. Add equipment to start the sizing.");
}

fn print_parameters(params: &SiteParameters) {
    println!("Irradiation (PSH):        {} h/day", params.irradiation_hours);
    println!("System efficiency (PR):   {:.2}", params.system_efficiency);
    println!("System voltage:           {}", params.system_voltage);
    println!("Autonomy:                 {} days", params.autonomy_days);
    println!("Depth of discharge (DoD): {:.0}%", params.depth_of_discharge * 100.0);
    println!("Panel rating:             {} Wc", params.panel_watts);
    println!("Panel Icc:                {:.1} A", params.panel_short_circuit_amps);
    println!("Inverter safety factor:   {:.2}", params.inverter_safety_factor);
}

fn sample_household() -> Vec<Equipment> {
    vec![
        Equipment::new("LED lamp", 9.0, 8, 5.0),
        Equipment::new("Fridge", 150.0, 1, 10.0),
        Equipment::new("Television", 80.0, 1, 4.0),
        Equipment::new("Laptop", 65.0, 2, 6.0),
        Equipment::new("Wi-Fi router", 12.0, 1, 24.0),
        Equipment::new("Phone charger", 10.0, 3, 2.0),
        Equipment::new("Water pump", 750.0, 1, 1.0).standalone(),
    ]
}

/// Load a sample household for trying the calculator
fn load_sample_data(conn: &Connection) -> Result<usize> {
    let sample = sample_household();

    let tx = conn.unchecked_transaction()?;
    db::clear_equipment(&tx)?;
    for equipment in &sample {
        db::insert_equipment(&tx, equipment)?;
    }
    tx.commit()?;

    Ok(sample.len())
}
