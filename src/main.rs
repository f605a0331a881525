use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum, ValueHint};
use tracing_subscriber::EnvFilter;

use musette::project::{self, SessionDisplay};
use musette::{Capacities, UnitSystem, decode_file};

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode a FIT or TCX activity file and print its session summary", long_about = None)]
struct Cli {
    /// Activity file to decode (.fit or .tcx)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Unit system for display values
    #[arg(long, value_enum, default_value_t = Units::Metric)]
    units: Units,

    /// Local-time offset from UTC, in seconds
    #[arg(long, default_value_t = 0)]
    tz_offset: i64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Units {
    Metric,
    English,
}

impl From<Units> for UnitSystem {
    fn from(units: Units) -> Self {
        match units {
            Units::Metric => Self::Metric,
            Units::English => Self::English,
        }
    }
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let store = decode_file(&cli.input, Capacities::default())
        .with_context(|| format!("decoding {}", cli.input.display()))?;

    let units = UnitSystem::from(cli.units);
    let session = project::session_display(store.session(), units, cli.tz_offset);

    println!("Samples: {}", store.samples().len());
    println!("Laps:    {}", store.laps().len());
    println!();
    print_session(&session, units);

    Ok(())
}

fn print_session(session: &SessionDisplay, units: UnitSystem) {
    let (distance, speed, altitude, temperature) = match units {
        UnitSystem::Metric => ("km", "km/h", "m", "deg C"),
        UnitSystem::English => ("miles", "mph", "ft", "deg F"),
    };

    print_text("Start time", session.start_time.as_deref());
    print_value("Start latitude", session.start_position_lat, "deg");
    print_value("Start longitude", session.start_position_long, "deg");
    print_value("Total elapsed time", session.total_elapsed_time, "s");
    print_value("Total timer time", session.total_timer_time, "s");
    print_value("Total distance", session.total_distance, distance);
    print_value("Total work", session.total_work, "kJ");
    print_value("Total moving time", session.total_moving_time, "s");
    print_value("Average lap time", session.avg_lap_time, "s");
    print_value("Total calories", session.total_calories, "kcal");
    print_value("Average speed", session.avg_speed, speed);
    print_value("Maximum speed", session.max_speed, speed);
    print_value("Total ascent", session.total_ascent, altitude);
    print_value("Total descent", session.total_descent, altitude);
    print_value("Average altitude", session.avg_altitude, altitude);
    print_value("Maximum altitude", session.max_altitude, altitude);
    print_value("Minimum altitude", session.min_altitude, altitude);
    print_value("Average heart rate", session.avg_heart_rate, "bpm");
    print_value("Maximum heart rate", session.max_heart_rate, "bpm");
    print_value("Minimum heart rate", session.min_heart_rate, "bpm");
    print_value("Average cadence", session.avg_cadence, "steps/min");
    print_value("Maximum cadence", session.max_cadence, "steps/min");
    print_value("Average temperature", session.avg_temperature, temperature);
    print_value("Maximum temperature", session.max_temperature, temperature);
    print_value(
        "Total anaerobic training effect",
        session.total_anaerobic_training_effect,
        "",
    );
    print_text("End time", session.end_time.as_deref());
}

fn print_value(label: &str, value: Option<f64>, unit: &str) {
    match value {
        Some(v) => println!("{label:<32} = {v:.2} {unit}"),
        None => println!("{label:<32} = no data"),
    }
}

fn print_text(label: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("{label:<32} = {v}"),
        None => println!("{label:<32} = no data"),
    }
}
