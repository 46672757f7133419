mod scenario;

use airborne::Simulation;
use log::info;
use scenario::Scenario;
use simcore::{DofPermutation, OutputTable};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Usage: `acro-sim [--verbose] [scenario.json]`. Without a scenario file the
/// built-in demo is run.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let path = args.iter().find(|a| !a.starts_with('-'));

    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let scenario = match path {
        Some(path) => {
            info!("loading scenario {path}");
            serde_json::from_reader(File::open(path)?)?
        }
        None => Scenario::demo(),
    };
    scenario.inertia.validate()?;

    let convention = DofPermutation::root_first(&scenario.model)?;
    let sim = Simulation::new(
        scenario.model.clone(),
        scenario.joints.clone(),
        scenario.inertia.clone(),
        convention,
        scenario.markers.clone(),
    )
    .with_settings(scenario.settings);

    let output = sim.run(&scenario.takeoff)?;
    write_csv(&scenario.output, &output.table)?;

    println!(
        "{} of {} samples written to {}",
        output.used_samples, output.total_samples, scenario.output
    );
    if let Some(k) = output.contact_index {
        println!("landing at t = {:.2} s", output.table.time(k));
    }
    Ok(())
}

fn write_csv(path: &str, table: &OutputTable) -> std::io::Result<()> {
    let mut csv = BufWriter::new(File::create(path)?);
    let header: Vec<String> = (0..table.dof_count()).map(|dof| format!("q{dof}")).collect();
    writeln!(csv, "t,{}", header.join(","))?;
    for k in 0..table.len() {
        let row: Vec<String> = table.sample(k).iter().map(|v| format!("{v:.6}")).collect();
        writeln!(csv, "{:.4},{}", table.time(k), row.join(","))?;
    }
    csv.flush()
}
