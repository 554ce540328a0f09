use std::fs::write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use ck2eu_lib::{
    disable_ansi_colors, emit_reports, set_minimum_severity, PdxFile, Severity, Tables, Weights,
    World,
};

#[derive(Parser)]
#[clap(version, about)]
struct Cli {
    /// Path to the Crusader Kings save game.
    ck_save: PathBuf,
    /// Path to the coefficient tables for settlements, buildings and units.
    #[clap(long)]
    tables: PathBuf,
    /// Path to a Europa Universalis save to load the target provinces and countries from.
    #[clap(long)]
    eu: Option<PathBuf>,
    /// Output the scores and the reports in JSON format.
    #[clap(long)]
    json: bool,
    /// Omit color from the output.
    #[clap(long)]
    no_color: bool,
    /// Include the per-settlement weight breakdown in the reports.
    #[clap(long)]
    trace: bool,
    /// Write the scored provinces and the rulers, with their barony counts, to this file.
    #[clap(long)]
    write: Option<PathBuf>,
}

#[derive(Serialize)]
struct ProvinceScore<'a> {
    id: &'a str,
    name: &'a str,
    settlements: usize,
    weights: &'a Weights,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    #[cfg(windows)]
    if !args.no_color {
        let _ = ansiterm::enable_ansi_support()
            .map_err(|_| eprintln!("Failed to enable ANSI support for Windows10 users. Continuing probably without colored output."));
    }

    if args.no_color {
        disable_ansi_colors();
    }
    if !args.trace {
        set_minimum_severity(Severity::Untidy);
    }

    let tables = Tables::read(&args.tables)?;
    let ck = PdxFile::read(&args.ck_save)?;
    let eu = args.eu.as_deref().map(PdxFile::read).transpose()?;

    let world = World::build(ck, eu, &tables);
    // Print whatever was found even if the build failed, since the reports explain the failure.
    emit_reports(args.json);
    let world = world?;

    eprintln!(
        "Loaded {} titles, {} rulers, {} provinces, {} wars.",
        world.titles.len(),
        world.rulers.len(),
        world.ck_provinces.len(),
        world.wars.len()
    );
    if !world.eu_provinces.is_empty() {
        eprintln!(
            "Loaded {} target provinces and {} countries.",
            world.eu_provinces.len(),
            world.countries.len()
        );
    }

    let scores: Vec<_> = world
        .ck_provinces
        .all()
        .iter()
        .map(|p| ProvinceScore {
            id: p.id().as_str(),
            name: p.name(),
            settlements: p.settlements().len(),
            weights: p.weights(),
        })
        .collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
    } else {
        for score in &scores {
            print!("{} {} ({} settlements):", score.id, score.name, score.settlements);
            for (weight, value) in score.weights.iter() {
                print!(" {weight} {value:.3}");
            }
            println!();
        }
    }

    if let Some(path) = &args.write {
        let output = format!("{}{}", world.ck_provinces_block(), world.rulers_block());
        write(path, output)
            .with_context(|| format!("could not write {}", path.display()))?;
        eprintln!("Wrote scored provinces and rulers to {}", path.display());
    }
    Ok(())
}
