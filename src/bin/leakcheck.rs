//! Command-line front end for the layer-store leak audit.
//!
//! Exit status is zero only on a clean pass: any unreferenced entity, any
//! fatal error, and any incomplete removal pass all exit non-zero.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use leakcheck::{audit, remove_leaked, DriverFamily, Store};

/// leakcheck
#[derive(Debug, Parser)]
#[clap(name = "leakcheck", version)]
struct App {
    /// Root of the runtime data directory
    #[clap(long, default_value = DriverFamily::default_data_root())]
    root: PathBuf,

    /// Graph driver family whose stores are audited
    #[clap(long, value_enum, default_value_t = Driver::host_default())]
    driver: Driver,

    /// Delete unreferenced entities after reporting them
    #[clap(long)]
    delete: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Driver {
    Overlay2,
    Windowsfilter,
}

impl Driver {
    fn host_default() -> Self {
        if cfg!(windows) {
            Driver::Windowsfilter
        } else {
            Driver::Overlay2
        }
    }

    fn family(self) -> DriverFamily {
        match self {
            Driver::Overlay2 => DriverFamily::Overlay2,
            Driver::Windowsfilter => DriverFamily::WindowsFilter,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = App::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the store was clean (and, with `--delete`, whether the
/// cleanup completed).
fn run(args: &App) -> Result<bool> {
    let store = Store::open(&args.root, args.driver.family())
        .with_context(|| format!("opening layer store under {}", args.root.display()))?;

    let report = audit(&store)?;

    for id in &report.leaked_records {
        println!("layer record not referenced: {id}");
    }
    for id in &report.leaked_layers {
        println!("raw layer not referenced: {id}");
    }

    if report.is_clean() {
        println!("clean: every layer record and raw layer is referenced");
        return Ok(true);
    }

    println!(
        "unreferenced: {} layer records, {} raw layers",
        report.leaked_records.len(),
        report.leaked_layers.len()
    );

    if args.delete {
        let summary = remove_leaked(&store, &report);
        println!("removed {} entities ({} failed)", summary.removed, summary.failed);
    }

    Ok(false)
}
