use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mcs51_sim::ctl::{Controller, FlagPresets, FullState};
use mcs51_sim::err::{report, CtlErr};
use mcs51_sim::sim::SimFlags;

/// Assembles and runs an 8051 assembly file, then prints the machine state as JSON.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.asm` file to run
    path: PathBuf,

    /// Execute this many instructions (one at a time) instead of running to completion
    #[arg(short, long)]
    steps: Option<u64>,

    /// Iteration cap for running to completion
    #[arg(long, default_value_t = SimFlags::default().max_steps)]
    max_steps: u64,

    /// PSW flag to preset before running, as NAME=VALUE (e.g. CY=1)
    #[arg(short, long = "flag", value_name = "NAME=VALUE", value_parser = FlagPresets::parse_assignment)]
    flags: Vec<(String, u32)>,

    /// Print the JSON on a single line
    #[arg(short, long)]
    compact: bool,
}

fn execute(args: &Args, src: &str, ctl: &mut Controller) -> Result<FullState, CtlErr> {
    let lines: Vec<_> = src.lines().collect();
    let presets: FlagPresets = args.flags.iter().cloned().collect();

    ctl.assemble(&lines, Some(&presets))?;
    match args.steps {
        Some(n) => {
            for _ in 0..n {
                ctl.run_once()?;
            }
            Ok(ctl.state())
        },
        None => ctl.run(),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let src = match std::fs::read_to_string(&args.path) {
        Ok(src) => src,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut ctl = Controller::with_flags(SimFlags { max_steps: args.max_steps });
    let state = match execute(&args, &src, &mut ctl) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", report(&e));
            return ExitCode::FAILURE;
        }
    };

    let json = match args.compact {
        true  => state.to_json(),
        false => state.to_json_pretty(),
    };
    match json {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
