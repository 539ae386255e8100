use std::path::PathBuf;
use std::process;

use clap::Parser;

mod context;
mod run;

/// Terminal front-end for the plum8 machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Program image, loaded at address 0x200
    rom: PathBuf,

    /// Clock rate in instructions per second
    #[arg(default_value_t = 500)]
    clock_hz: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run::run(&args.rom, args.clock_hz) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
