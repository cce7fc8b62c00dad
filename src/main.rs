//! SML interpreter CLI.
//!
//! Translates an SML program, prints its listing, runs it and prints the
//! final register state.
//!
//! # Usage
//! ```text
//! sml <program.sml> [OPTIONS]
//! ```
//!
//! # Options
//! - `-d, --dir <dir>`: Directory the program path is resolved against
//! - `-t, --trace`: Log every executed instruction
//! - `-q, --quiet`: Only print values emitted by `out`
//!
//! # Environment
//! - `SML_LOG`: Default log level (`debug`, `info`, `warn`, `error`)
//! - `SML_DIR`: Default program directory

use sml::config::{Command, Config};
use sml::utils::log;
use sml::virtual_machine::errors::SmlError;
use sml::virtual_machine::machine::Machine;
use sml::virtual_machine::translator::translate_file;
use sml::{error, info, warn};
use std::env;
use std::process;

fn main() {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "sml".to_string());

    let config = match Config::from_args(args, |k| env::var(k).ok()) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print_usage(&program);
            process::exit(0);
        }
        Err(e) => {
            error!("{e}");
            print_usage(&program);
            process::exit(1);
        }
    };

    log::set_max_level(config.log_level);

    if let Err(e) = run(&config) {
        if !e.is_translation_failure() {
            error!("{e}");
        }
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), SmlError> {
    let path = config.program_path();
    let translation = translate_file(&path)?;

    if !translation.degradations.is_empty() {
        warn!(
            "{} line(s) of {} were degraded during translation",
            translation.degradations.len(),
            path.display()
        );
    }

    if !config.quiet {
        println!(
            "Here is the program; it has {} instructions.",
            translation.program.len()
        );
        print!("{}", translation.program.listing());
        println!("Labels: {}", translation.labels);
        println!();
        println!("Beginning program execution.");
    }

    let mut machine = Machine::new(translation.labels, translation.program);
    let result = machine.run();

    if !config.quiet {
        println!("Ending program execution.");
        println!("Values of registers at program termination:");
        println!("{}", machine.registers());
    }

    let summary = result.inspect_err(|_| {
        if let Some(instruction) = machine.program().get(machine.pc()) {
            error!("fault at instruction {}: {}", machine.pc(), instruction);
        }
    })?;
    info!("executed {} instructions", summary.steps);
    Ok(())
}

const USAGE: &str = "\
SML Interpreter

USAGE:
    {program} <program.sml> [OPTIONS]

ARGS:
    <program.sml>    SML source file to run

OPTIONS:
    -d, --dir <dir>    Directory the program path is resolved against
    -t, --trace        Log every executed instruction
    -q, --quiet        Only print values emitted by `out`
    -h, --help         Print this help message

ENVIRONMENT:
    SML_LOG            Default log level (debug, info, warn, error)
    SML_DIR            Default program directory
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
