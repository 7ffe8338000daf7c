//! # hoconset demo
//!
//! A small host that drives hoconset from the command line. It exists to
//! demonstrate and manually verify the library, not as a finished tool.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example hoconset_demo -- apply foo.bar --path /tmp/foo.conf --value '"BAR!"'
//! cargo run --example hoconset_demo -- check foo.bar --path /tmp/foo.conf --value '"BAR!"'
//! ```
//!
//! ## Things to try
//!
//! | Behaviour               | Command                                                                 |
//! |-------------------------|-------------------------------------------------------------------------|
//! | Create nested setting   | `apply foo.bar --path /tmp/foo.conf --value BAR!`                       |
//! | Idempotence             | run the same `apply` twice; the second reports `in sync`                |
//! | Whole-array replacement | `apply arr --path /tmp/foo.conf --type array --value '[1]'`             |
//! | Add one element         | `apply arr --path /tmp/foo.conf --type array_element --value 2`         |
//! | Remove a setting        | `apply foo.bar --path /tmp/foo.conf --ensure absent`                    |
//! | Raw text block          | `apply cache --path /tmp/foo.conf --type text --value '{ size = 10 }'`  |
//! | Aggregated validation   | `apply` with no flags                                                   |
//! | Render options          | `HOCONSET_INDENT=2 cargo run --example hoconset_demo -- apply ...`      |
//! | Logging                 | `RUST_LOG=hoconset=debug cargo run --example hoconset_demo -- apply ...` |

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hoconset::{Options, SettingArgs, SettingError, apply_file, check_file};

/// hoconset demo: converge one HOCON setting.
#[derive(Parser, Debug)]
#[command(name = "hoconset-demo")]
struct Cli {
    /// Options file (defaults to the platform config directory).
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report whether the file already holds the setting. Exits 1 if not.
    Check(SettingArgs),
    /// Converge the file and print what changed.
    Apply(SettingArgs),
}

fn run(cli: Cli) -> Result<ExitCode, SettingError> {
    match cli.command {
        Commands::Check(args) => {
            let desired = args.into_desired();
            if check_file(&desired)? {
                println!("in sync");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("out of sync");
                Ok(ExitCode::from(1))
            }
        }
        Commands::Apply(args) => {
            let options = Options::load(cli.options.as_deref())?;
            let outcome = apply_file(&args.into_desired(), &options)?;
            println!("{outcome}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        ExitCode::from(2)
    })
}
