mod commands;
mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mietmaske_core::{DEFAULT_API_BASE, DEFAULT_TEMPLATE_PATH};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mietmaske")]
#[command(about = "Rental-contract intake: client form, lawyer form, contract generation")]
#[command(version)]
struct Cli {
    /// Backend API root.
    #[arg(long, global = true, env = "MIETMASKE_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Contract template path passed through to the backend.
    #[arg(
        long,
        global = true,
        env = "MIETMASKE_TEMPLATE_PATH",
        default_value = DEFAULT_TEMPLATE_PATH
    )]
    template_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a client or lawyer record of any vintage to canonical keys.
    Normalize {
        file: PathBuf,
        /// Treat the file as lawyer decisions instead of a client intake.
        #[arg(long)]
        lawyer: bool,
    },
    /// Check every wizard step and list the fields that still need input.
    Validate {
        file: PathBuf,
        /// Validate the lawyer form of a combined `{maskA, maskB}` file.
        #[arg(long)]
        lawyer: bool,
    },
    /// Complete the client form: write the local export and send it to the backend.
    Intake {
        file: PathBuf,
        /// Field assignments `key=value`; the value may be JSON.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Skip the backend save.
        #[arg(long)]
        offline: bool,
    },
    /// Print the template placeholder mapping for an imported intake.
    Placeholders {
        file: PathBuf,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Submit the lawyer form and request the generated contract.
    Generate {
        file: PathBuf,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Write the combined client and lawyer file.
    Combine {
        file: PathBuf,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(api_base = %cli.api_base, "mietmaske v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Normalize { file, lawyer } => commands::normalize(&file, lawyer),
        Command::Validate { file, lawyer } => commands::validate(&file, lawyer),
        Command::Intake {
            file,
            set,
            out_dir,
            offline,
        } => {
            let api_base = (!offline).then_some(cli.api_base.as_str());
            commands::intake(&file, &set, &out_dir, api_base).await
        }
        Command::Placeholders { file, set } => commands::placeholders(&file, &set),
        Command::Generate { file, set } => {
            commands::generate(&file, &set, &cli.api_base, &cli.template_path).await
        }
        Command::Combine { file, set, out_dir } => commands::combine(&file, &set, &out_dir),
    }
}
