use clap::{Parser, Subcommand};
use colored::Colorize;
use pykeg::venv::SystemRunner;
use pykeg::{Formula, InstallOptions, installer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pykeg")]
#[command(author, version, about = "Install Python formulae into isolated virtualenv kegs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a formula into an isolated virtualenv keg
    Install {
        /// Path to the formula manifest (JSON)
        formula: PathBuf,

        /// Skip the pip compatibility pin
        #[arg(long)]
        no_pin_pip: bool,

        /// Fallback interpreter when the formula declares no python
        #[arg(long)]
        default_python: Option<String>,
    },

    /// Show a formula manifest without installing it
    Info {
        /// Path to the formula manifest (JSON)
        formula: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "warn");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Install {
            formula,
            no_pin_pip,
            default_python,
        } => {
            let formula = Formula::load(&formula)?;

            let mut opts = InstallOptions::default();
            if no_pin_pip {
                opts.pin_pip = false;
            }
            if let Some(python) = default_python {
                opts.default_python = python;
            }

            println!(
                "Installing {} {} ({} resources)...",
                formula.name.bold(),
                formula.version.dimmed(),
                formula.resources().len()
            );

            let venv = installer::install(&formula, &opts, &SystemRunner).await?;

            println!(
                "{} Installed {} {} with {}",
                "✓".green().bold(),
                formula.name.bold().green(),
                formula.version.dimmed(),
                venv.interpreter().cyan()
            );
        }
        Commands::Info { formula } => {
            let formula = Formula::load(&formula)?;

            println!("{} {}", formula.name.bold(), formula.version);
            if let Some(homepage) = &formula.homepage {
                println!("{}", homepage.cyan());
            }
            if !formula.dependencies.is_empty() {
                println!("Depends on: {}", formula.dependencies.join(", "));
            }
            println!("Resources:");
            for resource in formula.resources() {
                println!("  {} {}", resource.name.cyan(), resource.sha256.dimmed());
            }
        }
    }

    Ok(())
}
