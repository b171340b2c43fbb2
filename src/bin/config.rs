//! proto-compat Config CLI
//!
//! View and manage proto-compat configuration.

use clap::{Parser, Subcommand};
use proto_compat::CompatConfig;

#[derive(Parser)]
#[command(name = "proto-compat-config")]
#[command(about = "View and manage proto-compat configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: proto-compat.toml)
        #[arg(short, long, default_value = "proto-compat.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = CompatConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("proto-compat configuration\n");
                println!("Compare:");
                println!("  Mode: {}", cfg.compare.mode);

                println!("\nReport:");
                println!("  Format: {}", cfg.report.format);
                println!("  Notes: {}", cfg.report.show_notes);
                println!("  Indent: {}", cfg.report.indent);

                if let Some(path) = CompatConfig::user_config_path() {
                    println!("\nUser config: {}", path.display());
                }
            }
        }

        Commands::Init { output } => {
            let cfg = CompatConfig::default();
            cfg.save(&output)?;
            println!("Created config file: {}", output);
        }

        Commands::Validate { config } => match CompatConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("Configuration is valid");
                println!("   Mode: {}", cfg.compare.mode);
                println!("   Format: {}", cfg.report.format);
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
