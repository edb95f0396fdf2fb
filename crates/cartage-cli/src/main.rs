mod commands;

use cartage_schema::Tier;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_VERSION_CONFLICT};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cartage",
    version,
    about = "Per-tier library manifests and cartridge lists for modular applications"
)]
struct Cli {
    /// Path to the project configuration.
    #[arg(long, default_value = "cartage.toml", global = true)]
    config: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute and write the library manifest of every tier.
    Manifests,
    /// Recompute the manifests and compare them with the files on disk.
    Check,
    /// Extend the cartridge list template for a tier.
    Extend {
        /// Target tier: production, test, or development.
        #[arg(long)]
        tier: Tier,
    },
    /// Classify module references as cartridges or libraries.
    Classify {
        /// Local module names or group:name:version coordinates.
        #[arg(required = true)]
        references: Vec<String>,
    },
    /// Show which tiers deploy each module style.
    Tiers,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CARTAGE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config = cli.config.as_path();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Manifests => commands::manifests::run(config, json_output),
        Commands::Check => commands::check::run(config, json_output),
        Commands::Extend { tier } => commands::extend::run(config, tier, json_output),
        Commands::Classify { references } => {
            commands::classify::run(config, &references, json_output)
        }
        Commands::Tiers => commands::tiers::run(json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("configuration error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("version conflict:") {
                EXIT_VERSION_CONFLICT
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
