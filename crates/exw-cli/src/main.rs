use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "exw")]
#[command(about = "Exam integrity monitor CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session script through a fresh engine and print the report
    Replay {
        /// JSONL file, one SessionInput per line
        #[arg(long)]
        script: String,

        /// Layered config paths in merge order (base -> overrides)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Fail instead of warning when the config has keys nothing reads
        #[arg(long, default_value_t = false)]
        strict_config: bool,

        /// Write the session log + report to this hash-chained audit file
        #[arg(long)]
        audit: Option<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Audit trail utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of an audit JSONL file
    Verify {
        #[arg(long)]
        path: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Replay {
            script,
            config_paths,
            strict_config,
            audit,
        } => commands::replay::run(&script, &config_paths, strict_config, audit.as_deref()),
        Commands::ConfigHash { paths } => commands::config_hash(&paths),
        Commands::Audit { cmd } => match cmd {
            AuditCmd::Verify { path } => commands::audit::verify(&path),
        },
    }
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
