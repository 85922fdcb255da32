use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vigil", version, about = "Vigil dead man's switch CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an explicit check-in
    Checkin,
    /// Record a device activity signal
    Signal {
        #[arg(value_enum)]
        source: commands::signal::SignalSource,
    },
    /// Print the current ledger state and escalation decision
    Status,
    /// Run one escalation check with side effects
    Check,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the monitoring daemon
    Watch {
        /// Check interval in minutes (minimum 15, default 60)
        #[arg(long)]
        interval_mins: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Checkin => commands::checkin::run(),
        Commands::Signal { source } => commands::signal::run(source),
        Commands::Status => commands::status::run(),
        Commands::Check => commands::check::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch { interval_mins } => commands::watch::run(interval_mins),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
