use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "pokodoro", version, about = "Pokodoro CLI")]
struct Cli {
    /// Signed-in user (falls back to auth.user in config)
    #[arg(long, global = true, env = "POKODORO_USER")]
    user: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a focus session on the real clock
    Run(commands::run::RunArgs),
    /// Fast-forward sessions without waiting, using the local generator
    Simulate(commands::simulate::SimulateArgs),
    /// Print the state of a fresh session as JSON
    Status,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.user),
        Commands::Simulate(args) => commands::simulate::run(args, cli.user),
        Commands::Status => commands::status::run(cli.user),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
