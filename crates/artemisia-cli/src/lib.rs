mod cmd;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "artemisia",
    version,
    about = "Artemisia Pharma website - live server and static site generator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the site server
    Serve {
        /// Port to listen on (defaults to $PORT, then 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate the static site into dist/ and docs/
    Generate,
    /// Write sample product spreadsheets into data/
    Seed {
        /// Overwrite existing spreadsheets without asking
        #[arg(long)]
        force: bool,
    },
}

pub async fn run() {
    // .env may set RUST_LOG, so it is read before the logger starts.
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            log::warn!("Failed to load .env: {e}");
        }
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port } => cmd::serve::run(port).await,
        Commands::Generate => cmd::generate::run(),
        Commands::Seed { force } => artemisia_seed::run(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["artemisia", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));

        let cli = Cli::try_parse_from(["artemisia", "seed", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Seed { force: true }));

        let cli = Cli::try_parse_from(["artemisia", "generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate));

        assert!(Cli::try_parse_from(["artemisia", "generate", "--watch"]).is_err());
    }
}
