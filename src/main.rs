use clap::Parser;
use votebot::cli::{self, CatalogCommand, Cli, Command, ConfigCommand};
use votebot::{config, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Version) => {
            cli::handle_version();
            return Ok(());
        }
        Some(Command::Config(ConfigCommand::Path)) => {
            cli::handle_config_path();
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config()?;
    logging::init_tracing(&cfg.tracing)?;

    match cli.command.unwrap_or(Command::Start) {
        Command::Start => cli::handle_start(&cfg).await,
        Command::Config(ConfigCommand::Show) => cli::handle_config_show(&cfg),
        Command::Catalog(CatalogCommand::List) => cli::handle_catalog_list(&cfg).await,
        Command::Simulate {
            poll,
            votes,
            user,
            channel,
        } => cli::handle_simulate(&cfg, &poll, &votes, &user, &channel).await,
        Command::Config(ConfigCommand::Path) | Command::Version => Ok(()),
    }
}
