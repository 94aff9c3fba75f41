use clap::{Parser, Subcommand};
use semsearch::Result;
use semsearch::commands::{search_once, serve, show_status, show_usage};
use semsearch::config::{get_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "semsearch")]
#[command(about = "Semantic search over a small document corpus, served over HTTP")]
#[command(version)]
struct Cli {
    /// Application home holding config.toml and usage.db (defaults to ~/.semsearch)
    #[arg(long, global = true, env = "SEMSEARCH_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection, listen address and search defaults
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Index the seed documents and start the HTTP API
    Serve {
        /// Override the configured listen host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a single query against the seed documents
    Search {
        /// Query text
        text: String,
        /// Number of nearest documents to consider
        #[arg(long)]
        top_k: Option<usize>,
        /// Largest squared L2 distance a result may have
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Show per-user request counts
    Usage {
        /// Only show this user
        user_id: Option<String>,
    },
    /// Show Ollama and database status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let home = match cli.home {
        Some(home) => home,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&home)?;
            } else {
                run_interactive_config(&home)?;
            }
        }
        Commands::Serve { host, port } => {
            serve(&home, host, port).await?;
        }
        Commands::Search {
            text,
            top_k,
            threshold,
        } => {
            search_once(&home, text, top_k, threshold).await?;
        }
        Commands::Usage { user_id } => {
            show_usage(&home, user_id).await?;
        }
        Commands::Status => {
            show_status(&home).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["semsearch", "serve"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Serve { host, port } = parsed.command {
                assert_eq!(host, None);
                assert_eq!(port, None);
            } else {
                panic!("expected serve command");
            }
        }
    }

    #[test]
    fn serve_command_with_overrides() {
        let cli = Cli::try_parse_from([
            "semsearch",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Serve { host, port } = parsed.command {
                assert_eq!(host, Some("0.0.0.0".to_string()));
                assert_eq!(port, Some(9000));
            } else {
                panic!("expected serve command");
            }
        }
    }

    #[test]
    fn search_command_with_options() {
        let cli = Cli::try_parse_from([
            "semsearch",
            "search",
            "cloud offer",
            "--top-k",
            "2",
            "--threshold",
            "1.25",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Search {
                text,
                top_k,
                threshold,
            } = parsed.command
            {
                assert_eq!(text, "cloud offer");
                assert_eq!(top_k, Some(2));
                assert_eq!(threshold, Some(1.25));
            } else {
                panic!("expected search command");
            }
        }
    }

    #[test]
    fn search_requires_text() {
        let cli = Cli::try_parse_from(["semsearch", "search"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        }
    }

    #[test]
    fn usage_command_optional_user() {
        let all = Cli::try_parse_from(["semsearch", "usage"]);
        assert!(matches!(
            all.map(|c| c.command),
            Ok(Commands::Usage { user_id: None })
        ));

        let one = Cli::try_parse_from(["semsearch", "usage", "u1"]);
        assert!(matches!(
            one.map(|c| c.command),
            Ok(Commands::Usage { user_id: Some(id) }) if id == "u1"
        ));
    }

    #[test]
    fn home_flag_is_global() {
        let cli = Cli::try_parse_from(["semsearch", "status", "--home", "/tmp/semsearch"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.home, Some(PathBuf::from("/tmp/semsearch")));
            assert!(matches!(parsed.command, Commands::Status));
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["semsearch", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["semsearch", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn documents_are_not_added_from_the_cli() {
        let cli = Cli::try_parse_from(["semsearch", "add", "some text"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["semsearch", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
