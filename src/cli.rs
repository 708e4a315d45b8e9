use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Groq-backed conversation agent for home automation
#[derive(Parser, Debug, Clone)]
#[command(name = "groq-agent", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "GROQ_AGENT_CONFIG", default_value = "groq-agent.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP conversation service
    Serve {
        /// Server host address
        #[arg(long, env = "GROQ_AGENT_HOST")]
        host: Option<String>,

        /// Server port
        #[arg(long, env = "GROQ_AGENT_PORT")]
        port: Option<u16>,
    },

    /// Process a single utterance and print the reply
    Ask {
        /// What the user said
        text: String,

        /// Language tag attached to the reply
        #[arg(short, long, default_value = "vi")]
        language: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the models available to the configured API key
    Models,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["groq-agent", "models"]);
        assert_eq!(cli.config, PathBuf::from("groq-agent.toml"));
        assert_eq!(cli.command, Command::Models);
    }

    #[test]
    fn test_serve_with_args() {
        let cli = Cli::parse_from([
            "groq-agent",
            "--config",
            "custom.toml",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(
            cli.command,
            Command::Serve {
                host: Some("0.0.0.0".to_string()),
                port: Some(8080),
            }
        );
    }

    #[test]
    fn test_ask() {
        let cli = Cli::parse_from(["groq-agent", "ask", "bật đèn phòng khách"]);
        assert_eq!(
            cli.command,
            Command::Ask {
                text: "bật đèn phòng khách".to_string(),
                language: "vi".to_string(),
                json: false,
            }
        );

        let cli = Cli::parse_from(["groq-agent", "ask", "-l", "en", "--json", "hello"]);
        assert!(matches!(cli.command, Command::Ask { ref language, json: true, .. } if language == "en"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["groq-agent"]).is_err());
    }
}
