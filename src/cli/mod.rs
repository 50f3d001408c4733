//! CLI command definitions and parsing
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    author = "neur0map",
    about = "Ask questions about a folder of documents using local models",
    long_about = "docqa extracts text from the PDFs and source files in a folder, splits it into \
                  paragraphs, embeds them with an Ollama model and answers questions using the \
                  closest paragraph as context."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/docqa/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `chat`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DocsArgs {
    /// Folder of documents to index (overrides ingest.docs_dir)
    #[arg(short, long, value_name = "DIR")]
    pub docs: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index the documents folder, then answer questions interactively
    Chat {
        #[command(flatten)]
        docs: DocsArgs,
    },

    /// Index the documents folder and answer a single question
    Ask {
        /// Question to ask
        question: String,

        #[command(flatten)]
        docs: DocsArgs,

        /// Number of context chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Index the documents folder and print a summary
    Index {
        #[command(flatten)]
        docs: DocsArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["docqa"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_ask_args() {
        let cli = Cli::try_parse_from([
            "docqa", "--verbose", "ask", "What is alpha?", "--docs", "papers", "-k", "3",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Ask {
                question,
                docs,
                top_k,
            }) => {
                assert_eq!(question, "What is alpha?");
                assert_eq!(docs.docs, Some(PathBuf::from("papers")));
                assert_eq!(top_k, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["docqa", "index", "--profile", "fast", "-c", "cfg.toml"])
            .unwrap();
        assert_eq!(cli.profile.as_deref(), Some("fast"));
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        assert!(matches!(cli.command, Some(Commands::Index { .. })));
    }
}
