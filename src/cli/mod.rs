use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vid2article",
    about = "vid2article - Turn YouTube videos into structured markdown articles",
    version,
    long_about = "Fetches the transcript of a YouTube video from a transcript backend and asks Claude to rewrite it as a structured article in Russian. When no transcript can be fetched, a transcript can be supplied manually."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Transcript backend base URL (overrides the config file)
    #[arg(long, global = true, env = "VID2ARTICLE_BACKEND_URL", value_name = "URL")]
    pub backend_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a YouTube video into an article
    Convert {
        /// YouTube URL (watch, youtu.be or embed link) or an 11-character video ID
        #[arg(value_name = "URL_OR_ID")]
        input: String,

        /// Transcript to use if the backend cannot provide one
        #[arg(short, long, value_name = "FILE")]
        transcript_file: Option<PathBuf>,

        /// Output file or directory (prints to console if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print raw markdown instead of the rendered article
        #[arg(long)]
        no_render: bool,

        /// Print the final session as JSON instead of the article
        #[arg(long)]
        json: bool,
    },

    /// Convert a transcript you already have into an article
    Manual {
        /// Transcript file (reads stdin if not specified)
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Output file or directory (prints to console if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print raw markdown instead of the rendered article
        #[arg(long)]
        no_render: bool,

        /// Print the final session as JSON instead of the article
        #[arg(long)]
        json: bool,
    },

    /// Show the video ID a link resolves to
    Resolve {
        #[arg(value_name = "URL_OR_ID")]
        input: String,
    },

    /// Render a markdown article for display
    Render {
        /// Markdown file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Emit an HTML fragment instead of terminal text
        #[arg(long)]
        html: bool,
    },

    /// Check that the transcript backend is reachable
    Health,

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Write a default configuration file
    Init,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "vid2article",
            "convert",
            "dQw4w9WgXcQ",
            "-t",
            "backup.txt",
            "--no-render",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                input,
                transcript_file,
                no_render,
                ..
            } => {
                assert_eq!(input, "dQw4w9WgXcQ");
                assert_eq!(transcript_file, Some(PathBuf::from("backup.txt")));
                assert!(no_render);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vid2article",
            "health",
            "--backend-url",
            "http://example.com",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.backend_url.as_deref(), Some("http://example.com"));
    }
}
