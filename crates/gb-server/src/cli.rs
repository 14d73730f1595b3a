use clap::{Parser, Subcommand};
use gb_core::Scene;

/// Top-level CLI parser for the `guestbook` binary.
#[derive(Debug, Parser)]
#[command(
    name = "guestbook",
    version,
    about = "Append-only scene guestbook backed by a Neocities site"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Interface to bind (overrides `server.host`)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `server.port` and `PORT`)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static pages (overrides `server.public_dir`)
        #[arg(long)]
        public_dir: Option<String>,
    },

    /// Load the remote document once and print a summary
    Fetch {
        /// Print this scene's entries instead of per-scene counts
        #[arg(short, long)]
        scene: Option<Scene>,
    },
}
