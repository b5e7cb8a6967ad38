use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::ResolverConfig;

#[derive(Parser, Debug)]
#[command(name = "arcview")]
#[command(version)]
#[command(about = "Browse ZIP and RAR archives as a directory tree", long_about = None)]
#[command(after_help = "Examples:\n  \
  arcview list photos.zip                 list the top level of photos.zip\n  \
  arcview list comic.cbr pages/ch1 -r     everything below pages/ch1\n  \
  arcview --remote-url http://localhost:5001 list album.rar --json\n  \
  arcview extract album.rar -d out        extract album.rar into out/")]
pub struct Cli {
    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Base URL of the remote RAR helper
    #[arg(long, value_name = "URL", env = "ARCVIEW_REMOTE_URL", global = true)]
    pub remote_url: Option<String>,

    /// Timeout for remote list/extract requests, in seconds
    #[arg(
        long,
        value_name = "SECS",
        env = "ARCVIEW_REMOTE_TIMEOUT",
        default_value_t = 5,
        global = true
    )]
    pub remote_timeout: u64,

    /// Local directory the remote helper sees as /shared
    #[arg(long, value_name = "DIR", env = "ARCVIEW_SHARED_ROOT", global = true)]
    pub shared_root: Option<PathBuf>,

    /// Parent directory for default extraction targets
    #[arg(long, value_name = "DIR", env = "ARCVIEW_EXTRACT_ROOT", global = true)]
    pub extract_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the contents of an archive at a subpath
    List {
        /// Archive path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory inside the archive (default: root)
        #[arg(value_name = "SUBPATH", default_value = "")]
        subpath: String,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,

        /// Show the whole subtree instead of one level
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// Extract every member of an archive
    Extract {
        /// Archive path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Extract files into exdir
        #[arg(short = 'd', value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Password for encrypted RAR archives
        #[arg(long, value_name = "PW")]
        password: Option<String>,
    },
}

impl Cli {
    pub fn resolver_config(&self) -> ResolverConfig {
        let defaults = ResolverConfig::default();
        ResolverConfig {
            remote_url: self.remote_url.clone().filter(|url| !url.is_empty()),
            request_timeout: Duration::from_secs(self.remote_timeout),
            shared_root: self.shared_root.clone(),
            extract_root: self.extract_root.clone().unwrap_or(defaults.extract_root.clone()),
            ..defaults
        }
    }

    /// `tracing` filter directive for the `-v` count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
