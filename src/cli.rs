//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Archive the pages of the e-books on your shelf.
///
/// Logs in, unlocks each book and saves its pages and images as files.
/// Without item codes every book on the shelf is downloaded.
#[derive(Parser, Debug)]
#[command(name = "ebook-archiver")]
#[command(author, version, about)]
pub struct Args {
    /// Item codes to download (default: everything on the shelf)
    #[arg(value_name = "CODE")]
    pub codes: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/ebook-archiver/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory books are saved under (overrides `save_path`)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Proxy URL for all requests
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// List the shelf and exit
    #[arg(short, long)]
    pub list: bool,
}
