pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "frauditor")]
#[command(about = "Review authenticity badges for product pages", long_about = None)]
pub struct Cli {
    /// Path to an alternate config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch a product page and badge reviews as they render and paginate
    Watch {
        /// URL of the product page
        url: String,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headful: bool,
    },
    /// One-shot harvest of the rendered reviews, optionally across pages
    Scan {
        /// URL of the product page
        url: String,

        /// Number of pages to crawl by clicking "next" (capped by config)
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Write the harvested batch as JSON to this file
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Harvest only; skip submission to the classifier
        #[arg(long)]
        no_submit: bool,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headful: bool,
    },
    /// Probe the classification service
    Check,
    /// Print the config file location
    ConfigPath,
}
