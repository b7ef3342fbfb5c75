use std::path::PathBuf;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;

use crate::config::Config;
use crate::controller::{run_chart, run_sync, ChartArgs, SyncArgs};

mod backup;
mod browser;
mod chart;
mod config;
mod controller;
mod credentials;
mod db;
mod query;
mod window;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// Config file [default: <config dir>/drebedengi/config.toml]
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate records over date windows and render a chart
    Chart(ChartArgs),
    /// Download a fresh backup into the database file
    Sync(SyncArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli: Cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path, true)?,
        None => match Config::default_path() {
            Some(path) => Config::load_from_file(&path, false)?,
            None => Config::empty(),
        },
    };
    debug!("{:?}", config);

    match &cli.command {
        Command::Chart(args) => run_chart(args, &config),
        Command::Sync(args) => run_sync(args, &config),
    }
}
