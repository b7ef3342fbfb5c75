use std::path::PathBuf;
use chrono::Local;
use clap::Args;
use log::info;
use crate::browser::open_in_browser;
use crate::chart;
use crate::config::Config;
use crate::controller::{credentials_path, needs_update, rebuild_database};
use crate::db::Database;
use crate::query::{aggregate, ChartQuery};
use crate::window::{windows, Mode};

#[derive(Args, Debug)]
pub(crate) struct ChartArgs {
    /// Mode: 1 - by month, 2 - by year, 3 - by year up to today
    #[arg(short, long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub(crate) mode: u8,

    /// File with the login and password for drebedengi.ru [default: credentials.txt]
    #[arg(short, long, value_name = "FILE")]
    pub(crate) credentials: Option<PathBuf>,

    /// Database file (in memory if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub(crate) database: Option<PathBuf>,

    /// Download new backup from drebedengi.ru
    #[arg(short, long)]
    pub(crate) update: bool,

    /// Number of months or years to show
    #[arg(short, long, value_name = "N", default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) number: u32,

    /// Save html chart into the file
    #[arg(short, long, value_name = "FILE")]
    pub(crate) save_html: Option<PathBuf>,

    /// Save json output into the file
    #[arg(short = 'j', long, value_name = "FILE")]
    pub(crate) save_json: Option<PathBuf>,

    /// Show the chart in OS default browser, requires --save-html
    #[arg(short = 'x', long, requires = "save_html")]
    pub(crate) open: bool,

    /// Chart query file (special header + SQL)
    #[arg(value_name = "QUERY")]
    pub(crate) query: PathBuf,
}

pub(crate) fn run_chart(args: &ChartArgs, config: &Config) -> anyhow::Result<()> {
    let mode = Mode::try_from(args.mode)?;
    let query = ChartQuery::load(&args.query)?;

    let database = args.database.as_deref().or(config.database.as_deref());
    let db = if needs_update(args.update, database) {
        let credentials_file = credentials_path(args.credentials.as_deref(), config);
        rebuild_database(config, &credentials_file, database, Local::now().naive_local())?
    } else {
        Database::open(database)?
    };

    let windows = windows(mode, args.number, Local::now().date_naive())?;
    let buckets = aggregate(&db, &query, &windows)?;
    drop(db);
    info!("Aggregated {} windows", buckets.len());

    println!("{}", chart::render_table(&buckets, &query.fields));

    if let Some(path) = &args.save_json {
        chart::save(path, &chart::render_json(&buckets)?)?;
    }

    if let Some(path) = &args.save_html {
        let title = format!("mode: {}", mode);
        chart::save(path, &chart::render_html(&buckets, &query.fields, &title))?;

        if args.open {
            open_in_browser(path)?;
        }
    }

    Ok(())
}
