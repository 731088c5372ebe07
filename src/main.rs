use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, prelude::*};

use tabview::controller::Controller;
use tabview::domain::{TVConfig, TVError};
use tabview::loader::resolve_path;
use tabview::model::{Model, Status};
use tabview::settings::FileStore;
use tabview::ui::TableUI;

/// Page through, filter, sort and select rows of a CSV, Parquet or Arrow file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Data file to open
    path: String,

    /// Rows per page, overrides the stored preference
    #[arg(short = 'n', long)]
    page_size: Option<usize>,

    /// Where to write the log, defaults to tabview.log in the temp directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Preference file
    #[arg(long, default_value = "~/.config/tabview/settings")]
    settings: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Error: could not set up logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(args: &Args) -> Result<(), TVError> {
    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tabview.log"));
    let file = File::create(&log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), TVError> {
    let data_path = resolve_path(&args.path)?;
    let settings = FileStore::open(resolve_path(&args.settings)?)?;

    let defaults = TVConfig::default();
    let page_size = Model::resolve_page_size(args.page_size, &settings, defaults.page_size);
    let cfg = defaults.with_page_size(page_size);
    info!("Starting tabview on {:?} with {:?}", data_path, cfg);

    let mut model = Model::init(&cfg, Box::new(settings));
    model.load(data_path);

    let mut ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = (|| -> Result<(), TVError> {
        while model.status != Status::QUITTING {
            // Render the current view
            terminal.draw(|f| ui.draw(&model, f))?;

            // Handle events and map to a Message
            let message = controller.handle_event(&model)?;
            model.update(message)?;
        }
        Ok(())
    })();
    ratatui::restore();
    result
}
