use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use doodad::app::{DEFAULT_LINGER, Fetch, Flags};
use doodad::config::{DEFAULT_CHUNK_SIZE, DownloadConfig};
use doodad::download::{Fetcher, Status};
use doodad::input::CrosstermInput;
use doodad::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use url::Url;

const USAGE: &str = "usage: doodad [OPTIONS] <URL>\n  downloads URL into the current directory with a progress bar";

#[derive(Debug, Parser)]
#[command(name = "doodad", version, about = "Download a file with a terminal progress bar")]
struct Cli {
    /// Resource to fetch
    url: Option<String>,

    /// Bytes read and written per step
    #[arg(long, env = "DOODAD_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Where to write logs; the terminal is taken by the UI
    #[arg(long, env = "DOODAD_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).wrap_err_with(|| format!("cannot open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("DOODAD_LOG").unwrap_or_else(|_| EnvFilter::new("doodad=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let Some(url) = cli.url else {
        println!("{USAGE}");
        return Ok(());
    };
    let url = Url::parse(&url).wrap_err_with(|| format!("invalid url {url:?}"))?;

    let log_file = cli
        .log_file
        .unwrap_or_else(|| std::env::temp_dir().join("doodad.log"));
    init_logging(&log_file)?;

    let config = DownloadConfig::default().with_chunk_size(cli.chunk_size);
    let cwd = std::env::current_dir().wrap_err("cannot resolve the current directory")?;
    let flags = Flags {
        destination: config.destination_for(&url, &cwd),
        fetcher: Fetcher::http(&config),
        url,
        linger: DEFAULT_LINGER,
    };

    let runtime = Runtime::<Fetch>::new(flags).with_input(CrosstermInput::new());
    let mut terminal = ratatui::init();
    let result = runtime.run(&mut terminal).await;
    ratatui::restore();

    let app = result?;
    let download = app.download();
    match download.status() {
        Status::Completed => println!(
            "saved {} ({} bytes)",
            download.destination().display(),
            download.received()
        ),
        Status::Failed(error) => eprintln!("download failed: {error}"),
        Status::Pending | Status::Running => eprintln!("download interrupted"),
    }

    Ok(())
}
