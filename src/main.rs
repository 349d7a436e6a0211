use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use meta4fetch::download::{DownloadOutcome, Report};
use meta4fetch::downloader::{DownloaderBuilder, TimeoutPolicy};
use meta4fetch::run::fetch_meta4_with_cancel;
use meta4fetch::Error;

#[derive(Parser)]
#[command(name = "meta4fetch")]
#[command(author, version, about = "Fetch the files of a Metalink 4 manifest from their mirrors")]
struct Cli {
    /// Metalink 4 manifest listing the files to fetch
    manifest: PathBuf,

    /// Directory the files are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Maximum number of files fetched at once
    #[arg(short, long, default_value_t = 8)]
    workers: usize,

    /// Basic credential user name
    #[arg(long, env = "META4FETCH_USERNAME")]
    username: Option<String>,

    /// Basic credential password
    #[arg(long, env = "META4FETCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Proxy for every request (defaults to HTTPS_PROXY)
    #[arg(long, conflicts_with = "no_proxy")]
    proxy: Option<String>,

    /// Ignore any proxy from the environment
    #[arg(long)]
    no_proxy: bool,

    /// Connect timeout of the first mirror attempt, in seconds
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Read timeout of the first mirror attempt, in seconds
    #[arg(long, default_value_t = 30)]
    read_timeout: u64,

    /// Hide the progress bars
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn builder(&self) -> DownloaderBuilder {
        let mut builder = match self.quiet {
            true => DownloaderBuilder::hidden(),
            false => DownloaderBuilder::new(),
        };
        builder = builder
            .directory(self.output.clone())
            .workers(self.workers)
            .timeouts(TimeoutPolicy::new(
                Duration::from_secs(self.connect_timeout),
                Duration::from_secs(self.read_timeout),
            ));
        if let Some(ref username) = self.username {
            builder = builder.username(username.as_str());
        }
        if let Some(ref password) = self.password {
            builder = builder.password(password.as_str());
        }
        if let Some(ref proxy) = self.proxy {
            builder = builder.proxy(proxy.as_str());
        }
        if self.no_proxy {
            builder = builder.no_proxy();
        }
        builder
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping transfers");
            on_signal.cancel();
        }
    });

    match fetch_meta4_with_cancel(&cli.manifest, cli.builder(), &cancel).await {
        Ok(report) => {
            print_totals(&report);
            Ok(ExitCode::SUCCESS)
        }
        Err(Error::Fetch(error)) => {
            let report = error.into_report();
            print_totals(&report);
            eprintln!("{}", failure_table(&report));
            Ok(ExitCode::FAILURE)
        }
        Err(error) => Err(error.into()),
    }
}

fn print_totals(report: &Report) {
    let failed = report.failures().count();
    println!(
        "{} {} fetched ({} bytes), {} already present, {} failed, {} cancelled",
        style("Done:").bold(),
        style(report.completed()).green(),
        report.bytes_transferred(),
        style(report.skipped()).cyan(),
        match failed {
            0 => style(failed),
            _ => style(failed).red(),
        },
        style(report.cancelled()).yellow(),
    );
}

fn failure_table(report: &Report) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Reason", "Last error"]);

    for summary in report.summaries() {
        match summary.outcome() {
            DownloadOutcome::Failed(error) => {
                table.add_row(vec![
                    Cell::new(summary.item().name()),
                    Cell::new(error.kind()).fg(Color::Red),
                    Cell::new(error.last_error()),
                ]);
            }
            DownloadOutcome::Cancelled => {
                table.add_row(vec![
                    Cell::new(summary.item().name()),
                    Cell::new("cancelled").fg(Color::Yellow),
                    Cell::new(""),
                ]);
            }
            _ => {}
        }
    }
    table
}
