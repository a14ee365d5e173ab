//! fontmask - download a novel and undo its font obfuscation

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use fontmask::config::DownloadConfig;
use fontmask::converters::{OutputFormat, clean_filename};
use fontmask::net::HttpFetcher;
use fontmask::pipeline::{Downloader, apply_selection};

#[derive(Parser)]
#[command(name = "fontmask")]
#[command(version, about = "Download web-novel chapters and recover their obfuscated text", long_about = None)]
#[command(after_help = "EXAMPLES:
    fontmask https://fanqienovel.com/page/7143038691944959011
    fontmask URL --chapters 1-10,15 --format html
    fontmask URL --cookie \"sessionid=...\" --diagnostics ./debug")]
struct Cli {
    /// Catalog page URL of the novel
    #[arg(value_name = "URL")]
    url: String,

    /// Chapters to download: `all` or 1-based ranges such as `1-10,15`
    #[arg(short, long, default_value = "all")]
    chapters: String,

    /// Output format (txt or html)
    #[arg(short, long, default_value = "txt")]
    format: OutputFormat,

    /// Raw Cookie header value for restricted chapters
    #[arg(long)]
    cookie: Option<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Directory for the debug log and failure pages
    #[arg(long, value_name = "DIR")]
    diagnostics: Option<PathBuf>,

    /// Disable the pause between chapter fetches
    #[arg(long)]
    no_delay: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn load_config(cli: &Cli) -> fontmask::Result<DownloadConfig> {
    let mut config = match &cli.config {
        Some(path) => DownloadConfig::from_json_file(path)?,
        None => DownloadConfig::new(),
    };
    if let Some(cookie) = &cli.cookie {
        config = config.with_cookie(cookie.clone());
    }
    if let Some(dir) = &cli.output {
        config = config.with_output_dir(dir.clone());
    }
    if let Some(dir) = &cli.diagnostics {
        config = config.with_diagnostics_dir(dir.clone());
    }
    if cli.no_delay {
        config = config.with_delay(0, 0);
    }
    Ok(config)
}

fn run(cli: Cli) -> fontmask::Result<()> {
    let config = load_config(&cli)?;
    let output_dir = config.output_dir.clone();
    let downloader = Downloader::new(config, Arc::new(HttpFetcher::new()?))?;

    let catalog = downloader.fetch_catalog(&cli.url)?;
    println!("{} / {}", catalog.metadata.title, catalog.metadata.author);

    let selected = apply_selection(&catalog.chapters, &cli.chapters)?;
    println!("Downloading {} of {} chapters", selected.len(), catalog.chapters.len());

    let report = downloader.download_with(&selected, |progress| {
        println!(
            "[{}/{}] {} (ok {}, failed {})",
            progress.index, progress.total, progress.title, progress.succeeded, progress.failed
        );
        ControlFlow::Continue(())
    })?;

    let document = downloader.render(cli.format, &catalog.metadata, &report);
    std::fs::create_dir_all(&output_dir)?;
    let path = output_dir.join(format!(
        "{}.{}",
        clean_filename(&catalog.metadata.title),
        cli.format.extension()
    ));
    std::fs::write(&path, document)?;

    println!(
        "Saved {} ({} succeeded, {} failed, {} font failures)",
        path.display(),
        report.succeeded,
        report.failed,
        report.decode_failed
    );
    Ok(())
}
