// UI layer: argument definitions and the handlers behind each subcommand.
// Handlers stay small and synchronous; the heavy lifting lives in
// `session` and `fetch`, this layer wires config, client and progress.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::api::ApiClient;
use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::fetch::ResultFetcher;
use crate::layout::Layout;
use crate::session::Session;
use crate::submit::preflight;
use crate::upload::UploadProgress;

#[derive(Parser, Debug)]
#[command(name = "pai", author, version, about = "PAI (Phenomic AI) CLI", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload an h5ad file, wait for the embedding job and unpack its results.
    Embed(EmbedArgs),
    /// Download the example h5ad file published by the backend.
    DownloadExample(DownloadExampleArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EmbedArgs {
    /// Working directory for downloaded archives and extracted results.
    #[arg(long)]
    pub tmp_dir: PathBuf,
    /// Input file to embed.
    #[arg(long)]
    pub h5ad_path: PathBuf,
    /// Tissue or organ the sample comes from.
    #[arg(long)]
    pub tissue_organ: String,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadExampleArgs {
    #[arg(long)]
    pub tmp_dir: PathBuf,
}

/// The upload progress bar is driven from the chunk loop.
impl UploadProgress for ProgressBar {
    fn chunk_sent(&self, sent: u64, total: u64) {
        self.set_length(total);
        self.set_position(sent);
    }
}

fn upload_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} uploading [{bar:40}] {pos}/{len} chunks")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner
}

pub fn run(command: Commands, config: &Config, cancel: &CancellationToken) -> Result<()> {
    match command {
        Commands::Embed(args) => run_embed(&args, config, cancel),
        Commands::DownloadExample(args) => run_download_example(&args, config),
    }
}

/// Local input checks run before the token exchange, so a bad file never
/// causes any network traffic.
pub fn run_embed(args: &EmbedArgs, config: &Config, cancel: &CancellationToken) -> Result<()> {
    preflight(&args.h5ad_path)?;

    let api = ApiClient::connect(config).context("Failed to authenticate with the backend")?;
    let bar = upload_bar();
    let session = Session::new(&api, Layout::new(&args.tmp_dir), cancel.clone())
        .with_progress(&bar);

    let outcome = session.inference(&args.h5ad_path, &args.tissue_organ);
    bar.finish_and_clear();
    let outcome = outcome.with_context(|| {
        format!("Embedding of {} failed", args.h5ad_path.display())
    })?;

    info!("Job {} finished", outcome.job_id);
    println!("Results written to {}", outcome.results_dir.display());
    Ok(())
}

pub fn run_download_example(args: &DownloadExampleArgs, config: &Config) -> Result<()> {
    let api = ApiClient::connect(config).context("Failed to authenticate with the backend")?;
    let layout = Layout::new(&args.tmp_dir);

    let spinner = spinner("Downloading example h5ad...");
    let path = ResultFetcher::new(&api, &layout).download_example();
    spinner.finish_and_clear();
    let path = path.context("Failed to download example file")?;

    println!("Example file saved to {}", path.display());
    Ok(())
}
