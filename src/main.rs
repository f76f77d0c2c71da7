//! Reelfetch - social video fetcher
//!
//! Resolves a post identifier, runs the platform's fallback chain and prints
//! the path of the cached video. `sweep` runs the retention sweeper.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reelfetch::extractor::ytdlp::find_ytdlp;
use reelfetch::{App, ReelfetchError, Settings};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reelfetch", version, about = "Fetch short videos by post identifier")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "REELFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Cache root, overrides the configuration file
    #[arg(long, env = "REELFETCH_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[arg(long, env = "REELFETCH_PUBLER_TOKEN", hide_env_values = true)]
    publer_token: Option<String>,

    #[arg(long, env = "REELFETCH_SAVEGRAM_K_EXP")]
    savegram_k_exp: Option<String>,

    #[arg(long, env = "REELFETCH_SAVEGRAM_TOKEN", hide_env_values = true)]
    savegram_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical post URL for a route such as `/x/123`
    Resolve { route: String },
    /// Download (or reuse) the video for a route and print its path
    Fetch { route: String },
    /// Delete expired videos
    Sweep {
        /// Run a single pass instead of looping
        #[arg(long)]
        once: bool,
    },
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(dir) = &self.cache_dir {
            settings.cache_dir = dir.clone();
        }
        if let Some(token) = &self.publer_token {
            settings.tokens.publer = Some(token.clone());
        }
        if let Some(k_exp) = &self.savegram_k_exp {
            settings.tokens.savegram_k_exp = Some(k_exp.clone());
        }
        if let Some(token) = &self.savegram_token {
            settings.tokens.savegram_k_token = Some(token.clone());
        }
        Ok(settings.validated())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reelfetch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = args.settings()?;
    let app = App::new(settings).context("Failed to initialize HTTP client")?;

    match args.command {
        Command::Resolve { route } => match app.resolve(&route) {
            Ok((platform, url)) => {
                println!("{}\t{}\t{}", platform, url, url.media_key());
            }
            Err(e) => exit_with(&e),
        },
        Command::Fetch { route } => {
            check_ytdlp_installed(&app);
            app.cache()
                .ensure_dirs()
                .await
                .context("Failed to create cache directories")?;

            match app.fetch(&route).await {
                Ok(outcome) => {
                    if outcome.from_cache {
                        info!("Served from cache");
                    }
                    println!("{}", outcome.asset.path.display());
                }
                Err(e) => exit_with(&e),
            }
        }
        Command::Sweep { once } => {
            let sweeper = app.sweeper();
            if once {
                let report = sweeper.sweep_once(SystemTime::now()).await;
                println!(
                    "scanned {} deleted {} failed {}",
                    report.scanned, report.deleted, report.failed
                );
            } else {
                sweeper.run().await;
            }
        }
    }

    Ok(())
}

fn exit_with(err: &ReelfetchError) -> ! {
    error!("{}", err);
    eprintln!("Error ({}): {}", err.status_code(), err);
    let code = if err.status_code() == 400 { 2 } else { 1 };
    std::process::exit(code)
}

fn check_ytdlp_installed(app: &App) {
    match app.settings().ytdlp_path.clone().or_else(find_ytdlp) {
        Some(path) => info!("yt-dlp found at: {}", path.display()),
        // Not fatal: every chain has non yt-dlp tiers
        None => warn!("yt-dlp not found; generic extractor tiers will fail"),
    }
}
