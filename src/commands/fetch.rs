//! Fetch command handler: download URLs, or the links captured from pages.

use std::path::PathBuf;

use anyhow::{Context, Result};
use grabbag_core::{Downloader, Fetcher, Naming};
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::app_config::{FileConfig, NetworkSettings};
use crate::cli::FetchArgs;

const DEFAULT_FETCH_DIR: &str = "downloads";

pub async fn run_fetch_command(args: &FetchArgs, file: &FileConfig) -> Result<()> {
    let settings = NetworkSettings::resolve(
        args.network.retries,
        args.network.delay,
        args.browser_ua,
        file,
    );
    let downloader = Downloader::new(Fetcher::new(&settings.fetch_config(file))?);
    let out_dir = args
        .network
        .output
        .clone()
        .or_else(|| file.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FETCH_DIR));

    let targets = match &args.pattern {
        Some(pattern) => collect_links(&downloader, &args.urls, pattern).await?,
        None => parse_targets(&args.urls)?,
    };
    if targets.is_empty() {
        info!("No links found");
        return Ok(());
    }

    let naming = if args.original_name {
        Naming::Original {
            with_path: args.with_path,
        }
    } else {
        Naming::Sequential { start: args.start }
    };

    info!(
        count = targets.len(),
        out_dir = %out_dir.display(),
        "downloading"
    );
    let report = downloader
        .download_batch(&targets, &out_dir, naming)
        .await
        .map_err(|error| {
            let completed = error.completed;
            let hint = resume_hint(naming, completed);
            anyhow::Error::new(error).context(format!(
                "download stopped after {completed} of {} item(s){hint}",
                targets.len()
            ))
        })?;
    info!(count = report.paths.len(), "download complete");
    Ok(())
}

/// Fetches each page and gathers the links `pattern` captures, in order.
async fn collect_links(downloader: &Downloader, pages: &[String], pattern: &Regex) -> Result<Vec<Url>> {
    let mut links: Vec<Url> = Vec::new();
    for page_url in pages {
        let page = downloader
            .fetcher()
            .fetch_page(page_url)
            .await
            .with_context(|| format!("Failed to read page '{page_url}'"))?;
        let found = page.capture_links(pattern);
        debug!(page = %page.final_url, links = found.len(), "scanned page");
        for link in found {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }
    Ok(links)
}

fn parse_targets(urls: &[String]) -> Result<Vec<Url>> {
    urls.iter()
        .map(|raw| Url::parse(raw).with_context(|| format!("Invalid URL '{raw}'")))
        .collect()
}

fn resume_hint(naming: Naming, completed: usize) -> String {
    match naming {
        Naming::Sequential { start } => {
            format!("; rerun the remaining items with --start {}", u64::from(start) + completed as u64)
        }
        Naming::Original { .. } => String::new(),
    }
}
