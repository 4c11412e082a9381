//! Tiles command handler: download a zoom level or a bounding box.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use grabbag_core::{
    Fetcher, ItemPolicy, Rotation, ServerPool, TileCoordinate, TileDownloader, TileRange, Zoom,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::app_config::{FileConfig, NetworkSettings};
use crate::cli::TilesArgs;

const DEFAULT_TILES_DIR: &str = "tiles";

pub async fn run_tiles_command(
    args: &TilesArgs,
    file: &FileConfig,
    show_progress: bool,
) -> Result<()> {
    let zoom = Zoom::new(args.zoom)?;
    let resume = args
        .resume
        .map(|xy| TileCoordinate::new(zoom, xy.x, xy.y));
    let range = match (args.min, args.max) {
        (Some(min), Some(max)) => TileRange::bounding_box(zoom, min, max, resume)?,
        (None, None) => TileRange::whole_grid(zoom, resume)?,
        _ => bail!("--min and --max have to be specified together"),
    };

    let pool = match &file.tile_servers {
        Some(servers) => ServerPool::parse(servers)?,
        None => ServerPool::openstreetmap()?,
    };
    let out_dir = args
        .network
        .output
        .clone()
        .or_else(|| file.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TILES_DIR));

    let settings = NetworkSettings::resolve(args.network.retries, args.network.delay, false, file);
    let fetcher = Fetcher::new(&settings.fetch_config(file))?;
    let downloader = TileDownloader::new(fetcher, pool, &out_dir);

    let policy = if args.skip_failed {
        ItemPolicy::SkipAndContinue
    } else {
        ItemPolicy::Abort
    };

    info!(
        zoom = %zoom,
        min = %range.min(),
        max = %range.max(),
        resume = %range.resume(),
        tiles = range.tile_count(),
        out_dir = %out_dir.display(),
        "downloading tiles"
    );

    let progress = tile_progress_bar(show_progress, range.tile_count());
    let outcome = downloader
        .download_range_with(&range, &mut Rotation::default(), policy, |tile, _| {
            progress.set_message(tile.to_string());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    match outcome {
        Ok(report) => {
            info!(
                completed = report.completed,
                failed = report.failed.len(),
                "tiles done"
            );
            for failure in &report.failed {
                warn!(error = %failure, "tile skipped");
            }
            if !report.failed.is_empty() {
                bail!("{} tile(s) failed", report.failed.len());
            }
            Ok(())
        }
        Err(error) => {
            let hint = error.coordinate().map_or_else(String::new, |tile| {
                format!("; resume with --resume {},{}", tile.x(), tile.y())
            });
            Err(error).context(format!("tile download stopped{hint}"))
        }
    }
}

fn tile_progress_bar(enabled: bool, total: u64) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} tiles ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
