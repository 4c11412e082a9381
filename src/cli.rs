//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use grabbag_core::LatLon;
use regex::Regex;

/// Polite bulk downloader for map tiles and paged image sites.
///
/// Every request is retried on transient failures and followed by a fixed
/// pause, so a long run never hammers the server.
#[derive(Parser, Debug)]
#[command(name = "grabbag")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download slippy-map tiles at one zoom level
    ///
    /// Downloads every tile at the zoom level unless a bounding box is given.
    /// Public tile servers ask that bulk downloads stay at or below zoom 16.
    #[command(after_help = TILES_EXAMPLES)]
    Tiles(TilesArgs),

    /// Download files by URL, or the links a pattern captures from pages
    Fetch(FetchArgs),
}

const TILES_EXAMPLES: &str = "\
Examples:
  # Download all tiles from zoom 0-5
  $ for i in $(seq 0 5); do grabbag tiles -z $i; done

  # Resume from {server}/4/5/2.png inclusive
  $ grabbag tiles -z 4 --resume 5,2

  # Limit to a bounding box (top left lat,lon then bottom right lat,lon)
  $ grabbag tiles -z 13 --min 1.5,103.6 --max 1.2,104.1";

/// Network options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct NetworkArgs {
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Delay after each download in milliseconds [default: 1500]
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay: Option<u64>,

    /// Retries per download for transient failures [default: 3]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub retries: Option<u8>,
}

#[derive(clap::Args, Debug)]
pub struct TilesArgs {
    /// Zoom level (0-19)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=19))]
    pub zoom: u8,

    /// Top left corner of the bounding box
    #[arg(long, value_name = "LAT,LON", value_parser = parse_lat_lon, requires = "max", allow_hyphen_values = true)]
    pub min: Option<LatLon>,

    /// Bottom right corner of the bounding box
    #[arg(long, value_name = "LAT,LON", value_parser = parse_lat_lon, requires = "min", allow_hyphen_values = true)]
    pub max: Option<LatLon>,

    /// First tile to download, inclusive
    #[arg(long, value_name = "X,Y", value_parser = parse_tile_xy)]
    pub resume: Option<TileXy>,

    /// Keep going past tiles that fail and list them at the end
    #[arg(long)]
    pub skip_failed: bool,

    #[command(flatten)]
    pub network: NetworkArgs,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// URLs to download (or pages to scan with --pattern)
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Name files after the URL path instead of numbering them
    #[arg(long)]
    pub original_name: bool,

    /// Keep the full URL path as nested directories
    #[arg(long, requires = "original_name")]
    pub with_path: bool,

    /// Treat each URL as a page and download capture group 1 of every match
    #[arg(short, long, value_name = "REGEX", value_parser = parse_pattern)]
    pub pattern: Option<Regex>,

    /// First number used for sequential names
    #[arg(long, default_value_t = 1)]
    pub start: u32,

    /// Send a desktop browser User-Agent (some hosts block unknown clients)
    #[arg(long)]
    pub browser_ua: bool,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// A tile column and row given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileXy {
    pub x: u32,
    pub y: u32,
}

fn split_pair(value: &str) -> Result<(&str, &str), String> {
    value
        .split_once(',')
        .map(|(a, b)| (a.trim(), b.trim()))
        .ok_or_else(|| format!("expected two comma-separated values, got '{value}'"))
}

fn parse_lat_lon(value: &str) -> Result<LatLon, String> {
    let (lat, lon) = split_pair(value)?;
    let lat: f64 = lat.parse().map_err(|_| format!("invalid latitude '{lat}'"))?;
    let lon: f64 = lon.parse().map_err(|_| format!("invalid longitude '{lon}'"))?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err(format!("coordinates must be finite, got '{value}'"));
    }
    Ok(LatLon::new(lat, lon))
}

fn parse_tile_xy(value: &str) -> Result<TileXy, String> {
    let (x, y) = split_pair(value)?;
    let x: u32 = x.parse().map_err(|_| format!("invalid tile x '{x}'"))?;
    let y: u32 = y.parse().map_err(|_| format!("invalid tile y '{y}'"))?;
    Ok(TileXy { x, y })
}

fn parse_pattern(value: &str) -> Result<Regex, String> {
    let regex = Regex::new(value).map_err(|e| e.to_string())?;
    if regex.captures_len() < 2 {
        return Err("pattern needs a capture group around the link".to_string());
    }
    Ok(regex)
}
