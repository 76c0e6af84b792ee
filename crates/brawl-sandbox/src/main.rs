//! # Brawl Sandbox
//!
//! Headless duel runner for the Brawl combat core.
//!
//! Loads combat tuning and the content catalog, spawns a knight and a brute
//! in a small arena and plays a scripted exchange of sword swings and
//! firebombs, logging every combat event the core publishes.
//!
//! Usage: `brawl-sandbox [ASSET_DIR] [FRAMES]`. Without an asset directory
//! the bundled `assets/` files are used.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod assets;
mod duel;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Frames simulated when none are given.
const DEFAULT_FRAMES: u32 = 600;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("brawl=info".parse()?))
        .init();

    info!("Brawl sandbox starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let asset_dir = args.next().map(PathBuf::from);
    let frames = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid frame count {raw:?}"))?,
        None => DEFAULT_FRAMES,
    };

    let (tuning, catalog) = assets::load(asset_dir.as_deref())?;
    let mut duel = duel::Duel::new(tuning, &catalog)?;
    let report = duel.run(frames)?;

    info!(
        "Duel finished after {} frames: {} events, {} hits, {} deaths",
        report.frames,
        report.events,
        report.hits,
        report.deaths.len()
    );
    info!(
        "Knight health {:.1}, brute health {:.1}",
        report.knight_health, report.brute_health
    );

    info!("Brawl sandbox shutdown complete");
    Ok(())
}
