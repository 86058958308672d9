//! Writes the post-bundler build artifacts: the icon sprite and the
//! `entrypoints.json` manifest with subresource-integrity hashes.
//!
//! Usage: emit-artifacts --build-dir build --metafile build/meta.json --icons-dir assets/icons

use std::fs;
use std::path::PathBuf;

use actilog_assets::manifest::{build_manifest, write_manifest, ManifestConfig, Metafile};
use actilog_assets::sprite::{build_sprite_from_dir, write_sprite};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "emit-artifacts")]
#[command(about = "Write the icon sprite and entrypoints.json for a finished bundle")]
struct Args {
    /// Directory the bundler wrote its outputs to.
    #[arg(long)]
    build_dir: PathBuf,
    /// Path to the bundler's JSON metafile.
    #[arg(long)]
    metafile: PathBuf,
    /// Directory holding the individual icon .svg files.
    #[arg(long)]
    icons_dir: PathBuf,
    /// Entry name assets are grouped under in the manifest.
    #[arg(long, default_value = "app")]
    entry_name: String,
    /// URL prefix for public asset paths.
    #[arg(long, default_value = "/build")]
    public_prefix: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let sprite = build_sprite_from_dir(&args.icons_dir)?;
    let sprite_path = write_sprite(&args.build_dir, &sprite)?;
    tracing::info!(path = %sprite_path.display(), "wrote icon sprite");

    let metafile_json = fs::read_to_string(&args.metafile)
        .with_context(|| format!("reading metafile {}", args.metafile.display()))?;
    let metafile = Metafile::from_json(&metafile_json)?;
    let config = ManifestConfig {
        entry_name: args.entry_name,
        public_prefix: args.public_prefix,
    };
    let manifest = build_manifest(&args.build_dir, &metafile, &config)?;
    let manifest_path = write_manifest(&args.build_dir, &manifest)?;
    tracing::info!(path = %manifest_path.display(), "wrote asset manifest");

    Ok(())
}
