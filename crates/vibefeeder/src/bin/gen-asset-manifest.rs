//! Writes the asset manifest used for cache-busting URLs.
//!
//! ```text
//! gen-asset-manifest [STATIC_DIR] [OUTPUT]
//! ```
//!
//! Defaults to `static` and `<STATIC_DIR>/manifest.json`. Run it before
//! building with `--features embed` so the manifest is embedded too.

use std::path::PathBuf;

use anyhow::Context;
use vibefeeder_view::AssetManifest;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let dir = args.next().map_or_else(|| PathBuf::from("static"), PathBuf::from);
    let output = args
        .next()
        .map_or_else(|| dir.join("manifest.json"), PathBuf::from);

    let manifest = AssetManifest::generate(&dir)
        .with_context(|| format!("failed to hash assets in {}", dir.display()))?;
    manifest
        .write(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Wrote {} entries to {}", manifest.len(), output.display());
    Ok(())
}
