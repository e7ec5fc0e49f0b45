//! Manifest writer for myopia-risk model artifacts.
//!
//! Hashes every `.json` / `.bin` artifact in a model directory and writes
//! `manifest.json` next to them. The store then refuses artifacts whose
//! contents no longer match.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_models -- <model_dir> [--only <file>]...
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use myopia_risk::adapters::artifact::{ArtifactEncoding, ModelManifest, MANIFEST_FILE};

fn usage() -> anyhow::Error {
    anyhow!("Usage: hash_models <model_dir> [--only <file>]...")
}

fn parse_args() -> Result<(PathBuf, Vec<String>)> {
    let mut args = env::args().skip(1);
    let mut model_dir: Option<PathBuf> = None;
    let mut only = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--only" => only.push(args.next().ok_or_else(usage)?),
            "-h" | "--help" => return Err(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    Ok((model_dir.ok_or_else(usage)?, only))
}

fn is_artifact(name: &str) -> bool {
    name != MANIFEST_FILE
        && std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ArtifactEncoding::from_extension)
            .is_some()
}

fn main() -> Result<()> {
    let (model_dir, only) = parse_args()?;

    let files: Vec<String> = if only.is_empty() {
        let mut names = Vec::new();
        for entry in fs::read_dir(&model_dir).with_context(|| format!("reading {model_dir:?}"))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_artifact(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        names
    } else {
        only
    };

    if files.is_empty() {
        bail!("No .json or .bin artifacts found in {model_dir:?}");
    }

    let manifest = ModelManifest::build(&model_dir, &files)?;
    manifest.write(&model_dir)?;

    println!("Wrote {:?}", model_dir.join(MANIFEST_FILE));
    for (name, digest) in &manifest.files {
        println!("  {digest}  {name}");
    }
    Ok(())
}
