//! Resolution of the file names a batch run operates on.

use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::BufReader,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, ensure};
use log::debug;
use serde::{Deserialize, Serialize};

/// YAML manifest listing the evolvable files, e.g.
///
/// ```yaml
/// files:
///   - gateways.csv
///   - termId.csv
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub files: Vec<String>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening manifest {path:?}"))?;
        let manifest: Manifest = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing manifest YAML {path:?}"))?;
        for name in &manifest.files {
            validate_file_name(name)?;
        }
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating manifest {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing manifest YAML")
    }
}

/// Picks the file list: explicit names win, then the manifest, then every
/// `*.csv` found in either directory.
pub fn resolve_files(
    explicit: &[String],
    manifest: Option<&Path>,
    src_dir: &Path,
    dst_dir: &Path,
) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        for name in explicit {
            validate_file_name(name)?;
        }
        return Ok(explicit.to_vec());
    }
    if let Some(path) = manifest {
        let manifest = Manifest::load(path)?;
        ensure!(
            !manifest.files.is_empty(),
            "Manifest {path:?} does not list any files"
        );
        return Ok(manifest.files);
    }
    let mut names = BTreeSet::new();
    for dir in [src_dir, dst_dir] {
        names.extend(discover_csv_files(dir)?);
    }
    debug!("Discovered {} csv file(s)", names.len());
    Ok(names.into_iter().collect())
}

fn discover_csv_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Listing directory {dir:?}"))? {
        let entry = entry.with_context(|| format!("Reading entry in {dir:?}"))?;
        let path: PathBuf = entry.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub fn validate_file_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(anyhow!("'{name}' is not a plain file name")),
    }
}
