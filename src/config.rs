//! Source listing and viewer configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Used when no listing is available.
pub const DEFAULT_SOURCE_ID: &str = "Fall 2024 Anime in a Nutshell_anime_references.csv";

/// Listing file name inside the data directory.
pub const LISTING_FILE: &str = "csv_config.json";

pub const DATA_DIR_ENV: &str = "ANIME_REFS_DIR";
pub const DEFAULT_DATA_DIR: &str = "transcripts";

/// The `{"files": [...]}` payload enumerating source ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceListing {
    #[serde(default)]
    pub files: Vec<String>,
}

impl SourceListing {
    pub fn from_json(text: &str) -> Result<Self> {
        let listing: SourceListing =
            serde_json::from_str(text).map_err(|e| Error::ConfigLoad(e.to_string()))?;
        if listing.files.is_empty() {
            return Err(Error::ConfigLoad("listing contains no files".into()));
        }
        Ok(listing)
    }

    pub fn fallback() -> Self {
        SourceListing {
            files: vec![DEFAULT_SOURCE_ID.to_string()],
        }
    }

    /// Use the loaded listing, or fall back to the single default id.
    pub fn load_or_default(loaded: Result<Self>) -> Self {
        match loaded {
            Ok(listing) => listing,
            Err(e) => {
                log::warn!("Using default source list: {e}");
                Self::fallback()
            }
        }
    }

    /// Read and parse a listing file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// All `*.csv` files in `dir`, sorted by name.
    pub fn discover(dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".csv") {
                files.push(name);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(Error::ConfigLoad(format!(
                "no csv files in {}",
                dir.display()
            )));
        }
        Ok(SourceListing { files })
    }

    /// Append `id` unless already listed. Returns whether it was added.
    pub fn add(&mut self, id: &str) -> bool {
        if self.files.iter().any(|f| f == id) {
            return false;
        }
        self.files.push(id.to_string());
        true
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Where the viewer finds its data.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub data_dir: PathBuf,
    pub fetch_timeout: Duration,
}

impl ViewerConfig {
    /// Data directory priority: explicit argument, then `ANIME_REFS_DIR`,
    /// then `transcripts`.
    pub fn resolve(cli_arg: Option<&str>) -> Self {
        let data_dir = cli_arg
            .map(PathBuf::from)
            .or_else(|| std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        ViewerConfig {
            data_dir,
            fetch_timeout: Duration::from_secs(10),
        }
    }

    pub fn listing_path(&self) -> PathBuf {
        self.data_dir.join(LISTING_FILE)
    }

    /// Listing file, else a directory scan, else the default id.
    pub fn load_listing(&self) -> SourceListing {
        let loaded = SourceListing::read(&self.listing_path()).or_else(|e| {
            log::warn!("{e}; scanning {}", self.data_dir.display());
            SourceListing::discover(&self.data_dir)
        });
        SourceListing::load_or_default(loaded)
    }
}
