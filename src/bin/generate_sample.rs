use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use anime_refs::data::model::{EXCITED, NOTES, TIMESTAMP, TITLE};
use anime_refs::{SourceListing, ViewerConfig};

type Row = (&'static str, &'static str, &'static str, &'static str);

const SOURCES: &[(&str, &[Row])] = &[
    (
        "Fall 2024 Anime in a Nutshell_anime_references.csv",
        &[
            ("Dandadan", "1:05", "Yes", "Aliens, ghosts and a very fast opening"),
            ("Blue Box", "4:32", "Neutral", "Sports romance"),
            ("Ranma 1/2", "7:10", "No, already seen it", "Remake of the classic"),
            ("Re:Zero Season 3", "10:48", "Yes!!", "Finally back"),
        ],
    ),
    (
        "Spring 2025 Anime in a Nutshell_anime_references.csv",
        &[
            ("The Apothecary Diaries S2", "0:45", "Yes", "Maomao returns"),
            ("Wind Breaker S2", "3:20", "Neutral", ""),
            ("Fire Force S3", "1:02:15", "neutral leaning yes", "Long segment"),
        ],
    ),
    (
        "Winter 2025 Anime in a Nutshell_anime_references.csv",
        &[
            ("Solo Leveling S2", "2:00", "Yes", "Hype"),
            ("Medalist", "5:55", "Neutral", "Figure skating, surprisingly good"),
        ],
    ),
];

fn write_source(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([TITLE, TIMESTAMP, EXCITED, NOTES])?;
    for (title, timestamp, excited, notes) in rows {
        writer.write_record([title, timestamp, excited, notes])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let arg = std::env::args().nth(1);
    let config = ViewerConfig::resolve(arg.as_deref());
    let dir: PathBuf = config.data_dir.clone();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut listing = SourceListing::default();
    for (id, rows) in SOURCES {
        write_source(&dir.join(id), rows)?;
        if listing.add(id) {
            log::info!("Added {id} to listing");
        }
    }
    listing
        .write(&config.listing_path())
        .context("writing source listing")?;

    println!(
        "Wrote {} sample sources and {} to {}",
        listing.files.len(),
        config.listing_path().display(),
        dir.display()
    );
    Ok(())
}
