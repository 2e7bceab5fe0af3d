use std::sync::Arc;

use anime_refs::data::model::{EXCITED, NOTES, TIMESTAMP, TITLE};
use anime_refs::{DirFetcher, ExcitementLevel, Session, SourceRegistry, View, ViewerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let arg = std::env::args().nth(1);
    let config = ViewerConfig::resolve(arg.as_deref());
    let listing = config.load_listing();

    let registry = Arc::new(SourceRegistry::new());
    let fetcher = DirFetcher::new(&config.data_dir, config.fetch_timeout);
    let report = registry.load_all(&listing.files, &fetcher).await;
    log::info!(
        "Loaded {} of {} sources from {}",
        report.loaded.len(),
        listing.files.len(),
        config.data_dir.display()
    );

    println!("Sources:");
    for source in registry.sources_ordered() {
        println!("  {} ({} records)", source.display_name, source.len());
    }
    for (id, reason) in &report.failed {
        println!("  {id}: failed ({reason})");
    }
    println!();

    let session = Session::open_latest(registry);
    if let Some(err) = session.last_error() {
        anyhow::bail!("could not build view: {err}");
    }
    print_view(session.view());
    Ok(())
}

fn print_view(view: &View) {
    if view.records.is_empty() {
        println!("{}", view.status.message());
        return;
    }
    for row in &view.records {
        let rec = &row.record;
        let class = ExcitementLevel::classify(rec.get(EXCITED))
            .map(ExcitementLevel::as_str)
            .unwrap_or("-");
        let source = match (&row.provenance, view.show_source_column) {
            (Some(name), true) => format!(" [{name}]"),
            _ => String::new(),
        };
        println!(
            "{:>8}  {:<7}  {}{}  {}",
            rec.get(TIMESTAMP),
            class,
            rec.get(TITLE),
            source,
            rec.get(NOTES)
        );
    }
}
