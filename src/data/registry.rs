use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::future::join_all;

use crate::{Error, Result};

use super::loader::parse_records;
use super::model::{Source, SourceOrderKey};

// ---------------------------------------------------------------------------
// Fetch collaborator
// ---------------------------------------------------------------------------

/// Fetches the raw text of one source by id.
pub trait SourceFetcher: Send + Sync {
    fn fetch(&self, id: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Reads `<dir>/<id>` from disk, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    dir: PathBuf,
    timeout: Duration,
}

impl DirFetcher {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            timeout,
        }
    }
}

impl SourceFetcher for DirFetcher {
    async fn fetch(&self, id: &str) -> Result<String> {
        // Ids are bare file names; anything else could escape `dir`.
        let mut components = Path::new(id).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::fetch(id, "not a plain file name"));
        }

        let path = self.dir.join(id);
        match tokio::time::timeout(self.timeout, tokio::fs::read_to_string(&path)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::fetch(id, e)),
            Err(_) => Err(Error::fetch(
                id,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}

/// In-memory fetcher: id → text. Ids not in the map fail with a fetch error.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    pub contents: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.contents.insert(id.into(), text.into());
        self
    }
}

impl SourceFetcher for MemoryFetcher {
    async fn fetch(&self, id: &str) -> Result<String> {
        self.contents
            .get(id)
            .cloned()
            .ok_or_else(|| Error::fetch(id, "not found"))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// `(id, reason)` for every id that could not be fetched or parsed.
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Registration order; re-registration replaces in place.
    sources: Vec<Arc<Source>>,
    failures: BTreeMap<String, String>,
}

/// Append-only cache of parsed sources, keyed by id.
///
/// Readers always see whole sources: each entry is swapped in as a
/// complete `Arc<Source>`.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    inner: RwLock<RegistryInner>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw` and store it under `id`, replacing any previous entry.
    pub fn register(&self, id: &str, raw: &str) -> Result<Arc<Source>> {
        let set = parse_records(raw)?;
        let source = Arc::new(Source::from_record_set(id, set));

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.sources.iter_mut().find(|s| s.id == id) {
            Some(slot) => *slot = Arc::clone(&source),
            None => inner.sources.push(Arc::clone(&source)),
        }
        inner.failures.remove(id);

        Ok(source)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Source>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all sources, newest year/season first. Ties keep
    /// registration order.
    pub fn sources_ordered(&self) -> Vec<Arc<Source>> {
        let mut sources = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .clone();
        sources.sort_by_cached_key(|s| std::cmp::Reverse(SourceOrderKey::from_id(&s.id)));
        sources
    }

    pub fn list_ids_ordered(&self) -> Vec<String> {
        self.sources_ordered()
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    /// Remember that `id` failed to load.
    pub fn record_failure(&self, id: &str, reason: impl Into<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .failures
            .insert(id.to_string(), reason.into());
    }

    pub fn failure_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .failures
            .len()
    }

    pub fn failure(&self, id: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .failures
            .get(id)
            .cloned()
    }

    /// Fetch and register every id concurrently.
    ///
    /// Each source becomes visible as soon as its own fetch completes;
    /// the call returns once every fetch has settled. Failures are logged
    /// and skipped.
    pub async fn load_all<F: SourceFetcher>(&self, ids: &[String], fetcher: &F) -> LoadReport {
        let loads = ids.iter().map(|id| async move {
            let outcome = match fetcher.fetch(id).await {
                Ok(text) => self.register(id, &text).map(|source| source.len()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(count) => {
                    log::info!("Loaded source '{id}' ({count} records)");
                    Ok(id.clone())
                }
                Err(e) => {
                    log::warn!("Skipping source '{id}': {e}");
                    self.record_failure(id, e.to_string());
                    Err((id.clone(), e.to_string()))
                }
            }
        });

        let mut report = LoadReport::default();
        for result in join_all(loads).await {
            match result {
                Ok(id) => report.loaded.push(id),
                Err(failure) => report.failed.push(failure),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Anime Title,Timestamp,Gigguk Excited?,Notes\nDandadan,1:05,Yes,fun\n";

    #[test]
    fn test_register_and_get() {
        let registry = SourceRegistry::new();
        registry.register("Fall 2024_anime_references.csv", CSV).unwrap();

        let source = registry.get("Fall 2024_anime_references.csv").unwrap();
        assert_eq!(source.display_name, "Fall 2024");
        assert_eq!(source.records[0].source(), "Fall 2024");
        assert!(matches!(registry.get("missing.csv"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_reregister_last_write_wins() {
        let registry = SourceRegistry::new();
        registry.register("a.csv", CSV).unwrap();
        registry.register("b.csv", CSV).unwrap();
        registry.register("a.csv", "Anime Title\nOne\nTwo\n").unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a.csv").unwrap().len(), 2);
        assert_eq!(registry.list_ids_ordered(), vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_register_rejects_empty_text() {
        let registry = SourceRegistry::new();
        assert!(matches!(registry.register("a.csv", ""), Err(Error::Parse(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_ids_ordered() {
        let registry = SourceRegistry::new();
        for id in [
            "notes.csv",
            "Fall 2024 Anime in a Nutshell.csv",
            "Spring 2024 Anime in a Nutshell.csv",
            "extras.csv",
            "Winter 2025 Anime in a Nutshell.csv",
        ] {
            registry.register(id, CSV).unwrap();
        }

        assert_eq!(
            registry.list_ids_ordered(),
            vec![
                "Winter 2025 Anime in a Nutshell.csv",
                "Spring 2024 Anime in a Nutshell.csv",
                "Fall 2024 Anime in a Nutshell.csv",
                "notes.csv",
                "extras.csv",
            ]
        );
    }

    #[tokio::test]
    async fn test_load_all_partial_failure() {
        let registry = SourceRegistry::new();
        let fetcher = MemoryFetcher::default()
            .with("a.csv", CSV)
            .with("c.csv", CSV);
        let ids: Vec<String> = ["a.csv", "b.csv", "c.csv"].map(String::from).to_vec();

        let report = registry.load_all(&ids, &fetcher).await;

        assert_eq!(report.loaded, vec!["a.csv", "c.csv"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "b.csv");
        assert_eq!(registry.len(), 2);
        assert!(registry.failure("b.csv").is_some());
        assert!(registry.failure("a.csv").is_none());
    }

    #[tokio::test]
    async fn test_load_all_records_parse_failure() {
        let registry = SourceRegistry::new();
        let fetcher = MemoryFetcher::default().with("empty.csv", "");
        let ids = vec!["empty.csv".to_string()];

        let report = registry.load_all(&ids, &fetcher).await;

        assert!(report.loaded.is_empty());
        assert!(registry.failure("empty.csv").is_some());

        // A later successful registration clears the failure.
        registry.register("empty.csv", CSV).unwrap();
        assert!(registry.failure("empty.csv").is_none());
    }

    #[tokio::test]
    async fn test_dir_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), CSV).unwrap();
        let fetcher = DirFetcher::new(dir.path(), Duration::from_secs(5));

        assert_eq!(fetcher.fetch("a.csv").await.unwrap(), CSV);
        assert!(matches!(
            fetcher.fetch("missing.csv").await,
            Err(Error::SourceFetch { .. })
        ));
        assert!(matches!(
            fetcher.fetch("../a.csv").await,
            Err(Error::SourceFetch { .. })
        ));
    }
}
