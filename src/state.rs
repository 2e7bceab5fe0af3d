use std::sync::Arc;

use crate::data::filter::{evaluate, Scope};
use crate::data::model::{ExcitementFilter, TaggedRecord};
use crate::data::registry::SourceRegistry;
use crate::data::sort::{sort_records, SortDirection, SortKey};
use crate::{Error, Result};

// ---------------------------------------------------------------------------
// Session state snapshot
// ---------------------------------------------------------------------------

/// Everything that determines the displayed rows, independent of rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active_source: Option<String>,
    pub search_term: String,
    pub excitement: ExcitementFilter,
    pub sort_key: Option<SortKey>,
    pub sort_direction: SortDirection,
    pub global_mode: bool,
}

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    SelectSource(String),
    SetSearchTerm(String),
    SetExcitementFilter(ExcitementFilter),
    ToggleSortColumn(SortKey),
    ToggleGlobalMode,
}

impl SessionState {
    /// The snapshot that results from applying `transition`.
    pub fn apply(&self, transition: &Transition) -> SessionState {
        let mut next = self.clone();
        match transition {
            Transition::SelectSource(id) => {
                next.active_source = Some(id.clone());
                next.search_term.clear();
                next.excitement = ExcitementFilter::All;
                next.sort_key = None;
                next.sort_direction = SortDirection::Asc;
            }
            Transition::SetSearchTerm(term) => next.search_term = term.clone(),
            Transition::SetExcitementFilter(filter) => next.excitement = *filter,
            Transition::ToggleSortColumn(key) => {
                if next.sort_key == Some(*key) {
                    next.sort_direction = next.sort_direction.toggled();
                } else {
                    next.sort_key = Some(*key);
                    next.sort_direction = SortDirection::Asc;
                }
            }
            Transition::ToggleGlobalMode => next.global_mode = !next.global_mode,
        }
        next
    }

    /// Query scope; `None` when scoped mode has no active source.
    pub fn scope(&self) -> Option<Scope> {
        if self.global_mode {
            Some(Scope::All)
        } else {
            self.active_source.clone().map(Scope::Source)
        }
    }

    /// The source column only exists in global mode, so sorting by it is a
    /// no-op otherwise.
    pub fn effective_sort_key(&self) -> Option<SortKey> {
        match self.sort_key {
            Some(SortKey::Source) if !self.global_mode => None,
            key => key,
        }
    }
}

// ---------------------------------------------------------------------------
// Displayed view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// At least one row is displayed.
    Ready,
    /// Sources are loaded but nothing passes the current filter.
    NoMatches,
    /// The active source failed to fetch or parse.
    SourceFailed { id: String, reason: String },
    /// The active source is not registered (yet).
    SourceMissing(String),
    /// Sources exist but none has been selected.
    NoSourceSelected,
    /// Every configured source failed to load.
    AllSourcesFailed(usize),
    /// The registry is empty and nothing failed.
    NoSources,
}

impl ViewStatus {
    pub fn message(&self) -> String {
        match self {
            ViewStatus::Ready => String::new(),
            ViewStatus::NoMatches => "No matches for the current search and filter.".into(),
            ViewStatus::SourceFailed { id, reason } => {
                format!("Source '{id}' failed to load: {reason}")
            }
            ViewStatus::SourceMissing(id) => format!("Source '{id}' is not loaded."),
            ViewStatus::NoSourceSelected => "Select a source to view its records.".into(),
            ViewStatus::AllSourcesFailed(count) => {
                format!("All {count} configured sources failed to load.")
            }
            ViewStatus::NoSources => "No sources configured.".into(),
        }
    }
}

/// Rows ready for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub records: Vec<TaggedRecord>,
    pub status: ViewStatus,
    /// Whether the provenance column is shown.
    pub show_source_column: bool,
}

impl View {
    fn empty(status: ViewStatus) -> Self {
        View {
            records: Vec::new(),
            status,
            show_source_column: false,
        }
    }
}

/// Query then sort: the only path from state to displayed rows.
///
/// Only errors other than `NotFound` propagate; none exist today, but
/// `Session::commit` keeps the previous view if one ever does.
pub fn recompute(registry: &SourceRegistry, state: &SessionState) -> Result<View> {
    let Some(scope) = state.scope() else {
        let status = if registry.is_empty() && registry.failure_count() == 0 {
            ViewStatus::NoSources
        } else {
            ViewStatus::NoSourceSelected
        };
        return Ok(View::empty(status));
    };

    let mut records = match evaluate(registry, &scope, &state.search_term, state.excitement) {
        Ok(records) => records,
        Err(Error::NotFound(id)) => {
            let status = match registry.failure(&id) {
                Some(reason) => ViewStatus::SourceFailed { id, reason },
                None if registry.is_empty() => ViewStatus::NoSources,
                None => ViewStatus::SourceMissing(id),
            };
            return Ok(View::empty(status));
        }
        Err(e) => return Err(e),
    };
    if registry.is_empty() {
        let failed = registry.failure_count();
        let status = if failed == 0 {
            ViewStatus::NoSources
        } else {
            ViewStatus::AllSourcesFailed(failed)
        };
        return Ok(View::empty(status));
    }
    sort_records(&mut records, state.effective_sort_key(), state.sort_direction);

    let status = if records.is_empty() {
        ViewStatus::NoMatches
    } else {
        ViewStatus::Ready
    };
    Ok(View {
        records,
        status,
        show_source_column: state.global_mode,
    })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A viewing session over a shared registry.
///
/// State and view only ever change together: a transition whose recompute
/// fails leaves both untouched and sets `last_error`.
pub struct Session {
    registry: Arc<SourceRegistry>,
    state: SessionState,
    view: View,
    last_error: Option<String>,
}

impl Session {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        let mut session = Session {
            registry,
            state: SessionState::default(),
            view: View::empty(ViewStatus::NoSources),
            last_error: None,
        };
        session.refresh();
        session
    }

    /// Open a session on the newest registered source, if any.
    pub fn open_latest(registry: Arc<SourceRegistry>) -> Self {
        let latest = registry.list_ids_ordered().into_iter().next();
        let mut session = Session::new(registry);
        if let Some(id) = latest {
            session.select_source(id);
        }
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn select_source(&mut self, id: impl Into<String>) {
        self.dispatch(Transition::SelectSource(id.into()));
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.dispatch(Transition::SetSearchTerm(term.into()));
    }

    pub fn set_excitement_filter(&mut self, filter: ExcitementFilter) {
        self.dispatch(Transition::SetExcitementFilter(filter));
    }

    pub fn toggle_sort_column(&mut self, key: SortKey) {
        self.dispatch(Transition::ToggleSortColumn(key));
    }

    pub fn toggle_global_mode(&mut self) {
        self.dispatch(Transition::ToggleGlobalMode);
    }

    /// Recompute against the current registry contents, e.g. after more
    /// sources finished loading.
    pub fn refresh(&mut self) {
        let state = self.state.clone();
        self.commit(state);
    }

    pub fn dispatch(&mut self, transition: Transition) {
        log::debug!("Session transition: {transition:?}");
        let next = self.state.apply(&transition);
        self.commit(next);
    }

    fn commit(&mut self, next: SessionState) {
        match recompute(&self.registry, &next) {
            Ok(view) => {
                self.state = next;
                self.view = view;
                self.last_error = None;
            }
            Err(e) => {
                log::error!("Recompute failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALL: &str = "Anime Title,Timestamp,Gigguk Excited?,Notes\n\
        Dandadan,1:05,Yes,aliens\n\
        Blue Box,0:30,Neutral,sports\n\
        Ranma,2:00,No,remake\n";
    const SPRING: &str = "Anime Title,Timestamp,Gigguk Excited?,Notes\n\
        Apothecary,0:10,Yes,herbs\n";

    fn registry() -> Arc<SourceRegistry> {
        let registry = SourceRegistry::new();
        registry.register("Fall 2024.csv", FALL).unwrap();
        registry.register("Spring 2025.csv", SPRING).unwrap();
        Arc::new(registry)
    }

    fn titles(session: &Session) -> Vec<&str> {
        session.view().records.iter().map(|r| r.record.title()).collect()
    }

    #[test]
    fn test_select_source_resets_query() {
        let mut session = Session::new(registry());
        session.select_source("Fall 2024.csv");
        session.set_search_term("dan");
        session.set_excitement_filter(ExcitementFilter::Yes);
        session.toggle_sort_column(SortKey::Title);
        assert_eq!(titles(&session), vec!["Dandadan"]);

        session.select_source("Spring 2025.csv");
        let state = session.state();
        assert_eq!(state.search_term, "");
        assert_eq!(state.excitement, ExcitementFilter::All);
        assert_eq!(state.sort_key, None);
        assert_eq!(state.sort_direction, SortDirection::Asc);
        assert_eq!(titles(&session), vec!["Apothecary"]);
    }

    #[test]
    fn test_toggle_sort_column() {
        let mut session = Session::new(registry());
        session.select_source("Fall 2024.csv");

        session.toggle_sort_column(SortKey::Timestamp);
        assert_eq!(titles(&session), vec!["Blue Box", "Dandadan", "Ranma"]);
        let before = session.view().clone();

        session.toggle_sort_column(SortKey::Timestamp);
        assert_eq!(session.state().sort_direction, SortDirection::Desc);
        assert_eq!(titles(&session), vec!["Ranma", "Dandadan", "Blue Box"]);

        session.toggle_sort_column(SortKey::Timestamp);
        assert_eq!(session.state().sort_direction, SortDirection::Asc);
        assert_eq!(session.view(), &before);

        session.toggle_sort_column(SortKey::Title);
        assert_eq!(session.state().sort_key, Some(SortKey::Title));
        assert_eq!(session.state().sort_direction, SortDirection::Asc);
    }

    #[test]
    fn test_global_mode_tags_and_shows_source() {
        let mut session = Session::new(registry());
        session.select_source("Fall 2024.csv");
        assert!(!session.view().show_source_column);
        assert!(session.view().records.iter().all(|r| r.provenance.is_none()));

        session.toggle_global_mode();
        let view = session.view();
        assert!(view.show_source_column);
        assert_eq!(view.records.len(), 4);
        assert_eq!(view.records[0].provenance.as_deref(), Some("Spring 2025"));
        assert!(view.records[1..]
            .iter()
            .all(|r| r.provenance.as_deref() == Some("Fall 2024")));
    }

    #[test]
    fn test_source_sort_only_in_global_mode() {
        let mut session = Session::new(registry());
        session.select_source("Fall 2024.csv");
        session.toggle_global_mode();
        session.toggle_sort_column(SortKey::Source);
        assert_eq!(session.view().records[0].provenance.as_deref(), Some("Fall 2024"));

        session.toggle_global_mode();
        assert_eq!(session.state().effective_sort_key(), None);
        assert_eq!(titles(&session), vec!["Dandadan", "Blue Box", "Ranma"]);
    }

    #[test]
    fn test_status_messages() {
        let empty = Session::new(Arc::new(SourceRegistry::new()));
        assert_eq!(empty.view().status, ViewStatus::NoSources);

        let mut session = Session::new(registry());
        assert_eq!(session.view().status, ViewStatus::NoSourceSelected);

        session.select_source("Fall 2024.csv");
        session.set_search_term("zzz");
        assert_eq!(session.view().status, ViewStatus::NoMatches);

        session.select_source("Winter 2023.csv");
        assert_eq!(
            session.view().status,
            ViewStatus::SourceMissing("Winter 2023.csv".into())
        );

        session.registry().record_failure("Winter 2023.csv", "not found");
        session.refresh();
        assert!(matches!(
            session.view().status,
            ViewStatus::SourceFailed { .. }
        ));
        assert!(session.view().status.message().contains("failed to load"));
    }

    #[tokio::test]
    async fn test_failed_only_source_is_not_reported_as_unconfigured() {
        let registry = Arc::new(SourceRegistry::new());
        let ids = vec!["Fall 2024.csv".to_string()];
        registry
            .load_all(&ids, &crate::data::registry::MemoryFetcher::default())
            .await;

        let mut session = Session::new(Arc::clone(&registry));
        assert_eq!(session.view().status, ViewStatus::NoSourceSelected);

        session.select_source("Fall 2024.csv");
        assert!(matches!(
            &session.view().status,
            ViewStatus::SourceFailed { id, .. } if id == "Fall 2024.csv"
        ));

        session.toggle_global_mode();
        assert_eq!(session.view().status, ViewStatus::AllSourcesFailed(1));
        assert_ne!(
            session.view().status.message(),
            ViewStatus::NoSources.message()
        );
    }

    #[test]
    fn test_open_latest() {
        let session = Session::open_latest(registry());
        assert_eq!(session.state().active_source.as_deref(), Some("Spring 2025.csv"));
        assert_eq!(session.view().status, ViewStatus::Ready);
    }

    #[test]
    fn test_refresh_sees_late_sources() {
        let registry = Arc::new(SourceRegistry::new());
        let mut session = Session::new(Arc::clone(&registry));
        session.select_source("Fall 2024.csv");
        assert!(matches!(session.view().status, ViewStatus::NoSources));

        registry.register("Fall 2024.csv", FALL).unwrap();
        session.refresh();
        assert_eq!(session.view().records.len(), 3);
    }
}
