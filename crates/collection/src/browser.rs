use std::collections::BTreeSet;
use std::sync::Arc;

use common::Track;
use tracing::{debug, info, warn};

use crate::cache::TrackCache;
use crate::editor::{EditOutcome, GenreEditor};
use crate::filter::{self, FilterSpec};
use crate::order::{self, SortKey};
use crate::paging;
use crate::remote::{ScanSource, TrackService};
use crate::settings::{SettingsStore, ViewSettings};
use crate::status::StatusLine;
use crate::store::{SharedTrackStore, TrackStore};
use crate::CollectionError;

pub const FILTER_PROMPT: &str = "Changing filters will reset the saved page number to 1. Continue?";
pub const ORDER_PROMPT: &str =
    "Changing the order will reset the saved page number to 1. Continue?";

/// The visible window of the filtered, ordered collection.
#[derive(Clone, Debug)]
pub struct PageView {
    pub tracks: Vec<Track>,
    pub index: usize,
    pub page_count: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Debug, Default)]
pub struct PageEditReport {
    pub submitted: usize,
    pub failures: Vec<(String, CollectionError)>,
}

/// A browsing session: scanned tracks, persisted view settings and the
/// filter, order and paging pipeline between them.
///
/// Every view-changing call re-runs the whole pipeline before returning, so
/// no caller can observe a half-updated view.
pub struct Browser<S> {
    service: Arc<S>,
    store: SharedTrackStore,
    editor: GenreEditor<S>,
    settings_store: SettingsStore,
    cache: TrackCache,
    settings: ViewSettings,
    view: Vec<String>,
}

impl<S: TrackService> Browser<S> {
    pub fn new(service: Arc<S>, settings_store: SettingsStore) -> Self {
        let store = TrackStore::new().shared();
        let editor = GenreEditor::new(Arc::clone(&store), Arc::clone(&service));
        let cache = settings_store.track_cache();
        Self {
            service,
            store,
            editor,
            settings_store,
            cache,
            settings: ViewSettings::default(),
            view: Vec::new(),
        }
    }

    /// Loads a scan, then the stored settings, then builds the view.
    ///
    /// A cached open is served from the local track cache when it holds one
    /// and only reaches the API on a miss. A fresh open always fetches and
    /// replaces the local copy.
    pub async fn open(&mut self, source: ScanSource) -> Result<(), CollectionError> {
        let cached = match source {
            ScanSource::Cached => self.cache.load()?,
            ScanSource::Fresh => None,
        };
        let tracks = match cached {
            Some(tracks) => {
                info!("Loaded {} tracks from the local cache", tracks.len());
                tracks
            }
            None => {
                let tracks = self.service.fetch_tracks(source).await?;
                info!("Fetched {} tracks ({:?} scan)", tracks.len(), source);
                tracks
            }
        };
        self.store.write().replace(tracks);
        self.persist_tracks()?;
        self.editor.reset_summaries();
        self.load_and_apply()
    }

    /// Drops the local track cache and reloads from a fresh scan.
    pub async fn rescan(&mut self) -> Result<(), CollectionError> {
        self.cache.clear()?;
        self.open(ScanSource::Fresh).await
    }

    fn persist_tracks(&self) -> Result<(), CollectionError> {
        let store = self.store.read();
        self.cache.save(store.all())?;
        Ok(())
    }

    /// Re-reads the stored settings and rebuilds the view from scratch.
    pub fn load_and_apply(&mut self) -> Result<(), CollectionError> {
        let settings = self.settings_store.load()?;
        {
            let mut store = self.store.write();
            for genre in &settings.selected_genres {
                if !store.genres().contains(genre) {
                    store.genres_mut().add_reserved(genre)?;
                }
            }
        }
        self.settings = settings;
        self.refresh();
        Ok(())
    }

    pub fn save_and_reload(&mut self) -> Result<(), CollectionError> {
        self.settings_store.save(&self.settings)?;
        self.load_and_apply()
    }

    fn save(&self) -> Result<(), CollectionError> {
        self.settings_store.save(&self.settings)
    }

    fn refresh(&mut self) {
        let store = self.store.read();
        let mut visible = filter::apply(store.all(), &self.settings.filter);
        order::apply(&mut visible, &self.settings.order);
        self.view = visible.iter().map(|track| track.id.clone()).collect();
        debug!(
            "View rebuilt: {} of {} tracks, order {}",
            self.view.len(),
            store.len(),
            order::describe(&self.settings.order)
        );
    }

    /// Returns `false` when the user declined to leave the current page.
    pub fn apply_filter<C>(&mut self, spec: FilterSpec, confirm: C) -> Result<bool, CollectionError>
    where
        C: FnOnce(&str) -> bool,
    {
        if !self
            .settings
            .restructure(confirm, FILTER_PROMPT, |s| s.filter = spec)
        {
            return Ok(false);
        }
        self.refresh();
        self.save()?;
        Ok(true)
    }

    pub fn reset_filter<C>(&mut self, confirm: C) -> Result<bool, CollectionError>
    where
        C: FnOnce(&str) -> bool,
    {
        self.apply_filter(FilterSpec::default(), confirm)
    }

    pub fn push_sort_key<C>(&mut self, key: SortKey, confirm: C) -> Result<bool, CollectionError>
    where
        C: FnOnce(&str) -> bool,
    {
        if !self
            .settings
            .restructure(confirm, ORDER_PROMPT, |s| s.order.push(key))
        {
            return Ok(false);
        }
        self.refresh();
        self.save()?;
        Ok(true)
    }

    pub fn reset_order<C>(&mut self, confirm: C) -> Result<bool, CollectionError>
    where
        C: FnOnce(&str) -> bool,
    {
        if !self
            .settings
            .restructure(confirm, ORDER_PROMPT, |s| s.order.clear())
        {
            return Ok(false);
        }
        self.refresh();
        self.save_and_reload()?;
        Ok(true)
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), CollectionError> {
        let page = paging::rebase_index(self.settings.page, self.settings.page_size, page_size)?;
        debug!(
            "Page size {} -> {}, page {} -> {}",
            self.settings.page_size, page_size, self.settings.page, page
        );
        self.settings.page_size = page_size;
        self.settings.page = page;
        self.save()
    }

    pub fn next_page(&mut self) -> Result<bool, CollectionError> {
        let page = paging::slice(&self.view, self.settings.page_size, self.settings.page)?;
        if !page.has_next {
            return Ok(false);
        }
        self.settings.page += 1;
        self.save()?;
        Ok(true)
    }

    pub fn prev_page(&mut self) -> Result<bool, CollectionError> {
        if self.settings.page == 0 {
            return Ok(false);
        }
        self.settings.page -= 1;
        self.save()?;
        Ok(true)
    }

    pub fn reset_paging(&mut self) -> Result<(), CollectionError> {
        self.settings.page = 0;
        self.save()
    }

    /// Flips the genre panel and returns its new visibility.
    pub fn toggle_genres_panel(&mut self) -> Result<bool, CollectionError> {
        self.settings.genres_visible = !self.settings.genres_visible;
        self.save()?;
        Ok(self.settings.genres_visible)
    }

    /// Replaces the genres offered as per-track toggles.
    pub fn select_genres(&mut self, genres: BTreeSet<String>) -> Result<(), CollectionError> {
        self.settings.selected_genres = genres;
        self.save_and_reload()
    }

    pub fn clear_selected_genres(&mut self) -> Result<(), CollectionError> {
        self.select_genres(BTreeSet::new())
    }

    /// Creates a genre no track carries yet and selects it.
    pub fn add_genre(&mut self, name: &str) -> Result<(), CollectionError> {
        if let Err(err) = self.store.write().genres_mut().add_reserved(name) {
            warn!("Genre not added: {}", err);
            return Err(err);
        }
        self.settings.selected_genres.insert(name.to_string());
        self.save()
    }

    pub fn page(&self) -> Result<PageView, CollectionError> {
        let page = paging::slice(&self.view, self.settings.page_size, self.settings.page)?;
        let store = self.store.read();
        let tracks = page
            .items
            .iter()
            .map(|id| store.get(id).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageView {
            tracks,
            index: page.index,
            page_count: page.page_count,
            has_prev: page.has_prev,
            has_next: page.has_next,
        })
    }

    pub fn status(&self) -> Result<StatusLine, CollectionError> {
        Ok(StatusLine {
            total: self.store.read().len(),
            filtered: self.view.len(),
            page: self.settings.page,
            page_count: paging::page_count(self.view.len(), self.settings.page_size)?,
            order: order::describe(&self.settings.order),
        })
    }

    pub async fn toggle_genre(
        &self,
        track_id: &str,
        genre: &str,
        included: bool,
    ) -> Result<EditOutcome, CollectionError> {
        let outcome = self.editor.toggle_genre(track_id, genre, included).await;
        if !matches!(outcome, Err(CollectionError::NotFound(_))) {
            // The local change stands whatever the remote said.
            if let Err(err) = self.persist_tracks() {
                warn!("Failed to cache tracks after editing {}: {}", track_id, err);
            }
        }
        outcome
    }

    /// Sets or clears `genre` on every visible track that differs, one by one.
    pub async fn toggle_genre_on_page(
        &self,
        genre: &str,
        included: bool,
    ) -> Result<PageEditReport, CollectionError> {
        let pending: Vec<String> = self
            .page()?
            .tracks
            .into_iter()
            .filter(|track| track.has_genre(genre) != included)
            .map(|track| track.id)
            .collect();

        let mut report = PageEditReport::default();
        for track_id in pending {
            match self.toggle_genre(&track_id, genre, included).await {
                Ok(_) => report.submitted += 1,
                Err(err) => report.failures.push((track_id, err)),
            }
        }
        Ok(report)
    }

    pub fn genre_summary(&self, track_id: &str) -> Option<String> {
        self.editor.summary(track_id)
    }

    pub fn genres(&self) -> Vec<String> {
        self.store
            .read()
            .genres()
            .genres()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn visible_count(&self) -> usize {
        self.view.len()
    }
}
