use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::remote::TrackService;
use crate::store::SharedTrackStore;
use crate::CollectionError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The remote accepted this genre list.
    Submitted(Vec<String>),
    /// A newer edit of the same track was queued and carries this one's change.
    Superseded,
}

/// Applies genre toggles locally and pushes the result to the remote.
///
/// Local changes are optimistic: a failed submission is reported but never
/// rolled back. Submissions for one track go out one at a time, each carrying
/// the genre list as it stands when its turn comes.
pub struct GenreEditor<S> {
    store: SharedTrackStore,
    service: Arc<S>,
    queue: Arc<EditQueue>,
    summaries: Arc<RwLock<HashMap<String, String>>>,
}

impl<S> Clone for GenreEditor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            service: Arc::clone(&self.service),
            queue: Arc::clone(&self.queue),
            summaries: Arc::clone(&self.summaries),
        }
    }
}

impl<S: TrackService> GenreEditor<S> {
    pub fn new(store: SharedTrackStore, service: Arc<S>) -> Self {
        let editor = Self {
            store,
            service,
            queue: Arc::new(EditQueue::default()),
            summaries: Arc::new(RwLock::new(HashMap::new())),
        };
        editor.reset_summaries();
        editor
    }

    /// Last genre list the remote confirmed for a track, joined for display.
    pub fn summary(&self, track_id: &str) -> Option<String> {
        self.summaries.read().get(track_id).cloned()
    }

    /// Rebuilds every summary from the store, after a new scan.
    pub fn reset_summaries(&self) {
        let store = self.store.read();
        let summaries = store
            .all()
            .iter()
            .map(|track| (track.id.clone(), track.genre_summary()))
            .collect();
        *self.summaries.write() = summaries;
    }

    pub async fn toggle_genre(
        &self,
        track_id: &str,
        genre: &str,
        included: bool,
    ) -> Result<EditOutcome, CollectionError> {
        let ticket = {
            let mut store = self.store.write();
            let track = store.get_mut(track_id)?;
            if apply_toggle(&mut track.genres, genre, included) {
                debug!(
                    "{} {} on {}",
                    if included { "Added" } else { "Removed" },
                    genre,
                    track.display_title()
                );
            }
            self.queue.enqueue(track_id)
        };

        let _in_flight = ticket.slot.gate.lock().await;
        if ticket.is_superseded() {
            debug!("Genre edit for {} superseded by a newer one", track_id);
            return Ok(EditOutcome::Superseded);
        }
        self.submit(track_id).await.map(EditOutcome::Submitted)
    }

    async fn submit(&self, track_id: &str) -> Result<Vec<String>, CollectionError> {
        let (title, genres) = {
            let store = self.store.read();
            let track = store.get(track_id)?;
            (track.display_title().to_string(), track.genres.clone())
        };
        info!("Setting genres for {} to [{}]", title, genres.join(", "));
        match self.service.update_genres(track_id, &genres).await {
            Ok(()) => {
                self.summaries
                    .write()
                    .insert(track_id.to_string(), genres.join(", "));
                Ok(genres)
            }
            Err(err) => {
                error!("Failed to update genres for {}: {}", title, err);
                Err(err.into())
            }
        }
    }
}

/// Returns whether the list changed.
fn apply_toggle(genres: &mut Vec<String>, genre: &str, included: bool) -> bool {
    if included {
        if genres.iter().any(|g| g == genre) {
            return false;
        }
        genres.push(genre.to_string());
        true
    } else {
        let before = genres.len();
        genres.retain(|g| g != genre);
        genres.len() != before
    }
}

/// Per-track submission queue: one gate per track with edits outstanding.
#[derive(Default)]
struct EditQueue {
    slots: Mutex<HashMap<String, Arc<EditSlot>>>,
}

#[derive(Default)]
struct EditSlot {
    gate: tokio::sync::Mutex<()>,
    next_generation: AtomicU64,
    /// Generations whose caller is still waiting or submitting.
    live: Mutex<BTreeSet<u64>>,
}

/// A queued edit. Dropping it, finished or abandoned, leaves the queue.
struct EditTicket<'a> {
    queue: &'a EditQueue,
    track_id: String,
    slot: Arc<EditSlot>,
    generation: u64,
}

impl EditTicket<'_> {
    fn is_superseded(&self) -> bool {
        self.slot
            .live
            .lock()
            .last()
            .is_some_and(|&newest| newest != self.generation)
    }
}

impl Drop for EditTicket<'_> {
    fn drop(&mut self) {
        self.slot.live.lock().remove(&self.generation);
        let mut slots = self.queue.slots.lock();
        // Only the map and this ticket still hold the slot.
        let idle = slots
            .get(&self.track_id)
            .is_some_and(|slot| Arc::ptr_eq(slot, &self.slot) && Arc::strong_count(slot) == 2);
        if idle {
            slots.remove(&self.track_id);
        }
    }
}

impl EditQueue {
    fn enqueue(&self, track_id: &str) -> EditTicket<'_> {
        let mut slots = self.slots.lock();
        let slot = Arc::clone(slots.entry(track_id.to_string()).or_default());
        let generation = slot.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        slot.live.lock().insert(generation);
        EditTicket {
            queue: self,
            track_id: track_id.to_string(),
            slot,
            generation,
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.slots.lock().len()
    }
}
