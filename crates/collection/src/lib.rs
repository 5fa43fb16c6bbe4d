mod browser;
mod cache;
mod editor;
mod error;
pub mod filter;
mod genres;
pub mod order;
pub mod paging;
mod remote;
mod settings;
mod status;
mod store;
#[cfg(test)]
mod testing;

pub use browser::{Browser, PageEditReport, PageView, FILTER_PROMPT, ORDER_PROMPT};
pub use cache::{TrackCache, TRACKS_KEY};
pub use common::Track;
pub use editor::{EditOutcome, GenreEditor};
pub use error::CollectionError;
pub use filter::{FilterField, FilterSpec};
pub use genres::GenreIndex;
pub use order::{SortField, SortKey, ValueKind};
pub use paging::Page;
pub use remote::{HttpTrackService, RemoteError, ScanSource, TrackService};
pub use settings::{
    MemoryBackend, RedbBackend, SettingsBackend, SettingsError, SettingsStore, ViewSettings,
    SETTINGS_KEY,
};
pub use status::{with_commas, StatusLine};
pub use store::{SharedTrackStore, TrackStore};
