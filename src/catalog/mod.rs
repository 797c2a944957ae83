//! Content aggregation core.
//!
//! - **Loader**: reads typed entries from the flat-file store.
//! - **State**: the engine-owned mutable model (entry lists, person
//!   profiles, contributors).
//! - **Updates**: typed partial enrichment updates and the FIFO queue they
//!   travel through.
//! - **Engine**: the single consumer applying updates and invalidating
//!   cached pages.

mod engine;
mod loader;
mod lock;
mod state;
mod updates;

pub(crate) use lock::{rw_read, rw_write};

pub use engine::Engine;
pub use loader::{CategoryReport, load_category, load_store};
pub use state::{CatalogState, LoadedStore};
pub use updates::{EntryKey, Epoch, QueuedUpdate, Update, UpdateQueue};
