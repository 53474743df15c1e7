//! State store for the page editor.
//!
//! [`EditorStore`] owns the page's sections and elements. Edits apply to
//! memory immediately; writes to the [`EditorPersistence`] backend are either
//! immediate (create, delete, reorder) or debounced per entity through
//! [`Debouncer`]. Undo/redo history is bounded by
//! [`EditorConfig::history_limit`].

pub mod config;
pub mod debounce;
pub mod history;
pub mod model;
pub mod persistence;
pub mod store;
pub mod templates;

pub use config::{ConfigError, EditorConfig};
pub use debounce::{DebounceKey, Debouncer};
pub use history::{History, Snapshot};
pub use model::{Element, ElementKind, ElementPatch, Section, SectionKind, SectionPatch};
pub use persistence::{EditorPersistence, MemoryPersistence, OfflinePersistence, PersistenceCall};
pub use store::EditorStore;
pub use templates::{section_template, SectionTemplate};

/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
