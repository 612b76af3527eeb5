//! Round-trips flashcard decks between a collection and a version-control
//! friendly directory tree:
//!
//! ```text
//! deck.json
//! note_models/<model>/note_model.json
//! note_models/<model>/style.css
//! note_models/<model>/tmpls/<template>/{tmpl.json, front.html, back.html}
//! media/
//! import_config.yaml
//! ```
//!
//! [`exporter::AnkiExporter`] writes the tree, [`importer::AnkiJsonImporter`]
//! reads it back and merges it through the [`collection::Collection`] seam.

pub mod collection;
pub mod config;
pub mod deck_locator;
pub mod error;
pub mod exporter;
pub mod import_policy;
pub mod importer;
pub mod media;
pub mod name_sanitizer;
pub mod note_sorter;
pub mod saver;
pub mod store;
pub mod types;
pub mod uuid_generator;
pub mod uuid_resolver;

pub use collection::Collection;
pub use config::Config;
pub use error::{CollectionError, DeckError};
pub use exporter::AnkiExporter;
pub use importer::AnkiJsonImporter;
