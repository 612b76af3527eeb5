use serde_json::{Map, Value};

pub mod crowd_anki_config;
pub mod crowd_anki_models;
pub mod deck;
pub mod import_config;

pub use crowd_anki_config::DeckConfig;
pub use crowd_anki_models::{Deck, Field, Note, NoteModel, Template};
pub use deck::{DeckTree, Metadata};
pub use import_config::{ImportConfig, ImportConfigDocument};

/// Backing-store fields this crate never interprets, carried through every
/// load and save verbatim.
pub type Opaque = Map<String, Value>;

/// The kinds of entity that carry a `crowdanki_uuid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
	Deck,
	DeckConfig,
	NoteModel,
}

impl std::fmt::Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			EntityKind::Deck => "deck",
			EntityKind::DeckConfig => "deck config",
			EntityKind::NoteModel => "note model",
		})
	}
}
