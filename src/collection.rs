//! The seam to the host collection. Everything this crate persists goes
//! through [`Collection`]; how records are stored, merged into existing ones
//! or backed up is the implementor's business.

use std::path::PathBuf;

use crate::{error::CollectionError, types::{Deck, DeckConfig, DeckTree, EntityKind, ImportConfig, Note, NoteModel}};

pub trait Collection {
	/// Re-derives the named deck, its sub-decks and the note models and deck
	/// configs they reference from current collection state.
	fn deck_tree(&self, name: &str) -> Result<DeckTree, CollectionError>;

	fn save_deck(&mut self, deck: &Deck) -> Result<(), CollectionError>;

	fn save_deck_config(&mut self, config: &DeckConfig) -> Result<(), CollectionError>;

	/// Saves a note model. Merging it into an existing model with the same
	/// identifier is up to the collection.
	fn save_note_model(&mut self, model: &NoteModel) -> Result<(), CollectionError>;

	/// Saves an imported note into `deck`, honouring the import policy.
	fn save_note(&mut self, note: &Note, deck: &Deck, policy: &ImportConfig) -> Result<(), CollectionError>;

	fn media_directory(&self) -> PathBuf;

	/// Creates a recovery point of the whole collection.
	fn create_backup(&mut self) -> Result<(), CollectionError>;

	/// Whether `uuid` is claimed in a way an import must not reuse, e.g. by
	/// several existing entities at once.
	fn uuid_conflicts(&self, _kind: EntityKind, _uuid: &str) -> bool { false }
}
