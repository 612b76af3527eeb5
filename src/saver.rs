//! Persists a deck tree to the collection. Decks are saved once each,
//! depth-first. Note models and deck configs are shared by many decks, so
//! they are saved once per tree, from the root call only.

use std::borrow::Cow;

use tracing::{debug, info, instrument};

use crate::{collection::Collection, error::DeckError, types::{Deck, DeckTree, ImportConfig, Metadata, Note}};

#[derive(Debug, Clone, Copy)]
pub enum SaveMode<'a> {
	/// Write back identifiers assigned while exporting.
	Export,
	/// Merge an imported tree, notes included.
	Import(&'a ImportConfig),
}

#[instrument(skip_all, fields(deck = %tree.root.name))]
pub fn save_changes(collection: &mut dyn Collection, tree: &DeckTree, mode: SaveMode) -> Result<(), DeckError> {
	save_deck(collection, &tree.root, &tree.metadata, mode, false)?;
	info!("Saved deck tree '{}'", tree.root.name);
	Ok(())
}

/// `is_export_child` is whether this deck is a child for the purposes of the
/// current operation. Exporting a sub-deck makes that sub-deck the root here.
fn save_deck(
	collection: &mut dyn Collection,
	deck: &Deck,
	metadata: &Metadata,
	mode: SaveMode,
	is_export_child: bool,
) -> Result<(), DeckError> {
	if !is_export_child {
		save_shared(collection, metadata)?;
	}

	debug!("Saving deck '{}'", deck.name);
	collection.save_deck(deck)?;

	if let SaveMode::Import(policy) = mode {
		if policy.use_notes {
			for note in &deck.notes {
				collection.save_note(&with_import_tags(note, policy), deck, policy)?;
			}
		}
	}

	for child in &deck.children {
		save_deck(collection, child, metadata, mode, true)?;
	}

	Ok(())
}

fn save_shared(collection: &mut dyn Collection, metadata: &Metadata) -> Result<(), DeckError> {
	for deck_config in metadata.deck_configs.values() {
		debug!("Saving deck config '{}'", deck_config.name);
		collection.save_deck_config(deck_config)?;
	}

	for model in metadata.note_models.values() {
		debug!("Saving note model '{}'", model.name);
		collection.save_note_model(model)?;
	}

	Ok(())
}

fn with_import_tags<'a>(note: &'a Note, policy: &ImportConfig) -> Cow<'a, Note> {
	let missing: Vec<_> = policy.add_tag_to_cards.iter().filter(|tag| !note.tags.contains(tag)).collect();
	if missing.is_empty() {
		return Cow::Borrowed(note);
	}

	let mut note = note.clone();
	note.tags.extend(missing.into_iter().cloned());
	Cow::Owned(note)
}
