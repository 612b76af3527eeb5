//! Identifier reconciliation for imports. Before anything is saved, every
//! identifier in the incoming tree is checked against the collection; one
//! that would collide is replaced, and the replacement is carried to every
//! reference inside the tree so decks keep pointing at their config and
//! notes at their model.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::{collection::Collection, types::{DeckTree, EntityKind}, uuid_generator};

pub trait UuidReconciler {
	/// Rewrites colliding identifiers in place, returning how many changed.
	fn reconcile(&self, tree: &mut DeckTree, collection: &dyn Collection) -> usize;
}

/// Regenerates identifiers the collection reports as conflicting.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionReconciler;

impl UuidReconciler for CollisionReconciler {
	fn reconcile(&self, tree: &mut DeckTree, collection: &dyn Collection) -> usize {
		resolve_uuids(tree, collection)
	}
}

/// Old identifier to its replacement.
type Renames = BTreeMap<String, String>;

fn renames_for<'a>(
	kind: EntityKind,
	uuids: impl Iterator<Item = &'a String>,
	collection: &dyn Collection,
) -> Renames {
	uuids
		.filter(|uuid| collection.uuid_conflicts(kind, uuid))
		.map(|uuid| {
			let fresh = uuid_generator::generate_crowdanki_uuid();
			info!("Replacing conflicting {} identifier {} with {}", kind, uuid, fresh);
			(uuid.clone(), fresh)
		})
		.collect()
}

#[instrument(skip_all, fields(deck = %tree.root.name))]
pub fn resolve_uuids(tree: &mut DeckTree, collection: &dyn Collection) -> usize {
	let config_renames = renames_for(EntityKind::DeckConfig, tree.metadata.deck_configs.keys(), collection);
	let model_renames = renames_for(EntityKind::NoteModel, tree.metadata.note_models.keys(), collection);

	for (old, new) in &config_renames {
		if let Some(mut config) = tree.metadata.deck_configs.remove(old) {
			config.crowdanki_uuid = new.clone();
			tree.metadata.deck_configs.insert(new.clone(), config);
		}
	}
	for (old, new) in &model_renames {
		if let Some(mut model) = tree.metadata.note_models.remove(old) {
			model.crowdanki_uuid = new.clone();
			tree.metadata.note_models.insert(new.clone(), model);
		}
	}

	let mut changed = config_renames.len() + model_renames.len();
	tree.root.walk_mut(&mut |deck| {
		if deck.crowdanki_uuid.is_empty() || collection.uuid_conflicts(EntityKind::Deck, &deck.crowdanki_uuid) {
			deck.crowdanki_uuid = uuid_generator::generate_crowdanki_uuid();
			changed += 1;
		}

		if let Some(new) = deck.deck_config_uuid.as_ref().and_then(|uuid| config_renames.get(uuid)) {
			deck.deck_config_uuid = Some(new.clone());
		}

		for note in &mut deck.notes {
			if let Some(new) = model_renames.get(&note.note_model_uuid) {
				note.note_model_uuid = new.clone();
			}
		}
	});

	changed
}

#[cfg(test)]
mod tests {
	use std::{collections::HashSet, path::PathBuf};

	use super::*;
	use crate::{error::CollectionError, types::{Deck, DeckConfig, ImportConfig, Metadata, Note, NoteModel, Opaque}};

	/// Only answers conflict queries.
	struct Claims(HashSet<&'static str>);

	impl Collection for Claims {
		fn deck_tree(&self, name: &str) -> Result<DeckTree, CollectionError> {
			Err(CollectionError::UnknownDeck(name.to_string()))
		}

		fn save_deck(&mut self, _: &Deck) -> Result<(), CollectionError> { unreachable!() }

		fn save_deck_config(&mut self, _: &DeckConfig) -> Result<(), CollectionError> { unreachable!() }

		fn save_note_model(&mut self, _: &NoteModel) -> Result<(), CollectionError> { unreachable!() }

		fn save_note(&mut self, _: &Note, _: &Deck, _: &ImportConfig) -> Result<(), CollectionError> {
			unreachable!()
		}

		fn media_directory(&self) -> PathBuf { PathBuf::new() }

		fn create_backup(&mut self) -> Result<(), CollectionError> { unreachable!() }

		fn uuid_conflicts(&self, _: EntityKind, uuid: &str) -> bool { self.0.contains(uuid) }
	}

	fn tree() -> DeckTree {
		let note = Note {
			guid:            "g".to_string(),
			note_model_uuid: "model".to_string(),
			fields:          vec!["front".to_string()],
			tags:            Vec::new(),
			extra:           Opaque::new(),
		};

		let mut child = Deck::new("Root::Child");
		child.crowdanki_uuid = "child".to_string();
		child.deck_config_uuid = Some("config".to_string());
		child.notes.push(note);

		let mut root = Deck::new("Root");
		root.crowdanki_uuid = "root".to_string();
		root.deck_config_uuid = Some("config".to_string());
		root.children.push(child);

		let mut config = DeckConfig::new("Default");
		config.crowdanki_uuid = "config".to_string();

		let model = NoteModel {
			name:           "Basic".to_string(),
			crowdanki_uuid: "model".to_string(),
			css:            String::new(),
			flds:           Vec::new(),
			tmpls:          Vec::new(),
			extra:          Opaque::new(),
		};

		let mut metadata = Metadata::default();
		metadata.insert_deck_config(config);
		metadata.insert_note_model(model);
		DeckTree::new(root, metadata)
	}

	#[test]
	fn leaves_unclaimed_identifiers_alone() {
		let mut tree = tree();
		let before = tree.clone();

		assert_eq!(CollisionReconciler.reconcile(&mut tree, &Claims(HashSet::new())), 0);
		assert_eq!(tree, before);
	}

	#[test]
	fn rewrites_every_reference_to_a_conflicting_config() {
		let mut tree = tree();
		assert_eq!(CollisionReconciler.reconcile(&mut tree, &Claims(HashSet::from(["config"]))), 1);

		let (key, config) = tree.metadata.deck_configs.iter().next().unwrap();
		assert_ne!(key, "config");
		assert_eq!(key, &config.crowdanki_uuid);
		assert_eq!(tree.root.deck_config_uuid.as_ref(), Some(key));
		assert_eq!(tree.root.children[0].deck_config_uuid.as_ref(), Some(key));
	}

	#[test]
	fn rewrites_note_references_to_a_conflicting_model() {
		let mut tree = tree();
		CollisionReconciler.reconcile(&mut tree, &Claims(HashSet::from(["model", "child"])));

		let key = tree.metadata.note_models.keys().next().unwrap().clone();
		assert_ne!(key, "model");
		assert_eq!(tree.root.children[0].notes[0].note_model_uuid, key);
		assert_ne!(tree.root.children[0].crowdanki_uuid, "child");
		assert_eq!(tree.root.crowdanki_uuid, "root");
	}
}
