use std::{borrow::Cow, collections::{BTreeMap, BTreeSet}};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{error::DeckError, media, types::{Deck, DeckConfig, NoteModel, crowd_anki_models::{DECK_CONFIGURATIONS_FIELD_NAME, NOTE_MODELS_FIELD_NAME}}, uuid_generator};

/// Entities shared across every deck of one export or import, keyed by
/// `crowdanki_uuid`. Decks refer to them by key and never own them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
	pub note_models:  BTreeMap<String, NoteModel>,
	pub deck_configs: BTreeMap<String, DeckConfig>,
}

impl Metadata {
	/// Registers a note model, giving it an identifier first if it has none.
	pub fn insert_note_model(&mut self, mut model: NoteModel) -> String {
		if model.crowdanki_uuid.is_empty() {
			warn!("Note model '{}' has no identifier, assigning one", model.name);
			model.crowdanki_uuid = uuid_generator::generate_crowdanki_uuid();
		}
		let key = model.crowdanki_uuid.clone();
		self.note_models.insert(key.clone(), model);
		key
	}

	pub fn insert_deck_config(&mut self, mut config: DeckConfig) -> String {
		if config.crowdanki_uuid.is_empty() {
			warn!("Deck config '{}' has no identifier, assigning one", config.name);
			config.crowdanki_uuid = uuid_generator::generate_crowdanki_uuid();
		}
		let key = config.crowdanki_uuid.clone();
		self.deck_configs.insert(key.clone(), config);
		key
	}
}

/// A deck hierarchy together with the metadata its decks share.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckTree {
	pub root:     Deck,
	pub metadata: Metadata,
}

impl DeckTree {
	pub fn new(root: Deck, metadata: Metadata) -> Self { Self { root, metadata } }

	/// Builds a tree from the reassembled deck index: the root deck's fields
	/// plus `note_models` and `deck_configurations` lists.
	#[instrument(skip(value))]
	pub fn from_json(mut value: Value) -> Result<Self, DeckError> {
		let mut metadata = Metadata::default();

		if let Some(object) = value.as_object_mut() {
			if let Some(models) = object.remove(NOTE_MODELS_FIELD_NAME) {
				for model in serde_json::from_value::<Vec<NoteModel>>(models)? {
					metadata.insert_note_model(model);
				}
			}
			if let Some(configs) = object.remove(DECK_CONFIGURATIONS_FIELD_NAME) {
				for config in serde_json::from_value::<Vec<DeckConfig>>(configs)? {
					metadata.insert_deck_config(config);
				}
			}
		}

		let root: Deck = serde_json::from_value(value)?;
		debug!(
			"Built deck '{}' with {} note models and {} deck configs",
			root.name,
			metadata.note_models.len(),
			metadata.deck_configs.len()
		);

		Ok(Self { root, metadata })
	}

	/// The content of the deck index file. Note models are left out, they are
	/// written to their own directory tree.
	pub fn to_index_value(&self) -> Result<Value, DeckError> {
		let mut value = serde_json::to_value(&self.root)?;
		let configs = serde_json::to_value(self.metadata.deck_configs.values().collect::<Vec<_>>())?;

		if let Value::Object(object) = &mut value {
			object.insert(DECK_CONFIGURATIONS_FIELD_NAME.to_string(), configs);
		}
		Ok(value)
	}

	pub fn note_count(&self) -> usize { self.root.note_count() }

	/// Every media file the tree refers to: references inside note fields of
	/// any deck, plus media declared on the note models' fields. Sorted and
	/// deduplicated.
	pub fn media_file_list(&self) -> Vec<String> {
		let mut files = BTreeSet::new();

		self.root.walk(&mut |deck| {
			for note in &deck.notes {
				for field in &note.fields {
					files.extend(media::media_references(field).map(Cow::into_owned));
				}
			}
		});

		for model in self.metadata.note_models.values() {
			files.extend(model.field_media().map(str::to_string));
		}

		files.into_iter().collect()
	}
}
