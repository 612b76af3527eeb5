use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The optional `import_config.yaml` shipped alongside an exported deck.
/// Every key may be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfigDocument {
	pub use_media:            Option<bool>,
	pub use_notes:            Option<bool>,
	pub ignore_deck_movement: Option<bool>,
	pub add_tag_to_cards:     Vec<String>,

	/// Note model name to the fields whose local content survives an import.
	pub personal_fields: BTreeMap<String, Vec<String>>,
}

/// The finalized merge policy for one import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
	pub use_media:            bool,
	pub use_notes:            bool,
	pub ignore_deck_movement: bool,
	pub add_tag_to_cards:     Vec<String>,
	pub personal_fields:      BTreeMap<String, Vec<String>>,
}

impl Default for ImportConfig {
	fn default() -> Self {
		Self {
			use_media:            true,
			use_notes:            true,
			ignore_deck_movement: false,
			add_tag_to_cards:     Vec::new(),
			personal_fields:      BTreeMap::new(),
		}
	}
}

impl From<ImportConfigDocument> for ImportConfig {
	fn from(document: ImportConfigDocument) -> Self {
		let defaults = Self::default();
		Self {
			use_media:            document.use_media.unwrap_or(defaults.use_media),
			use_notes:            document.use_notes.unwrap_or(defaults.use_notes),
			ignore_deck_movement: document.ignore_deck_movement.unwrap_or(defaults.ignore_deck_movement),
			add_tag_to_cards:     document.add_tag_to_cards,
			personal_fields:      document.personal_fields,
		}
	}
}

impl ImportConfig {
	pub fn is_personal_field(&self, note_model_name: &str, field_name: &str) -> bool {
		self.personal_fields
			.get(note_model_name)
			.is_some_and(|fields| fields.iter().any(|field| field == field_name))
	}
}
