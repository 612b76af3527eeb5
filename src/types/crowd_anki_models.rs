use serde::{Deserialize, Serialize};

use crate::types::Opaque;

pub const CSS_FIELD_NAME: &str = "css";
pub const QFMT_FIELD_NAME: &str = "qfmt";
pub const AFMT_FIELD_NAME: &str = "afmt";
pub const TMPLS_FIELD_NAME: &str = "tmpls";
pub const NOTE_MODELS_FIELD_NAME: &str = "note_models";
pub const DECK_CONFIGURATIONS_FIELD_NAME: &str = "deck_configurations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
	pub name: String,

	#[serde(default)]
	pub crowdanki_uuid: String,

	// Filtered decks have no options preset
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub deck_config_uuid: Option<String>,

	#[serde(default)]
	pub children:    Vec<Deck>,
	#[serde(default)]
	pub notes:       Vec<Note>,
	#[serde(default)]
	pub media_files: Vec<String>,

	#[serde(flatten)]
	pub extra: Opaque,
}

impl Deck {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name:             name.into(),
			crowdanki_uuid:   String::new(),
			deck_config_uuid: None,
			children:         Vec::new(),
			notes:            Vec::new(),
			media_files:      Vec::new(),
			extra:            Opaque::new(),
		}
	}

	/// Notes in this deck and every deck below it.
	pub fn note_count(&self) -> usize {
		self.notes.len() + self.children.iter().map(Deck::note_count).sum::<usize>()
	}

	/// Visits this deck, then its children depth-first.
	pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Deck)) {
		visit(self);
		for child in &self.children {
			child.walk(visit);
		}
	}

	pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Deck)) {
		visit(self);
		for child in &mut self.children {
			child.walk_mut(visit);
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
	pub guid:            String,
	pub note_model_uuid: String,

	#[serde(default)]
	pub fields: Vec<String>,
	#[serde(default)]
	pub tags:   Vec<String>,

	#[serde(flatten)]
	pub extra: Opaque,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteModel {
	pub name: String,

	#[serde(default)]
	pub crowdanki_uuid: String,

	// Written out of line as style.css
	#[serde(default)]
	pub css: String,

	#[serde(default)]
	pub flds:  Vec<Field>,
	#[serde(default)]
	pub tmpls: Vec<Template>,

	#[serde(flatten)]
	pub extra: Opaque,
}

impl NoteModel {
	/// Media declared on the model's fields, independent of any note.
	pub fn field_media(&self) -> impl Iterator<Item = &str> {
		self.flds.iter().flat_map(|field| field.media.iter().flatten()).map(String::as_str)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
	pub name: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub media: Option<Vec<String>>,

	#[serde(flatten)]
	pub extra: Opaque,
}

/// A card template. The question and answer formats live in `front.html`
/// and `back.html` on disk and are re-attached on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
	pub name: String,
	pub qfmt: String,
	pub afmt: String,

	#[serde(flatten)]
	pub extra: Opaque,
}
