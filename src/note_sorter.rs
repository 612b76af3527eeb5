use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::types::{Deck, DeckTree, Metadata, Note};

/// Orders the notes of a tree in place before it is written out.
pub trait NoteSorter {
	fn sort_deck(&self, tree: &mut DeckTree);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMethod {
	None,
	Guid,
	Flag,
	Tag,
	NoteModelName,
	NoteModelId,
	Field1,
	Field2,
}

impl SortMethod {
	fn compare(self, metadata: &Metadata, a: &Note, b: &Note) -> Ordering {
		match self {
			SortMethod::None => Ordering::Equal,
			SortMethod::Guid => a.guid.cmp(&b.guid),
			SortMethod::Flag => flags(a).cmp(&flags(b)),
			SortMethod::Tag => a.tags.cmp(&b.tags),
			SortMethod::NoteModelName => model_name(metadata, a).cmp(model_name(metadata, b)),
			SortMethod::NoteModelId => a.note_model_uuid.cmp(&b.note_model_uuid),
			SortMethod::Field1 => a.fields.first().cmp(&b.fields.first()),
			SortMethod::Field2 => a.fields.get(1).cmp(&b.fields.get(1)),
		}
	}
}

fn flags(note: &Note) -> i64 { note.extra.get("flags").and_then(|flags| flags.as_i64()).unwrap_or(0) }

fn model_name<'a>(metadata: &'a Metadata, note: &Note) -> &'a str {
	metadata.note_models.get(&note.note_model_uuid).map(|model| model.name.as_str()).unwrap_or_default()
}

/// Sorts by the configured keys in order of precedence. Stable, so an empty
/// key list keeps collection order.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredNoteSorter {
	pub methods: Vec<SortMethod>,
	pub reverse: bool,
}

impl ConfiguredNoteSorter {
	pub fn new(methods: Vec<SortMethod>, reverse: bool) -> Self { Self { methods, reverse } }

	fn sort_notes(&self, metadata: &Metadata, deck: &mut Deck) {
		deck.notes.sort_by(|a, b| {
			self.methods
				.iter()
				.map(|method| method.compare(metadata, a, b))
				.find(|ordering| ordering.is_ne())
				.unwrap_or(Ordering::Equal)
		});
		if self.reverse {
			deck.notes.reverse();
		}

		for child in &mut deck.children {
			self.sort_notes(metadata, child);
		}
	}
}

impl NoteSorter for ConfiguredNoteSorter {
	#[instrument(skip(self, tree), fields(deck = %tree.root.name))]
	fn sort_deck(&self, tree: &mut DeckTree) {
		if self.methods.is_empty() && !self.reverse {
			return;
		}

		debug!("Sorting notes by {:?} (reverse: {})", self.methods, self.reverse);
		let DeckTree { root, metadata } = tree;
		self.sort_notes(metadata, root);
	}
}
