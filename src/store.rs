//! A [`Collection`] kept in a single `collection.json`, with media in a
//! sibling `collection.media` folder. Decks are stored flat and nest by
//! their `::`-separated names, the way Anki names them.

use std::path::{Path, PathBuf};

use chrono::Local;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{collection::Collection, error::CollectionError, types::{Deck, DeckConfig, DeckTree, EntityKind, ImportConfig, Metadata, Note, NoteModel}};

pub const COLLECTION_FILE_NAME: &str = "collection.json";
pub const MEDIA_DIRECTORY_NAME: &str = "collection.media";
pub const BACKUP_DIRECTORY_NAME: &str = "backups";

const DECK_SEPARATOR: &str = "::";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionFile {
	pub decks:        Vec<Deck>,
	pub deck_configs: Vec<DeckConfig>,
	pub note_models:  Vec<NoteModel>,
	pub notes:        Vec<StoredNote>,
}

/// A note and the name of the deck holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNote {
	pub deck: String,

	#[serde(flatten)]
	pub note: Note,
}

pub struct JsonCollection {
	root: PathBuf,
	data: CollectionFile,
}

impl JsonCollection {
	/// Opens the collection in `root`, starting empty if there is none yet.
	#[instrument]
	pub fn open(root: &Path) -> Result<Self, CollectionError> {
		let path = root.join(COLLECTION_FILE_NAME);
		let data = if path.is_file() {
			serde_json::from_str(&fs::read_to_string(&path)?)?
		} else {
			info!("No collection at {:?}, starting empty", path);
			CollectionFile::default()
		};

		Ok(Self { root: root.to_path_buf(), data })
	}

	pub fn data(&self) -> &CollectionFile { &self.data }

	fn flush(&self) -> Result<(), CollectionError> {
		fs::create_dir_all(&self.root)?;
		fs::write(self.root.join(COLLECTION_FILE_NAME), serde_json::to_vec_pretty(&self.data)?)?;
		Ok(())
	}

	fn find_deck(&self, name: &str) -> Option<&Deck> { self.data.decks.iter().find(|deck| deck.name == name) }

	/// Builds `deck` with its sub-decks and notes attached, registering what
	/// they reference in `metadata`.
	fn assemble(&self, deck: &Deck, metadata: &mut Metadata) -> Deck {
		let mut assembled = deck.clone();

		if let Some(config_uuid) = &deck.deck_config_uuid {
			match self.data.deck_configs.iter().find(|config| &config.crowdanki_uuid == config_uuid) {
				Some(config) => {
					metadata.deck_configs.insert(config_uuid.clone(), config.clone());
				}
				None => warn!("Deck '{}' refers to unknown deck config {}", deck.name, config_uuid),
			}
		}

		assembled.notes = self
			.data
			.notes
			.iter()
			.filter(|stored| stored.deck == deck.name)
			.map(|stored| stored.note.clone())
			.collect();

		for note in &assembled.notes {
			if metadata.note_models.contains_key(&note.note_model_uuid) {
				continue;
			}
			match self.data.note_models.iter().find(|model| model.crowdanki_uuid == note.note_model_uuid) {
				Some(model) => {
					metadata.note_models.insert(model.crowdanki_uuid.clone(), model.clone());
				}
				None => warn!("Note {} refers to unknown note model {}", note.guid, note.note_model_uuid),
			}
		}

		let prefix = format!("{}{}", deck.name, DECK_SEPARATOR);
		let mut children: Vec<&Deck> = self
			.data
			.decks
			.iter()
			.filter(|child| child.name.strip_prefix(&prefix).is_some_and(|rest| !rest.contains(DECK_SEPARATOR)))
			.collect();
		children.sort_by(|a, b| a.name.cmp(&b.name));

		assembled.children = children.into_iter().map(|child| self.assemble(child, metadata)).collect();
		assembled
	}

	fn model_field_names(&self, note_model_uuid: &str) -> Option<(&str, Vec<&str>)> {
		self.data
			.note_models
			.iter()
			.find(|model| model.crowdanki_uuid == note_model_uuid)
			.map(|model| (model.name.as_str(), model.flds.iter().map(|field| field.name.as_str()).collect()))
	}
}

impl Collection for JsonCollection {
	fn deck_tree(&self, name: &str) -> Result<DeckTree, CollectionError> {
		let deck = self.find_deck(name).ok_or_else(|| CollectionError::UnknownDeck(name.to_string()))?;
		let mut metadata = Metadata::default();
		let root = self.assemble(deck, &mut metadata);
		Ok(DeckTree::new(root, metadata))
	}

	fn save_deck(&mut self, deck: &Deck) -> Result<(), CollectionError> {
		let mut record = deck.clone();
		record.children.clear();
		record.notes.clear();

		let existing = self
			.data
			.decks
			.iter()
			.position(|stored| !deck.crowdanki_uuid.is_empty() && stored.crowdanki_uuid == deck.crowdanki_uuid)
			.or_else(|| self.data.decks.iter().position(|stored| stored.name == deck.name));

		match existing {
			Some(index) => {
				let old_name = std::mem::replace(&mut self.data.decks[index], record).name;
				if old_name != deck.name {
					debug!("Deck '{}' renamed to '{}'", old_name, deck.name);
					for stored in self.data.notes.iter_mut().filter(|stored| stored.deck == old_name) {
						stored.deck = deck.name.clone();
					}
				}
			}
			None => self.data.decks.push(record),
		}

		self.flush()
	}

	fn save_deck_config(&mut self, config: &DeckConfig) -> Result<(), CollectionError> {
		match self.data.deck_configs.iter_mut().find(|stored| stored.crowdanki_uuid == config.crowdanki_uuid) {
			Some(stored) => *stored = config.clone(),
			None => self.data.deck_configs.push(config.clone()),
		}
		self.flush()
	}

	fn save_note_model(&mut self, model: &NoteModel) -> Result<(), CollectionError> {
		if model.tmpls.is_empty() {
			return Err(CollectionError::Rejected {
				kind:   "note model",
				name:   model.name.clone(),
				reason: "no templates".to_string(),
			});
		}

		match self.data.note_models.iter_mut().find(|stored| stored.crowdanki_uuid == model.crowdanki_uuid) {
			Some(stored) => *stored = model.clone(),
			None => self.data.note_models.push(model.clone()),
		}
		self.flush()
	}

	fn save_note(&mut self, note: &Note, deck: &Deck, policy: &ImportConfig) -> Result<(), CollectionError> {
		let existing = self.data.notes.iter().position(|stored| stored.note.guid == note.guid);

		let Some(index) = existing else {
			self.data.notes.push(StoredNote { deck: deck.name.clone(), note: note.clone() });
			return self.flush();
		};

		let mut incoming = note.clone();
		if let Some((model_name, field_names)) = self.model_field_names(&note.note_model_uuid) {
			let current = &self.data.notes[index].note;
			for (position, field_name) in field_names.iter().enumerate() {
				if !policy.is_personal_field(model_name, field_name) {
					continue;
				}
				if let (Some(kept), Some(slot)) = (current.fields.get(position), incoming.fields.get_mut(position)) {
					*slot = kept.clone();
				}
			}
		}

		let stored = &mut self.data.notes[index];
		if !policy.ignore_deck_movement {
			stored.deck = deck.name.clone();
		}
		stored.note = incoming;
		self.flush()
	}

	fn media_directory(&self) -> PathBuf { self.root.join(MEDIA_DIRECTORY_NAME) }

	fn create_backup(&mut self) -> Result<(), CollectionError> {
		let backups = self.root.join(BACKUP_DIRECTORY_NAME);
		fs::create_dir_all(&backups)?;

		let path = backups.join(format!("collection-{}.json", Local::now().format("%Y%m%d-%H%M%S%.3f")));
		fs::write(&path, serde_json::to_vec_pretty(&self.data)?)?;

		info!("Backed up collection to {:?}", path);
		Ok(())
	}

	/// A preset cloned inside Anki keeps its source's identifier, so an
	/// identifier held by two stored entities can no longer tell them apart.
	fn uuid_conflicts(&self, kind: EntityKind, uuid: &str) -> bool {
		let holders = match kind {
			EntityKind::Deck => self.data.decks.iter().filter(|deck| deck.crowdanki_uuid == uuid).count(),
			EntityKind::DeckConfig => {
				self.data.deck_configs.iter().filter(|config| config.crowdanki_uuid == uuid).count()
			}
			EntityKind::NoteModel => self.data.note_models.iter().filter(|model| model.crowdanki_uuid == uuid).count(),
		};
		holders > 1
	}
}
