#![allow(dead_code)]

use std::{collections::{BTreeMap, HashSet}, path::{Path, PathBuf}};

use decktree::{Collection, CollectionError, types::{Deck, DeckConfig, DeckTree, EntityKind, Field, ImportConfig, Metadata, Note, NoteModel, Opaque, Template}};
use fs_err as fs;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Backup,
	Deck(String),
	DeckConfig(String),
	NoteModel(String),
	Note(String),
}

/// Hands out a fixed tree and records every mutating call.
pub struct MemoryCollection {
	pub tree:          DeckTree,
	pub media:         PathBuf,
	pub calls:         Vec<Call>,
	pub saved_decks:   Vec<Deck>,
	pub saved_configs: Vec<DeckConfig>,
	pub conflicting:   HashSet<String>,
}

impl MemoryCollection {
	pub fn new(tree: DeckTree, media: &Path) -> Self {
		Self {
			tree,
			media: media.to_path_buf(),
			calls: Vec::new(),
			saved_decks: Vec::new(),
			saved_configs: Vec::new(),
			conflicting: HashSet::new(),
		}
	}

	pub fn count(&self, call: &Call) -> usize { self.calls.iter().filter(|made| *made == call).count() }
}

impl Collection for MemoryCollection {
	fn deck_tree(&self, name: &str) -> Result<DeckTree, CollectionError> {
		if self.tree.root.name == name {
			Ok(self.tree.clone())
		} else {
			Err(CollectionError::UnknownDeck(name.to_string()))
		}
	}

	fn save_deck(&mut self, deck: &Deck) -> Result<(), CollectionError> {
		self.calls.push(Call::Deck(deck.name.clone()));
		self.saved_decks.push(deck.clone());
		Ok(())
	}

	fn save_deck_config(&mut self, config: &DeckConfig) -> Result<(), CollectionError> {
		self.calls.push(Call::DeckConfig(config.crowdanki_uuid.clone()));
		self.saved_configs.push(config.clone());
		Ok(())
	}

	fn save_note_model(&mut self, model: &NoteModel) -> Result<(), CollectionError> {
		self.calls.push(Call::NoteModel(model.crowdanki_uuid.clone()));
		Ok(())
	}

	fn save_note(&mut self, note: &Note, _: &Deck, _: &ImportConfig) -> Result<(), CollectionError> {
		self.calls.push(Call::Note(note.guid.clone()));
		Ok(())
	}

	fn media_directory(&self) -> PathBuf { self.media.clone() }

	fn create_backup(&mut self) -> Result<(), CollectionError> {
		self.calls.push(Call::Backup);
		Ok(())
	}

	fn uuid_conflicts(&self, _: EntityKind, uuid: &str) -> bool { self.conflicting.contains(uuid) }
}

fn opaque(value: Value) -> Opaque {
	match value {
		Value::Object(map) => map,
		_ => Opaque::new(),
	}
}

fn note(guid: &str, model: &str, fields: &[&str]) -> Note {
	Note {
		guid:            guid.to_string(),
		note_model_uuid: model.to_string(),
		fields:          fields.iter().map(|field| field.to_string()).collect(),
		tags:            vec!["lang".to_string()],
		extra:           opaque(json!({ "__type__": "Note", "flags": 0, "newlyAdded": false })),
	}
}

fn deck(name: &str, uuid: &str, notes: Vec<Note>) -> Deck {
	let mut deck = Deck::new(name);
	deck.crowdanki_uuid = uuid.to_string();
	deck.deck_config_uuid = Some("config-default".to_string());
	deck.notes = notes;
	deck.extra = opaque(json!({ "__type__": "Deck", "desc": "", "dyn": 0, "extendNew": 10, "extendRev": 50 }));
	deck
}

fn template(name: &str, ord: i64, qfmt: &str, afmt: &str) -> Template {
	Template {
		name:  name.to_string(),
		qfmt:  qfmt.to_string(),
		afmt:  afmt.to_string(),
		extra: opaque(json!({ "ord": ord, "bqfmt": "", "bafmt": "", "did": null })),
	}
}

fn field(name: &str, ord: i64) -> Field {
	Field { name: name.to_string(), media: None, extra: opaque(json!({ "ord": ord, "sticky": false })) }
}

/// "Languages" with two sub-decks that share the "Basic" note model.
pub fn languages() -> DeckTree {
	let french = deck("Languages::French", "deck-french", vec![
		note("fr-1", "model-basic", &["bonjour", "hello [sound:bonjour.mp3]"]),
		note("fr-2", "model-cloze", &["{{c1::Paris}} est la capitale", ""]),
	]);
	let spanish = deck("Languages::Spanish", "deck-spanish", vec![note("es-1", "model-basic", &[
		"¿Qué tal? <img src=\"que.png\">",
		"how are you",
	])]);

	let mut root = deck("Languages", "deck-root", Vec::new());
	root.children = vec![french, spanish];

	let basic = NoteModel {
		name:           "Basic (and reversed)".to_string(),
		crowdanki_uuid: "model-basic".to_string(),
		css:            ".card {\n    font-family: \"Noto Sans\";\n}\n".to_string(),
		flds:           vec![field("Front", 0), field("Back", 1)],
		tmpls:          vec![
			template("Card 1", 0, "{{Front}}", "{{FrontSide}}\n<hr id=answer>\n{{Back}}"),
			template("Card 2", 1, "{{Back}}", "{{FrontSide}}\n<hr id=answer>\n{{Front}}"),
		],
		extra:          opaque(json!({ "__type__": "NoteModel", "type": 0, "sortf": 0, "latexPre": "\\begin{document}" })),
	};
	let cloze = NoteModel {
		name:           "Cloze/Extra".to_string(),
		crowdanki_uuid: "model-cloze".to_string(),
		css:            ".cloze { color: blue; } /* ünïcödé */".to_string(),
		flds:           vec![field("Text", 0), field("Extra", 1)],
		tmpls:          vec![template("Cloze", 0, "{{cloze:Text}}", "{{cloze:Text}}<br>{{Extra}}")],
		extra:          opaque(json!({ "__type__": "NoteModel", "type": 1 })),
	};

	let mut metadata = Metadata::default();
	metadata.insert_note_model(basic);
	metadata.insert_note_model(cloze);
	metadata.insert_deck_config(DeckConfig {
		name:           "Default".to_string(),
		crowdanki_uuid: "config-default".to_string(),
		extra:          opaque(json!({ "__type__": "DeckConfig", "maxTaken": 60, "new": { "perDay": 20 } })),
	});

	DeckTree::new(root, metadata)
}

/// Relative path to contents for every file below `root`.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
	let mut files = BTreeMap::new();
	let mut pending = vec![root.to_path_buf()];

	while let Some(directory) = pending.pop() {
		for entry in fs::read_dir(&directory).unwrap() {
			let path = entry.unwrap().path();
			if path.is_dir() {
				pending.push(path);
			} else {
				let relative = path.strip_prefix(root).unwrap().to_path_buf();
				files.insert(relative, fs::read(&path).unwrap());
			}
		}
	}

	files
}
