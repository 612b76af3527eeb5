use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::Serialize;
use serde_json::{Serializer, Value, ser::PrettyFormatter};
use tracing::{debug, info, instrument};

use crate::{collection::Collection, config::Config, deck_locator::{BACK_FILE_EXTENSION, BACK_FILE_NAME, FRONT_FILE_EXTENSION, FRONT_FILE_NAME, INDEX_FILE_EXTENSION, NOTE_MODEL_FILE_NAME, NOTE_MODELS_SUBDIRECTORY_NAME, STYLE_FILE_EXTENSION, STYLE_FILE_NAME, TMPL_FILE_NAME, TMPLS_SUBDIRECTORY_NAME, file_path}, error::DeckError, media::{self, MediaReport}, name_sanitizer::sanitize_anki_name, note_sorter::NoteSorter, saver::{self, SaveMode}, types::{DeckTree, crowd_anki_models::{AFMT_FIELD_NAME, CSS_FIELD_NAME, QFMT_FIELD_NAME, TMPLS_FIELD_NAME}}, uuid_generator};

/// Writes a collection deck out as a directory tree of sorted JSON and
/// plain text files.
pub struct AnkiExporter<'c> {
	collection:     &'c mut dyn Collection,
	note_sorter:    Box<dyn NoteSorter>,
	name_sanitizer: fn(&str) -> String,
	deck_file_name: String,

	/// Notes written by the last export.
	pub last_exported_count: usize,
	pub last_media_report:   Option<MediaReport>,
}

impl<'c> AnkiExporter<'c> {
	pub fn new(collection: &'c mut dyn Collection, config: &Config) -> Self {
		Self {
			collection,
			note_sorter: Box::new(config.note_sorter()),
			name_sanitizer: sanitize_anki_name,
			deck_file_name: config.deck_file_name.clone(),
			last_exported_count: 0,
			last_media_report: None,
		}
	}

	pub fn with_name_sanitizer(mut self, name_sanitizer: fn(&str) -> String) -> Self {
		self.name_sanitizer = name_sanitizer;
		self
	}

	pub fn with_note_sorter(mut self, note_sorter: impl NoteSorter + 'static) -> Self {
		self.note_sorter = Box::new(note_sorter);
		self
	}

	/// Exports the named deck and its sub-decks. The hierarchy is re-read from
	/// the collection rather than trusted from the caller. Returns the
	/// directory the deck was written to.
	///
	/// Existing directories are reused and files from an earlier export that
	/// no longer correspond to anything are left in place.
	#[instrument(skip(self))]
	pub fn export_to_directory(
		&mut self,
		deck_name: &str,
		output_dir: &Path,
		copy_media: bool,
		create_deck_subdirectory: bool,
	) -> Result<PathBuf, DeckError> {
		let deck_directory = if create_deck_subdirectory {
			make_directory(output_dir, &(self.name_sanitizer)(deck_name))?
		} else {
			fs::create_dir_all(output_dir)?;
			output_dir.to_path_buf()
		};

		let mut tree = self.collection.deck_tree(deck_name)?;
		validate(&tree)?;

		let assigned = uuid_generator::assign_missing_deck_uuids(&mut tree.root);
		if assigned > 0 {
			info!("Assigned identifiers to {} decks", assigned);
		}

		self.note_sorter.sort_deck(&mut tree);
		self.last_exported_count = tree.note_count();
		tree.root.media_files = tree.media_file_list();

		write_index_file(&deck_directory, &self.deck_file_name, &tree.to_index_value()?)?;
		self.write_note_models(&tree, &deck_directory)?;

		saver::save_changes(&mut *self.collection, &tree, SaveMode::Export)?;

		self.last_media_report = if copy_media {
			let media_directory = self.collection.media_directory();
			Some(media::export_media(&tree.root.media_files, &media_directory, &deck_directory)?)
		} else {
			None
		};

		info!("Exported {} notes to {:?}", self.last_exported_count, deck_directory);
		Ok(deck_directory)
	}

	fn write_note_models(&self, tree: &DeckTree, deck_directory: &Path) -> Result<(), DeckError> {
		let note_models_directory = make_directory(deck_directory, NOTE_MODELS_SUBDIRECTORY_NAME)?;

		for note_model in tree.metadata.note_models.values() {
			debug!("Writing note model '{}'", note_model.name);
			let note_model_directory =
				make_directory(&note_models_directory, &(self.name_sanitizer)(&note_model.name))?;

			let mut index = serde_json::to_value(note_model)?;
			strip_fields(&mut index, &[CSS_FIELD_NAME, TMPLS_FIELD_NAME]);
			write_index_file(&note_model_directory, NOTE_MODEL_FILE_NAME, &index)?;

			write_file(&note_model_directory, STYLE_FILE_NAME, STYLE_FILE_EXTENSION, &note_model.css)?;

			let tmpls_directory = make_directory(&note_model_directory, TMPLS_SUBDIRECTORY_NAME)?;
			for tmpl in &note_model.tmpls {
				let tmpl_directory = make_directory(&tmpls_directory, &(self.name_sanitizer)(&tmpl.name))?;

				write_file(&tmpl_directory, FRONT_FILE_NAME, FRONT_FILE_EXTENSION, &tmpl.qfmt)?;
				write_file(&tmpl_directory, BACK_FILE_NAME, BACK_FILE_EXTENSION, &tmpl.afmt)?;

				let mut index = serde_json::to_value(tmpl)?;
				strip_fields(&mut index, &[QFMT_FIELD_NAME, AFMT_FIELD_NAME]);
				write_index_file(&tmpl_directory, TMPL_FILE_NAME, &index)?;
			}
		}

		Ok(())
	}
}

fn validate(tree: &DeckTree) -> Result<(), DeckError> {
	match tree.metadata.note_models.values().find(|model| model.tmpls.is_empty()) {
		Some(model) => Err(DeckError::EmptyNoteModel(model.name.clone())),
		None => Ok(()),
	}
}

fn strip_fields(value: &mut Value, fields: &[&str]) {
	if let Value::Object(object) = value {
		for field in fields {
			object.remove(*field);
		}
	}
}

fn make_directory(base_directory: &Path, name: &str) -> Result<PathBuf, DeckError> {
	let directory = base_directory.join(name);
	fs::create_dir_all(&directory)?;
	Ok(directory)
}

/// Key-sorted, four-space indented JSON with non-ASCII left as is, so that
/// unchanged input always produces the same bytes.
pub fn to_index_json(value: &Value) -> Result<Vec<u8>, DeckError> {
	let mut value = value.clone();
	value.sort_all_objects();

	let mut buffer = Vec::new();
	let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
	value.serialize(&mut serializer)?;
	Ok(buffer)
}

fn write_index_file(directory: &Path, name: &str, value: &Value) -> Result<(), DeckError> {
	let content = to_index_json(value)?;
	fs::write(file_path(directory, name, INDEX_FILE_EXTENSION), content)?;
	Ok(())
}

fn write_file(directory: &Path, name: &str, extension: &str, content: &str) -> Result<(), DeckError> {
	fs::write(file_path(directory, name, extension), content)?;
	Ok(())
}
