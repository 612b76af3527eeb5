use std::path::{Path, PathBuf};

use fs_err as fs;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{collection::Collection, config::Config, deck_locator::{self, BACK_FILE_EXTENSION, BACK_FILE_NAME, FRONT_FILE_EXTENSION, FRONT_FILE_NAME, IMPORT_CONFIG_NAME, INDEX_FILE_EXTENSION, NOTE_MODEL_FILE_NAME, NOTE_MODELS_SUBDIRECTORY_NAME, STYLE_FILE_EXTENSION, STYLE_FILE_NAME, TMPL_FILE_NAME, TMPLS_SUBDIRECTORY_NAME, file_path}, error::DeckError, import_policy::{DefaultPolicy, ImportDecision, ImportPolicyProvider}, media::{self, MediaReport}, saver::{self, SaveMode}, types::{DeckTree, ImportConfigDocument, crowd_anki_models::{AFMT_FIELD_NAME, CSS_FIELD_NAME, NOTE_MODELS_FIELD_NAME, QFMT_FIELD_NAME, TMPLS_FIELD_NAME}}, uuid_resolver::{CollisionReconciler, UuidReconciler}};

/// Reads a deck directory tree back and merges it into a collection.
pub struct AnkiJsonImporter<'c> {
	collection:     &'c mut dyn Collection,
	deck_file_name: String,
	policy:         Box<dyn ImportPolicyProvider>,
	reconciler:     Box<dyn UuidReconciler>,

	pub last_media_report: Option<MediaReport>,
}

impl<'c> AnkiJsonImporter<'c> {
	pub fn new(collection: &'c mut dyn Collection, config: &Config) -> Self {
		Self {
			collection,
			deck_file_name: config.deck_file_name.clone(),
			policy: Box::new(DefaultPolicy::default()),
			reconciler: Box::new(CollisionReconciler),
			last_media_report: None,
		}
	}

	pub fn with_policy(mut self, policy: impl ImportPolicyProvider + 'static) -> Self {
		self.policy = Box::new(policy);
		self
	}

	pub fn with_reconciler(mut self, reconciler: impl UuidReconciler + 'static) -> Self {
		self.reconciler = Box::new(reconciler);
		self
	}

	/// Loads the deck serialized to `directory_path` into the collection.
	///
	/// Returns `Ok(false)` when the import policy declines, in which case the
	/// collection is not touched. Otherwise the collection is backed up before
	/// the first save; a save that fails part way leaves that backup as the
	/// way back.
	#[instrument(skip(self))]
	pub fn load_deck(&mut self, directory_path: &Path) -> Result<bool, DeckError> {
		let deck_json = self.read_deck_json(directory_path)?;
		let document = read_import_config(directory_path)?;

		let import_config = match self.policy.resolve(&deck_json, document) {
			ImportDecision::Proceed(import_config) => import_config,
			ImportDecision::Cancelled => {
				info!("Import from {:?} cancelled", directory_path);
				return Ok(false);
			}
		};

		let mut tree = self.tree_from_json(directory_path, deck_json)?;

		self.collection.create_backup()?;

		let reassigned = self.reconciler.reconcile(&mut tree, &*self.collection);
		if reassigned > 0 {
			info!("Reassigned {} conflicting identifiers", reassigned);
		}

		saver::save_changes(&mut *self.collection, &tree, SaveMode::Import(&import_config))?;

		self.last_media_report = if import_config.use_media {
			let media_directory = self.collection.media_directory();
			Some(media::import_media(directory_path, &media_directory)?)
		} else {
			None
		};

		info!("Import of {} deck was successful", tree.root.name);
		Ok(true)
	}

	/// Reads the tree without touching any collection.
	pub fn read_deck_tree(&self, directory_path: &Path) -> Result<DeckTree, DeckError> {
		self.tree_from_json(directory_path, self.read_deck_json(directory_path)?)
	}

	/// Shape errors in the index are reported against the index file.
	fn tree_from_json(&self, directory_path: &Path, deck_json: Value) -> Result<DeckTree, DeckError> {
		DeckTree::from_json(deck_json).map_err(|error| match error {
			DeckError::Malformed(source) => DeckError::Json {
				path: deck_locator::deck_index_path(directory_path, &self.deck_file_name),
				source,
			},
			other => other,
		})
	}

	/// Reassembles the deck index with its note models, templates and styles
	/// read back into it.
	#[instrument(skip(self))]
	pub fn read_deck_json(&self, directory_path: &Path) -> Result<Value, DeckError> {
		let deck_path = deck_locator::deck_index_path(directory_path, &self.deck_file_name);
		if !deck_path.is_file() {
			return Err(DeckError::MissingDeckIndex(deck_path));
		}
		let mut deck_json = read_json_file(&deck_path)?;

		let note_models_directory_path = directory_path.join(NOTE_MODELS_SUBDIRECTORY_NAME);
		if !note_models_directory_path.is_dir() {
			return Err(DeckError::MissingNoteModels(note_models_directory_path));
		}

		let mut note_models = Vec::new();
		for note_model_directory_path in subdirectories(&note_models_directory_path)? {
			note_models.push(read_note_model(&note_model_directory_path)?);
		}
		info!("Read {} note models from {:?}", note_models.len(), note_models_directory_path);

		attach(&mut deck_json, &deck_path, NOTE_MODELS_FIELD_NAME, Value::Array(note_models))?;
		Ok(deck_json)
	}
}

fn read_note_model(note_model_directory_path: &Path) -> Result<Value, DeckError> {
	debug!("Reading note model from {:?}", note_model_directory_path);

	let index_path = file_path(note_model_directory_path, NOTE_MODEL_FILE_NAME, INDEX_FILE_EXTENSION);
	let mut note_model_json = read_json_file(&index_path)?;

	let css = read_text_file(&file_path(note_model_directory_path, STYLE_FILE_NAME, STYLE_FILE_EXTENSION))?;
	attach(&mut note_model_json, &index_path, CSS_FIELD_NAME, Value::String(css))?;

	let tmpls_directory_path = note_model_directory_path.join(TMPLS_SUBDIRECTORY_NAME);
	if !tmpls_directory_path.is_dir() {
		return Err(DeckError::MissingTemplates(tmpls_directory_path));
	}

	let mut tmpls = Vec::new();
	for tmpl_directory_path in subdirectories(&tmpls_directory_path)? {
		let tmpl_index_path = file_path(&tmpl_directory_path, TMPL_FILE_NAME, INDEX_FILE_EXTENSION);
		let mut tmpl_json = read_json_file(&tmpl_index_path)?;

		let afmt = read_text_file(&file_path(&tmpl_directory_path, BACK_FILE_NAME, BACK_FILE_EXTENSION))?;
		let qfmt = read_text_file(&file_path(&tmpl_directory_path, FRONT_FILE_NAME, FRONT_FILE_EXTENSION))?;
		attach(&mut tmpl_json, &tmpl_index_path, AFMT_FIELD_NAME, Value::String(afmt))?;
		attach(&mut tmpl_json, &tmpl_index_path, QFMT_FIELD_NAME, Value::String(qfmt))?;

		tmpls.push(tmpl_json);
	}

	if tmpls.is_empty() {
		return Err(DeckError::NoTemplates(tmpls_directory_path));
	}
	order_templates(&mut tmpls);

	attach(&mut note_model_json, &index_path, TMPLS_FIELD_NAME, Value::Array(tmpls))?;
	Ok(note_model_json)
}

/// Directory listings come back in filesystem order. Templates are put back
/// in card order when every one of them records its `ord`, and otherwise
/// stay in name order.
fn order_templates(tmpls: &mut [Value]) {
	let ords: Option<Vec<i64>> = tmpls.iter().map(|tmpl| tmpl.get("ord").and_then(Value::as_i64)).collect();
	match ords {
		Some(_) => tmpls.sort_by_key(|tmpl| tmpl.get("ord").and_then(Value::as_i64)),
		None => warn!("Templates without 'ord', keeping directory name order"),
	}
}

/// Immediate subdirectories, sorted by name.
fn subdirectories(directory: &Path) -> Result<Vec<PathBuf>, DeckError> {
	let mut paths = Vec::new();
	for entry in fs::read_dir(directory)? {
		let path = entry?.path();
		if path.is_dir() {
			paths.push(path);
		}
	}
	paths.sort();
	Ok(paths)
}

fn attach(value: &mut Value, path: &Path, field: &str, content: Value) -> Result<(), DeckError> {
	let object = value.as_object_mut().ok_or_else(|| DeckError::NotAnObject(path.to_path_buf()))?;
	object.insert(field.to_string(), content);
	Ok(())
}

fn read_text_file(file_path: &Path) -> Result<String, DeckError> {
	if !file_path.is_file() {
		return Err(DeckError::MissingFile(file_path.to_path_buf()));
	}
	Ok(fs::read_to_string(file_path)?)
}

fn read_json_file(file_path: &Path) -> Result<Value, DeckError> {
	let content = read_text_file(file_path)?;
	serde_json::from_str(&content).map_err(|source| DeckError::Json { path: file_path.to_path_buf(), source })
}

/// The optional `import_config.yaml`; `None` when absent or empty.
fn read_import_config(directory_path: &Path) -> Result<Option<ImportConfigDocument>, DeckError> {
	let file_path = directory_path.join(IMPORT_CONFIG_NAME);
	if !file_path.is_file() {
		return Ok(None);
	}

	let content = fs::read_to_string(&file_path)?;
	if content.trim().is_empty() {
		return Ok(None);
	}

	serde_yaml::from_str(&content)
		.map(Some)
		.map_err(|source| DeckError::Yaml { path: file_path, source })
}
