use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

pub const DECK_FILE_NAME: &str = "deck";
pub const NOTE_MODEL_FILE_NAME: &str = "note_model";
pub const STYLE_FILE_NAME: &str = "style";
pub const TMPL_FILE_NAME: &str = "tmpl";
pub const FRONT_FILE_NAME: &str = "front";
pub const BACK_FILE_NAME: &str = "back";

pub const INDEX_FILE_EXTENSION: &str = "json";
pub const STYLE_FILE_EXTENSION: &str = "css";
pub const FRONT_FILE_EXTENSION: &str = "html";
pub const BACK_FILE_EXTENSION: &str = "html";

pub const NOTE_MODELS_SUBDIRECTORY_NAME: &str = "note_models";
pub const TMPLS_SUBDIRECTORY_NAME: &str = "tmpls";
pub const MEDIA_SUBDIRECTORY_NAME: &str = "media";

pub const IMPORT_CONFIG_NAME: &str = "import_config.yaml";

/// `<directory>/<name>.<extension>`. Appends rather than replaces, so names
/// containing dots survive.
pub fn file_path(directory: &Path, name: &str, extension: &str) -> PathBuf {
	directory.join(format!("{name}.{extension}"))
}

/// Locates a deck's index file across both naming conventions: the
/// configured `[dir]/deck.json` wins when present, otherwise the legacy
/// `[dir]/[dir].json` is returned. Never checks that the fallback exists.
#[instrument]
pub fn deck_index_path(directory: &Path, deck_file_name: &str) -> PathBuf {
	let convention_path = file_path(directory, deck_file_name, INDEX_FILE_EXTENSION);
	if convention_path.exists() {
		return convention_path;
	}

	let folder_name = directory.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
	let inferred_path = file_path(directory, &folder_name, INDEX_FILE_EXTENSION);
	debug!("No {:?}, falling back to {:?}", convention_path, inferred_path);
	inferred_path
}
