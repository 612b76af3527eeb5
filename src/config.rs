use std::path::Path;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{deck_locator::DECK_FILE_NAME, error::DeckError, note_sorter::{ConfiguredNoteSorter, SortMethod}};

/// Settings shared by every export and import, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Name of the deck index file, without extension.
	pub deck_file_name: String,
	pub export:         ExportSettings,
	pub sort:           SortSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
	pub copy_media:               bool,
	pub create_deck_subdirectory: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSettings {
	pub note_sort_methods: Vec<SortMethod>,
	pub reverse_sort:      bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			deck_file_name: DECK_FILE_NAME.to_string(),
			export:         ExportSettings::default(),
			sort:           SortSettings::default(),
		}
	}
}

impl Default for ExportSettings {
	fn default() -> Self { Self { copy_media: true, create_deck_subdirectory: true } }
}

impl Config {
	/// Loads the config at `path`, or the defaults when there is none.
	#[instrument]
	pub fn load(path: Option<&Path>) -> Result<Self, DeckError> {
		let Some(path) = path.filter(|path| path.exists()) else {
			debug!("No config file, using defaults");
			return Ok(Self::default());
		};

		let content = fs::read_to_string(path)?;
		let config = toml::from_str(&content)
			.map_err(|source| DeckError::Config { path: path.to_path_buf(), source })?;

		info!("Loaded config from {:?}", path);
		Ok(config)
	}

	pub fn note_sorter(&self) -> ConfiguredNoteSorter {
		ConfiguredNoteSorter::new(self.sort.note_sort_methods.clone(), self.sort.reverse_sort)
	}
}
