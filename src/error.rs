use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
	#[error("There is no {} file inside of the selected directory", .0.display())]
	MissingDeckIndex(PathBuf),

	#[error("There is no {} directory inside of the selected directory", .0.display())]
	MissingNoteModels(PathBuf),

	#[error("There is no {} directory inside of the note model directory", .0.display())]
	MissingTemplates(PathBuf),

	#[error("There are no templates inside of {}", .0.display())]
	NoTemplates(PathBuf),

	#[error("Required file {} is missing", .0.display())]
	MissingFile(PathBuf),

	#[error("Failed to parse {}: {source}", .path.display())]
	Json {
		path:   PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Failed to parse {}: {source}", .path.display())]
	Yaml {
		path:   PathBuf,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("Failed to parse config {}: {source}", .path.display())]
	Config {
		path:   PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("{} does not contain a JSON object", .0.display())]
	NotAnObject(PathBuf),

	#[error("Malformed deck representation: {0}")]
	Malformed(#[from] serde_json::Error),

	#[error("Note model '{0}' has no templates")]
	EmptyNoteModel(String),

	#[error("Collection operation failed: {0}")]
	Persistence(#[from] CollectionError),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Failures reported by a backing collection.
#[derive(Debug, Error)]
pub enum CollectionError {
	#[error("{kind} '{name}' was rejected: {reason}")]
	Rejected { kind: &'static str, name: String, reason: String },

	#[error("Deck '{0}' does not exist")]
	UnknownDeck(String),

	#[error("Collection file is corrupt: {0}")]
	Corrupt(#[from] serde_json::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}
