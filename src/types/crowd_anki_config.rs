use serde::{Deserialize, Serialize};

use crate::types::Opaque;

/// An options preset shared by any number of decks. Scheduling internals
/// (`new`, `rev`, `lapse`, ...) are carried in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
	pub name: String,

	#[serde(default)]
	pub crowdanki_uuid: String,

	#[serde(flatten)]
	pub extra: Opaque,
}

impl DeckConfig {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), crowdanki_uuid: String::new(), extra: Opaque::new() }
	}
}
