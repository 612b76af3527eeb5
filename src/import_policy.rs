use serde_json::Value;
use tracing::{info, instrument};

use crate::types::{ImportConfig, ImportConfigDocument};

/// What the merge-policy provider decided about an import.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportDecision {
	Proceed(ImportConfig),
	/// The caller declined; nothing is imported and nothing is an error.
	Cancelled,
}

/// Turns the parsed deck and its optional `import_config.yaml` into a final
/// import configuration, or declines the import.
pub trait ImportPolicyProvider {
	fn resolve(&self, deck_json: &Value, document: Option<ImportConfigDocument>) -> ImportDecision;
}

/// Non-interactive provider: accepts the document as written, with command
/// line overrides on top.
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicy {
	pub use_media: Option<bool>,
	pub cancel:    bool,
}

impl DefaultPolicy {
	pub fn cancelling() -> Self { Self { cancel: true, ..Self::default() } }
}

impl ImportPolicyProvider for DefaultPolicy {
	#[instrument(skip(self, deck_json, document))]
	fn resolve(&self, deck_json: &Value, document: Option<ImportConfigDocument>) -> ImportDecision {
		let deck_name = deck_json.get("name").and_then(Value::as_str).unwrap_or_default();
		if self.cancel {
			info!("Import of '{}' declined", deck_name);
			return ImportDecision::Cancelled;
		}

		let mut config = ImportConfig::from(document.unwrap_or_default());
		if let Some(use_media) = self.use_media {
			config.use_media = use_media;
		}

		info!("Importing '{}' with {:?}", deck_name, config);
		ImportDecision::Proceed(config)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn absent_document_means_default_policy() {
		let decision = DefaultPolicy::default().resolve(&json!({ "name": "Deck" }), None);
		assert_eq!(decision, ImportDecision::Proceed(ImportConfig::default()));
	}

	#[test]
	fn override_wins_over_document() {
		let document = ImportConfigDocument { use_media: Some(true), ..Default::default() };
		let policy = DefaultPolicy { use_media: Some(false), cancel: false };

		match policy.resolve(&json!({}), Some(document)) {
			ImportDecision::Proceed(config) => assert!(!config.use_media),
			ImportDecision::Cancelled => panic!("unexpected cancellation"),
		}
	}

	#[test]
	fn cancelling_policy_declines() {
		assert_eq!(DefaultPolicy::cancelling().resolve(&json!({}), None), ImportDecision::Cancelled);
	}
}
