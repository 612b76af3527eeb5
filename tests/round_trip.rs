mod common;

use common::{Call, MemoryCollection, languages, snapshot};
use decktree::{AnkiExporter, AnkiJsonImporter, Config, DeckError};
use fs_err as fs;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn export(collection: &mut MemoryCollection, output: &std::path::Path) -> std::path::PathBuf {
	AnkiExporter::new(collection, &Config::default())
		.export_to_directory("Languages", output, false, true)
		.unwrap()
}

#[test]
fn export_then_load_reconstructs_the_tree() {
	let media = TempDir::new().unwrap();
	let output = TempDir::new().unwrap();
	let mut collection = MemoryCollection::new(languages(), media.path());

	let directory = export(&mut collection, output.path());
	assert_eq!(directory, output.path().join("Languages"));

	let mut reader = MemoryCollection::new(languages(), media.path());
	let loaded = AnkiJsonImporter::new(&mut reader, &Config::default()).read_deck_tree(&directory).unwrap();

	let mut expected = languages();
	expected.root.media_files = vec!["bonjour.mp3".to_string(), "que.png".to_string()];
	assert_eq!(loaded, expected);
}

#[test]
fn writes_the_canonical_layout() {
	let media = TempDir::new().unwrap();
	let output = TempDir::new().unwrap();
	let mut collection = MemoryCollection::new(languages(), media.path());

	let directory = export(&mut collection, output.path());
	let model = directory.join("note_models/Basic (and reversed)");

	assert!(directory.join("deck.json").is_file());
	assert!(model.join("note_model.json").is_file());
	assert!(model.join("style.css").is_file());
	assert!(model.join("tmpls/Card 1/front.html").is_file());
	assert!(directory.join("note_models/Cloze_Extra/tmpls/Cloze/back.html").is_file());
	assert!(!directory.join("media").exists());

	let tmpl = fs::read_to_string(model.join("tmpls/Card 2/tmpl.json")).unwrap();
	assert!(!tmpl.contains("\"qfmt\"") && !tmpl.contains("\"afmt\""));
	assert!(tmpl.contains("\"bqfmt\""));
	assert_eq!(fs::read_to_string(model.join("tmpls/Card 2/front.html")).unwrap(), "{{Back}}");

	let note_model = fs::read_to_string(model.join("note_model.json")).unwrap();
	assert!(!note_model.contains("\"css\"") && !note_model.contains("\"tmpls\""));

	let deck = fs::read_to_string(directory.join("deck.json")).unwrap();
	assert!(deck.contains("¿Qué tal?"));
	assert!(deck.starts_with("{\n    \"__type__\": \"Deck\",\n    \"children\": ["));
	assert!(!deck.contains("\"note_models\""));
}

#[test]
fn exporting_twice_is_byte_identical() {
	let media = TempDir::new().unwrap();
	let first = TempDir::new().unwrap();
	let second = TempDir::new().unwrap();
	let mut collection = MemoryCollection::new(languages(), media.path());

	export(&mut collection, first.path());
	export(&mut collection, second.path());

	assert_eq!(snapshot(first.path()), snapshot(second.path()));
}

#[test]
fn shared_note_model_is_saved_once() {
	let media = TempDir::new().unwrap();
	let output = TempDir::new().unwrap();
	let mut collection = MemoryCollection::new(languages(), media.path());

	export(&mut collection, output.path());

	assert_eq!(collection.count(&Call::NoteModel("model-basic".to_string())), 1);
	assert_eq!(collection.count(&Call::NoteModel("model-cloze".to_string())), 1);
	assert_eq!(collection.count(&Call::DeckConfig("config-default".to_string())), 1);
	assert_eq!(collection.count(&Call::Deck("Languages::Spanish".to_string())), 1);
	assert_eq!(collection.count(&Call::Backup), 0);
	assert!(collection.calls.iter().all(|call| !matches!(call, Call::Note(_))));
}

#[test]
fn export_records_note_count() {
	let media = TempDir::new().unwrap();
	let output = TempDir::new().unwrap();
	let mut collection = MemoryCollection::new(languages(), media.path());

	let mut exporter = AnkiExporter::new(&mut collection, &Config::default());
	exporter.export_to_directory("Languages", output.path(), false, false).unwrap();

	assert_eq!(exporter.last_exported_count, 3);
	assert!(output.path().join("deck.json").is_file());
}

#[test]
fn missing_identifiers_are_assigned_and_saved() {
	let media = TempDir::new().unwrap();
	let output = TempDir::new().unwrap();
	let mut tree = languages();
	tree.root.children[0].crowdanki_uuid.clear();
	let mut collection = MemoryCollection::new(tree, media.path());

	export(&mut collection, output.path());

	let saved = collection.saved_decks.iter().find(|deck| deck.name == "Languages::French").unwrap();
	assert!(!saved.crowdanki_uuid.is_empty());
}

#[test]
fn note_model_without_templates_fails_export() {
	let media = TempDir::new().unwrap();
	let output = TempDir::new().unwrap();
	let mut tree = languages();
	tree.metadata.note_models.get_mut("model-cloze").unwrap().tmpls.clear();
	let mut collection = MemoryCollection::new(tree, media.path());

	let result = AnkiExporter::new(&mut collection, &Config::default()).export_to_directory(
		"Languages",
		output.path(),
		false,
		true,
	);

	assert!(matches!(result, Err(DeckError::EmptyNoteModel(name)) if name == "Cloze/Extra"));
	assert!(collection.calls.is_empty());
}

#[test]
fn media_copy_is_best_effort() {
	let media = TempDir::new().unwrap();
	let output = TempDir::new().unwrap();
	fs::write(media.path().join("que.png"), b"png").unwrap();
	let mut collection = MemoryCollection::new(languages(), media.path());

	let mut exporter = AnkiExporter::new(&mut collection, &Config::default());
	let directory = exporter.export_to_directory("Languages", output.path(), true, true).unwrap();

	let report = exporter.last_media_report.clone().unwrap();
	assert_eq!(report.copied, vec!["que.png"]);
	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].0, "bonjour.mp3");
	assert!(directory.join("media/que.png").is_file());
}
