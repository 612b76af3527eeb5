use std::path::PathBuf;

use clap::{Parser, Subcommand};
use decktree::{AnkiExporter, AnkiJsonImporter, Config, import_policy::DefaultPolicy, store::JsonCollection};
use eyre::{Result, WrapErr};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

#[derive(Debug, Parser)]
#[command(name = "decktree", version, about = "Export decks to diffable directory trees and import them back")]
struct Cli {
	/// TOML settings file
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Write a deck and its sub-decks out as a directory tree
	Export {
		/// Directory holding collection.json
		#[arg(long)]
		collection: PathBuf,

		/// Full deck name, e.g. "Languages::Spanish"
		#[arg(long)]
		deck: String,

		#[arg(long, default_value = ".")]
		output: PathBuf,

		/// Skip copying media files
		#[arg(long)]
		no_media: bool,

		/// Write straight into --output instead of a deck-named subdirectory
		#[arg(long)]
		flat: bool,
	},

	/// Merge a previously exported directory tree into the collection
	Import {
		#[arg(long)]
		collection: PathBuf,

		path: PathBuf,

		/// Ignore media regardless of import_config.yaml
		#[arg(long)]
		no_media: bool,
	},
}

fn main() -> Result<()> {
	color_eyre::install()?;

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_timer(ChronoLocal::rfc_3339())
		.init();

	let cli = Cli::parse();
	let config = Config::load(cli.config.as_deref()).wrap_err("Failed to load settings")?;

	match cli.command {
		Command::Export { collection, deck, output, no_media, flat } => {
			let mut collection = JsonCollection::open(&collection)
				.wrap_err_with(|| format!("Failed to open collection at {:?}", collection))?;

			let copy_media = config.export.copy_media && !no_media;
			let create_deck_subdirectory = config.export.create_deck_subdirectory && !flat;

			let mut exporter = AnkiExporter::new(&mut collection, &config);
			let directory = exporter
				.export_to_directory(&deck, &output, copy_media, create_deck_subdirectory)
				.wrap_err_with(|| format!("While trying to export deck {deck}"))?;

			info!("Exported {} notes to {:?}", exporter.last_exported_count, directory);
			if let Some(report) = &exporter.last_media_report {
				for (name, error) in &report.failed {
					warn!("Media file {} was not copied: {}", name, error);
				}
			}
		}

		Command::Import { collection, path, no_media } => {
			let mut collection = JsonCollection::open(&collection)
				.wrap_err_with(|| format!("Failed to open collection at {:?}", collection))?;

			let policy = DefaultPolicy { use_media: no_media.then_some(false), cancel: false };
			let mut importer = AnkiJsonImporter::new(&mut collection, &config).with_policy(policy);

			let imported = importer
				.load_deck(&path)
				.wrap_err_with(|| format!("While trying to import deck from directory {:?}", path))?;

			if imported {
				info!("Import of {:?} was successful", path);
			} else {
				info!("Import of {:?} was cancelled", path);
			}
		}
	}

	Ok(())
}
