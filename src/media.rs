//! Best-effort copying of media files between a collection's media folder
//! and an export's `media` folder. A file that cannot be copied is logged and
//! recorded, never fatal.

use std::{borrow::Cow, path::{Component, Path}, sync::LazyLock};

use fs_err as fs;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::deck_locator::MEDIA_SUBDIRECTORY_NAME;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)<img[^>]*?\ssrc\s*=\s*(?:"([^"]+)"|'([^']+)'|([^\s>"']+))"#).expect("valid regex")
});

static SOUND_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\[sound:([^\]]+)\]").expect("valid regex"));

/// Local media filenames referenced from a note field, with HTML entities
/// decoded. Remote and inline sources are skipped.
pub fn media_references(field: &str) -> impl Iterator<Item = Cow<'_, str>> {
	let images = IMG_SRC
		.captures_iter(field)
		.filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)));
	let sounds = SOUND_TAG.captures_iter(field).filter_map(|caps| caps.get(1));

	images.chain(sounds).map(|m| unescape_html(m.as_str())).filter(|name| is_local(name))
}

fn is_local(name: &str) -> bool {
	!["http://", "https://", "data:", "ftp://"].iter().any(|scheme| name.starts_with(scheme))
}

/// `&amp;` goes last so an escaped entity stays escaped once.
fn unescape_html(text: &str) -> Cow<'_, str> {
	if !text.contains('&') {
		return Cow::Borrowed(text);
	}

	let decoded = [("&quot;", "\""), ("&#39;", "'"), ("&#x27;", "'"), ("&lt;", "<"), ("&gt;", ">"), ("&amp;", "&")]
		.iter()
		.fold(text.to_string(), |acc, (entity, plain)| acc.replace(entity, plain));
	Cow::Owned(decoded)
}

/// A media filename must name a file directly inside the media folder.
fn is_plain_file_name(name: &str) -> bool {
	let mut components = Path::new(name).components();
	matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Outcome of a bulk media transfer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MediaReport {
	pub copied: Vec<String>,
	/// Filename and the error that stopped it.
	pub failed: Vec<(String, String)>,
}

impl MediaReport {
	fn record(&mut self, name: String, result: std::io::Result<u64>) {
		match result {
			Ok(_) => {
				debug!("Copied media file {}", name);
				self.copied.push(name);
			}
			Err(error) => {
				warn!("Failed to copy a file {}. Full error: {}", name, error);
				self.failed.push((name, error.to_string()));
			}
		}
	}
}

/// Copies `files` from the collection's media folder into
/// `<export_directory>/media`.
#[instrument(skip(files))]
pub fn export_media(
	files: &[String],
	collection_media: &Path,
	export_directory: &Path,
) -> std::io::Result<MediaReport> {
	let media_directory = export_directory.join(MEDIA_SUBDIRECTORY_NAME);
	fs::create_dir_all(&media_directory)?;

	let mut report = MediaReport::default();
	for name in files {
		if !is_plain_file_name(name) {
			warn!("Refusing to copy media file {}, it is not a plain file name", name);
			report.failed.push((name.clone(), "not a plain file name".to_string()));
			continue;
		}

		let result = fs::copy(collection_media.join(name), media_directory.join(name));
		report.record(name.clone(), result);
	}

	info!("Exported {} media files, {} failed", report.copied.len(), report.failed.len());
	Ok(report)
}

/// Copies every regular file in `<export_directory>/media` into the
/// collection's media folder. Subdirectories are skipped.
#[instrument]
pub fn import_media(export_directory: &Path, collection_media: &Path) -> std::io::Result<MediaReport> {
	let media_directory = export_directory.join(MEDIA_SUBDIRECTORY_NAME);
	let mut report = MediaReport::default();

	if !media_directory.is_dir() {
		warn!("Warning: no media directory exists at {:?}", media_directory);
		return Ok(report);
	}

	fs::create_dir_all(collection_media)?;

	let mut entries = fs::read_dir(&media_directory)?.collect::<Result<Vec<_>, _>>()?;
	entries.sort_by_key(|entry| entry.file_name());

	for entry in entries {
		let name = entry.file_name().to_string_lossy().into_owned();
		let path = entry.path();

		if !path.is_file() {
			debug!("Skipping {:?}, not a regular file", path);
			continue;
		}

		let result = fs::copy(&path, collection_media.join(&name));
		report.record(name, result);
	}

	info!("Imported {} media files, {} failed", report.copied.len(), report.failed.len());
	Ok(report)
}
