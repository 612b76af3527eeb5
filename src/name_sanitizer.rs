/// Characters no mainstream filesystem accepts in a path segment.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED: &[&str] = &[
	"CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9",
	"LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Maps a display name (deck, note model, template) to a name that is safe
/// as a single directory or file name. Deterministic; distinct inputs may
/// collide.
pub fn sanitize_anki_name(name: &str) -> String {
	let replaced: String =
		name.chars().map(|c| if FORBIDDEN.contains(&c) || c.is_control() { '_' } else { c }).collect();

	let trimmed = replaced.trim_end_matches(['.', ' ']);
	if trimmed.is_empty() {
		return "_".to_string();
	}

	let stem = trimmed.split('.').next().unwrap_or(trimmed);
	if RESERVED.iter().any(|reserved| reserved.eq_ignore_ascii_case(stem)) {
		return format!("_{trimmed}");
	}

	trimmed.to_string()
}
