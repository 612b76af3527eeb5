use tracing::{debug, instrument};
use uuid::Uuid;

/// A fresh stable identifier for a deck, deck config or note model.
pub fn generate_crowdanki_uuid() -> String { Uuid::new_v4().to_string() }

/// Assigns identifiers to every deck in the hierarchy that lacks one.
/// Returns how many were assigned.
#[instrument(skip(deck), fields(deck = %deck.name))]
pub fn assign_missing_deck_uuids(deck: &mut crate::types::Deck) -> usize {
	let mut assigned = 0;
	deck.walk_mut(&mut |deck| {
		if deck.crowdanki_uuid.is_empty() {
			deck.crowdanki_uuid = generate_crowdanki_uuid();
			debug!("Assigned {} to deck '{}'", deck.crowdanki_uuid, deck.name);
			assigned += 1;
		}
	});
	assigned
}
