// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Adds one newest-first batch of channel history to the collected messages, stopping at the ticket's opening
/// message. Returns whether there's more history to walk.
///
/// A batch shorter than `batch_size` means the start of the channel was reached.
pub fn absorb_batch<T>(
	collected: &mut Vec<T>,
	batch: Vec<T>,
	id_of: impl Fn(&T) -> u64,
	opening_message: Option<u64>,
	batch_size: usize,
) -> bool {
	let reached_start = batch.len() < batch_size;
	for message in batch {
		let id = id_of(&message);
		if let Some(opening_message) = opening_message {
			if id < opening_message {
				return false;
			}
		}
		collected.push(message);
		if Some(id) == opening_message {
			return false;
		}
	}
	!reached_start
}

#[cfg(test)]
mod tests {
	use super::*;

	fn walk(history_newest_first: &[u64], opening: Option<u64>, batch_size: usize) -> (Vec<u64>, usize) {
		let mut collected = Vec::new();
		let mut batches = 0;
		for batch in history_newest_first.chunks(batch_size) {
			batches += 1;
			if !absorb_batch(&mut collected, batch.to_vec(), |id| *id, opening, batch_size) {
				break;
			}
		}
		(collected, batches)
	}

	#[test]
	fn stops_at_opening_message_and_includes_it() {
		let history = [10, 9, 8, 7, 6, 5, 4, 3, 2, 1];
		let (collected, batches) = walk(&history, Some(5), 3);
		assert_eq!(collected, vec![10, 9, 8, 7, 6, 5]);
		assert_eq!(batches, 2);
	}

	#[test]
	fn stops_before_older_messages_when_opening_was_deleted() {
		let history = [10, 9, 8, 4, 3];
		let (collected, _) = walk(&history, Some(6), 2);
		assert_eq!(collected, vec![10, 9, 8]);
	}

	#[test]
	fn short_batch_ends_the_walk() {
		let history = [5, 4, 3, 2, 1];
		let (collected, batches) = walk(&history, None, 3);
		assert_eq!(collected, vec![5, 4, 3, 2, 1]);
		assert_eq!(batches, 2);
	}

	#[test]
	fn full_final_batch_asks_for_more() {
		let mut collected = Vec::new();
		assert!(absorb_batch(&mut collected, vec![4, 3], |id| *id, None, 2));
		assert!(!absorb_batch(&mut collected, Vec::new(), |id| *id, None, 2));
		assert_eq!(collected, vec![4, 3]);
	}
}
