//! Small shared helpers for the adapters.

/// Inserts or replaces `key` in an insertion-ordered pair list. A replaced
/// key keeps its original position, so output built from the list stays in
/// first-seen order.
pub(crate) fn upsert_ordered(entries: &mut Vec<(String, String)>, key: String, value: String) {
    if let Some(slot) = entries.iter_mut().find(|(existing, _)| *existing == key) {
        slot.1 = value;
    } else {
        entries.push((key, value));
    }
}
