use crate::models::{FoodHistory, MAX_SUGGESTIONS, Nutrients};

/// Known food names containing `query`, ignoring case, in history order.
/// At most [`MAX_SUGGESTIONS`]; an empty query suggests nothing.
#[must_use]
pub fn suggest(query: &str, history: &FoodHistory) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    history
        .names()
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

/// Stored nutrients for an exact (case-sensitive) name, used to pre-fill a
/// new entry once a suggestion is picked.
#[must_use]
pub fn prefill(name: &str, history: &FoodHistory) -> Option<Nutrients> {
    history.get(name).cloned()
}
