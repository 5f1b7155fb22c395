use serde_json::Value as Json;
use std::collections::BTreeSet;

/// Extract the distinct region codes listed in a summary document, sorted ascending.
///
/// Entries that are not objects, are empty, or whose `key` is missing, null,
/// not a string or blank are skipped.
#[must_use]
pub fn discover_regions(summary: &[Json], key: &str) -> Vec<String> {
    summary
        .iter()
        .filter_map(Json::as_object)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| entry.get(key).and_then(Json::as_str))
        .filter(|region| !region.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
