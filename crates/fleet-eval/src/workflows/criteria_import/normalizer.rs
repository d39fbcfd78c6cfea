/// Strip export artifacts and collapse runs of whitespace, keeping the original casing.
pub(crate) fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{a0}'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used to detect duplicate names regardless of casing.
pub(crate) fn name_key(value: &str) -> String {
    normalize_name(value).to_lowercase()
}
