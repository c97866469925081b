/// Canonical form of resource identifiers (book and project ids) used when
/// comparing what was requested with what a fetch returned.
pub fn normalize_string(s: &str) -> String { s.trim().to_lowercase() }
