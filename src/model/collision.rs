use std::collections::HashSet;

/// Resolve a name collision by appending ` 2`, ` 3`, etc.
///
/// Returns `desired` itself when it is free, otherwise the first
/// `"{desired} {n}"` (n ≥ 2) not present in `existing`. Comparison is exact
/// and case-sensitive.
pub fn collision_free_name<I, S>(desired: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let taken: HashSet<String> = existing
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();
    if !taken.contains(desired) {
        return desired.to_string();
    }

    let mut suffix = 2usize;
    loop {
        let candidate = format!("{desired} {suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
