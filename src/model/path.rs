//! Root-relative node paths.
//!
//! A path is a sequence of sibling-unique names; the empty sequence is the
//! root. Functions here accept any `&[S]` with `S: AsRef<str>` so callers can
//! pass `&["Work", "Todo"]` and owned [`NodePath`]s alike.

/// Name of a single node, unique among its siblings.
pub type NodeName = String;

/// Owned root-relative path.
pub type NodePath = Vec<NodeName>;

/// The root path, typed so it can be passed where `&[S]` is expected.
pub const ROOT: &[&str] = &[];

/// Separator used when rendering or parsing paths.
pub const SEPARATOR: char = '/';

/// Copy a borrowed path into an owned one.
pub fn to_owned<S: AsRef<str>>(path: &[S]) -> NodePath {
    path.iter().map(|part| part.as_ref().to_string()).collect()
}

/// Render a path as `a/b/c`. The root renders as `/`.
pub fn display<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        return SEPARATOR.to_string();
    }
    path.iter()
        .map(|part| part.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse a `/`-separated path. Empty segments are dropped, so `""`, `"/"`
/// and `"//"` all denote the root.
pub fn parse(raw: &str) -> NodePath {
    raw.split(SEPARATOR)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the two paths are element-wise equal.
pub fn eq<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    a.len() == b.len() && is_prefix(a, b)
}

/// Whether `prefix` matches the leading elements of `path`.
pub fn is_prefix<A: AsRef<str>, B: AsRef<str>>(prefix: &[A], path: &[B]) -> bool {
    prefix.len() <= path.len()
        && prefix
            .iter()
            .zip(path.iter())
            .all(|(a, b)| a.as_ref() == b.as_ref())
}

/// Split a path into its parent path and last segment.
pub fn split_last<S: AsRef<str>>(path: &[S]) -> Option<(&[S], &str)> {
    path.split_last()
        .map(|(last, parent)| (parent, last.as_ref()))
}

/// Append `name` to `parent`.
pub fn join<S: AsRef<str>>(parent: &[S], name: &str) -> NodePath {
    let mut joined = to_owned(parent);
    joined.push(name.to_string());
    joined
}

/// Replace the leading `old_prefix` of `path` with `new_prefix`.
///
/// Returns `None` if `old_prefix` is not a prefix of `path`.
pub fn rebase<A, B, C>(path: &[A], old_prefix: &[B], new_prefix: &[C]) -> Option<NodePath>
where
    A: AsRef<str>,
    B: AsRef<str>,
    C: AsRef<str>,
{
    if !is_prefix(old_prefix, path) {
        return None;
    }
    let mut rebased = to_owned(new_prefix);
    rebased.extend(path[old_prefix.len()..].iter().map(|p| p.as_ref().to_string()));
    Some(rebased)
}
