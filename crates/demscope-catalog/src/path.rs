//! Resolution of `dem` paths against `base` instructions.

use demscope_common::DemDescriptor;

/// Whether `path` names a resource through a URL scheme (`https://...`).
pub fn is_url(path: &str) -> bool {
    match path.split_once("://") {
        Some((scheme, _)) => !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)),
        None => false,
    }
}

/// Join `path` to `base` with exactly one `/` between them.
///
/// With no (or an empty) base the path is returned unchanged, so absolute
/// paths pass through. A path that is itself a URL is never joined.
pub fn resolve(base: Option<&str>, path: &str) -> String {
    if is_url(path) {
        return path.to_string();
    }
    match base.filter(|b| !b.is_empty()) {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')),
        None => path.to_string(),
    }
}

/// The `(base, dem)` pair written for a descriptor's source.
///
/// [`resolve`] on the pair gives the source back.
pub fn split_source(descriptor: &DemDescriptor) -> (&str, &str) {
    let base = descriptor.base_path();
    let rest = descriptor.source[base.len()..].trim_start_matches('/');
    (base, rest)
}
