//! Path cleansing and name precedence

/// Separator used by the Vault HTTP API
pub const SEPARATOR: char = '/';

/// Canonicalize a raw concatenation of path segments.
///
/// Empty segments are dropped, so `"//sys///mounts/"` becomes `"sys/mounts"`.
/// Running the result through `cleanse` again returns it unchanged.
///
/// ```rust
/// use vault_paths::clean::cleanse;
///
/// assert_eq!(cleanse("/auth//kubernetes/config/"), "auth/kubernetes/config");
/// assert_eq!(cleanse(&cleanse("a//b")), cleanse("a//b"));
/// ```
#[must_use]
pub fn cleanse(raw: &str) -> String {
    raw.split(SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join segments and cleanse the result
#[must_use]
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    let raw = segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/");
    cleanse(&raw)
}

/// Final path segment for a resource.
///
/// An explicit override name wins when it is non-blank; otherwise the
/// Kubernetes object name is used.
#[must_use]
pub fn effective_name<'a>(override_name: Option<&'a str>, object_name: &'a str) -> &'a str {
    match override_name.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => object_name,
    }
}

/// Returns true if `path` is already in canonical form
#[must_use]
pub fn is_clean(path: &str) -> bool {
    !path.starts_with(SEPARATOR)
        && !path.ends_with(SEPARATOR)
        && !path.contains("//")
        && path.split(SEPARATOR).all(|segment| segment.trim() == segment)
}
