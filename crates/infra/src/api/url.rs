//! Joining the configured base URL with endpoint paths

/// Resolve `path` against `base`.
///
/// Absolute URLs pass through. A base ending in `/api` and a path starting
/// with `/api/` share the prefix once. Otherwise the two are joined with a
/// single `/`.
pub fn resolve_api_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }

    let path = if base.ends_with("/api") && (path.starts_with("/api/") || path == "/api") {
        &path[4..]
    } else {
        path
    };

    match path.strip_prefix('/') {
        Some(rest) => format!("{base}/{rest}"),
        None if path.is_empty() => base.to_string(),
        None => format!("{base}/{path}"),
    }
}
