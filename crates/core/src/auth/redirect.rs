//! Login redirect target computation
//!
//! Decides where the login page should send the user back to, without ever
//! producing a loop back into the login page itself.

use url::form_urlencoded;

/// Build `<login_path>?next=<encoded target>` for the current location.
///
/// `current` is the path plus query of the page the user is on. `next`
/// overrides the return target unless the user is already on the login
/// page, in which case that page's own `next` parameter is kept.
pub fn login_redirect_target(login_path: &str, current: &str, next: Option<&str>) -> String {
    let (current_path, current_query) = split_path_and_query(current);

    let mut target = next.filter(|n| !n.is_empty()).unwrap_or(current).to_string();
    if current_path == login_path {
        target = current_query
            .and_then(|query| query_param(query, "next"))
            .filter(|candidate| !points_at_login(candidate, login_path))
            .unwrap_or_else(|| "/".to_string());
    }
    if points_at_login(&target, login_path) {
        target = "/".to_string();
    }

    format!("{login_path}?next={}", urlencoding::encode(&target))
}

/// Whether `location` (path plus optional query) is the login page.
pub fn is_login_location(location: &str, login_path: &str) -> bool {
    split_path_and_query(location).0 == login_path
}

/// True when `target` is the login path followed by nothing, a query, or a
/// non-word character (`/login`, `/login?x=1`, `/login/sso`).
fn points_at_login(target: &str, login_path: &str) -> bool {
    match target.strip_prefix(login_path) {
        Some(rest) => rest
            .chars()
            .next()
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_')),
        None => false,
    }
}

fn split_path_and_query(location: &str) -> (&str, Option<&str>) {
    let without_fragment = location.split('#').next().unwrap_or(location);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
