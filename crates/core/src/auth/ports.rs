//! Port interfaces for authentication side effects

/// Where the user currently is, and how to send them to the login page.
///
/// The executor calls [`navigate`](LoginNavigator::navigate) when a request
/// can no longer be authenticated. Implementations must tolerate repeated
/// calls from parallel requests.
pub trait LoginNavigator: Send + Sync {
    /// Path plus query of the current location (e.g. `/data/new?tab=2`).
    fn current_location(&self) -> String;

    /// Move to `target`, a login URL produced by
    /// [`login_redirect_target`](super::login_redirect_target).
    fn navigate(&self, target: &str);
}
