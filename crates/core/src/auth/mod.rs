//! Authentication rules that do not depend on HTTP

pub mod ports;
pub mod redirect;

pub use ports::LoginNavigator;
pub use redirect::{is_login_location, login_redirect_target};
