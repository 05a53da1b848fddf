//! HTTP Basic authentication for the Flashman API.

use base64::{engine::general_purpose, Engine as _};

/// Build the `Authorization` header value for `username:password`.
///
/// No character-set validation is done; a `:` inside the username will be
/// read back by the server as the separator.
pub fn build_auth_header(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}
