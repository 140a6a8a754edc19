// Session types and auth wire bodies

use serde::{Deserialize, Serialize};

/// The (token, identity) pair proving an authenticated identity.
///
/// Both fields are set together or cleared together; a partial pair in
/// storage is treated as "no credential".
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub identity: String,
}

/// Login/registration request body.
/// The service speaks `username`/`password` on the wire.
#[derive(Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Login response body. The token is optional at the wire level so a
/// success response without one can be rejected explicitly.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
}
