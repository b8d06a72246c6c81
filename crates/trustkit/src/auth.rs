//! HTTP Basic authentication header codec.
//!
//! Implements the credential format from RFC 2617 section 2: the client sends
//! the userid and password, separated by a single colon (`:`), within a base64
//! encoded string in the credentials.
//!
//! ```rust
//! use trustkit::auth;
//!
//! let header = auth::encode("alice", "pa:ss");
//! assert_eq!(header, "Basic YWxpY2U6cGE6c3M=");
//!
//! let creds = auth::decode(&header).unwrap();
//! assert_eq!(creds.username, b"alice");
//! assert_eq!(creds.password_str(), Some("pa:ss"));
//! ```
//!
//! Usernames and passwords are byte strings: clients that send ISO-8859-1
//! credentials decode fine, and callers choose how to interpret the bytes.
//! Usernames containing `:` do not round-trip: decoding splits on the first
//! colon, so everything after it lands in the password.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use http::header::{AUTHORIZATION, HeaderValue};

use crate::error::{Error, Result};

/// Authentication scheme token, matched case-sensitively.
pub const BASIC_SCHEME: &str = "Basic";

/// A username/password pair carried by a Basic `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: Vec<u8>,
    pub password: Vec<u8>,
}

impl Credentials {
    pub fn new(username: impl Into<Vec<u8>>, password: impl Into<Vec<u8>>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The username, if it is valid UTF-8.
    pub fn username_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.username).ok()
    }

    /// The password, if it is valid UTF-8.
    pub fn password_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.password).ok()
    }

    /// Encode as a `Basic ...` header value.
    pub fn to_header_value(&self) -> String {
        encode(&self.username, &self.password)
    }
}

// Never print the password, even in debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Encode a username/password pair into a Basic `Authorization` header value.
///
/// No validation is done on the content; callers must not embed control
/// characters that would break header framing.
pub fn encode(username: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> String {
    let (username, password) = (username.as_ref(), password.as_ref());
    let mut payload = Vec::with_capacity(username.len() + 1 + password.len());
    payload.extend_from_slice(username);
    payload.push(b':');
    payload.extend_from_slice(password);
    format!("{} {}", BASIC_SCHEME, STANDARD.encode(payload))
}

/// Decode a Basic `Authorization` header value back into credentials.
///
/// Fails with [`Error::AuthFormat`] when the value is empty, does not split
/// into exactly two whitespace-separated tokens, the scheme is not exactly
/// `Basic`, the token is not valid base64, or the decoded payload has no colon.
pub fn decode(header_value: &str) -> Result<Credentials> {
    let mut parts = header_value.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(Error::auth_format("invalid or missing HTTP auth header")),
    };
    if scheme != BASIC_SCHEME {
        return Err(Error::auth_format("invalid or missing HTTP auth header"));
    }

    let mut challenge = STANDARD
        .decode(token)
        .map_err(|_| Error::auth_format("invalid HTTP auth encoding"))?;

    let Some(colon) = challenge.iter().position(|&b| b == b':') else {
        return Err(Error::auth_format("invalid HTTP auth contents"));
    };
    let password = challenge.split_off(colon + 1);
    challenge.truncate(colon);
    Ok(Credentials::new(challenge, password))
}

/// Build a header map containing just the `Authorization` entry.
///
/// Useful when the header has to travel outside a request object, e.g. on a
/// websocket handshake.
pub fn basic_auth_header(username: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(1);
    // base64 output plus the scheme prefix is always a valid header value.
    if let Ok(mut value) = HeaderValue::from_str(&encode(username, password)) {
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    headers
}

/// Find the `Authorization` header in `headers` and decode it as Basic auth.
pub fn parse_basic_auth_header(headers: &HeaderMap) -> Result<Credentials> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::auth_format("invalid or missing HTTP auth header"))?;
    let value = value
        .to_str()
        .map_err(|_| Error::auth_format("invalid or missing HTTP auth header"))?;
    decode(value)
}
