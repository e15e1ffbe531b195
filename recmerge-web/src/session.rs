//! Session and flash cookies
//!
//! The session cookie carries only the operation token, signed as
//! `<token>.<sha256(token + secret) hex>`. Flash messages ride in their own
//! cookie (URL-safe base64) and are consumed by the next landing-page view.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::store::OperationToken;

pub const SESSION_COOKIE: &str = "recmerge_session";
pub const FLASH_COOKIE: &str = "recmerge_flash";

/// Why a session cookie was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Missing,
    Malformed,
    BadSignature,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Missing => write!(f, "No comparison in progress"),
            SessionError::Malformed => write!(f, "Session cookie is malformed"),
            SessionError::BadSignature => write!(f, "Session cookie signature is invalid"),
        }
    }
}

impl std::error::Error for SessionError {}

/// SHA-256 over token followed by the secret, hex encoded
pub fn sign(token: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `Set-Cookie` value binding the browser to `token`
pub fn session_cookie(token: OperationToken, secret: &str) -> String {
    let token = token.to_string();
    let signature = sign(&token, secret);
    format!(
        "{}={}.{}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token, signature
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Verify the session cookie and extract its token
pub fn session_token(headers: &HeaderMap, secret: &str) -> Result<OperationToken, SessionError> {
    let value = read_cookie(headers, SESSION_COOKIE).ok_or(SessionError::Missing)?;
    let (token, signature) = value.split_once('.').ok_or(SessionError::Malformed)?;
    if sign(token, secret) != signature {
        return Err(SessionError::BadSignature);
    }
    OperationToken::parse(token).ok_or(SessionError::Malformed)
}

pub fn flash_cookie(message: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE,
        URL_SAFE_NO_PAD.encode(message)
    )
}

pub fn clear_flash_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", FLASH_COOKIE)
}

/// Pending flash message, if any
pub fn flash_message(headers: &HeaderMap) -> Option<String> {
    let encoded = read_cookie(headers, FLASH_COOKIE)?;
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok().filter(|m| !m.is_empty())
}

/// Value of cookie `name` from the request's `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    /// Turn a Set-Cookie value into the Cookie header a browser would send
    fn as_request_cookie(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[test]
    fn test_session_cookie_roundtrip() {
        let token = OperationToken::new();
        let cookie = as_request_cookie(&session_cookie(token, "secret"));
        let headers = headers_with(&format!("theme=dark; {}", cookie));

        assert_eq!(session_token(&headers, "secret"), Ok(token));
    }

    #[test]
    fn test_session_cookie_rejects_other_secret_and_tampering() {
        let token = OperationToken::new();
        let cookie = as_request_cookie(&session_cookie(token, "secret"));

        assert_eq!(
            session_token(&headers_with(&cookie), "other"),
            Err(SessionError::BadSignature)
        );

        let forged = format!("{}={}.{}", SESSION_COOKIE, OperationToken::new(), sign("x", "secret"));
        assert_eq!(
            session_token(&headers_with(&forged), "secret"),
            Err(SessionError::BadSignature)
        );

        let unsigned = format!("{}={}", SESSION_COOKIE, token);
        assert_eq!(
            session_token(&headers_with(&unsigned), "secret"),
            Err(SessionError::Malformed)
        );
        assert_eq!(session_token(&HeaderMap::new(), "secret"), Err(SessionError::Missing));
    }

    #[test]
    fn test_flash_roundtrip() {
        let message = "Unable to read the master file: Row 3 has 4 fields; expected 3";
        let cookie = as_request_cookie(&flash_cookie(message));
        assert_eq!(flash_message(&headers_with(&cookie)).as_deref(), Some(message));
        assert_eq!(flash_message(&HeaderMap::new()), None);
    }

    #[test]
    fn test_sign_is_hex_sha256() {
        let signature = sign("token", "secret");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
