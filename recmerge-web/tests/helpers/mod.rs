//! Test helper utilities
//!
//! Shared fixtures for driving the recmerge-web router in-process

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use recmerge_common::Matcher;
use recmerge_web::config::WizardConfig;
use recmerge_web::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "recmerge-test-boundary";

pub const MASTER_CSV: &str =
    "CustomerID,Name,Phone\nM1,Ada Lovelace,555-1212\nM2,Alan Turing,555-0000\n";
pub const INCOMING_CSV: &str = "Name,Phone\nAda Lovelace,555-9999\n";
pub const PROFILE_CSV: &str = "Key,Master Key,Comparison\nName,Name,fuzzy\nPhone,Phone,exact\n";

/// Router plus the temporary store directory backing it
pub struct TestApp {
    pub router: Router,
    pub store_dir: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_matcher(matcher: Arc<dyn Matcher>) -> Self {
        Self::build(Some(matcher))
    }

    fn build(matcher: Option<Arc<dyn Matcher>>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("operations");
        std::fs::create_dir_all(&store_dir).unwrap();

        let config = WizardConfig::for_store(&store_dir, SECRET);
        let state = match matcher {
            Some(matcher) => AppState::with_matcher(config, matcher),
            None => AppState::new(config),
        };

        Self {
            router: build_router(state),
            store_dir,
            _dir: dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Number of operation files currently persisted
    pub fn stored_operations(&self) -> usize {
        std::fs::read_dir(&self.store_dir).unwrap().count()
    }
}

/// One multipart part: (field name, optional filename, content)
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn run_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/run")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Standard three-file upload with the given extra fields
pub fn standard_run(fields: &[(&str, &str)]) -> Request<Body> {
    let mut parts: Vec<Part<'_>> = vec![
        ("master", Some("master.csv"), MASTER_CSV.as_bytes()),
        ("incoming", Some("incoming.csv"), INCOMING_CSV.as_bytes()),
        ("profile", Some("profile.csv"), PROFILE_CSV.as_bytes()),
        ("primary_key", None, "CustomerID".as_bytes()),
    ];
    for (name, value) in fields {
        parts.push((*name, None, value.as_bytes()));
    }
    run_request(&parts)
}

pub fn download_request(cookie: Option<&str>, fields: &[(String, String)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/dl")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form_urlencode(fields))).unwrap()
}

pub fn form_urlencode(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

/// `name=value` of cookie `name` from the response's Set-Cookie headers
pub fn response_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", name)))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
