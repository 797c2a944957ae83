//! Embedded static asset serving and fingerprinting.
//!
//! Assets are compiled into the binary; pages reference them with a
//! content-hash query parameter, so far-future cache headers are safe.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::Mime;
use sha2::{Digest, Sha256};

static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

const FINGERPRINT_LEN: usize = 12;

/// Content fingerprints of the assets pages link to.
#[derive(Debug, Clone)]
pub struct AssetFingerprints {
    pub css: String,
    pub js: String,
}

/// Compute asset fingerprints once at startup.
pub fn fingerprints() -> AssetFingerprints {
    AssetFingerprints {
        css: digest_of("public/main.css"),
        js: digest_of("public/tooling.js"),
    }
}

fn digest_of(path: &str) -> String {
    match STATIC_ASSETS.get_file(path) {
        Some(file) => {
            let digest = Sha256::digest(file.contents());
            let mut fingerprint = hex::encode(digest);
            fingerprint.truncate(FINGERPRINT_LEN);
            fingerprint
        }
        None => "dev".to_string(),
    }
}

/// Serve embedded public static assets.
pub async fn serve_public(path: Option<Path<String>>) -> Response {
    let captured = path.map(|Path(value)| value);
    match resolve_asset(captured) {
        Some((bytes, mime)) => build_response(bytes, mime),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn resolve_asset(path: Option<String>) -> Option<(Bytes, Mime)> {
    let mut candidate = path.unwrap_or_default();
    if candidate.starts_with('/') {
        candidate = candidate.trim_start_matches('/').to_string();
    }

    // No traversal, no directory listings.
    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        return None;
    }

    let file = STATIC_ASSETS.get_file(format!("public/{candidate}"))?;
    let mime = mime_guess::from_path(&candidate).first_or_octet_stream();
    Some((Bytes::from_static(file.contents()), mime))
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprints_are_stable_and_short() {
        let first = fingerprints();
        let second = fingerprints();
        assert_eq!(first.css, second.css);
        assert_eq!(first.css.len(), FINGERPRINT_LEN);
        assert_ne!(first.css, "dev");
    }

    #[test]
    fn traversal_is_rejected() {
        assert!(resolve_asset(Some("../Cargo.toml".to_string())).is_none());
        assert!(resolve_asset(Some(String::new())).is_none());
        assert!(resolve_asset(Some("css/".to_string())).is_none());
    }

    #[test]
    fn known_assets_resolve_with_a_mime_type() {
        let (bytes, mime) = resolve_asset(Some("main.css".to_string())).expect("asset");
        assert!(!bytes.is_empty());
        assert_eq!(mime.type_(), mime_guess::mime::TEXT);
    }
}
