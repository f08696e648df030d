//! The HTTP server handler that serves peer GETs out of the process-wide
//! [`Group`] registry: an `axum`-routed boundary collaborator, built only
//! when the crate is compiled with the `peer-http` feature.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::CacheError;
use crate::group::Group;

/// Builds the `axum` router for the peer wire protocol, mounted under
/// `base_path` (which must end in `/`; `/_mycache/` is the conventional
/// default -- see [`crate::config::default_base_path`]).
pub fn router(base_path: &str) -> Router {
    let route = format!("{base_path}*rest");
    Router::new().route(&route, get(handle_peer_get))
}

async fn handle_peer_get(Path(rest): Path<String>) -> Response {
    tracing::debug!(path = %rest, "peer GET");

    // `Path` has already percent-decoded `rest` once; splitting it here
    // does not decode it again, so a key containing a literal `%` (sent
    // as `%25` on the wire) survives intact instead of being unescaped
    // twice.
    let mut segments = rest.splitn(2, '/');
    let group_name = segments.next().unwrap_or_default().to_string();
    let key = segments.next().unwrap_or_default().to_string();
    if group_name.is_empty() || key.is_empty() {
        return respond(&CacheError::BadRequest(rest));
    }

    let Some(group) = Group::get_group(&group_name) else {
        return respond(&CacheError::GroupNotFound(group_name));
    };

    match group.get(&key).await {
        Ok(view) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(err) => respond(&err),
    }
}

/// Maps a [`CacheError`] onto the HTTP status code a peer client should
/// see for it.
/// `Peer` is included for completeness but shouldn't surface here --
/// `Group::load` swallows peer failures and falls back to a local load.
fn respond(err: &CacheError) -> Response {
    let status = match err {
        CacheError::InvalidKey | CacheError::BadRequest(_) => StatusCode::BAD_REQUEST,
        CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
        CacheError::Origin(_) | CacheError::Peer(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GetterFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn unique_name(prefix: &str) -> String {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[tokio::test]
    async fn unknown_group_yields_404() {
        let app = router("/_mycache/");
        let request = axum::http::Request::builder()
            .uri("/_mycache/no-such-group/key")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn known_group_serves_the_value_as_octet_stream() {
        let name = unique_name("server-hit");
        let _group = Group::new(
            name.clone(),
            1024,
            GetterFn(|_: &str| -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
                Ok(b"630".to_vec())
            }),
        );

        let app = router("/_mycache/");
        let uri = format!("/_mycache/{name}/Tom");
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/octet-stream"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"630");
    }

    #[tokio::test]
    async fn a_key_containing_a_literal_percent_sign_is_decoded_exactly_once() {
        let name = unique_name("percent-key");
        let _group = Group::new(
            name.clone(),
            1024,
            GetterFn(|key: &str| -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
                assert_eq!(key, "50%");
                Ok(b"off".to_vec())
            }),
        );

        let app = router("/_mycache/");
        // "50%" percent-encoded once is "50%25"; axum's `Path` extractor
        // undoes that one encoding, so the handler must not decode again.
        let uri = format!("/_mycache/{name}/50%25");
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"off");
    }
}
