use crate::state::AppState;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

/// Catch-all for faults while answering a request. A single bad request must
/// never take the process down; the fault is surfaced in the response body
/// instead.
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request handling failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": format!("Exception {}", self.0)})),
        )
            .into_response()
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
}

/// Splits the `repo:tag` path segment, keeping the separator on the tag side
/// so the resolver sees the raw request key.
fn split_tag(repo_tag: &str) -> (&str, &str) {
    match repo_tag.find(':') {
        Some(at) => repo_tag.split_at(at),
        None => (repo_tag, ""),
    }
}

/// GET/HEAD /container/{org}/{repo}[:tag]
pub async fn get_container(
    State(state): State<AppState>,
    Path((org, repo_tag)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (repo, tag) = split_tag(&repo_tag);
    let name = format!("{org}/{repo}");
    let Some(record) = state.dataset.resolve(&name, tag) else {
        return Ok(not_found());
    };
    let body = serde_json::to_string(record)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// GET/HEAD /collections/{id}
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    // A non-numeric id cannot be a known collection.
    let Ok(pk) = id.parse::<u64>() else {
        return Ok(not_found());
    };
    let Some(full_name) = state.dataset.resolve_collection(pk) else {
        return Ok(not_found());
    };
    Ok(Redirect::temporary(&format!("{}/{full_name}", state.goto_url)).into_response())
}

/// GET / and the legacy browse aliases.
pub async fn goto_browse(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.goto_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_the_separator_on_the_tag() {
        assert_eq!(split_tag("repo:v2"), ("repo", ":v2"));
        assert_eq!(split_tag("repo:"), ("repo", ":"));
        assert_eq!(split_tag("repo"), ("repo", ""));
        assert_eq!(split_tag("repo:v2:odd"), ("repo", ":v2:odd"));
    }
}
