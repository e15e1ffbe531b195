//! Wizard workflow handlers
//!
//! POST /run (compare and render review), POST /dl (resolve and download)

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::FormRejection, Form, Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Response},
    routing::post,
    Router,
};
use recmerge_common::encoding::TextEncoding;
use recmerge_common::tabular::write_source;
use std::collections::HashMap;

use crate::api::ui::review::render_review;
use crate::error::{WizardError, WizardResult};
use crate::field_key::ResolutionForm;
use crate::intake::{prepare, UploadForm};
use crate::merge::resolve;
use crate::operation::Operation;
use crate::session;
use crate::AppState;

/// POST /run
///
/// Parse uploads, compare, persist the operation and render the review page.
pub async fn run_comparison(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> WizardResult<Response> {
    let multipart = multipart.map_err(|e| WizardError::input("upload", e.body_text()))?;
    let form = UploadForm::from_multipart(multipart).await?;

    let matcher = state.matcher.clone();
    let operation = tokio::task::spawn_blocking(move || {
        let run = prepare(&form)?;
        Operation::compare(run, matcher.as_ref())
    })
    .await
    .map_err(|e| WizardError::Matcher(format!("comparison task failed: {}", e)))??;

    let token = state.store.persist(&operation).await?;
    tracing::info!(
        operation = %token,
        groups = operation.results.len(),
        "Operation persisted, rendering review"
    );

    let html = render_review(&operation);
    Ok((
        [(
            header::SET_COOKIE,
            session::session_cookie(token, &state.config.secret_key),
        )],
        Html(html),
    )
        .into_response())
}

/// POST /dl
///
/// Consume the session's operation, apply the submitted choices and return
/// the merged file. The session cookie is cleared whatever the outcome, since
/// the operation is gone once read.
pub async fn download(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    match build_download(&state, &headers, form).await {
        Ok(response) => response,
        Err(err) => (
            AppendHeaders([(header::SET_COOKIE, session::clear_session_cookie())]),
            err,
        )
            .into_response(),
    }
}

async fn build_download(
    state: &AppState,
    headers: &HeaderMap,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> WizardResult<Response> {
    let token = session::session_token(headers, &state.config.secret_key)?;
    let Form(fields) =
        form.map_err(|e| WizardError::InvalidSubmission(e.body_text()))?;

    let operation: Operation = state.store.consume(token).await?;
    let extension = operation.options.output_format.extension();
    tracing::info!(operation = %token, fields = fields.len(), "Resolving operation");

    let form = ResolutionForm::new(fields);
    let bytes = tokio::task::spawn_blocking(move || -> WizardResult<Vec<u8>> {
        let output = resolve(&operation, &form)?;
        let options = &operation.options;
        let encoding = TextEncoding::from_key(&options.output_encoding)
            .map_err(|e| WizardError::Output(e.to_string()))?;
        write_source(&output, options.output_format, encoding, options.line_ending)
            .map_err(|e| WizardError::Output(e.to_string()))
    })
    .await
    .map_err(|e| WizardError::Output(format!("merge task failed: {}", e)))??;

    tracing::info!(operation = %token, bytes = bytes.len(), "Merged output ready");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=output.{}", extension),
            ),
            (header::SET_COOKIE, session::clear_session_cookie()),
        ],
        bytes,
    )
        .into_response())
}

/// Build workflow routes
pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/run", post(run_comparison))
        .route("/dl", post(download))
}
