//! Villa API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::model::VillaDto;
use crate::patch::PatchOperation;
use crate::state::AppState;

/// Create villa routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/villas", get(list_villas).post(create_villa))
        .route(
            "/villas/{id}",
            get(get_villa)
                .put(replace_villa)
                .patch(patch_villa)
                .delete(delete_villa),
        )
}

/// Parse the `{id}` path segment. Range checks happen in the service.
fn parse_path_id(raw: &str, request_id: &str) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|_| {
        ApiError::bad_request("invalid_villa_id", format!("Id '{raw}' is not valid"))
            .with_request_id(request_id.to_string())
    })
}

/// Unwrap a JSON body, turning extractor rejections into problem responses.
fn json_body<T>(
    body: Result<Json<Option<T>>, JsonRejection>,
    request_id: &str,
) -> Result<Option<T>, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(request_id = %request_id, error = %rejection, "Rejected request body");
            Err(ApiError::bad_request("invalid_body", rejection.body_text())
                .with_request_id(request_id.to_string()))
        }
    }
}

/// List all villas.
///
/// GET /villas
async fn list_villas(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let villas = state
        .service()
        .list()
        .await
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;

    Ok((StatusCode::OK, Json(villas)).into_response())
}

/// Get one villa.
///
/// GET /villas/{id}
async fn get_villa(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id;
    let id = parse_path_id(&id, &request_id)?;

    let villa = state
        .service()
        .get(id)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    Ok((StatusCode::OK, Json(villa)).into_response())
}

/// Create a villa.
///
/// POST /villas
async fn create_villa(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Result<Json<Option<VillaDto>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id;
    let payload = json_body(body, &request_id)?;

    let villa = state
        .service()
        .create(payload)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    let location = format!("/villas/{}", villa.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(villa),
    )
        .into_response())
}

/// Replace every field of a villa.
///
/// PUT /villas/{id}
async fn replace_villa(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    body: Result<Json<Option<VillaDto>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id;
    let id = parse_path_id(&id, &request_id)?;
    let payload = json_body(body, &request_id)?;

    state
        .service()
        .replace(id, payload)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Apply a patch document to a villa.
///
/// PATCH /villas/{id}
async fn patch_villa(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    body: Result<Json<Option<Vec<PatchOperation>>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id;
    let id = parse_path_id(&id, &request_id)?;
    let operations = json_body(body, &request_id)?;

    state
        .service()
        .patch(id, operations)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Delete a villa.
///
/// DELETE /villas/{id}
async fn delete_villa(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let request_id = ctx.request_id;
    let id = parse_path_id(&id, &request_id)?;

    state
        .service()
        .delete(id)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(request_id.clone()))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
