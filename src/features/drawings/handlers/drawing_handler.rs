use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::drawings::dtos::{
    DrawingForm, DrawingJsonDto, DrawingResponseDto, UploadDrawingDto,
};
use crate::features::drawings::services::DrawingService;
use crate::shared::types::{ApiResponse, Meta};

/// An id that does not parse can never match a drawing
fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::NotFound(format!("Drawing with id {} not found", raw)))
}

/// List all drawings, most recent first
#[utoipa::path(
    get,
    path = "/api/drawings/",
    responses(
        (status = 200, description = "Drawings retrieved successfully", body = ApiResponse<Vec<DrawingResponseDto>>)
    ),
    tag = "drawings"
)]
pub async fn list_drawings(
    State(service): State<Arc<DrawingService>>,
) -> Result<Json<ApiResponse<Vec<DrawingResponseDto>>>> {
    let drawings = service.list().await?;
    let total = drawings.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(drawings),
        None,
        Some(Meta { total }),
    )))
}

/// Upload a new drawing
///
/// Accepts multipart/form-data with:
/// - `title`: Drawing title, 1 to 100 characters (required)
/// - `file`: The drawing file (required)
#[utoipa::path(
    post,
    path = "/api/drawings/",
    request_body(
        content = UploadDrawingDto,
        content_type = "multipart/form-data",
        description = "Drawing title and file",
    ),
    responses(
        (status = 201, description = "Drawing created successfully", body = ApiResponse<DrawingResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 413, description = "File too large")
    ),
    tag = "drawings"
)]
pub async fn create_drawing(
    State(service): State<Arc<DrawingService>>,
    form: DrawingForm,
) -> Result<(StatusCode, Json<ApiResponse<DrawingResponseDto>>)> {
    let dto = form.into_create()?;

    let drawing = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(drawing), None, None)),
    ))
}

/// Get a drawing by ID
#[utoipa::path(
    get,
    path = "/api/drawings/{id}/",
    params(
        ("id" = Uuid, Path, description = "Drawing ID")
    ),
    responses(
        (status = 200, description = "Drawing retrieved successfully", body = ApiResponse<DrawingResponseDto>),
        (status = 404, description = "Drawing not found")
    ),
    tag = "drawings"
)]
pub async fn get_drawing(
    State(service): State<Arc<DrawingService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DrawingResponseDto>>> {
    let drawing = service.get_by_id(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(Some(drawing), None, None)))
}

/// Replace a drawing's title and file
#[utoipa::path(
    put,
    path = "/api/drawings/{id}/",
    params(
        ("id" = Uuid, Path, description = "Drawing ID")
    ),
    request_body(
        content = UploadDrawingDto,
        content_type = "multipart/form-data",
        description = "Both title and file are required",
    ),
    responses(
        (status = 200, description = "Drawing updated successfully", body = ApiResponse<DrawingResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Drawing not found")
    ),
    tag = "drawings"
)]
pub async fn update_drawing(
    State(service): State<Arc<DrawingService>>,
    Path(id): Path<String>,
    form: DrawingForm,
) -> Result<Json<ApiResponse<DrawingResponseDto>>> {
    let drawing = service.update(parse_id(&id)?, form, false).await?;
    Ok(Json(ApiResponse::success(Some(drawing), None, None)))
}

/// Update some fields of a drawing
///
/// Send multipart/form-data with any of `title` and `file`, or a JSON body
/// to change the title only.
#[utoipa::path(
    patch,
    path = "/api/drawings/{id}/",
    params(
        ("id" = Uuid, Path, description = "Drawing ID")
    ),
    request_body(
        content(
            (UploadDrawingDto = "multipart/form-data"),
            (DrawingJsonDto = "application/json")
        ),
        description = "Fields to change",
    ),
    responses(
        (status = 200, description = "Drawing updated successfully", body = ApiResponse<DrawingResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Drawing not found")
    ),
    tag = "drawings"
)]
pub async fn partial_update_drawing(
    State(service): State<Arc<DrawingService>>,
    Path(id): Path<String>,
    form: DrawingForm,
) -> Result<Json<ApiResponse<DrawingResponseDto>>> {
    let drawing = service.update(parse_id(&id)?, form, true).await?;
    Ok(Json(ApiResponse::success(Some(drawing), None, None)))
}

/// Delete a drawing and its file
#[utoipa::path(
    delete,
    path = "/api/drawings/{id}/",
    params(
        ("id" = Uuid, Path, description = "Drawing ID")
    ),
    responses(
        (status = 204, description = "Drawing deleted successfully"),
        (status = 404, description = "Drawing not found")
    ),
    tag = "drawings"
)]
pub async fn delete_drawing(
    State(service): State<Arc<DrawingService>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{json, Value};

    use crate::features::drawings::dtos::DrawingResponseDto;
    use crate::shared::test_helpers::{test_app, test_app_with_body_limit, TestApp, PNG_BYTES};
    use crate::shared::types::ApiResponse;

    fn upload_form(title: &str) -> MultipartForm {
        MultipartForm::new().add_text("title", title).add_part(
            "file",
            Part::bytes(PNG_BYTES.to_vec())
                .file_name("sketch.png")
                .mime_type("image/png"),
        )
    }

    async fn create(app: &TestApp, title: &str) -> DrawingResponseDto {
        let response = app
            .server
            .post("/api/drawings/")
            .multipart(upload_form(title))
            .await;
        response.assert_status(StatusCode::CREATED);
        response
            .json::<ApiResponse<DrawingResponseDto>>()
            .data
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_flat_record() {
        let app = test_app();

        let response = app
            .server
            .post("/api/drawings/")
            .multipart(upload_form("Harbour at dusk"))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "Harbour at dusk");
        assert!(body["data"]["id"].is_string());
        assert!(body["data"]["created"].is_string());

        let file = body["data"]["file"].as_str().unwrap();
        assert!(file.contains("/drawings/"));
        assert!(file.ends_with(".png"));
        assert_eq!(app.store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_then_retrieve() {
        let app = test_app();
        let created = create(&app, "Still life").await;

        let response = app
            .server
            .get(&format!("/api/drawings/{}/", created.id))
            .await;

        response.assert_status_ok();
        let fetched = response
            .json::<ApiResponse<DrawingResponseDto>>()
            .data
            .unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "Still life");
        assert_eq!(fetched.file, created.file);
        assert_eq!(fetched.created, created.created);
    }

    #[tokio::test]
    async fn test_routes_accept_missing_trailing_slash() {
        let app = test_app();
        let created = create(&app, "No slash").await;

        app.server.get("/api/drawings").await.assert_status_ok();
        app.server
            .get(&format!("/api/drawings/{}", created.id))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_list_newest_first_with_total() {
        let app = test_app();
        for title in ["one", "two", "three"] {
            create(&app, title).await;
        }

        let response = app.server.get("/api/drawings/").await;
        response.assert_status_ok();

        let body = response.json::<ApiResponse<Vec<DrawingResponseDto>>>();
        assert_eq!(body.meta.unwrap().total, 3);

        let drawings = body.data.unwrap();
        let titles: Vec<&str> = drawings.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two", "one"]);
        assert!(drawings.windows(2).all(|w| w[0].created >= w[1].created));
    }

    #[tokio::test]
    async fn test_create_with_long_title_persists_nothing() {
        let app = test_app();

        let response = app
            .server
            .post("/api/drawings/")
            .multipart(upload_form(&"x".repeat(101)))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(
            body["errors"],
            json!(["title: Ensure this field has no more than 100 characters."])
        );
        assert_eq!(app.repository.len(), 0);
        assert_eq!(app.store.len(), 0);
    }

    #[tokio::test]
    async fn test_create_without_file_lists_field() {
        let app = test_app();

        let response = app
            .server
            .post("/api/drawings/")
            .multipart(MultipartForm::new().add_text("title", "Only a title"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["errors"],
            json!(["file: This field is required."])
        );
    }

    #[tokio::test]
    async fn test_json_create_cannot_carry_file() {
        let app = test_app();

        let response = app
            .server
            .post("/api/drawings/")
            .json(&json!({ "title": "JSON only" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(app.repository.len(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_content_type_rejected() {
        let app = test_app();

        let response = app.server.post("/api/drawings/").text("title=plain").await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let app = test_app_with_body_limit(64);

        let response = app
            .server
            .post("/api/drawings/")
            .multipart(upload_form("Too big"))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(app.repository.len(), 0);
    }

    #[tokio::test]
    async fn test_patch_json_title_keeps_id_created_and_file() {
        let app = test_app();
        let created = create(&app, "Draft").await;

        let response = app
            .server
            .patch(&format!("/api/drawings/{}/", created.id))
            .json(&json!({ "title": "Final" }))
            .await;

        response.assert_status_ok();
        let updated = response
            .json::<ApiResponse<DrawingResponseDto>>()
            .data
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created, created.created);
        assert_eq!(updated.file, created.file);
        assert_eq!(updated.title, "Final");
    }

    #[tokio::test]
    async fn test_patch_json_null_title_rejected() {
        let app = test_app();
        let created = create(&app, "Draft").await;

        let response = app
            .server
            .patch(&format!("/api/drawings/{}/", created.id))
            .json(&json!({ "title": null }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["errors"],
            json!(["title: This field may not be null."])
        );

        let fetched = app
            .server
            .get(&format!("/api/drawings/{}/", created.id))
            .await
            .json::<ApiResponse<DrawingResponseDto>>()
            .data
            .unwrap();
        assert_eq!(fetched.title, "Draft");
    }

    #[tokio::test]
    async fn test_put_requires_every_field() {
        let app = test_app();
        let created = create(&app, "Draft").await;

        let response = app
            .server
            .put(&format!("/api/drawings/{}/", created.id))
            .json(&json!({ "title": "Final" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["errors"],
            json!(["file: This field is required."])
        );
    }

    #[tokio::test]
    async fn test_put_replaces_title_and_file() {
        let app = test_app();
        let created = create(&app, "Draft").await;

        let response = app
            .server
            .put(&format!("/api/drawings/{}/", created.id))
            .multipart(upload_form("Redrawn"))
            .await;

        response.assert_status_ok();
        let updated = response
            .json::<ApiResponse<DrawingResponseDto>>()
            .data
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created, created.created);
        assert_eq!(updated.title, "Redrawn");
        assert_ne!(updated.file, created.file);
        assert_eq!(app.store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_then_retrieve_is_not_found() {
        let app = test_app();
        let created = create(&app, "Doomed").await;
        let path = format!("/api/drawings/{}/", created.id);

        let response = app.server.delete(&path).await;
        response.assert_status(StatusCode::NO_CONTENT);
        assert!(response.as_bytes().is_empty());

        app.server.get(&path).await.assert_status_not_found();
        assert_eq!(app.store.len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_without_side_effects() {
        let app = test_app();
        create(&app, "Keeper").await;
        let path = "/api/drawings/0190f6c2-7a4e-7d2b-9b1e-3c2f5d6a7b8c/";

        app.server.get(path).await.assert_status_not_found();
        app.server
            .patch(path)
            .json(&json!({ "title": "Ghost" }))
            .await
            .assert_status_not_found();
        app.server
            .put(path)
            .multipart(upload_form("Ghost"))
            .await
            .assert_status_not_found();
        app.server.delete(path).await.assert_status_not_found();

        assert_eq!(app.repository.len(), 1);
        assert_eq!(app.store.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let app = test_app();

        let response = app.server.get("/api/drawings/not-a-uuid/").await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["success"], false);
    }
}
