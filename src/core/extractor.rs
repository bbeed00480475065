use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError},
        rejection::JsonRejection,
        FromRequest, Multipart, Request,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::drawings::dtos::{
    DrawingForm, DrawingJsonDto, UploadedFile, DEFAULT_CONTENT_TYPE,
};

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl From<AppJsonRejection> for AppError {
    fn from(rejection: AppJsonRejection) -> Self {
        if rejection.0.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge(rejection.0.body_text());
        }

        let message = match rejection.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message)
    }
}

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Reads a drawing write from either `multipart/form-data` (`title` text
/// field, `file` file field) or `application/json` (`title` only)
impl<S> FromRequest<S> for DrawingForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read multipart data: {}", e))
            })?;
            read_multipart(multipart).await
        } else if content_type.starts_with("application/json") {
            let AppJson(body) = AppJson::<DrawingJsonDto>::from_request(req, state).await?;
            body.into_form()
        } else {
            Err(AppError::BadRequest(format!(
                "Unsupported content type '{}'. Use multipart/form-data or application/json",
                content_type
            )))
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<DrawingForm, AppError> {
    let mut form = DrawingForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("multipart data", e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("title field", e))?;
                form.title = Some(text);
            }
            "file" => form.file = Some(read_file(field).await?),
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    Ok(form)
}

async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let file_name = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unnamed".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| multipart_error("file data", e))?;

    Ok(UploadedFile {
        file_name,
        content_type,
        data: data.to_vec(),
    })
}

/// Body-limit hits surface as 413, everything else as a bad request
fn multipart_error(what: &str, e: MultipartError) -> AppError {
    debug!("Failed to read {}: {}", what, e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large while reading {}", what))
    } else {
        AppError::BadRequest(format!("Failed to read {}: {}", what, e.body_text()))
    }
}
