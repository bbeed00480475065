use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::core::error::{AppError, Result};
use crate::features::drawings::models::Drawing;
use crate::modules::storage::FileStore;

/// Content type recorded for file parts that do not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const REQUIRED_MESSAGE: &str = "This field is required.";
const BLANK_MESSAGE: &str = "This field may not be blank.";
const NULL_MESSAGE: &str = "This field may not be null.";
const EMPTY_FILE_MESSAGE: &str = "The submitted file is empty.";

// Response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DrawingResponseDto {
    pub id: Uuid,
    #[schema(example = "Harbour at dusk")]
    pub title: String,
    /// URL the drawing file can be downloaded from
    #[schema(example = "http://localhost:9000/canvas-media/drawings/0190f6c2-7a4e-7d2b-9b1e-3c2f5d6a7b8c.png")]
    pub file: String,
    pub created: DateTime<Utc>,
}

impl DrawingResponseDto {
    /// Serialize a stored drawing, resolving its file key into a URL
    pub fn from_model(drawing: Drawing, store: &dyn FileStore) -> Self {
        Self {
            id: drawing.id,
            file: store.url_for(&drawing.file),
            title: drawing.title,
            created: drawing.created,
        }
    }
}

/// Multipart form for drawing writes, for OpenAPI documentation only.
/// The handlers read the body through the `DrawingForm` extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDrawingDto {
    /// Drawing title, at most 100 characters
    #[schema(example = "Harbour at dusk")]
    pub title: String,
    /// The drawing file
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// JSON body accepted for drawing writes that carry no file
///
/// `title` is `None` when the key is absent and `Some(None)` for an
/// explicit `null`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DrawingJsonDto {
    #[serde(default, deserialize_with = "present_value")]
    #[schema(value_type = Option<String>, example = "Harbour at dusk")]
    pub title: Option<Option<String>>,
}

fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl DrawingJsonDto {
    /// Title-only form; an explicit `null` title is a validation error
    pub fn into_form(self) -> Result<DrawingForm> {
        match self.title {
            Some(None) => {
                let mut errors = ValidationErrors::new();
                errors.add("title", field_error("null", NULL_MESSAGE));
                Err(errors.into())
            }
            title => Ok(DrawingForm {
                title: title.flatten(),
                file: None,
            }),
        }
    }
}

/// A file part received with a drawing write
#[derive(Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Raw inbound drawing payload, before validation
#[derive(Debug, Default, Validate)]
pub struct DrawingForm {
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub title: Option<String>,

    pub file: Option<UploadedFile>,
}

/// Validated payload for creating a drawing
#[derive(Debug)]
pub struct CreateDrawingDto {
    pub title: String,
    pub file: UploadedFile,
}

/// Validated payload for updating a drawing, absent fields stay unchanged
#[derive(Debug, Default)]
pub struct UpdateDrawingDto {
    pub title: Option<String>,
    pub file: Option<UploadedFile>,
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

impl DrawingForm {
    /// Validate for create: both fields required
    pub fn into_create(self) -> Result<CreateDrawingDto> {
        let form = self.normalized();
        form.check(true)?;

        match (form.title, form.file) {
            (Some(title), Some(file)) => Ok(CreateDrawingDto { title, file }),
            _ => Err(AppError::Internal(
                "validated drawing form is missing fields".to_string(),
            )),
        }
    }

    /// Validate for update; a full update (`partial == false`) requires
    /// every field just like create
    pub fn into_update(self, partial: bool) -> Result<UpdateDrawingDto> {
        let form = self.normalized();
        form.check(!partial)?;

        Ok(UpdateDrawingDto {
            title: form.title,
            file: form.file,
        })
    }

    /// Surrounding whitespace never counts towards the title
    fn normalized(mut self) -> Self {
        if let Some(title) = self.title.as_mut() {
            let trimmed = title.trim();
            if trimmed.len() != title.len() {
                *title = trimmed.to_string();
            }
        }
        self
    }

    fn check(&self, require_all: bool) -> std::result::Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        match &self.title {
            None if require_all => errors.add("title", field_error("required", REQUIRED_MESSAGE)),
            Some(title) if title.is_empty() => {
                errors.add("title", field_error("blank", BLANK_MESSAGE))
            }
            _ => {}
        }

        match &self.file {
            None if require_all => errors.add("file", field_error("required", REQUIRED_MESSAGE)),
            Some(file) if file.data.is_empty() => {
                errors.add("file", field_error("empty", EMPTY_FILE_MESSAGE))
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
