use utoipa::{Modify, OpenApi};

use crate::features::drawings::{dtos as drawings_dtos, handlers as drawings_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        drawings_handlers::list_drawings,
        drawings_handlers::create_drawing,
        drawings_handlers::get_drawing,
        drawings_handlers::update_drawing,
        drawings_handlers::partial_update_drawing,
        drawings_handlers::delete_drawing,
    ),
    components(
        schemas(
            Meta,
            drawings_dtos::DrawingResponseDto,
            drawings_dtos::UploadDrawingDto,
            drawings_dtos::DrawingJsonDto,
            ApiResponse<drawings_dtos::DrawingResponseDto>,
            ApiResponse<Vec<drawings_dtos::DrawingResponseDto>>,
        )
    ),
    tags(
        (name = "drawings", description = "Drawing upload, retrieval and management"),
    ),
    info(
        title = "Canvas Drawings API",
        version = "0.1.0",
        description = "Storage and retrieval of canvas drawings",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
