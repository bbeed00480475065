use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

use crate::features::drawings::{handlers, services::DrawingService};

/// Create routes for the drawings feature
///
/// Every route answers with and without the trailing slash.
pub fn routes(service: Arc<DrawingService>, max_body_size: usize) -> Router {
    let collection = get(handlers::list_drawings).post(handlers::create_drawing);
    let item = get(handlers::get_drawing)
        .put(handlers::update_drawing)
        .patch(handlers::partial_update_drawing)
        .delete(handlers::delete_drawing);

    Router::new()
        .route("/api/drawings", collection.clone())
        .route("/api/drawings/", collection)
        .route("/api/drawings/{id}", item.clone())
        .route("/api/drawings/{id}/", item)
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(service)
}
