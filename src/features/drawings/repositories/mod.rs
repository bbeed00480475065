mod drawing_repository;

pub use drawing_repository::{DrawingRepository, PgDrawingRepository};
