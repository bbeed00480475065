pub mod drawing_dto;

pub use drawing_dto::{
    CreateDrawingDto, DrawingForm, DrawingJsonDto, DrawingResponseDto,
    UploadDrawingDto, UploadedFile, DEFAULT_CONTENT_TYPE,
};
