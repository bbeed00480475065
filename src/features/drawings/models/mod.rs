mod drawing;

pub use drawing::{Drawing, DrawingPatch, NewDrawing};
