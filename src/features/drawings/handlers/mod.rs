mod drawing_handler;

pub use drawing_handler::*;
