pub mod stack;

pub use stack::{load_image, read_stack, save_image, save_png_preview, write_stack};
