pub mod accumulate;
pub mod masks;

pub use accumulate::{
    normalization_factors, subtract_background, subtract_background_cached, Subtraction,
    SubtractionConfig, SubtractionMode,
};
pub use masks::{mask_pair, off_mask, on_mask, MaskCache, MaskConfig, MaskPair};
