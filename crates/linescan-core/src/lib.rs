pub mod calibrate;
pub mod consts;
pub mod detect;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod mask;
pub mod pipeline;
