pub mod apply;
pub mod calibrate;
pub mod common;
pub mod config;
pub mod detect;
pub mod lines;
pub mod subtract;
