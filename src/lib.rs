#![forbid(unsafe_code)]

pub mod errors;
pub mod float_types;
pub mod mesh;
pub mod traits;

#[cfg(any(
    all(feature = "f64", feature = "f32"),
    not(any(feature = "f64", feature = "f32"))
))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");
