pub mod diagnostics;
pub mod error;
pub mod model;
pub mod options;
pub mod validate;
pub mod wasm;
