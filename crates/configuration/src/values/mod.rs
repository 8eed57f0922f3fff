mod dialect;

pub use dialect::{Dialect, DialectPreset};
