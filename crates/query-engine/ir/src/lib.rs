//! The canonical query representation shared by every entry point and every backend.

pub mod ir;
