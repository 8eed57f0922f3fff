//! Query IR: what to select, how to order it, and how to page it.

pub mod ast;
pub mod helpers;
pub mod pipeline;
pub mod typing;
