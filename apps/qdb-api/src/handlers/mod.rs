//! Handlers 模块

pub mod health;
pub mod readings;

pub use health::*;
pub use readings::*;
