//! Module which contains utilities useful for testing and development.

pub mod mock;
