//! Database access for the progression engine

pub mod settings;
