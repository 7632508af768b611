//! Release mapping library - shared modules for the CLI.

pub mod collate;
pub mod document;
pub mod mapping;
pub mod payload;
pub mod progress;
pub mod safety;
pub mod store;
