//! Visual editor for branching-dialogue conversation graphs.
//!
//! A conversation is a JSON object mapping node ids to nodes. Each node shows
//! some text and either offers choices or asks for typed input, and links to
//! further nodes by id. This crate loads such documents, lays them out on a
//! zoomable canvas, and edits them while preserving unknown fields.
//!
//! Everything except [`egui_app`] is toolkit-independent: coordinate
//! transforms, hit testing, the edit protocol and the interaction state are
//! plain Rust and unit tested.

pub mod color;
pub mod config;
pub mod geometry;
pub mod history;
pub mod layout;
pub mod model;
pub mod operations;
pub mod scene;
pub mod state;
pub mod store;

// Optional desktop window lives behind the `egui` feature flag.
#[cfg(feature = "egui")]
pub mod egui_app;
