//! fhx - Paged hex/text file editor
//!
//! This library provides shared functionality for fhx (TUI editor) and fbx (CLI tool).
//! Files are split into fixed-size frames; each frame is shown and edited as hex
//! or as decoded text, validated on every commit, and written back as one stream.

pub mod app;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod ui;
pub mod view;
