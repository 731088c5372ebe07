//! Table engine plus a terminal viewer built on top of it.
//!
//! [`engine`] holds the pure filter, sort, paginate and selection logic.
//! The remaining modules make up the `tabview` viewer: [`loader`] reads files
//! with polars, [`model`] reduces [`domain::Message`]s into table actions, and
//! [`ui`] draws the current page with ratatui.

pub mod controller;
pub mod domain;
pub mod engine;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod request;
pub mod settings;
pub mod ui;
