//! Article composition client for a content admin API.

pub mod api;
pub mod cache;
pub mod compose;
pub mod config;
pub mod editor;
pub mod model;
pub mod navigation;
pub mod picker;
pub mod util;
