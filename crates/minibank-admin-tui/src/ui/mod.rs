//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, login view, shell frame and overlays
//! - `pages`: content area for each admin page
//! - `input`: keyboard event handling
//! - `styles`: colors and text styling

pub mod input;
pub mod pages;
pub mod render;
pub mod styles;
