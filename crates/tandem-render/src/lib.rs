//! Tandem Render Library
//!
//! Raster surfaces for the Tandem whiteboard. [`Pixmap`] implements
//! [`tandem_core::Surface`] in software so any client can draw and export
//! the board without a GPU.

mod pixmap;
mod renderer;

pub use pixmap::{Pixmap, TextLabel};
pub use renderer::{RendererError, parse_hex_color};
