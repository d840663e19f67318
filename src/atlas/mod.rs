//! Cross atlas building.
//!
//! This module places the six normalized faces on a 4x3 grid and
//! serializes the result as PNG.

mod cross;

pub use cross::{
    cell_of, compose, CrossAtlas, CrossCell, CrossCompositor, CROSS_COLUMNS, CROSS_ROWS,
    EMPTY_CELLS,
};
