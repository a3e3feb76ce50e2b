//! Core types and utilities for OMR sheet decoding.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete marker/contour detector or image decoder; those
//! live behind the scan-dump seam in `omr-decode`.

mod binary;
mod geometry;
mod grid;
mod logger;
mod marker;
mod region;

pub use binary::{BinaryImage, BinaryImageError, BinaryImageView};
pub use geometry::{BoundingBox, NormPoint};
pub use grid::{order_row_major, GridOrderParams, GridPos};
pub use logger::init_with_level;
pub use marker::{Barcode, Marker};
pub use region::Region;
