//! Calibration template model for OMR sheet layouts.
//!
//! A [`Template`] is built once from a blank reference sheet and thereafter
//! read-only: it records where every bubble of a given form layout sits, in
//! resolution-independent percent coordinates, together with the marker and
//! barcode anchors used to register freshly scanned sheets against it.

mod layout;
mod template;

pub use layout::{BubbleGroup, FormLayout, GroupLayout};
pub use template::{Template, TemplateError, TemplateIoError};
