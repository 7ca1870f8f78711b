#![warn(warnings)]
#![deny(clippy::all)]

pub mod config;
pub mod drag;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod model;
pub mod preview;
pub mod registry;
pub mod wire;

#[cfg(feature = "python")]
mod python;

pub use error::{FormError, RequestError};
pub use model::{Column, Document, Field, FieldConfig, FieldKind, Form, NodeId, Row, Section};
