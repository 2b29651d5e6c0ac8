//! Model persistence.
//!
//! - [`text`]: the liblinear text model format, used by
//!   [`ModelView::save`](crate::model::ModelView::save)
//! - [`json`]: a versioned serde schema, used by
//!   [`ModelView::save_json`](crate::model::ModelView::save_json)
//!
//! I/O failures surface as [`LinearError::Io`](crate::LinearError::Io);
//! content that cannot be understood surfaces as a format error.

pub mod json;
pub mod text;
