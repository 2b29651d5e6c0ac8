//! Trained models.
//!
//! - [`Model`]: solver, label order, feature count, bias and [`LinearWeights`]
//! - [`ModelView`]: destroyable façade used for inspection, prediction and I/O

mod view;
mod weights;

pub use view::{Model, ModelView, Prediction};
pub use weights::LinearWeights;

pub(crate) use view::bias_index;
