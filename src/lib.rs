//! sparselin: sparse problem and model marshalling for linear classifiers.
//!
//! This crate turns host-side associative data (label plus sparse
//! `index → value` features per sample) into the flat, sentinel-terminated
//! node arena that liblinear-style solvers consume, trains models on it, and
//! exposes the trained weights for inspection and prediction.
//!
//! # Modules
//!
//! - [`data`]: [`FeatureArena`](data::FeatureArena), [`Problem`](data::Problem),
//!   [`ProblemBuilder`](data::ProblemBuilder) and the sparse text parser
//! - [`training`]: [`Parameter`](training::Parameter), solvers and logging
//! - [`model`]: [`ModelView`](model::ModelView) and the weight matrix
//! - [`io`]: text and JSON model files
//!
//! # Example
//!
//! ```
//! use sparselin::data::Problem;
//! use sparselin::model::ModelView;
//! use sparselin::training::{Parameter, SolverType};
//!
//! let problem = Problem::from_text("1 1:1.0\n-1 1:-1.0\n1 1:0.8\n", 1.0).unwrap();
//! let param = Parameter::builder().solver(SolverType::L2rL2LossSvcDual).build().unwrap();
//! let model = ModelView::train(&problem, &param).unwrap();
//!
//! assert_eq!(model.labels().unwrap(), &[1, -1]);
//! assert_eq!(model.predict(&vec![(1, 0.9)]).unwrap(), 1);
//! ```

pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod testing;
pub mod training;

pub use error::{ErrorKind, LinearError, Resource, Result};
