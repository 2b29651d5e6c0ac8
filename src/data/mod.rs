//! Sparse training data.
//!
//! A [`Problem`] is a label vector plus a [`FeatureArena`]: one contiguous
//! allocation of [`FeatureNode`]s sliced into sentinel-terminated runs, one
//! per sample.
//!
//! Two construction paths produce identical layouts:
//!
//! - [`ProblemBuilder`] from host associative data ([`SparseSample`])
//! - [`TextFormatParser`] from the sparse text format
//!
//! [`FeatureColumns`] re-indexes a problem column-major for primal solvers.

mod arena;
mod columns;
mod node;
mod problem;
mod text;

pub use arena::{ArenaWriter, FeatureArena};
pub use columns::FeatureColumns;
pub use node::{FeatureNode, SENTINEL_INDEX};
pub use problem::{bias_enabled, Problem, ProblemBuilder, SparseSample};
pub use text::{patch_bias_slots, write_problem, TextFormatParser};

pub(crate) use node::{sparse_axpy, sparse_dot, squared_norm};
