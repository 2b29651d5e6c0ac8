//! JSON model format.
//!
//! The on-disk schema is kept separate from [`Model`] so the two can evolve
//! independently; conversion validates the weight shape.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LinearError, Result};
use crate::model::{LinearWeights, Model};
use crate::training::SolverType;

use super::text::weight_count;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Serialized form of a [`Model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub version: u32,
    pub solver_type: SolverType,
    pub labels: Vec<i32>,
    pub nr_feature: usize,
    pub bias: f64,
    /// Number of weight vectors.
    pub nr_w: usize,
    /// Row-major, effective features × `nr_w`.
    pub weights: Vec<f64>,
}

impl From<&Model> for ModelSchema {
    fn from(model: &Model) -> Self {
        Self {
            version: SCHEMA_VERSION,
            solver_type: model.solver_type(),
            labels: model.labels().to_vec(),
            nr_feature: model.nr_feature(),
            bias: model.bias(),
            nr_w: model.nr_w(),
            weights: model.weights().to_flat(),
        }
    }
}

impl TryFrom<ModelSchema> for Model {
    type Error = LinearError;

    fn try_from(schema: ModelSchema) -> Result<Self> {
        let format = |message: String| LinearError::model_format(0, message);
        if schema.version != SCHEMA_VERSION {
            return Err(format(format!(
                "unsupported schema version {}",
                schema.version
            )));
        }
        let nr_w = schema.solver_type.weight_rows(schema.labels.len());
        let expected = weight_count(schema.nr_feature, schema.bias, nr_w).ok_or_else(|| {
            format(format!("nr_feature {} is too large", schema.nr_feature))
        })?;
        let n_rows = schema.nr_feature + usize::from(schema.bias >= 0.0);
        if schema.nr_w != nr_w || schema.weights.len() != expected {
            return Err(format(format!(
                "expected {n_rows} x {nr_w} weights, found {} in {} columns",
                schema.weights.len(),
                schema.nr_w
            )));
        }
        let weights = LinearWeights::from_flat(schema.weights, n_rows, nr_w)?;
        Model::new(
            schema.solver_type,
            schema.labels,
            schema.nr_feature,
            schema.bias,
            weights,
        )
    }
}

pub fn write_model<W: Write>(model: &Model, writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut out, &ModelSchema::from(model))?;
    out.flush()?;
    Ok(())
}

pub fn read_model<R: Read>(reader: R) -> Result<Model> {
    let schema: ModelSchema = serde_json::from_reader(reader)?;
    Model::try_from(schema)
}

pub fn save_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    write_model(model, File::create(path)?)
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    read_model(BufReader::new(File::open(path)?))
}
