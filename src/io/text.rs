//! liblinear text model format.
//!
//! ```text
//! solver_type L2R_LR
//! nr_class 2
//! label 1 -1
//! nr_feature 3
//! bias 1
//! w
//! 0.4081
//! -0.25
//! 1.5
//! 0.125
//! ```
//!
//! One line per effective feature (bias row last), each holding `nr_w`
//! space-terminated values.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{LinearError, Result};
use crate::model::{bias_index, LinearWeights, Model};
use crate::training::SolverType;

/// Write `model` in the text format.
pub fn write_model<W: Write>(model: &Model, writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);
    writeln!(out, "solver_type {}", model.solver_type().name())?;
    writeln!(out, "nr_class {}", model.nr_class())?;
    write!(out, "label")?;
    for label in model.labels() {
        write!(out, " {label}")?;
    }
    writeln!(out)?;
    writeln!(out, "nr_feature {}", model.nr_feature())?;
    writeln!(out, "bias {}", model.bias())?;
    writeln!(out, "w")?;
    for row in model.weights().as_array().rows() {
        for value in row {
            write!(out, "{value} ")?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_model(model, file)?;
    tracing::debug!(
        solver = model.solver_type().name(),
        nr_class = model.nr_class(),
        "saved text model"
    );
    Ok(())
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let file = File::open(path)?;
    read_model(BufReader::new(file))
}

/// Upper bound on weights reserved from header values before any are read.
const PREALLOC_LIMIT: usize = 1 << 16;

/// Number of weights a model header describes, or `None` if the feature
/// count does not fit a feature index or the total overflows.
pub(crate) fn weight_count(nr_feature: usize, bias: f64, nr_w: usize) -> Option<usize> {
    bias_index(nr_feature)?;
    nr_feature
        .checked_add(usize::from(bias >= 0.0))?
        .checked_mul(nr_w)
}

#[derive(Default)]
struct Header {
    solver: Option<SolverType>,
    nr_class: Option<usize>,
    labels: Option<Vec<i32>>,
    nr_feature: Option<usize>,
    bias: Option<f64>,
}

fn parse_value<T: std::str::FromStr>(token: Option<&str>, key: &str, line: usize) -> Result<T> {
    let token = token.ok_or_else(|| LinearError::model_format(line, format!("{key} needs a value")))?;
    token
        .parse()
        .map_err(|_| LinearError::model_format(line, format!("invalid {key} value {token:?}")))
}

/// Read a model in the text format.
///
/// Either a complete model is returned or an error; nothing is half-built.
pub fn read_model<R: BufRead>(reader: R) -> Result<Model> {
    let mut lines = reader.lines().enumerate();
    let mut header = Header::default();
    let mut weights_line = 0;

    loop {
        let (idx, line) = lines
            .next()
            .ok_or_else(|| LinearError::model_format(weights_line + 1, "missing weight section"))?;
        let line = line?;
        let line_number = idx + 1;
        weights_line = line_number;

        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };
        match key {
            "solver_type" => {
                let name = tokens.next().unwrap_or_default();
                let solver = SolverType::from_name(name).ok_or_else(|| {
                    LinearError::model_format(line_number, format!("unknown solver type {name:?}"))
                })?;
                header.solver = Some(solver);
            }
            "nr_class" => header.nr_class = Some(parse_value(tokens.next(), key, line_number)?),
            "nr_feature" => header.nr_feature = Some(parse_value(tokens.next(), key, line_number)?),
            "bias" => header.bias = Some(parse_value(tokens.next(), key, line_number)?),
            "label" => {
                let labels = tokens
                    .map(|t| parse_value(Some(t), key, line_number))
                    .collect::<Result<Vec<i32>>>()?;
                header.labels = Some(labels);
            }
            "w" => break,
            other => {
                return Err(LinearError::model_format(
                    line_number,
                    format!("unknown header key {other:?}"),
                ))
            }
        }
    }

    let missing = |key: &str| LinearError::model_format(weights_line, format!("header lacks {key}"));
    let solver = header.solver.ok_or_else(|| missing("solver_type"))?;
    let nr_class = header.nr_class.ok_or_else(|| missing("nr_class"))?;
    let nr_feature = header.nr_feature.ok_or_else(|| missing("nr_feature"))?;
    let bias = header.bias.ok_or_else(|| missing("bias"))?;
    let labels = header.labels.ok_or_else(|| missing("label"))?;
    if labels.len() != nr_class {
        return Err(LinearError::model_format(
            weights_line,
            format!("nr_class is {nr_class} but {} labels are listed", labels.len()),
        ));
    }

    let expected = weight_count(nr_feature, bias, solver.weight_rows(nr_class))
        .ok_or_else(|| {
            LinearError::model_format(weights_line, format!("nr_feature {nr_feature} is too large"))
        })?;
    let n_rows = nr_feature + usize::from(bias >= 0.0);
    let nr_w = solver.weight_rows(nr_class);
    let mut values = Vec::with_capacity(expected.min(PREALLOC_LIMIT));
    let mut last_line = weights_line;
    for (idx, line) in lines {
        let line = line?;
        last_line = idx + 1;
        for token in line.split_whitespace() {
            if values.len() == expected {
                return Err(LinearError::model_format(last_line, "too many weights"));
            }
            values.push(parse_value(Some(token), "weight", last_line)?);
        }
    }
    if values.len() != expected {
        return Err(LinearError::model_format(
            last_line,
            format!("expected {expected} weights, found {}", values.len()),
        ));
    }

    let weights = LinearWeights::from_flat(values, n_rows, nr_w)?;
    Model::new(solver, labels, nr_feature, bias, weights)
}
