//! Sparse text format.
//!
//! One sample per line:
//!
//! ```text
//! <label> <index1>:<value1> <index2>:<value2> ...
//! ```
//!
//! Labels are integers (a leading `+` is accepted). Indices are positive and
//! strictly increasing within a line. Tokens are whitespace separated and
//! trailing whitespace is ignored.
//!
//! [`TextFormatParser`] reads the input twice. The first pass sizes the arena,
//! the second fills it. The bias feature's index is only known once every line
//! has been seen, so bias nodes are written with a placeholder index and
//! rewritten afterwards by [`patch_bias_slots`].

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{LinearError, Result};

use super::arena::{ArenaWriter, FeatureArena};
use super::problem::{bias_enabled, Problem};

/// Index written into bias slots until the final attribute count is known.
const BIAS_PLACEHOLDER: i32 = 0;

/// Two-pass parser for the sparse text format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFormatParser {
    bias: f64,
    attribute_count: Option<i32>,
}

impl Default for TextFormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFormatParser {
    /// Parser with the bias disabled and the attribute count discovered from
    /// the data.
    pub fn new() -> Self {
        Self {
            bias: -1.0,
            attribute_count: None,
        }
    }

    /// Set the bias value. Values `> 0` append a bias node to every sample.
    pub fn bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Declare the attribute count up front.
    ///
    /// Indices above it are rejected. The resulting problem's `n` is the
    /// larger of this value and the largest index seen.
    pub fn attribute_count(mut self, attribute_count: Option<i32>) -> Self {
        self.attribute_count = attribute_count;
        self
    }

    /// Parse a problem held in memory.
    pub fn parse_str(&self, text: &str) -> Result<Problem> {
        self.parse(Cursor::new(text.as_bytes()))
    }

    /// Parse a problem from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Problem> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file))
    }

    /// Parse a problem from a seekable reader.
    ///
    /// The reader is rewound to its starting position between passes.
    ///
    /// # Errors
    ///
    /// - [`LinearError::InvalidParameter`] if the declared attribute count is
    ///   negative, or leaves no index for the bias feature
    /// - [`LinearError::MalformedInput`] with the 1-based line number of the
    ///   first offending line; nothing is returned for the lines before it
    /// - [`LinearError::InternalConsistency`] if the second pass did not fill
    ///   exactly what the first pass sized
    /// - [`LinearError::Io`] on read or seek failure
    pub fn parse<R: BufRead + Seek>(&self, mut reader: R) -> Result<Problem> {
        let with_bias = bias_enabled(self.bias);
        if let Some(count) = self.attribute_count {
            if count < 0 || (with_bias && count == i32::MAX) {
                return Err(LinearError::InvalidParameter(format!(
                    "attribute count {count} leaves no valid bias index"
                )));
            }
        }
        let origin = reader.stream_position()?;
        let mut buf = Vec::new();

        // Pass 1: count samples and nodes.
        let mut l = 0usize;
        let mut elements = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let tokens = buf
                .split(u8::is_ascii_whitespace)
                .filter(|token| !token.is_empty())
                .count();
            elements += tokens.saturating_sub(1) + 1 + usize::from(with_bias);
            l += 1;
        }
        tracing::debug!(samples = l, elements, "sized sparse text input");

        reader.seek(SeekFrom::Start(origin))?;

        // Pass 2: fill.
        let mut writer = FeatureArena::allocate(elements);
        let mut labels = Vec::with_capacity(l);
        let mut bias_slots = Vec::with_capacity(if with_bias { l } else { 0 });
        let mut max_index = 0;
        let mut max_line = 0;

        for line_number in 1..=l {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Err(LinearError::malformed(
                    line_number,
                    "input ended before the sized line count",
                ));
            }
            let line = std::str::from_utf8(&buf)
                .map_err(|_| LinearError::malformed(line_number, "line is not valid UTF-8"))?;
            let mut tokens = line.split_ascii_whitespace();
            let label = tokens
                .next()
                .ok_or_else(|| LinearError::malformed(line_number, "missing label"))?;
            let label: i32 = label.parse().map_err(|_| {
                LinearError::malformed(line_number, format!("invalid label {label:?}"))
            })?;
            labels.push(label);

            writer.begin_sample();
            let mut previous = 0;
            for token in tokens {
                let (index, value) = self.parse_pair(token, previous, line_number)?;
                writer.append(index, value)?;
                previous = index;
            }
            if previous > max_index {
                max_index = previous;
                max_line = line_number;
            }

            if with_bias {
                bias_slots.push(writer.append_bias(BIAS_PLACEHOLDER, self.bias)?);
            }
            writer.append_sentinel()?;
        }

        if writer.cursor() != writer.capacity() {
            return Err(LinearError::InternalConsistency {
                allocated: writer.capacity(),
                written: writer.cursor(),
            });
        }

        let attributes = self.attribute_count.unwrap_or(0).max(max_index);
        let n = if with_bias {
            let n = attributes.checked_add(1).ok_or_else(|| {
                LinearError::malformed(max_line, "feature index leaves no room for the bias feature")
            })?;
            patch_bias_slots(&mut writer, &bias_slots, n);
            n
        } else {
            attributes
        };

        let arena = writer.finish()?;
        Ok(Problem::from_parts(labels, arena, n, self.bias))
    }

    fn parse_pair(&self, token: &str, previous: i32, line: usize) -> Result<(i32, f64)> {
        let (index, value) = token
            .split_once(':')
            .ok_or_else(|| LinearError::malformed(line, format!("expected index:value, got {token:?}")))?;
        let index: i32 = index
            .parse()
            .map_err(|_| LinearError::malformed(line, format!("invalid feature index {index:?}")))?;
        if index <= 0 {
            return Err(LinearError::malformed(
                line,
                format!("feature index {index} is not positive"),
            ));
        }
        if index <= previous {
            return Err(LinearError::malformed(
                line,
                format!("feature index {index} does not follow {previous}"),
            ));
        }
        if index == i32::MAX && bias_enabled(self.bias) {
            return Err(LinearError::malformed(
                line,
                format!("feature index {index} leaves no room for the bias feature"),
            ));
        }
        if let Some(limit) = self.attribute_count {
            if index > limit {
                return Err(LinearError::malformed(
                    line,
                    format!("feature index {index} exceeds attribute count {limit}"),
                ));
            }
        }
        let value: f64 = value
            .parse()
            .map_err(|_| LinearError::malformed(line, format!("invalid feature value {value:?}")))?;
        Ok((index, value))
    }
}

/// Rewrite every recorded bias slot's index to `n`.
///
/// Returns the number of slots patched.
pub fn patch_bias_slots(writer: &mut ArenaWriter, slots: &[usize], n: i32) -> usize {
    for &slot in slots {
        writer.patch_index(slot, n);
    }
    tracing::debug!(patched = slots.len(), n, "patched bias slots");
    slots.len()
}

/// Write a problem in the sparse text format.
///
/// Bias nodes are omitted so the output parses back to the same samples
/// under the same bias setting.
pub fn write_problem<W: Write>(problem: &Problem, writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);
    let skip_bias = problem.has_bias();
    for (label, nodes) in problem.labels().iter().zip(problem.samples()?) {
        let nodes = match nodes.split_last() {
            Some((_, rest)) if skip_bias => rest,
            _ => nodes,
        };
        write!(out, "{label}")?;
        for node in nodes {
            write!(out, " {}:{}", node.index, node.value)?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
