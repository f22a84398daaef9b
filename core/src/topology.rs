// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random re-initialisation of a network topology file
//!
//! File layout:
//!
//! ```text
//! <layer count>
//! for each layer, three groups (weights, weight mask, bias):
//!     <input size>
//!     <output size>
//!     <input size> lines of <output size> space separated values
//! <anything else, copied through untouched>
//! ```
//!
//! Groups 0 and 2 get fresh values; group 1 is copied byte for byte. The
//! final layer is drawn uniformly from the Glorot range, hidden layers from
//! a scaled normal over a `(in + out + 1) x (4 * out)` matrix of which the
//! leading `in x out` block is written.

use crate::{PrepError, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Groups stored per layer
pub const GROUPS_PER_LAYER: usize = 3;

/// Group copied verbatim instead of being regenerated
pub const PASSTHROUGH_GROUP: usize = 1;

/// Declared dimensions of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupShape {
    pub input_size: usize,
    pub output_size: usize,
}

impl GroupShape {
    /// Dimensions of the matrix drawn for this group, `None` when they do
    /// not fit in memory
    pub fn draw_dims(&self, output_layer: bool) -> Option<(usize, usize)> {
        let dims = if output_layer {
            (self.input_size, self.output_size)
        } else {
            (
                self.input_size.checked_add(self.output_size)?.checked_add(1)?,
                self.output_size.checked_mul(4)?,
            )
        };
        let len = dims.0.checked_mul(dims.1)?;
        (len <= isize::MAX as usize / std::mem::size_of::<f64>()).then_some(dims)
    }
}

fn oversized(line: usize, shape: GroupShape) -> PrepError {
    PrepError::Topology {
        line,
        message: format!(
            "group of {} x {} is too large",
            shape.input_size, shape.output_size
        ),
    }
}

/// Shapes of the three groups of a layer
pub type LayerShape = [GroupShape; GROUPS_PER_LAYER];

/// Line oriented reader that keeps line endings and counts lines
struct Lines<R> {
    inner: R,
    line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> Lines<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            buf: Vec::new(),
        }
    }

    /// Next raw line including its terminator
    fn next_line(&mut self, what: &str) -> Result<&[u8]> {
        self.buf.clear();
        self.line += 1;
        if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
            return Err(PrepError::Topology {
                line: self.line,
                message: format!("unexpected end of file, expected {what}"),
            });
        }
        Ok(&self.buf)
    }

    fn next_usize(&mut self, what: &str) -> Result<usize> {
        let line = self.line + 1;
        let raw = self.next_line(what)?;
        let text = String::from_utf8_lossy(raw);
        text.trim().parse().map_err(|_| PrepError::Topology {
            line,
            message: format!("expected {what}, found {:?}", text.trim()),
        })
    }

    fn next_shape(&mut self) -> Result<GroupShape> {
        Ok(GroupShape {
            input_size: self.next_usize("input size")?,
            output_size: self.next_usize("output size")?,
        })
    }

    fn skip_lines(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.next_line("matrix row")?;
        }
        Ok(())
    }
}

/// Draw a fresh weight matrix for a group.
///
/// `output_layer` selects the uniform Glorot initialisation; otherwise the
/// gated `(in + out + 1) x (4 * out)` normal matrix is drawn.
pub fn sample_weights<G: Rng + ?Sized>(
    rng: &mut G,
    shape: GroupShape,
    output_layer: bool,
) -> Result<Array2<f64>> {
    let dim = shape.draw_dims(output_layer).ok_or_else(|| oversized(0, shape))?;
    let fan = shape.input_size as f64 + shape.output_size as f64;

    if output_layer {
        let r = (6.0 / fan).sqrt();
        return Ok(Array2::from_shape_fn(dim, |_| rng.gen::<f64>() * 2.0 * r - r));
    }

    if fan == 0.0 {
        return Ok(Array2::zeros(dim));
    }
    let normal = Normal::new(0.0, 1.0 / fan.sqrt()).map_err(|e| PrepError::Topology {
        line: 0,
        message: e.to_string(),
    })?;
    Ok(Array2::from_shape_fn(dim, |_| normal.sample(&mut *rng)))
}

/// Write the leading `rows x cols` block of `matrix`, one line per row
fn write_block<W: Write>(
    out: &mut W,
    matrix: &Array2<f64>,
    rows: usize,
    cols: usize,
) -> io::Result<()> {
    for row in matrix.outer_iter().take(rows) {
        let line = row
            .iter()
            .take(cols)
            .map(|v| format!("{v:.6}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Copy a topology with regenerated weights.
///
/// Returns the structure that was read, which is also the structure written.
pub fn reinit_network<R, W, G>(input: R, out: &mut W, rng: &mut G) -> Result<Vec<LayerShape>>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    let mut lines = Lines::new(input);
    let num_layers = lines.next_usize("layer count")?;
    writeln!(out, "{num_layers}")?;

    let mut layers = Vec::new();
    for layer in 0..num_layers {
        let mut groups = [GroupShape {
            input_size: 0,
            output_size: 0,
        }; GROUPS_PER_LAYER];

        for (k, group) in groups.iter_mut().enumerate() {
            let shape = lines.next_shape()?;
            writeln!(out, "{}", shape.input_size)?;
            writeln!(out, "{}", shape.output_size)?;

            if k == PASSTHROUGH_GROUP {
                for _ in 0..shape.input_size {
                    out.write_all(lines.next_line("matrix row")?)?;
                }
            } else {
                let size_line = lines.line;
                lines.skip_lines(shape.input_size)?;
                let output_layer = layer + 1 == num_layers;
                if shape.draw_dims(output_layer).is_none() {
                    return Err(oversized(size_line, shape));
                }
                let matrix = sample_weights(&mut *rng, shape, output_layer)?;
                write_block(out, &matrix, shape.input_size, shape.output_size)?;
            }

            debug!(layer, group = k, ?shape, "group done");
            *group = shape;
        }
        layers.push(groups);
    }

    io::copy(&mut lines.inner, out)?;
    out.flush()?;
    Ok(layers)
}

/// Read only the structure of a topology
pub fn read_shape<R: BufRead>(input: R) -> Result<Vec<LayerShape>> {
    let mut lines = Lines::new(input);
    let num_layers = lines.next_usize("layer count")?;
    let mut layers = Vec::new();
    for _ in 0..num_layers {
        let mut groups = [GroupShape {
            input_size: 0,
            output_size: 0,
        }; GROUPS_PER_LAYER];
        for group in groups.iter_mut() {
            *group = lines.next_shape()?;
            lines.skip_lines(group.input_size)?;
        }
        layers.push(groups);
    }
    Ok(layers)
}

/// Re-initialise `input` into `output`.
///
/// A seed makes the draw reproducible; without one the generator is seeded
/// from the operating system.
pub fn reinit_file(input: &Path, output: &Path, seed: Option<u64>) -> Result<Vec<LayerShape>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let reader = BufReader::new(File::open(input)?);
    let mut out = BufWriter::new(File::create(output)?);
    let layers = reinit_network(reader, &mut out, &mut rng)?;
    info!(
        layers = layers.len(),
        "wrote {} from {}",
        output.display(),
        input.display()
    );
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(input_size: usize, output_size: usize) -> GroupShape {
        GroupShape {
            input_size,
            output_size,
        }
    }

    #[test]
    fn uniform_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = sample_weights(&mut rng, shape(4, 2), true).unwrap();
        let r = (6.0f64 / 6.0).sqrt();
        assert_eq!(m.dim(), (4, 2));
        assert!(m.iter().all(|v| (-r..=r).contains(v)));
    }

    #[test]
    fn hidden_matrix_is_gated_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = sample_weights(&mut rng, shape(5, 3), false).unwrap();
        assert_eq!(m.dim(), (9, 12));
    }

    #[test]
    fn degenerate_group_has_no_values() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample_weights(&mut rng, shape(0, 0), false).unwrap().len(), 0);
        assert_eq!(sample_weights(&mut rng, shape(0, 0), true).unwrap().len(), 0);
    }

    #[test]
    fn truncated_file_is_an_error() {
        let src = "1\n2 \n3 \n1 2 3 \n";
        let mut rng = StdRng::seed_from_u64(1);
        let err = reinit_network(src.as_bytes(), &mut Vec::new(), &mut rng).unwrap_err();
        assert!(matches!(err, PrepError::Topology { line: 5, .. }));
    }

    #[test]
    fn overflowing_sizes_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let huge = shape(1, usize::MAX / 2);
        assert!(huge.draw_dims(false).is_none());
        assert!(huge.draw_dims(true).is_none());
        let err = sample_weights(&mut rng, huge, false).unwrap_err();
        assert!(matches!(err, PrepError::Topology { .. }));
    }

    #[test]
    fn bad_size_reports_line() {
        let err = read_shape("1\nabc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PrepError::Topology { line: 2, .. }));
    }
}
