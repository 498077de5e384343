//! Exact nearest-neighbour search under squared Euclidean distance.
//!
//! Vectors live in one row-major `Vec<f32>`; row `i` is the `i`-th vector
//! added. Queries scan every row, so results are exact and deterministic.

use serde::{Deserialize, Serialize};

use curriplan_core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
    dim: usize,
    vectors: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self {
        Self { dim, vectors: Vec::new() }
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.vectors.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        self.check_dim(vector.len())?;
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    /// Up to `k` `(position, squared_distance)` pairs, nearest first.
    /// Equal distances are ordered by position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        self.check_dim(query.len())?;
        if self.is_empty() {
            return Ok(vec![]);
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(pos, row)| (pos, squared_l2(row, query)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// Shape check for an index read back from disk.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::CorruptArtifacts("index dimension is zero".to_string()));
        }
        if self.vectors.len() % self.dim != 0 {
            return Err(Error::CorruptArtifacts(format!(
                "{} values do not split into rows of {}",
                self.vectors.len(),
                self.dim
            )));
        }
        Ok(())
    }

    fn check_dim(&self, got: usize) -> Result<()> {
        if self.dim == 0 || got != self.dim {
            return Err(Error::Operation(format!(
                "vector has {} dimensions, index expects {}",
                got, self.dim
            )));
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
