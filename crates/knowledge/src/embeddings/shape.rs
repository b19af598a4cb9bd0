//! Embedding output shapes and their normalisation to one flat vector.
//!
//! Model interfaces disagree on what "embed one text" returns: a bare vector,
//! a one-row batch `[[..]]`, or a batch of one-row batches `[[[..]]]`.
//! [`flatten_embedding`] is the only place these are reconciled.

use ragscope_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Raw output of an embedding call, by rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingOutput {
    /// Rank 1: `[d]`
    Vector(Vec<f32>),
    /// Rank 2: `[batch, d]`
    Matrix(Vec<Vec<f32>>),
    /// Rank 3: `[batch, rows, d]`
    Tensor(Vec<Vec<Vec<f32>>>),
}

impl EmbeddingOutput {
    pub fn rank(&self) -> usize {
        match self {
            EmbeddingOutput::Vector(_) => 1,
            EmbeddingOutput::Matrix(_) => 2,
            EmbeddingOutput::Tensor(_) => 3,
        }
    }

    /// Shape as reported in errors; inner sizes are taken from the first element.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            EmbeddingOutput::Vector(v) => vec![v.len()],
            EmbeddingOutput::Matrix(m) => vec![m.len(), m.first().map_or(0, Vec::len)],
            EmbeddingOutput::Tensor(t) => {
                let rows = t.first();
                vec![
                    t.len(),
                    rows.map_or(0, Vec::len),
                    rows.and_then(|r| r.first()).map_or(0, Vec::len),
                ]
            }
        }
    }
}

impl From<Vec<f32>> for EmbeddingOutput {
    fn from(vector: Vec<f32>) -> Self {
        EmbeddingOutput::Vector(vector)
    }
}

/// Reduce an embedding output to a single flat vector.
///
/// - rank 1 is returned as is
/// - rank 2 and rank 3 must have a leading batch axis of size 1, which is
///   dropped (twice for rank 3)
///
/// Any other shape, an empty vector, or a non-finite component is an
/// [`AppError::EmbeddingShape`].
pub fn flatten_embedding(output: EmbeddingOutput) -> AppResult<Vec<f32>> {
    let shape = output.shape();

    let vector = match output {
        EmbeddingOutput::Vector(v) => v,
        EmbeddingOutput::Matrix(rows) => only(rows, &shape)?,
        EmbeddingOutput::Tensor(batches) => only(only(batches, &shape)?, &shape)?,
    };

    if vector.is_empty() {
        return Err(AppError::EmbeddingShape(format!(
            "embedding of shape {:?} has no components",
            shape
        )));
    }

    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(AppError::EmbeddingShape(format!(
            "embedding component {} is not finite",
            pos
        )));
    }

    Ok(vector)
}

/// The single element of a size-1 batch axis.
fn only<T>(items: Vec<T>, shape: &[usize]) -> AppResult<T> {
    <[T; 1]>::try_from(items).map(|[item]| item).map_err(|items| {
        AppError::EmbeddingShape(format!(
            "expected a batch axis of size 1, got {} (shape {:?})",
            items.len(),
            shape
        ))
    })
}
