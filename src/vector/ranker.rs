//! Exhaustive cosine ranking over the vector store.
//!
//! Both sides are unit-normalized, so the dot product is the cosine
//! similarity. A linear scan is fast enough at this corpus size and keeps
//! results exact.

use rayon::prelude::*;

use crate::types::RecordId;
use crate::vector::storage::VectorStore;
use crate::vector::types::{EncoderError, Score};

/// One ranked row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Ranked {
    pub id: RecordId,
    pub score: Score,
}

/// Dot product of two equal-length vectors.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Ranks every stored row against `query` and keeps the best `k`.
///
/// Scores are non-increasing; equal scores keep corpus order. `k` larger
/// than the store returns every row.
///
/// # Errors
/// Returns `DimensionMismatch` if the query length differs from the store's.
pub fn rank(query: &[f32], store: &VectorStore, k: usize) -> Result<Vec<Ranked>, EncoderError> {
    store.dimension().validate_vector(query)?;

    let k = k.min(store.len());
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scored: Vec<Ranked> = store
        .as_flat()
        .par_chunks_exact(store.dimension().get())
        .enumerate()
        .map(|(index, row)| Ranked {
            id: RecordId::from(index),
            score: Score::new(dot(query, row)),
        })
        .collect();

    let by_rank = |a: &Ranked, b: &Ranked| b.score.cmp(&a.score).then(a.id.cmp(&b.id));
    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, by_rank);
        scored.truncate(k);
    }
    scored.sort_unstable_by(by_rank);

    Ok(scored)
}
