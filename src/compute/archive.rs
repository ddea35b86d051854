//! Incrementally merged non-dominated archive.

use super::error::{ParetoError, check_dims};
use super::front::non_dominated_indices;

/// Archive of mutually non-dominated, oriented objective vectors.
///
/// Rows live in one row-major buffer. The archive only ever shrinks to a
/// front subset or grows by the surviving members of a merged chunk, so the
/// buffer is rebuilt once per merge rather than edited in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParetoArchive {
    /// Row-major objective values.
    values: Vec<f64>,
    /// Objectives per row; zero until fixed by the first merge.
    objectives: usize,
    /// Number of rows.
    len: usize,
}

/// What a merge did, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    /// Archive rows plus chunk rows considered.
    pub candidates: usize,
    /// Archive size after the merge.
    pub retained: usize,
    /// Chunk rows that entered the archive.
    pub added: usize,
    /// Former archive rows that were dominated by the chunk.
    pub evicted: usize,
}

impl ParetoArchive {
    /// Create an empty archive whose dimensionality is set by the first merge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty archive with a fixed objective count.
    pub fn with_objectives(objectives: usize) -> Result<Self, ParetoError> {
        if objectives == 0 {
            return Err(ParetoError::EmptyObjectives);
        }
        Ok(Self {
            values: Vec::new(),
            objectives,
            len: 0,
        })
    }

    /// Build an archive holding the front of `points`.
    pub fn from_points<'a, I>(points: I) -> Result<Self, ParetoError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut archive = Self::new();
        archive.merge(points)?;
        Ok(archive)
    }

    /// Objective count, once known.
    pub fn objectives(&self) -> Option<usize> {
        (self.objectives > 0).then_some(self.objectives)
    }

    /// Number of archived rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if archive is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get a row by index.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        (i < self.len).then(|| &self.values[i * self.objectives..(i + 1) * self.objectives])
    }

    /// Iterate over archived rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on zero; an archive without objectives has no rows.
        self.values.chunks_exact(self.objectives.max(1))
    }

    /// Copy rows out as owned vectors.
    pub fn to_vecs(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Whether a row equal to `point` is archived.
    pub fn contains(&self, point: &[f64]) -> bool {
        self.rows().any(|r| r == point)
    }

    /// Remove all rows, keeping the dimensionality.
    pub fn clear(&mut self) {
        self.values.clear();
        self.len = 0;
    }

    /// Replace the archive with the front of (archive ∪ chunk).
    ///
    /// On error the archive is left unchanged.
    pub fn merge<'a, I>(&mut self, chunk: I) -> Result<MergeStats, ParetoError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let chunk: Vec<&[f64]> = chunk.into_iter().collect();
        let old_len = self.len;
        if chunk.is_empty() {
            return Ok(MergeStats {
                candidates: old_len,
                retained: old_len,
                added: 0,
                evicted: 0,
            });
        }

        let objectives = if self.objectives > 0 {
            self.objectives
        } else {
            chunk[0].len()
        };
        if objectives == 0 {
            return Err(ParetoError::EmptyObjectives);
        }
        for row in &chunk {
            check_dims(objectives, row.len())?;
        }

        let mut candidates: Vec<&[f64]> = Vec::with_capacity(old_len + chunk.len());
        candidates.extend(self.rows().take(old_len));
        candidates.extend(chunk.iter().copied());

        let front = non_dominated_indices(&candidates)?;
        let kept_from_archive = front.iter().take_while(|&&i| i < old_len).count();

        let mut values = Vec::with_capacity(front.len() * objectives);
        for &i in &front {
            values.extend_from_slice(candidates[i]);
        }
        let stats = MergeStats {
            candidates: candidates.len(),
            retained: front.len(),
            added: front.len() - kept_from_archive,
            evicted: old_len - kept_from_archive,
        };

        self.values = values;
        self.objectives = objectives;
        self.len = front.len();
        Ok(stats)
    }
}

/// Value form of [`ParetoArchive::merge`]: front of (archive ∪ chunk).
pub fn merged<'a, I>(archive: &ParetoArchive, chunk: I) -> Result<ParetoArchive, ParetoError>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut next = archive.clone();
    next.merge(chunk)?;
    Ok(next)
}
