//! Fixed-size batching over in-memory sample sequences
//!
//! Batches are contiguous, in order, and always exactly `batch_size` long.
//! A trailing remainder that cannot fill a whole batch is skipped.

use std::iter::Zip;
use std::slice::ChunksExact;

use crate::utils::error::{ClassifierError, Result};

/// Lazy sequence of contiguous, equally sized batches borrowed from a slice
#[derive(Debug, Clone)]
pub struct Batches<'a, T> {
    chunks: ChunksExact<'a, T>,
}

impl<'a, T> Batches<'a, T> {
    /// Elements at the tail that no batch will cover
    pub fn remainder(&self) -> &'a [T] {
        self.chunks.remainder()
    }
}

impl<'a, T> Iterator for Batches<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T> ExactSizeIterator for Batches<'_, T> {}

/// Split `items` into `len / batch_size` batches of exactly `batch_size`
///
/// The input is never mutated and each call starts again from offset 0.
pub fn batches<T>(items: &[T], batch_size: usize) -> Result<Batches<'_, T>> {
    if batch_size == 0 {
        return Err(ClassifierError::Config(
            "batch_size must be greater than 0".to_string(),
        ));
    }

    Ok(Batches {
        chunks: items.chunks_exact(batch_size),
    })
}

/// Number of whole batches `batches` yields for `len` items
pub fn batch_count(len: usize, batch_size: usize) -> Result<usize> {
    if batch_size == 0 {
        return Err(ClassifierError::Config(
            "batch_size must be greater than 0".to_string(),
        ));
    }
    Ok(len / batch_size)
}

/// Index-aligned batches over two parallel sequences
///
/// Batch `k` of `inputs` is paired with batch `k` of `labels`. The two
/// sequences must have the same length.
pub fn zip_batches<'a, A, L>(
    inputs: &'a [A],
    labels: &'a [L],
    batch_size: usize,
) -> Result<Zip<Batches<'a, A>, Batches<'a, L>>> {
    if inputs.len() != labels.len() {
        return Err(ClassifierError::ShapeMismatch(format!(
            "{} inputs but {} labels",
            inputs.len(),
            labels.len()
        )));
    }

    Ok(batches(inputs, batch_size)?.zip(batches(labels, batch_size)?))
}
