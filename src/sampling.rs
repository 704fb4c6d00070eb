// src/sampling.rs

//! Deterministic selection of a few representative points from an ordered
//! history.

use crate::model::{Commit, SampleCount, SampleRequest, Spacing, Tag};
use std::collections::HashSet;

/// Source positions picked by the fixed-stride rule.
///
/// For `len <= count` every position is returned. Otherwise the stride is
/// `floor(len / (count - 1))`, the endpoints are always kept and interior
/// picks are `i * stride`. When `len` is not a multiple of `count - 1` the
/// last interior pick can land close to the final endpoint.
pub fn stride_indices(len: usize, count: SampleCount) -> Vec<usize> {
    let count = count.get();
    if len <= count {
        return (0..len).collect();
    }

    let step = len / (count - 1);
    let mut indices = Vec::with_capacity(count);
    indices.push(0);
    indices.extend((1..count - 1).map(|i| i * step));
    indices.push(len - 1);
    indices
}

/// Source positions spread by linear interpolation over `[0, len - 1]`,
/// rounded to the nearest integer.
pub fn uniform_indices(len: usize, count: SampleCount) -> Vec<usize> {
    let count = count.get();
    if len <= count {
        return (0..len).collect();
    }

    let span = (len - 1) as f64;
    let intervals = (count - 1) as f64;
    (0..count)
        .map(|i| (i as f64 * span / intervals).round() as usize)
        .collect()
}

fn indices_for(len: usize, count: SampleCount, spacing: Spacing) -> Vec<usize> {
    match spacing {
        Spacing::FixedStride => stride_indices(len, count),
        Spacing::Uniform => uniform_indices(len, count),
    }
}

/// Picks at most `count` items of `sequence` with the fixed-stride rule,
/// always including the first and last.
pub fn sample<T: Clone>(sequence: &[T], count: SampleCount) -> Vec<T> {
    stride_indices(sequence.len(), count)
        .into_iter()
        .map(|i| sequence[i].clone())
        .collect()
}

/// Like [`sample`], after dropping the first `request.skip` items and keeping
/// only the last `request.window` of what remains.
pub fn sample_bounded<T: Clone>(sequence: &[T], request: &SampleRequest) -> Vec<T> {
    let bounded = bound(sequence, request.skip, request.window);
    indices_for(bounded.len(), request.count, request.spacing)
        .into_iter()
        .map(|i| bounded[i].clone())
        .collect()
}

fn bound<T>(sequence: &[T], skip: usize, window: Option<usize>) -> &[T] {
    let rest = sequence.get(skip..).unwrap_or(&[]);
    match window {
        Some(window) if window < rest.len() => &rest[rest.len() - window..],
        _ => rest,
    }
}

/// Picks commits referenced by release tags, spread evenly over the tag timeline.
///
/// Tags are deduplicated by name (first occurrence wins) and ordered by date,
/// then name. Returns `None` when there are no tags at all; with `count` or
/// fewer tags every tag's commit is returned.
pub fn sample_tags(tags: Vec<Tag>, count: SampleCount) -> Option<Vec<Commit>> {
    let mut seen = HashSet::new();
    let mut tags: Vec<Tag> = tags
        .into_iter()
        .filter(|tag| seen.insert(tag.name.clone()))
        .collect();
    if tags.is_empty() {
        return None;
    }
    tags.sort_by(|a, b| a.date().cmp(&b.date()).then_with(|| a.name.cmp(&b.name)));

    let commits = uniform_indices(tags.len(), count)
        .into_iter()
        .map(|i| tags[i].commit.clone())
        .collect();
    Some(commits)
}
