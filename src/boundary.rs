// src/boundary.rs

//! Adoption boundary detection: the first commit whose tree satisfies a
//! predicate marks the start of the analysis window.

use crate::error::FetchError;
use crate::history::HistoryProvider;
use crate::model::Commit;
use serde::Deserialize;
use std::fmt::Display;

/// Markers that identify a .NET Core (or later) target framework in a project file.
pub const DEFAULT_MARKERS: &[&str] = &["netcoreapp", "net5.0", "net6.0", "net7.0", "net8.0", "net9.0"];

pub const DEFAULT_MANIFEST_SUFFIX: &str = ".csproj";

/// Returns the index of the first item for which `predicate` holds.
///
/// A predicate error is logged and counts as "does not hold" for that item;
/// it never stops the scan. `None` means no item qualifies, which callers
/// treat as "skip this repository".
pub fn find_boundary<T, E, F>(sequence: &[T], mut predicate: F) -> Option<usize>
where
    F: FnMut(&T) -> Result<bool, E>,
    E: Display,
{
    sequence.iter().enumerate().find_map(|(index, item)| match predicate(item) {
        Ok(true) => Some(index),
        Ok(false) => None,
        Err(e) => {
            tracing::warn!(index, error = %e, "failed to inspect commit, treating as non-matching");
            None
        }
    })
}

/// Holds for a commit when any manifest file in its tree mentions one of the
/// markers, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestPredicate {
    pub suffix: String,
    pub markers: Vec<String>,
}

impl Default for ManifestPredicate {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_MANIFEST_SUFFIX.to_string(),
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ManifestPredicate {
    pub fn new(suffix: impl Into<String>, markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            suffix: suffix.into(),
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches_text(&self, contents: &str) -> bool {
        let contents = contents.to_lowercase();
        self.markers
            .iter()
            .any(|marker| contents.contains(&marker.to_lowercase()))
    }

    pub fn evaluate<H: HistoryProvider + ?Sized>(&self, history: &H, commit: &Commit) -> Result<bool, FetchError> {
        let files = history.files_with_suffix(&commit.id, &self.suffix)?;
        Ok(files.iter().any(|file| self.matches_text(&file.contents)))
    }

    /// First commit in `sequence` whose tree satisfies this predicate.
    pub fn find_in<H: HistoryProvider + ?Sized>(&self, history: &H, sequence: &[Commit]) -> Option<usize> {
        find_boundary(sequence, |commit| {
            self.evaluate(history, commit).map_err(|e| format!("{}: {e}", commit.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_index_wins() {
        let items = [1, 3, 8, 9, 10];
        let found = find_boundary(&items, |n| Ok::<_, String>(n % 2 == 0));
        assert_eq!(found, Some(2));
    }

    #[test]
    fn no_match_is_none() {
        let items = [1, 3, 5];
        assert_eq!(find_boundary(&items, |n| Ok::<_, String>(*n > 10)), None);
        let empty: [i32; 0] = [];
        assert_eq!(find_boundary(&empty, |_| Ok::<_, String>(true)), None);
    }

    #[test]
    fn read_failures_count_as_false_and_scan_continues() {
        let items = [0, 1, 2, 3];
        let found = find_boundary(&items, |n| match n {
            0 | 1 => Err("malformed tree"),
            2 => Ok(false),
            _ => Ok(true),
        });
        assert_eq!(found, Some(3));
    }

    #[test]
    fn markers_match_case_insensitively() {
        let predicate = ManifestPredicate::default();
        assert!(predicate.matches_text("<TargetFramework>NET8.0</TargetFramework>"));
        assert!(predicate.matches_text("<TargetFramework>netcoreapp3.1</TargetFramework>"));
        assert!(!predicate.matches_text("<TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>"));
    }

    #[test]
    fn custom_markers() {
        let predicate = ManifestPredicate::new("manifest.toml", ["Target-V2"]);
        assert!(predicate.matches_text("platform = \"target-v2\""));
        assert!(!predicate.matches_text("platform = \"target-v1\""));
    }
}
