//! Unique artifact names for image placeholders.

use crate::media::{extension, stem};
use std::collections::HashSet;

/// Hands out one artifact name per image placeholder.
///
/// The first placeholder for a media file keeps its basename; later ones get
/// an ordinal suffix (`image1-2.png`, `image1-3.png`) so no artifact ever
/// replaces another.
#[derive(Debug, Default)]
pub struct ArtifactNamer {
    issued: HashSet<String>,
}

impl ArtifactNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, basename: &str) -> String {
        if self.issued.insert(basename.to_string()) {
            return basename.to_string();
        }

        let stem = stem(basename);
        let suffix = extension(basename)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let mut ordinal = 2;
        loop {
            let candidate = format!("{stem}-{ordinal}{suffix}");
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
            ordinal += 1;
        }
    }

    /// Number of names handed out so far.
    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
