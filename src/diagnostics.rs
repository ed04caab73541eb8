//! Counters for recovered problems during one conversion.

use serde::Serialize;

/// Per-job tally of everything that was skipped, substituted or passed
/// through instead of converted normally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Image placeholders found in the body
    pub image_references: usize,
    /// Artifacts produced by the cropper
    pub artifacts: usize,
    /// Relationship ids with no media part behind them
    pub dangling_references: usize,
    pub decode_failures: usize,
    /// Raster images lacking `a:srcRect` or `a:xfrm`
    pub missing_geometry: usize,
    /// Crop rectangles that collapsed to nothing
    pub invalid_geometry: usize,
    pub unrecognized_media: usize,
    pub legacy_fallbacks: usize,
    pub legacy_without_fallback: usize,
    /// Placeholders rendered without an artifact
    pub missing_artifacts: usize,
}

impl Diagnostics {
    /// Number of recorded anomalies.
    ///
    /// Substituting the configured fallback for a metafile is the normal path
    /// and does not count.
    pub fn warnings(&self) -> usize {
        self.dangling_references
            + self.decode_failures
            + self.missing_geometry
            + self.invalid_geometry
            + self.unrecognized_media
            + self.legacy_without_fallback
            + self.missing_artifacts
    }

    pub fn is_clean(&self) -> bool {
        self.warnings() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings() {
        let mut diagnostics = Diagnostics::default();
        assert!(diagnostics.is_clean());

        diagnostics.legacy_fallbacks = 2;
        assert!(diagnostics.is_clean());

        diagnostics.dangling_references = 1;
        diagnostics.missing_artifacts = 1;
        assert_eq!(diagnostics.warnings(), 2);
    }

    #[test]
    fn test_json_report() {
        let diagnostics = Diagnostics {
            decode_failures: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(diagnostics).unwrap();
        assert_eq!(json["decode_failures"], 3);
        assert_eq!(json["missing_artifacts"], 0);
    }
}
