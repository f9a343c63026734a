// PLAN023 Tier 3: Conflict Detector
//
// Concept: High-level conflict detection and aggregation across validation results
// Synchronization: Accepts validation outputs from all Tier 3 validators, outputs ValidationReport
//
// Algorithm (per SPEC_wkmp_ai_recode.md):
// 1. Collect conflicts from ConsistencyChecker
// 2. Check completeness score from CompletenessScorer
// 3. Aggregate all warnings and conflicts
// 4. Determine overall quality score and conflict status
// 5. Return ValidationReport with actionable feedback

use crate::import_v2::types::{ConflictSeverity, FusedMetadata, ValidationReport};

/// Conflict detector (Tier 3 validation concept)
///
/// **Legible Software Principle:**
/// - Independent module: Pure aggregation logic, no side effects
/// - Explicit synchronization: Clear contract with other Tier 3 validators
/// - Transparent behavior: Conflict detection rules are explicit
/// - Integrity: Produces actionable ValidationReport for decision-making
pub struct ConflictDetector {
    /// Minimum quality score to avoid warnings
    min_quality_score: f64,
    /// Minimum confidence for required fields
    min_required_confidence: f64,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self {
            min_quality_score: 0.5,    // Warn if quality < 50%
            min_required_confidence: 0.6, // Warn if title/artist confidence < 60%
        }
    }
}

impl ConflictDetector {
    /// Detect conflicts and generate validation report
    ///
    /// # Algorithm: Multi-Source Validation Aggregation
    /// 1. Check completeness (quality score)
    /// 2. Check required fields (title, artist presence and confidence)
    /// 3. Aggregate consistency conflicts from field comparisons
    /// 4. Determine overall conflict status
    /// 5. Generate actionable warnings
    ///
    /// # Arguments
    /// * `metadata` - Fused metadata to validate
    /// * `quality_score` - Score from CompletenessScorer [0.0, 1.0]
    /// * `consistency_conflicts` - Conflicts from ConsistencyChecker
    ///
    /// # Returns
    /// ValidationReport with quality score, conflict status, and warnings
    pub fn detect(
        &self,
        metadata: &FusedMetadata,
        quality_score: f64,
        consistency_conflicts: Vec<(String, ConflictSeverity)>,
    ) -> ValidationReport {
        let mut warnings: Vec<String> = Vec::new();
        let mut conflicts: Vec<(String, ConflictSeverity)> = Vec::new();

        // Step 1: Check quality score
        if quality_score < self.min_quality_score {
            warnings.push(format!(
                "Low metadata quality: {:.1}% completeness (minimum: {:.0}%)",
                quality_score * 100.0,
                self.min_quality_score * 100.0
            ));
        }

        // Step 2: Check required fields (use High severity for missing required fields)
        if metadata.title.is_none() {
            conflicts.push((
                "Missing required field: title".to_string(),
                ConflictSeverity::High,
            ));
        } else if let Some(ref title) = metadata.title {
            if title.confidence < self.min_required_confidence {
                warnings.push(format!(
                    "Low confidence for title: {:.1}% (minimum: {:.0}%)",
                    title.confidence * 100.0,
                    self.min_required_confidence * 100.0
                ));
            }
        }

        if metadata.artist.is_none() {
            conflicts.push((
                "Missing required field: artist".to_string(),
                ConflictSeverity::High,
            ));
        } else if let Some(ref artist) = metadata.artist {
            if artist.confidence < self.min_required_confidence {
                warnings.push(format!(
                    "Low confidence for artist: {:.1}% (minimum: {:.0}%)",
                    artist.confidence * 100.0,
                    self.min_required_confidence * 100.0
                ));
            }
        }

        // Step 3: Aggregate consistency conflicts
        conflicts.extend(consistency_conflicts);

        // Step 4: Generate informational warnings for missing optional fields
        if metadata.album.is_none() {
            warnings.push("Optional field missing: album".to_string());
        }

        if metadata.release_date.is_none() {
            warnings.push("Optional field missing: release_date".to_string());
        }

        // Step 5: Determine overall conflict status
        let has_conflicts = !conflicts.is_empty();

        tracing::info!(
            "Conflict detection: quality={:.3}, conflicts={}, warnings={}",
            quality_score,
            conflicts.len(),
            warnings.len()
        );

        ValidationReport {
            quality_score,
            has_conflicts,
            warnings,
            conflicts,
        }
    }

    /// Count conflicts by severity
    pub fn count_by_severity(
        &self,
        conflicts: &[(String, ConflictSeverity)],
    ) -> (usize, usize, usize) {
        let mut high = 0;
        let mut medium = 0;
        let mut low = 0;

        for (_, severity) in conflicts {
            match severity {
                ConflictSeverity::High => high += 1,
                ConflictSeverity::Medium => medium += 1,
                ConflictSeverity::Low => low += 1,
            }
        }

        (high, medium, low)
    }

    /// Check if validation is acceptable (no high-severity conflicts from missing required fields)
    pub fn is_acceptable(&self, report: &ValidationReport) -> bool {
        // Check if any conflicts are about missing required fields (High severity)
        !report.conflicts.iter().any(|(msg, severity)| {
            *severity == ConflictSeverity::High && msg.contains("Missing required field")
        })
    }

    /// Get summary message from validation report
    pub fn summary_message(&self, report: &ValidationReport) -> String {
        if !report.has_conflicts && report.warnings.is_empty() {
            return format!(
                "Validation passed: {:.1}% quality",
                report.quality_score * 100.0
            );
        }

        let (high, medium, low) = self.count_by_severity(&report.conflicts);

        if high > 0 {
            format!(
                "Validation failed: {} high-severity conflict(s), {:.1}% quality",
                high,
                report.quality_score * 100.0
            )
        } else if medium > 0 {
            format!(
                "Validation warning: {} medium-severity conflict(s), {:.1}% quality",
                medium,
                report.quality_score * 100.0
            )
        } else if low > 0 {
            format!(
                "Validation passed with {} low-severity conflict(s), {:.1}% quality",
                low,
                report.quality_score * 100.0
            )
        } else {
            format!(
                "Validation passed: {} warning(s), {:.1}% quality",
                report.warnings.len(),
                report.quality_score * 100.0
            )
        }
    }
}
