// PLAN023 Tier 3: Completeness Scorer
//
// Concept: Calculate quality score based on metadata completeness
// Synchronization: Accepts FusedMetadata, outputs quality score
//
// Algorithm (per SPEC_wkmp_ai_recode.md):
// 1. Count present fields (non-None values)
// 2. Weight fields by importance (required vs. optional)
// 3. Factor in field confidence scores
// 4. Compute overall completeness score [0.0, 1.0]

use crate::import_v2::types::FusedMetadata;

/// Field importance weights
#[derive(Debug, Clone)]
pub struct FieldWeights {
    pub title: f64,
    pub artist: f64,
    pub album: f64,
    pub release_date: f64,
    pub track_number: f64,
    pub duration_ms: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 1.0,         // Required
            artist: 1.0,        // Required
            album: 0.7,         // Important but not required
            release_date: 0.5,  // Optional
            track_number: 0.3,  // Optional
            duration_ms: 0.3,   // Optional
        }
    }
}

/// Completeness scorer (Tier 3 validation concept)
///
/// **Legible Software Principle:**
/// - Independent module: Pure scoring logic, no side effects
/// - Explicit synchronization: Clear contract with Tier 2 fusers
/// - Transparent behavior: Weighting formula is explicit
/// - Integrity: Score always in [0.0, 1.0] range
pub struct CompletenessScorer {
    /// Field importance weights
    weights: FieldWeights,
}

impl Default for CompletenessScorer {
    fn default() -> Self {
        Self {
            weights: FieldWeights::default(),
        }
    }
}

impl CompletenessScorer {
    /// Calculate completeness score for metadata
    ///
    /// # Algorithm: Weighted Presence + Confidence
    /// 1. For each field:
    ///    - If present: score = weight × confidence
    ///    - If absent: score = 0
    /// 2. Sum all field scores
    /// 3. Divide by sum of all weights
    /// 4. Result is in [0.0, 1.0] where 1.0 = all fields present with max confidence
    ///
    /// # Arguments
    /// * `metadata` - Fused metadata from Tier 2
    ///
    /// # Returns
    /// Completeness score in range [0.0, 1.0]
    pub fn score(&self, metadata: &FusedMetadata) -> f64 {
        let mut total_score = 0.0;
        let total_weight = self.total_weight();

        // Score each field (present fields contribute weight × confidence)
        if let Some(ref field) = metadata.title {
            total_score += self.weights.title * field.confidence;
        }

        if let Some(ref field) = metadata.artist {
            total_score += self.weights.artist * field.confidence;
        }

        if let Some(ref field) = metadata.album {
            total_score += self.weights.album * field.confidence;
        }

        if let Some(ref field) = metadata.release_date {
            total_score += self.weights.release_date * field.confidence;
        }

        if let Some(ref field) = metadata.track_number {
            total_score += self.weights.track_number * field.confidence;
        }

        if let Some(ref field) = metadata.duration_ms {
            total_score += self.weights.duration_ms * field.confidence;
        }

        // Normalize by total possible weight
        let score = if total_weight > 0.0 {
            total_score / total_weight
        } else {
            0.0
        };

        // Ensure score is in valid range [0.0, 1.0]
        score.clamp(0.0, 1.0)
    }

    /// Calculate total weight (sum of all field weights)
    fn total_weight(&self) -> f64 {
        self.weights.title
            + self.weights.artist
            + self.weights.album
            + self.weights.release_date
            + self.weights.track_number
            + self.weights.duration_ms
    }

    /// Count number of present fields
    pub fn count_present_fields(&self, metadata: &FusedMetadata) -> usize {
        let mut count = 0;

        if metadata.title.is_some() {
            count += 1;
        }
        if metadata.artist.is_some() {
            count += 1;
        }
        if metadata.album.is_some() {
            count += 1;
        }
        if metadata.release_date.is_some() {
            count += 1;
        }
        if metadata.track_number.is_some() {
            count += 1;
        }
        if metadata.duration_ms.is_some() {
            count += 1;
        }

        count
    }

    /// Check if required fields are present (title + artist)
    pub fn has_required_fields(&self, metadata: &FusedMetadata) -> bool {
        metadata.title.is_some() && metadata.artist.is_some()
    }
}
