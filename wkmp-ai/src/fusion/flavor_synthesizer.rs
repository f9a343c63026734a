//! Flavor Synthesizer (Tier 2 Fuser)
//!
//! Performs weighted fusion of musical flavor characteristics from multiple extractors.
//! Merges flavor vectors using confidence-weighted averaging.
//!
//! # Implementation
//! - TASK-014: Flavor Synthesizer (PLAN024)
//! - Fusion strategy: Confidence-weighted averaging per characteristic
//!
//! # Architecture
//! Implements `Fusion` trait for integration with 3-tier architecture.
//! Accepts Vec<FlavorExtraction> and produces FusedFlavor with merged characteristics.
//!
//! # Weighted Fusion
//! For each characteristic present in any source:
//! - Compute weighted average: Σ(value_i * confidence_i) / Σ(confidence_i)
//! - Track per-characteristic confidence (average of contributing source confidences)
//! - Record source blend (which extractors contributed which characteristics)
//! - Compute completeness score (present characteristics / expected characteristics)
//!
//! # Example
//! ```rust,ignore
//! use wkmp_ai::fusion::FlavorSynthesizer;
//! use wkmp_ai::types::{Fusion, FlavorExtraction};
//!
//! let synthesizer = FlavorSynthesizer::new();
//! let flavors = vec![
//!     FlavorExtraction {
//!         characteristics: [("danceability", 0.8), ("energy", 0.7)].into(),
//!         confidence: 0.9,
//!         source: "Essentia".into(),
//!     },
//!     FlavorExtraction {
//!         characteristics: [("danceability", 0.7), ("valence", 0.6)].into(),
//!         confidence: 0.6,
//!         source: "AudioDerived".into(),
//!     },
//! ];
//!
//! let fused = synthesizer.fuse(flavors).await?;
//! // danceability = (0.8*0.9 + 0.7*0.6) / (0.9 + 0.6) = 0.76
//! ```

use crate::types::{FlavorExtraction, Fusion, FusionError, FusionResult, FusedFlavor};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Flavor Synthesizer
///
/// Performs weighted fusion of musical flavor characteristics from multiple extraction sources.
/// Uses confidence-weighted averaging to merge flavor vectors.
///
/// # Fusion Strategy
/// For each characteristic (danceability, energy, valence, etc.):
/// 1. Collect all values from sources that provide this characteristic
/// 2. Compute weighted average: Σ(value_i * confidence_i) / Σ(confidence_i)
/// 3. Track per-characteristic confidence (average of contributing confidences)
/// 4. Record source blend (source → overall contribution weight)
///
/// # Completeness Scoring
/// Completeness = (present characteristics count) / (expected characteristics count)
/// Expected characteristics: 13 standard AcousticBrainz high-level features
///
/// # Example Calculation
/// Given two sources for "danceability":
/// - Source A: value=0.8, confidence=0.9
/// - Source B: value=0.7, confidence=0.6
///
/// Weighted average = (0.8 * 0.9 + 0.7 * 0.6) / (0.9 + 0.6)
///                  = (0.72 + 0.42) / 1.5
///                  = 1.14 / 1.5
///                  = 0.76
///
/// Characteristic confidence = (0.9 + 0.6) / 2 = 0.75
pub struct FlavorSynthesizer {
    /// Expected number of characteristics for completeness calculation
    /// (13 standard AcousticBrainz high-level features)
    expected_characteristic_count: usize,
}

impl FlavorSynthesizer {
    /// Create new Flavor Synthesizer with default settings
    pub fn new() -> Self {
        Self {
            expected_characteristic_count: 13, // AcousticBrainz high-level feature count
        }
    }

    /// Create Flavor Synthesizer with custom expected characteristic count
    pub fn with_expected_count(expected_count: usize) -> Self {
        Self {
            expected_characteristic_count: expected_count,
        }
    }

    /// Fuse flavor characteristics from multiple sources
    fn fuse_flavors(
        &self,
        flavor_list: Vec<FlavorExtraction>,
    ) -> Result<FusedFlavor, FusionError> {
        if flavor_list.is_empty() {
            return Ok(FusedFlavor {
                characteristics: HashMap::new(),
                confidence_map: HashMap::new(),
                source_blend: vec![],
                completeness: 0.0,
            });
        }

        debug!(
            flavor_count = flavor_list.len(),
            "Starting flavor synthesis"
        );

        // Collect all unique characteristic names
        let mut all_characteristics: Vec<String> = flavor_list
            .iter()
            .flat_map(|f| f.characteristics.keys().cloned())
            .collect();
        all_characteristics.sort();
        all_characteristics.dedup();

        debug!(
            characteristic_count = all_characteristics.len(),
            "Found unique characteristics"
        );

        // Fuse each characteristic independently using confidence-weighted averaging
        let mut fused_characteristics = HashMap::new();
        let mut confidence_map = HashMap::new();

        for char_name in &all_characteristics {
            let (fused_value, char_confidence) =
                self.fuse_characteristic(char_name, &flavor_list);

            if let Some(value) = fused_value {
                fused_characteristics.insert(char_name.clone(), value);
                confidence_map.insert(char_name.clone(), char_confidence);
            }
        }

        // Compute source blend (overall contribution of each source)
        let source_blend = self.compute_source_blend(&flavor_list);

        // Compute completeness (present / expected)
        let completeness = if self.expected_characteristic_count > 0 {
            fused_characteristics.len() as f32 / self.expected_characteristic_count as f32
        } else {
            0.0
        }
        .min(1.0); // Cap at 1.0 even if more than expected

        debug!(
            fused_count = fused_characteristics.len(),
            completeness = completeness,
            "Flavor synthesis complete"
        );

        Ok(FusedFlavor {
            characteristics: fused_characteristics,
            confidence_map,
            source_blend,
            completeness,
        })
    }

    /// Fuse a single characteristic using confidence-weighted averaging
    ///
    /// Returns: (fused_value, characteristic_confidence)
    ///
    /// Formula:
    /// - fused_value = Σ(value_i * confidence_i) / Σ(confidence_i)
    /// - characteristic_confidence = Σ(confidence_i) / N
    fn fuse_characteristic(
        &self,
        char_name: &str,
        flavors: &[FlavorExtraction],
    ) -> (Option<f32>, f32) {
        // Collect all sources that provide this characteristic
        let sources: Vec<(f32, f32)> = flavors
            .iter()
            .filter_map(|flavor| {
                flavor
                    .characteristics
                    .get(char_name)
                    .map(|&value| (value, flavor.confidence))
            })
            .collect();

        if sources.is_empty() {
            return (None, 0.0);
        }

        // Confidence-weighted average
        let weighted_sum: f32 = sources.iter().map(|(value, conf)| value * conf).sum();
        let confidence_sum: f32 = sources.iter().map(|(_, conf)| conf).sum();

        let fused_value = if confidence_sum > 0.0 {
            weighted_sum / confidence_sum
        } else {
            0.0
        };

        // Characteristic confidence is average of contributing source confidences
        let char_confidence = confidence_sum / sources.len() as f32;

        debug!(
            characteristic = char_name,
            value = fused_value,
            confidence = char_confidence,
            source_count = sources.len(),
            "Fused characteristic"
        );

        (Some(fused_value), char_confidence)
    }

    /// Compute source blend (overall contribution weight of each source)
    ///
    /// For each source, compute its overall weight based on:
    /// - Number of characteristics it provided
    /// - Its confidence score
    ///
    /// Returns: Vec of (source_name, contribution_weight) sorted by weight descending
    fn compute_source_blend(&self, flavors: &[FlavorExtraction]) -> Vec<(String, f32)> {
        let mut source_weights: HashMap<String, f32> = HashMap::new();

        for flavor in flavors {
            let contribution = flavor.characteristics.len() as f32 * flavor.confidence;
            *source_weights.entry(flavor.source.clone()).or_insert(0.0) += contribution;
        }

        // Normalize weights to sum to 1.0
        let total_weight: f32 = source_weights.values().sum();
        let mut blend: Vec<(String, f32)> = if total_weight > 0.0 {
            source_weights
                .into_iter()
                .map(|(source, weight)| (source, weight / total_weight))
                .collect()
        } else {
            source_weights
                .into_iter()
                .collect()
        };

        // Sort by weight descending
        blend.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        blend
    }
}

impl Default for FlavorSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fusion for FlavorSynthesizer {
    type Input = Vec<FlavorExtraction>;
    type Output = FusedFlavor;

    fn name(&self) -> &'static str {
        "FlavorSynthesizer"
    }

    async fn fuse(&self, inputs: Self::Input) -> Result<FusionResult<Self::Output>, FusionError> {
        debug!(input_count = inputs.len(), "Fusing flavor extractions");

        let fused_flavor = self.fuse_flavors(inputs)?;

        // Overall confidence is average of all characteristic confidences
        let confidence = if fused_flavor.confidence_map.is_empty() {
            0.0
        } else {
            fused_flavor.confidence_map.values().sum::<f32>()
                / fused_flavor.confidence_map.len() as f32
        };

        // Extract source names from source blend
        let sources: Vec<String> = fused_flavor
            .source_blend
            .iter()
            .map(|(source, weight)| format!("{} ({:.1}%)", source, weight * 100.0))
            .collect();

        Ok(FusionResult {
            output: fused_flavor,
            confidence,
            sources,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
