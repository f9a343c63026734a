// PLAN023 Tier 2: Musical Flavor Synthesizer
//
// Concept: Fuse multiple musical flavor extractions using characteristic-wise weighted averaging
// Synchronization: Accepts Vec<FlavorExtraction> from Tier 1, outputs SynthesizedFlavor
//
// Algorithm (per SPEC_wkmp_ai_recode.md):
// 1. Group extractions by characteristic name
// 2. For each characteristic, compute weighted average of dimension probabilities
// 3. Normalize to ensure sum = 1.0 per category
// 4. Calculate overall confidence and completeness

use crate::import_v2::types::{
    Characteristic, ExtractionSource, FlavorExtraction, ImportError, ImportResult,
    MusicalFlavor, SynthesizedFlavor,
};
use std::collections::HashMap;

/// Musical Flavor Synthesizer (Tier 2 fusion concept)
///
/// **Legible Software Principle:**
/// - Explicit synchronization: Clear contract with Tier 1 extractors
/// - Transparency: Weighted averaging algorithm is explicit
/// - Integrity: Maintains normalization invariant (sum to 1.0)
/// - Independence: No side effects, pure fusion logic
pub struct FlavorSynthesizer {
    /// Minimum confidence threshold for considering a source
    min_confidence: f64,
    /// Normalization tolerance (for validation)
    normalization_tolerance: f64,
}

impl Default for FlavorSynthesizer {
    fn default() -> Self {
        Self {
            min_confidence: 0.1, // Ignore sources with confidence < 0.1
            normalization_tolerance: 0.0001, // per CRITICAL-002
        }
    }
}

impl FlavorSynthesizer {
    /// Synthesize musical flavor from multiple extractions
    ///
    /// # Algorithm
    /// 1. Filter out low-confidence sources (< min_confidence)
    /// 2. Group extractions by characteristic name
    /// 3. For each characteristic:
    ///    a. Collect all dimension → probability mappings from all sources
    ///    b. Compute weighted average: avg = Σ(prob_i * conf_i) / Σ(conf_i)
    ///    c. Normalize to sum to 1.0
    /// 4. Calculate overall confidence (weighted average of source confidences)
    /// 5. Calculate completeness (present_characteristics / 18)
    ///
    /// # Returns
    /// SynthesizedFlavor with fused characteristics, confidence, and provenance
    ///
    /// # Errors
    /// Returns error if no valid sources or normalization fails
    pub fn synthesize(
        &self,
        extractions: Vec<FlavorExtraction>,
    ) -> ImportResult<SynthesizedFlavor> {
        if extractions.is_empty() {
            return Err(ImportError::FusionFailed(
                "No flavor extractions provided".to_string(),
            ));
        }

        // Filter low-confidence sources
        let valid_extractions: Vec<&FlavorExtraction> = extractions
            .iter()
            .filter(|e| e.confidence >= self.min_confidence)
            .collect();

        if valid_extractions.is_empty() {
            return Err(ImportError::FusionFailed(
                "All flavor extractions below confidence threshold".to_string(),
            ));
        }

        tracing::debug!(
            "Synthesizing flavor from {} sources: {:?}",
            valid_extractions.len(),
            valid_extractions.iter().map(|e| e.source).collect::<Vec<_>>()
        );

        // Group characteristics by name across all sources
        let mut char_groups: HashMap<String, Vec<(&Characteristic, f64)>> = HashMap::new();

        for extraction in &valid_extractions {
            for char in &extraction.flavor.characteristics {
                char_groups
                    .entry(char.name.clone())
                    .or_default()
                    .push((char, extraction.confidence));
            }
        }

        // Fuse each characteristic group
        let mut fused_characteristics = Vec::new();

        for (char_name, sources) in char_groups {
            let fused_char = self.fuse_characteristic(&char_name, sources)?;
            fused_characteristics.push(fused_char);
        }

        // Calculate overall confidence (weighted average)
        let total_confidence: f64 = valid_extractions.iter().map(|e| e.confidence).sum();
        let flavor_confidence = total_confidence / valid_extractions.len() as f64;

        // Create synthesized flavor
        let flavor = MusicalFlavor {
            characteristics: fused_characteristics,
        };

        // Validate
        if !flavor.validate() {
            tracing::error!("Synthesized flavor failed validation (non-normalized characteristics)");
            return Err(ImportError::FusionFailed(
                "Flavor normalization validation failed".to_string(),
            ));
        }

        let flavor_completeness = flavor.completeness();
        let sources_used: Vec<ExtractionSource> =
            valid_extractions.iter().map(|e| e.source).collect();

        tracing::info!(
            "Synthesized flavor: {} characteristics ({:.1}% complete), confidence {:.2}",
            flavor.count_present(),
            flavor_completeness * 100.0,
            flavor_confidence
        );

        Ok(SynthesizedFlavor {
            flavor,
            flavor_confidence,
            flavor_completeness,
            sources_used,
        })
    }

    /// Fuse a single characteristic from multiple sources using weighted averaging
    ///
    /// # Algorithm
    /// For each dimension in the characteristic:
    ///   weighted_prob = Σ(prob_i * confidence_i) / Σ(confidence_i)
    ///
    /// Then normalize to ensure sum = 1.0
    fn fuse_characteristic(
        &self,
        name: &str,
        sources: Vec<(&Characteristic, f64)>,
    ) -> ImportResult<Characteristic> {
        // Collect all unique dimensions across sources
        let mut all_dimensions: HashMap<String, Vec<(f64, f64)>> = HashMap::new();

        for (char, confidence) in sources {
            for (dimension, &prob) in &char.values {
                all_dimensions
                    .entry(dimension.clone())
                    .or_default()
                    .push((prob, confidence));
            }
        }

        // Compute weighted average for each dimension
        let mut fused_values = HashMap::new();

        for (dimension, prob_conf_pairs) in all_dimensions {
            let weighted_sum: f64 = prob_conf_pairs
                .iter()
                .map(|(prob, conf)| prob * conf)
                .sum();

            let confidence_sum: f64 = prob_conf_pairs.iter().map(|(_, conf)| conf).sum();

            let weighted_avg = if confidence_sum > 0.0 {
                weighted_sum / confidence_sum
            } else {
                0.0
            };

            fused_values.insert(dimension, weighted_avg);
        }

        // Create characteristic and normalize
        let mut characteristic = Characteristic {
            name: name.to_string(),
            values: fused_values,
        };

        characteristic.normalize();

        // Validate normalization
        if !characteristic.is_normalized() {
            tracing::warn!(
                "Characteristic '{}' normalization outside tolerance: sum = {:.6}",
                name,
                characteristic.values.values().sum::<f64>()
            );
        }

        Ok(characteristic)
    }
}
