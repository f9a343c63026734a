//! Tier 1 Source Extractors
//!
//! Implements 7 independent extractors for parallel execution.
//! Each extractor implements the `SourceExtractor` trait from `types` module.
//!
//! # Architecture
//! Per PLAN024 3-tier hybrid fusion:
//! - **Tier 1:** Extract raw data from multiple sources (THIS MODULE)
//! - **Tier 2:** Fuse extracted data with confidence weighting
//! - **Tier 3:** Validate fused results
//!
//! # Extractors
//! 1. **id3_extractor** - Extract ID3 metadata tags
//! 2. **chromaprint_analyzer** - Generate Chromaprint fingerprints
//! 3. **acoustid_client** - Query fingerprint → Recording MBID
//! 4. **musicbrainz_client** - Query MBID → Recording metadata
//! 5. **essentia_analyzer** - Extract musical features (optional, command execution)
//! 6. **audio_derived_extractor** - Algorithmic feature extraction (DSP)
//! 7. **id3_genre_mapper** - Map ID3 genre → musical flavor characteristics
//!
//! # Parallel Execution
//! All extractors run independently and report failures via per-passage error isolation.
//! Failed extractors do not block other extractors or the overall import process.
//!
//! # Implementation Status
//! - ✅ TASK-004: Base traits defined
//! - ⏳ TASK-005: ID3 Extractor
//! - ⏳ TASK-006: Chromaprint Analyzer
//! - ⏳ TASK-007: AcoustID Client
//! - ⏳ TASK-008: MusicBrainz Client
//! - ⏳ TASK-009: Essentia Analyzer
//! - ⏳ TASK-010: AudioDerived Extractor
//! - ⏳ TASK-011: ID3 Genre Mapper

// Module declarations (implemented extractors)
pub mod id3_extractor;           // TASK-005 ✅
pub mod chromaprint_analyzer;    // TASK-006 ✅
pub mod acoustid_client;         // TASK-007 ✅
pub mod musicbrainz_client;      // TASK-008 ✅
pub mod essentia_analyzer;       // TASK-009 ✅
pub mod audio_derived_extractor; // TASK-010 ✅
pub mod id3_genre_mapper;        // TASK-011 ✅

// All 7 Tier 1 extractors complete! ✅

use crate::types::{ExtractionResult, PassageContext, SourceExtractor};
#[cfg(test)]
use crate::types::ExtractionError;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parallel extractor executor
///
/// Runs all extractors concurrently and collects results.
/// Per-passage error isolation: individual extractor failures do not fail the entire batch.
///
/// # Example
/// ```rust,ignore
/// use wkmp_ai::extractors::ParallelExtractor;
/// use wkmp_ai::types::PassageContext;
///
/// let extractors: Vec<Arc<dyn SourceExtractor>> = vec![
///     Arc::new(ID3Extractor),
///     Arc::new(ChromaprintAnalyzer::new()),
///     // ... more extractors
/// ];
///
/// let executor = ParallelExtractor::new(extractors);
/// let results = executor.extract_all(&passage_ctx).await;
///
/// // Results contains successful extractions, failures logged but not propagated
/// for result in results {
///     println!("Extracted from {}: {:?}", result.extractor_name, result.data);
/// }
/// ```
pub struct ParallelExtractor {
    extractors: Vec<Arc<dyn SourceExtractor>>,
}

impl ParallelExtractor {
    /// Create new parallel extractor with given extractors
    pub fn new(extractors: Vec<Arc<dyn SourceExtractor>>) -> Self {
        Self { extractors }
    }

    /// Extract from all sources concurrently
    ///
    /// # Arguments
    /// * `ctx` - Passage context for extraction
    ///
    /// # Returns
    /// Vec of successful extraction results with extractor names.
    /// Failures are logged but not returned (per-passage error isolation).
    pub async fn extract_all(&self, ctx: &PassageContext) -> Vec<ExtractionOutput> {
        let futures = self.extractors.iter().map(|extractor| {
            let extractor = Arc::clone(extractor);
            let ctx = ctx.clone();
            async move {
                let name = extractor.name();
                match extractor.extract(&ctx).await {
                    Ok(result) => {
                        debug!(
                            extractor = name,
                            passage_id = %ctx.passage_id,
                            "Extraction successful"
                        );
                        Some(ExtractionOutput {
                            extractor_name: name.to_string(),
                            data: result,
                            confidence: extractor.base_confidence(),
                        })
                    }
                    Err(e) => {
                        warn!(
                            extractor = name,
                            passage_id = %ctx.passage_id,
                            error = %e,
                            "Extraction failed (per-passage error isolation)"
                        );
                        None
                    }
                }
            }
        });

        join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Get extractor count
    pub fn count(&self) -> usize {
        self.extractors.len()
    }
}

/// Extraction output with extractor metadata
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    /// Name of extractor that produced this output
    pub extractor_name: String,
    /// Extracted data
    pub data: ExtractionResult,
    /// Base confidence of extractor
    pub confidence: f32,
}

// ============================================================================
// Mock Extractor for Testing
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
