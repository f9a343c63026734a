//! Fade processing for audio chunks
//!
//! Applies fade-in and fade-out curves to decoded audio chunks based on passage timing.
//! Maintains state across chunks for sample-accurate fade application.
//!
//! **Traceability:**
//! - [DBD-FADE-030] Pre-buffer fade-in application using passage timing
//! - [DBD-FADE-050] Pre-buffer fade-out application using passage timing
//! - [DBD-FADE-065] Use discovered endpoint for fade-out when endpoint is undefined
//! - [DBD-DEC-080] Sample-accurate fade timing
//! - [XFD-OV-020] Zero-duration timing behavior (pass-through mode)

use crate::db::passages::PassageWithTiming;
use tracing::{debug, warn};
use wkmp_common::FadeCurve;

/// Stateful fade processor for a single passage
///
/// Applies fade-in and fade-out curves to audio chunks as they pass through the pipeline.
/// Maintains frame position to ensure sample-accurate fade timing across chunk boundaries.
///
/// **[XFD-OV-020]** When fade durations are zero, operates in pass-through mode (no fades applied).
pub struct Fader {
    // Passage timing information (for debugging/logging)
    /// **Phase 4:** Timing fields reserved for passage validation diagnostics
    passage_start_ticks: i64,
    passage_end_ticks: Option<i64>,

    // Fade-in configuration
    fade_in_duration_samples: usize,
    fade_in_curve: FadeCurve,

    // Fade-out configuration
    fade_out_start_samples: usize,
    fade_out_duration_samples: usize,
    fade_out_curve: FadeCurve,

    // Total passage duration (for logging and validation)
    total_passage_duration_samples: usize,

    // State: current frame position in passage (stereo: 1 frame = 2 samples)
    current_frame: usize,

    // Sample rate (for logging conversions)
    /// **Phase 4:** Sample rate reserved for diagnostic time conversions (not yet logged)
    sample_rate: u32,

    // Pass-through mode flag (zero-duration fades)
    is_pass_through: bool,
}

impl Fader {
    /// Create a new Fader for the given passage
    ///
    /// # Arguments
    /// * `passage` - Passage timing information
    /// * `sample_rate` - Working sample rate (e.g., 44100 Hz)
    /// * `discovered_end_ticks` - Actual file endpoint discovered by decoder (for undefined endpoints)
    ///
    /// # Returns
    /// Fader configured for the passage's fade-in and fade-out curves
    pub fn new(
        passage: &PassageWithTiming,
        sample_rate: u32,
        discovered_end_ticks: Option<i64>,
    ) -> Self {
        // Calculate fade-in duration in samples
        let fade_in_duration_ticks = passage
            .fade_in_point_ticks
            .saturating_sub(passage.start_time_ticks);
        let fade_in_duration_samples =
            wkmp_common::timing::ticks_to_samples(fade_in_duration_ticks, sample_rate);

        // **[DBD-FADE-065]** Use discovered endpoint when passage endpoint is undefined
        let passage_end_ticks = if let Some(defined_end) = passage.end_time_ticks {
            debug!(
                "Using defined endpoint: {}ticks ({}ms)",
                defined_end,
                wkmp_common::timing::ticks_to_ms(defined_end)
            );
            defined_end
        } else if let Some(discovered_end) = discovered_end_ticks {
            debug!(
                "Using discovered endpoint for fades: {}ticks ({}ms)",
                discovered_end,
                wkmp_common::timing::ticks_to_ms(discovered_end)
            );
            discovered_end
        } else {
            // Fallback: should never happen in practice
            warn!("No defined or discovered endpoint available, using 10-second fallback");
            passage.start_time_ticks + wkmp_common::timing::ms_to_ticks(10000)
        };

        let passage_duration_ticks = passage_end_ticks.saturating_sub(passage.start_time_ticks);
        let passage_duration_samples =
            wkmp_common::timing::ticks_to_samples(passage_duration_ticks, sample_rate);

        // Calculate fade-out timing
        let fade_out_point_ticks = passage.fade_out_point_ticks.unwrap_or(passage_end_ticks);
        let fade_out_start_ticks = fade_out_point_ticks.saturating_sub(passage.start_time_ticks);
        let fade_out_start_samples =
            wkmp_common::timing::ticks_to_samples(fade_out_start_ticks, sample_rate);
        let fade_out_duration_samples =
            passage_duration_samples.saturating_sub(fade_out_start_samples);

        // Check if this is pass-through mode (zero-duration fades)
        // [XFD-OV-020] Zero-duration behavior
        let is_pass_through = fade_in_duration_samples == 0 && fade_out_duration_samples == 0;

        if is_pass_through {
            debug!(
                "Fader in pass-through mode (zero-duration fades): passage_duration={}ms",
                wkmp_common::timing::ticks_to_ms(passage_duration_ticks)
            );
        } else {
            debug!(
                "Fader initialized: fade_in={}samples ({}ms), fade_out_start={}samples ({}ms), \
                 fade_out_duration={}samples ({}ms), total_passage_duration={}samples ({}ms)",
                fade_in_duration_samples,
                wkmp_common::timing::ticks_to_ms(fade_in_duration_ticks),
                fade_out_start_samples,
                wkmp_common::timing::ticks_to_ms(fade_out_start_ticks),
                fade_out_duration_samples,
                wkmp_common::timing::ticks_to_ms(
                    passage_duration_ticks.saturating_sub(fade_out_start_ticks)
                ),
                passage_duration_samples,
                wkmp_common::timing::ticks_to_ms(passage_duration_ticks)
            );
        }

        Self {
            passage_start_ticks: passage.start_time_ticks,
            passage_end_ticks: Some(passage_end_ticks),
            fade_in_duration_samples,
            fade_in_curve: passage.fade_in_curve,
            fade_out_start_samples,
            fade_out_duration_samples,
            fade_out_curve: passage.fade_out_curve,
            total_passage_duration_samples: passage_duration_samples,
            current_frame: 0,
            sample_rate,
            is_pass_through,
        }
    }

    /// Process a chunk of audio, applying fades based on current position
    ///
    /// **[DBD-DEC-080]** Sample-accurate fade timing maintained across chunk boundaries.
    ///
    /// # Arguments
    /// * `samples` - Stereo interleaved samples (L, R, L, R, ...)
    ///
    /// # Returns
    /// Processed samples with fades applied (or original samples if pass-through)
    pub fn process_chunk(&mut self, mut samples: Vec<f32>) -> Vec<f32> {
        // [XFD-OV-020] Pass-through mode for zero-duration fades
        if self.is_pass_through {
            let frame_count = samples.len() / 2;
            self.current_frame += frame_count;
            return samples;
        }

        let frame_count = samples.len() / 2; // Stereo: 2 samples per frame

        // Apply fades frame by frame
        for frame_idx in 0..frame_count {
            let absolute_frame = self.current_frame + frame_idx;
            let mut fade_multiplier = 1.0;

            // **[DBD-FADE-030]** Fade-in
            if absolute_frame < self.fade_in_duration_samples {
                let fade_in_progress = if self.fade_in_duration_samples > 0 {
                    absolute_frame as f32 / self.fade_in_duration_samples as f32
                } else {
                    1.0
                };
                fade_multiplier *= self.fade_in_curve.calculate_fade_in(fade_in_progress);
            }

            // **[DBD-FADE-050]** Fade-out
            if absolute_frame >= self.fade_out_start_samples {
                let fade_out_position = absolute_frame.saturating_sub(self.fade_out_start_samples);
                let fade_out_progress = if self.fade_out_duration_samples > 0 {
                    fade_out_position as f32 / self.fade_out_duration_samples as f32
                } else {
                    1.0
                };
                fade_multiplier *= self.fade_out_curve.calculate_fade_out(fade_out_progress);
            }

            // Apply multiplier to stereo samples
            let sample_idx = frame_idx * 2;
            if sample_idx + 1 < samples.len() {
                samples[sample_idx] *= fade_multiplier; // Left
                samples[sample_idx + 1] *= fade_multiplier; // Right
            }
        }

        // Update state for next chunk
        self.current_frame += frame_count;

        samples
    }

    /// Check if this fader is in pass-through mode
    ///
    /// Returns true if both fade-in and fade-out durations are zero.
    /// **[XFD-OV-020]** Zero-duration timing behavior.
    pub fn is_pass_through(&self) -> bool {
        self.is_pass_through
    }

    /// Get current frame position (for debugging/validation)
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Get total passage duration in frames (for debugging/validation)
    ///
    /// **Phase 4:** Duration accessor reserved for diagnostics (not yet used)
    pub fn total_duration_frames(&self) -> usize {
        self.total_passage_duration_samples
    }

    /// Check if we've processed all expected frames for this passage
    ///
    /// Note: May return false positives if discovered endpoint differs from expected.
    ///
    /// **Phase 4:** Completion check reserved for diagnostics (not yet used)
    pub fn is_complete(&self) -> bool {
        self.current_frame >= self.total_passage_duration_samples
    }
}
