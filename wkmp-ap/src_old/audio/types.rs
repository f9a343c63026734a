//! Core audio data types
//!
//! Defines structures for audio buffers and frames used throughout the audio pipeline.
//!
//! **Traceability:**
//! - [SSD-FBUF-010] Full buffer contains entire passage in RAM
//! - [SSD-FBUF-020] All audio normalized to 44100 Hz
//! - [SSD-BUF-020] Buffer state transitions for event emission

use uuid::Uuid;

/// PassageBuffer holds decoded and resampled audio data ready for playback.
///
/// **[SSD-FBUF-010]** Full buffer contains entire passage in RAM for sample-accurate
/// seeking and crossfade operations.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Sample rate always 44100 Hz after resampling
#[derive(Debug, Clone)]
pub struct PassageBuffer {
    /// Passage UUID from database
    pub passage_id: Uuid,

    /// PCM audio samples (interleaved stereo)
    /// Index pattern: 0=left, 1=right, 2=left, 3=right, etc.
    pub samples: Vec<f32>,

    /// Sample rate (always 44100 after resampling)
    /// **[SSD-FBUF-020]** Standard rate for all playback
    pub sample_rate: u32,

    /// Channel count (always 2 for stereo)
    pub channel_count: u16,

    /// Number of stereo frames (samples.len() / 2)
    pub sample_count: usize,

    /// **[PCF-DUR-010]** Flag indicating if decode is complete
    /// When true, duration is cached and won't change even if buffer grows
    pub decode_complete: bool,

    /// **[PCF-COMP-010]** Total frames when decode completes (sentinel for completion)
    /// Set by finalize(), used for race-free exhaustion detection
    pub total_frames: Option<usize>,

    /// **[PCF-DUR-010]** Cached duration when decode completes
    /// Prevents duration from growing after decode finishes
    pub total_duration_ms: Option<u64>,
}

impl PassageBuffer {
    /// Create a new PassageBuffer from decoded and resampled audio data
    pub fn new(passage_id: Uuid, samples: Vec<f32>, sample_rate: u32, channel_count: u16) -> Self {
        let sample_count = samples.len() / channel_count as usize;

        Self {
            passage_id,
            samples,
            sample_rate,
            channel_count,
            sample_count,
            decode_complete: false,        // [PCF-DUR-010] Initially false, set by finalize()
            total_frames: None,            // [PCF-COMP-010] Set when decode completes
            total_duration_ms: None,       // [PCF-DUR-010] Cached when decode completes
        }
    }

    /// Get duration in milliseconds
    ///
    /// **[PCF-DUR-010]** After finalize() is called, returns cached duration
    /// to prevent duration from growing as buffer is appended to.
    pub fn duration_ms(&self) -> u64 {
        self.total_duration_ms.unwrap_or_else(|| {
            (self.sample_count as u64 * 1000) / self.sample_rate as u64
        })
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.sample_count as f32 / self.sample_rate as f32
    }

    /// Get audio frame at specific frame index
    pub fn get_frame(&self, frame_index: usize) -> Option<AudioFrame> {
        let sample_index = frame_index * 2;
        if sample_index + 1 < self.samples.len() {
            Some(AudioFrame {
                left: self.samples[sample_index],
                right: self.samples[sample_index + 1],
            })
        } else {
            None
        }
    }

    /// Append samples to buffer (for incremental decode)
    ///
    /// [SSD-PBUF-028] Support for partial buffer playback
    /// Allows decoder to progressively fill buffer as it decodes.
    ///
    /// # Arguments
    /// * `new_samples` - Stereo interleaved samples to append
    ///
    /// # Panics
    /// Panics if new_samples length is not even (must be stereo pairs)
    pub fn append_samples(&mut self, new_samples: Vec<f32>) {
        assert_eq!(new_samples.len() % 2, 0, "Samples must be stereo pairs");

        self.samples.extend(new_samples);
        self.sample_count = self.samples.len() / self.channel_count as usize;
    }

    /// Reserve capacity for expected total samples
    ///
    /// Optimization to reduce reallocations during incremental decode
    pub fn reserve_capacity(&mut self, total_frames: usize) {
        let total_samples = total_frames * self.channel_count as usize;
        self.samples.reserve(total_samples.saturating_sub(self.samples.len()));
    }

    /// Finalize buffer after decode completes
    ///
    /// **[PCF-DUR-010][PCF-COMP-010]** Sets the completion sentinel and caches duration.
    /// After finalize() is called:
    /// - `decode_complete` is true
    /// - `total_frames` holds the final frame count
    /// - `total_duration_ms` holds the cached duration
    /// - `duration_ms()` will return cached value even if buffer grows
    /// - `is_exhausted()` can accurately detect completion
    ///
    /// This method should be called by decoder when it reaches end of file.
    pub fn finalize(&mut self) {
        self.decode_complete = true;
        self.total_frames = Some(self.sample_count);
        self.total_duration_ms = Some(
            (self.sample_count as u64 * 1000) / self.sample_rate as u64
        );
    }

    /// Check if playback position has exhausted all available audio
    ///
    /// **[PCF-COMP-010]** Race-free completion detection using cached total_frames.
    ///
    /// Returns true if:
    /// - Decode is complete (finalized) AND
    /// - Position >= total_frames
    ///
    /// Returns false if decode is not yet complete (cannot be exhausted until
    /// we know the final length).
    ///
    /// # Arguments
    /// * `position` - Current playback position in frames
    pub fn is_exhausted(&self, position: usize) -> bool {
        if let Some(total) = self.total_frames {
            position >= total
        } else {
            false
        }
    }
}

/// AudioFrame represents a single stereo sample (one frame of audio).
///
/// Used for passing audio data between mixer and output device.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame { left: 0.0, right: 0.0 }
    }

    /// Create a frame from mono sample (duplicate to both channels)
    pub fn from_mono(sample: f32) -> Self {
        AudioFrame { left: sample, right: sample }
    }

    /// Create a frame from left and right samples
    pub fn from_stereo(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }

    /// Apply volume scaling to both channels
    pub fn apply_volume(&mut self, volume: f32) {
        self.left *= volume;
        self.right *= volume;
    }

    /// Add another frame to this frame (for mixing)
    pub fn add(&mut self, other: &AudioFrame) {
        self.left += other.left;
        self.right += other.right;
    }

    /// Clamp samples to valid range [-1.0, 1.0] to prevent clipping
    pub fn clamp(&mut self) {
        self.left = self.left.clamp(-1.0, 1.0);
        self.right = self.right.clamp(-1.0, 1.0);
    }
}

/// BufferStatus tracks buffer decode/playback state.
///
/// **[SSD-BUF-020]** Buffer state transitions for event emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferStatus {
    /// Buffer is currently being decoded
    Decoding {
        /// Decode progress percentage (0-100)
        progress_percent: u8
    },

    /// Buffer is fully decoded and ready for playback
    Ready,

    /// Buffer is currently being played
    Playing,

    /// Buffer has been fully consumed (playback complete)
    Exhausted,
}
