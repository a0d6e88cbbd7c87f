//! Audio quality monitoring for voice pipeline.
//!
//! Provides real-time metrics: RMS level, peak level, clipping detection,
//! signal-to-noise ratio estimation.

/// Audio quality metrics for a single frame.
#[derive(Debug, Clone, Default)]
pub struct AudioMetrics {
    /// Root mean square level (0.0 - 1.0 for normalized audio).
    pub rms_level: f32,
    /// Peak absolute sample value.
    pub peak_level: f32,
    /// Whether clipping was detected (samples at +/-1.0).
    pub clipping_detected: bool,
    /// Number of clipped samples in frame.
    pub clipped_sample_count: usize,
    /// Estimated signal-to-noise ratio in dB (higher is better).
    pub estimated_snr_db: f32,
}

/// Computes audio quality metrics for a frame of samples.
///
/// # Arguments
/// * `samples` - Audio samples (typically normalized to -1.0..1.0)
/// * `noise_floor` - Estimated noise floor level from NoiseSuppressor
///
/// # Returns
/// `AudioMetrics` with computed values for the frame.
pub fn analyze_frame(samples: &[f32], noise_floor: f32) -> AudioMetrics {
    if samples.is_empty() {
        return AudioMetrics::default();
    }

    let rms = (samples.iter().map(|s| s * s).sum::<f32>()
        / samples.len() as f32)
        .sqrt();
    let peak = samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0f32, f32::max);

    let clipping_threshold = 0.99;
    let clipped = samples
        .iter()
        .filter(|s| s.abs() >= clipping_threshold)
        .count();

    let snr = if noise_floor > 0.0001 {
        20.0 * (rms / noise_floor).log10()
    } else {
        60.0 // Assume good SNR if no noise
    };

    AudioMetrics {
        rms_level: rms,
        peak_level: peak,
        clipping_detected: clipped > 0,
        clipped_sample_count: clipped,
        estimated_snr_db: snr.clamp(-20.0, 80.0),
    }
}
