//! Noise suppression for voice pipeline.
//!
//! Reduces background noise from mic input to improve STT accuracy.
//! Current implementation: stub (passthrough).

use serde::{Deserialize, Serialize};

/// Configuration for noise suppression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseSuppressorConfig {
    /// Enable noise suppression.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Suppression aggressiveness (0 = gentle, 3 = aggressive).
    #[serde(default = "default_aggressiveness")]
    pub aggressiveness: u8,
}

fn default_true() -> bool {
    true
}
fn default_aggressiveness() -> u8 {
    2
}

impl Default for NoiseSuppressorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            aggressiveness: 2,
        }
    }
}

/// Noise suppressor state.
pub struct NoiseSuppressor {
    config: NoiseSuppressorConfig,
    /// Estimated noise floor level.
    noise_floor: f32,
    /// Number of processed frames.
    frames_processed: u64,
}

impl NoiseSuppressor {
    /// Create a new noise suppressor with the given configuration.
    pub fn new(config: NoiseSuppressorConfig) -> Self {
        Self {
            config,
            noise_floor: 0.0,
            frames_processed: 0,
        }
    }

    /// Process audio frame, suppressing noise.
    /// Currently a passthrough stub.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        self.frames_processed += 1;
        if !self.config.enabled {
            return input.to_vec();
        }
        // Update noise floor estimate (simple exponential moving average)
        if !input.is_empty() {
            let rms = (input.iter().map(|s| s * s).sum::<f32>()
                / input.len() as f32)
                .sqrt();
            self.noise_floor = 0.95 * self.noise_floor + 0.05 * rms;
        }
        // STUB: Real noise suppression would use spectral subtraction or RNNoise
        input.to_vec()
    }

    /// Get the current estimated noise floor.
    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Get number of frames processed.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Reset the noise suppressor state.
    pub fn reset(&mut self) {
        self.noise_floor = 0.0;
        self.frames_processed = 0;
    }
}
