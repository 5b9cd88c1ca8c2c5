//! Construction-time engine configuration (§6). Validated once; every
//! size here is immutable for the engine's lifetime.

use daw_core::ConfigError;

const VALID_SAMPLE_RATES: [u32; 4] = [44_100, 48_000, 96_000, 192_000];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_frames: u32,
    pub max_voices_per_synth: usize,
    pub telemetry_capacity: usize,
    pub command_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            buffer_frames: 1024,
            max_voices_per_synth: 32,
            telemetry_capacity: 8,
            command_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(ConfigError::UnsupportedSampleRate(self.sample_rate));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(ConfigError::UnsupportedChannels(self.channels));
        }
        if !(64..=8192).contains(&self.buffer_frames) || !self.buffer_frames.is_power_of_two() {
            return Err(ConfigError::InvalidBufferFrames(self.buffer_frames));
        }
        if self.max_voices_per_synth < 8 {
            return Err(ConfigError::TooFewVoices(self.max_voices_per_synth));
        }
        if self.telemetry_capacity < 4 {
            return Err(ConfigError::TelemetryCapacityTooSmall(self.telemetry_capacity));
        }
        if self.command_capacity < 256 {
            return Err(ConfigError::CommandCapacityTooSmall(self.command_capacity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unsupported_sample_rate() {
        let cfg = EngineConfig { sample_rate: 22_050, ..EngineConfig::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::UnsupportedSampleRate(22_050)));
    }

    #[test]
    fn rejects_non_power_of_two_buffer_frames() {
        let cfg = EngineConfig { buffer_frames: 1000, ..EngineConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidBufferFrames(1000))));
    }

    #[test]
    fn rejects_too_few_voices() {
        let cfg = EngineConfig { max_voices_per_synth: 4, ..EngineConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::TooFewVoices(4))));
    }

    #[test]
    fn rejects_undersized_queues() {
        let cfg = EngineConfig { telemetry_capacity: 1, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = EngineConfig { command_capacity: 10, ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
