//! Musical-time <-> sample-time conversion.
//!
//! Ticks are the only fractional-free representation outside of this
//! module: every conversion rounds to the nearest integer at its boundary
//! rather than letting fractional ticks or frames leak into callers.

/// Pulses (ticks) per quarter note.
pub const PPQ: u32 = 480;

pub fn ticks_to_seconds(ticks: i64, bpm: f64) -> f64 {
    ticks as f64 / PPQ as f64 * 60.0 / bpm
}

pub fn seconds_to_ticks(seconds: f64, bpm: f64) -> i64 {
    (seconds * bpm / 60.0 * PPQ as f64).round() as i64
}

pub fn ticks_to_frames(ticks: i64, bpm: f64, sample_rate: u32) -> i64 {
    (ticks_to_seconds(ticks, bpm) * sample_rate as f64).round() as i64
}

pub fn frames_to_ticks(frames: i64, bpm: f64, sample_rate: u32) -> i64 {
    seconds_to_ticks(frames as f64 / sample_rate as f64, bpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_at_common_tempos() {
        for bpm in [60.0, 90.0, 120.0, 128.0, 174.0] {
            let ticks = 480 * 4; // one bar at 4/4
            let frames = ticks_to_frames(ticks, bpm, 44_100);
            let back = frames_to_ticks(frames, bpm, 44_100);
            assert!((back - ticks).abs() <= 1, "bpm={bpm} ticks={ticks} back={back}");
        }
    }

    #[test]
    fn rate_independence_of_one_block_window() {
        // bufferFrames * bpm * PPQ / (60 * sampleRate), rounded consistently;
        // rounding error bounded by 1 tick/block (SPEC_FULL §8).
        let sample_rate = 44_100u32;
        let buffer_frames = 512i64;
        for bpm in [90.0, 120.0, 140.0] {
            let start_tick = frames_to_ticks(0, bpm, sample_rate);
            let end_tick = frames_to_ticks(buffer_frames, bpm, sample_rate);
            let expected = buffer_frames as f64 * bpm * PPQ as f64 / (60.0 * sample_rate as f64);
            assert!(((end_tick - start_tick) as f64 - expected).abs() <= 1.0);
        }
    }
}
