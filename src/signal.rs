use crate::error::AnalysisError;

/// A decoded multi-channel recording, stored as one sample vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl Signal {
    /// Build a signal from deinterleaved channels.
    ///
    /// Rejects a zero sample rate, an empty channel list, and channels of unequal length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSignal(
                "sample rate must be positive".to_string(),
            ));
        }
        let Some(first) = channels.first() else {
            return Err(AnalysisError::InvalidSignal(
                "signal has no channels".to_string(),
            ));
        };
        let frames = first.len();
        if let Some(pos) = channels.iter().position(|ch| ch.len() != frames) {
            return Err(AnalysisError::InvalidSignal(format!(
                "channel {} has {} samples, expected {}",
                pos + 1,
                channels[pos].len(),
                frames
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples in each channel.
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Mix all channels down to a single channel at the same sample rate.
    ///
    /// Mono is copied, stereo, quad and 5.1 use the usual speaker-layout
    /// coefficients (LFE is discarded), anything else is a plain average.
    pub fn downmix(&self) -> Signal {
        let frames = self.frames();
        let ch = &self.channels;
        let mono: Vec<f32> = match ch.len() {
            1 => ch[0].clone(),
            2 => (0..frames).map(|i| 0.5 * (ch[0][i] + ch[1][i])).collect(),
            4 => (0..frames)
                .map(|i| 0.25 * (ch[0][i] + ch[1][i] + ch[2][i] + ch[3][i]))
                .collect(),
            6 => (0..frames)
                .map(|i| {
                    std::f32::consts::FRAC_1_SQRT_2 * (ch[0][i] + ch[1][i])
                        + ch[2][i]
                        + 0.5 * (ch[4][i] + ch[5][i])
                })
                .collect(),
            n => {
                let scale = 1.0 / n as f32;
                (0..frames)
                    .map(|i| ch.iter().map(|c| c[i]).sum::<f32>() * scale)
                    .collect()
            }
        };
        Signal {
            sample_rate: self.sample_rate,
            channels: vec![mono],
        }
    }
}

/// Display label for a source channel, following common speaker layouts.
pub fn channel_label(index: usize, channel_count: usize) -> String {
    const QUAD: [&str; 4] = ["FL", "FR", "RL", "RR"];
    const SURROUND: [&str; 6] = ["L", "R", "C", "LFE", "SL", "SR"];

    match (channel_count, index) {
        (1, 0) => "Mono".to_string(),
        (2, 0) => "Left".to_string(),
        (2, 1) => "Right".to_string(),
        (4, i) if i < 4 => QUAD[i].to_string(),
        (6, i) if i < 6 => SURROUND[i].to_string(),
        (_, i) => format!("Ch {}", i + 1),
    }
}
