// Decoded track storage: stereo f32 frames at the output stream's rate.

use std::path::Path;

// The smallest unit of audio; one stereo frame
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

#[derive(Clone, Debug)]
pub struct TrackBuffer {
    pub data: Vec<StereoFrame>,
    pub sample_rate: u32,
}

impl TrackBuffer {
    pub fn duration_seconds(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64
    }

    // Load a WAV file from disk, converting to stereo f32 at target_rate
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let file_rate = spec.sample_rate;
        let file_channels = spec.channels;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                // scale ints down to -1..1
                let max = (1i32 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let mut frames: Vec<StereoFrame> = if file_channels == 1 {
            samples
                .into_iter()
                .map(|x| StereoFrame { left: x, right: x })
                .collect()
        } else {
            // take the first two channels, ignore the rest
            samples
                .chunks_exact(file_channels as usize)
                .map(|c| StereoFrame {
                    left: c[0],
                    right: if c.len() > 1 { c[1] } else { c[0] },
                })
                .collect()
        };

        if file_rate != target_rate {
            frames = resample_linear(&frames, file_rate, target_rate);
        }

        Ok(Self { data: frames, sample_rate: target_rate })
    }
}

// simple linear resampler; fine for playback, nobody is mastering here
fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;
        if idx >= frames.len().saturating_sub(1) {
            out.push(*frames.last().unwrap_or(&StereoFrame::default()));
        } else {
            let a = frames[idx];
            let b = frames[idx + 1];
            out.push(StereoFrame {
                left: a.left * (1.0 - frac) + b.left * frac,
                right: a.right * (1.0 - frac) + b.right * frac,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_frame_count() {
        let buffer = TrackBuffer {
            data: vec![StereoFrame::default(); 44100 * 2],
            sample_rate: 44100,
        };
        assert_eq!(buffer.duration_seconds(), 2.0);
    }

    #[test]
    fn resample_scales_length() {
        let frames = vec![StereoFrame { left: 1.0, right: 1.0 }; 1000];
        let out = resample_linear(&frames, 22050, 44100);
        assert_eq!(out.len(), 2000);
    }
}
