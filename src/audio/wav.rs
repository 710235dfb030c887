//! WAV encoding for chunk uploads and a WAV-backed audio source.

use crate::audio::source::AudioSource;
use crate::defaults::{FRAME_SAMPLES, SAMPLE_RATE};
use crate::error::{EchologError, Result};
use std::io::{Cursor, Read};
use std::path::Path;

/// Encode PCM samples as a complete WAV container (header + payload).
///
/// This is the audio body uploaded to the transcription service: mono,
/// 16-bit signed, at the given sample rate.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| EchologError::AudioCapture {
                message: format!("Failed to create WAV writer: {}", e),
            })?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| EchologError::AudioCapture {
                    message: format!("Failed to encode WAV sample: {}", e),
                })?;
        }
        writer.finalize().map_err(|e| EchologError::AudioCapture {
            message: format!("Failed to finalize WAV data: {}", e),
        })?;
    }

    Ok(cursor.into_inner())
}

/// Audio source backed by a decoded WAV body.
///
/// Accepts mono or stereo input at any rate; everything is normalized to
/// the pipeline format up front, and `read_samples` then just slices frames
/// off the normalized buffer.
pub struct WavAudioSource {
    samples: Vec<i16>,
    position: usize,
    frame_samples: usize,
}

impl WavAudioSource {
    /// Decodes and normalizes a complete WAV body from `reader`.
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| EchologError::AudioCapture {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(EchologError::AudioFormatMismatch {
                expected: "16-bit integer PCM".to_string(),
                actual: format!("{}-bit {:?}", spec.bits_per_sample, spec.sample_format),
            });
        }
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EchologError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        let mono_samples = match source_channels {
            2 => downmix_stereo(&raw_samples),
            _ => raw_samples,
        };
        let samples = resample(&mono_samples, source_rate, SAMPLE_RATE);

        Ok(Self {
            samples,
            position: 0,
            frame_samples: FRAME_SAMPLES,
        })
    }

    /// Create from a WAV file on disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(Box::new(std::io::BufReader::new(file)))
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        // Read all data from stdin into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| EchologError::AudioCapture {
                message: format!("Failed to read from stdin: {}", e),
            })?;

        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Override the per-read frame size.
    pub fn with_frame_samples(mut self, frame_samples: usize) -> Self {
        self.frame_samples = frame_samples.max(1);
        self
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        let end = (self.position + self.frame_samples).min(self.samples.len());
        let frame = self.samples[self.position..end].to_vec();
        self.position = end;
        // Empty frame signals exhaustion to the capture loop
        Ok(frame)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Averages interleaved L/R pairs into one mono stream.
fn downmix_stereo(samples: &[i16]) -> Vec<i16> {
    samples
        .chunks_exact(2)
        .map(|pair| ((pair[0] as i32 + pair[1] as i32) / 2) as i16)
        .collect()
}

/// Linear-interpolation rate conversion. Speech uploads tolerate the
/// interpolation artifacts; a filtered resampler is not worth carrying.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let step = from_rate as f64 / to_rate as f64;
    let mut out = Vec::with_capacity((samples.len() as f64 / step).ceil() as usize);
    let mut pos = 0.0f64;
    while pos < samples.len() as f64 {
        let idx = pos as usize;
        let frac = pos - idx as f64;
        let here = samples[idx] as f64;
        let next = samples.get(idx + 1).copied().unwrap_or(samples[idx]) as f64;
        out.push((here + (next - here) * frac).round() as i16);
        pos += step;
    }
    out
}
