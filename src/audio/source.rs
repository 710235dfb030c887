use crate::error::{EchologError, Result};

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real capture hardware vs
/// WAV files vs mocks). Sources yield mono 16-bit PCM at the configured
/// sample rate.
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read the next frame of samples from the source.
    ///
    /// An empty vector means no samples are available right now. For finite
    /// sources that signals exhaustion; for live sources the caller should
    /// keep polling.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Whether this source ends on its own (file/pipe) rather than
    /// producing samples indefinitely (microphone).
    fn is_finite(&self) -> bool {
        false
    }
}

/// One phase of a mock frame sequence: the same frame repeated `count` times.
#[derive(Debug, Clone)]
pub struct FramePhase {
    pub samples: Vec<i16>,
    pub count: u32,
}

/// Mock audio source for testing.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    phases: Vec<FramePhase>,
    phase_index: usize,
    emitted_in_phase: u32,
    finite: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    read_delay: Option<std::time::Duration>,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source that emits nothing.
    pub fn new() -> Self {
        Self {
            is_started: false,
            phases: Vec::new(),
            phase_index: 0,
            emitted_in_phase: 0,
            finite: true,
            should_fail_start: false,
            should_fail_read: false,
            read_delay: None,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the frames this mock emits, phase by phase.
    pub fn with_frame_sequence(mut self, phases: Vec<FramePhase>) -> Self {
        self.phases = phases;
        self
    }

    /// Shorthand: emit the same frame `count` times.
    pub fn with_frames(self, samples: Vec<i16>, count: u32) -> Self {
        self.with_frame_sequence(vec![FramePhase { samples, count }])
    }

    /// Treat this mock as a live source (empty reads mean "keep polling").
    pub fn as_live_source(mut self) -> Self {
        self.finite = false;
        self
    }

    /// Pace frame delivery like a real device would.
    pub fn with_read_delay(mut self, delay: std::time::Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on every read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Check if the audio source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(EchologError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(EchologError::AudioCapture {
                message: self.error_message.clone(),
            });
        }

        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }

        while let Some(phase) = self.phases.get(self.phase_index) {
            if self.emitted_in_phase < phase.count {
                self.emitted_in_phase += 1;
                return Ok(phase.samples.clone());
            }
            self.phase_index += 1;
            self.emitted_in_phase = 0;
        }

        // Sequence exhausted
        Ok(Vec::new())
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}
