//! Audio acquisition and chunk assembly.

pub mod assembler;
pub mod source;
pub mod wav;

pub use assembler::ChunkAssembler;
pub use source::{AudioSource, FramePhase, MockAudioSource};
pub use wav::{WavAudioSource, encode_wav};
