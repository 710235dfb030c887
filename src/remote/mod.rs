//! Remote service clients and environment probes.

pub mod connectivity;
pub mod llm;
pub mod resources;
pub mod stt;

pub use connectivity::{AssumeOnline, Connectivity, MockConnectivity, TcpProbe};
pub use llm::{ChatCompleter, HttpChatCompleter, MockChatCompleter};
pub use resources::{MockResources, ResourceProbe, SystemResources};
pub use stt::{HttpSpeechToText, MockSpeechToText, SpeechToText};
