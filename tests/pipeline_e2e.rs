//! End-to-end pipeline scenarios with mocked remote services.

use chrono::{Local, TimeZone};
use echolog::audio::{FramePhase, MockAudioSource, WavAudioSource, encode_wav};
use echolog::pipeline::{Pipeline, PipelineConfig, Services};
use echolog::query::{NO_DATA_MESSAGE, QueryEngine};
use echolog::remote::{MockChatCompleter, MockConnectivity, MockResources, MockSpeechToText};
use echolog::store::{QueryFilter, TranscriptRecord, TranscriptStore};
use std::sync::{Arc, RwLock};
use std::time::Duration;

fn services(stt: MockSpeechToText, llm: MockChatCompleter) -> Services {
    Services {
        stt: Arc::new(stt),
        llm: Arc::new(llm),
        connectivity: Arc::new(MockConnectivity::online()),
        resources: Arc::new(MockResources::ample()),
    }
}

fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        sample_rate: 1000,
        chunk_seconds: 1,
        retry_pause: Duration::ZERO,
        flush_deadline: Duration::from_secs(5),
        stop_deadline: Duration::from_secs(10),
        ..Default::default()
    }
}

fn temp_store(dir: &tempfile::TempDir) -> Arc<RwLock<TranscriptStore>> {
    Arc::new(RwLock::new(TranscriptStore::open(
        &dir.path().join("transcripts.json"),
        100,
        25,
    )))
}

#[test]
fn capture_to_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    // Three seconds of audio at the test rate: three full chunks
    let source = MockAudioSource::new()
        .with_frame_sequence(vec![FramePhase {
            samples: vec![200i16; 500],
            count: 6,
        }])
        .with_read_delay(Duration::from_millis(5));
    let handle = Pipeline::new(pipeline_config())
        .start(
            Box::new(source),
            services(
                MockSpeechToText::new().with_response("we talked about the launch"),
                MockChatCompleter::new().with_response("Launch discussion"),
            ),
            store.clone(),
        )
        .unwrap();
    handle.wait();

    let store = store.read().unwrap();
    assert_eq!(store.len(), 3);
    let latest = store.latest().unwrap();
    assert_eq!(latest.transcription, "we talked about the launch");
    assert_eq!(latest.summary, "Launch discussion");
    assert_eq!(latest.duration_secs, 1);
    assert_eq!(latest.timestamp.len(), 19);
    assert!(latest.unix_timestamp > 0);

    // Records survive a reload from disk
    let reloaded = TranscriptStore::open(&dir.path().join("transcripts.json"), 100, 25);
    assert_eq!(reloaded.len(), 3);
}

#[test]
fn wav_source_feeds_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    // 32000 samples at 16 kHz: one 30 s chunk config would never fill, so
    // use 2 s chunks and expect one full chunk plus no usable remainder.
    let wav = encode_wav(&vec![150i16; 32000], 16000).unwrap();
    let source = WavAudioSource::from_reader(Box::new(std::io::Cursor::new(wav))).unwrap();

    let config = PipelineConfig {
        sample_rate: 16000,
        chunk_seconds: 2,
        retry_pause: Duration::ZERO,
        ..Default::default()
    };
    let handle = Pipeline::new(config)
        .start(
            Box::new(source),
            services(
                MockSpeechToText::new().with_response("from a wav file"),
                MockChatCompleter::new().with_response("wav summary"),
            ),
            store.clone(),
        )
        .unwrap();
    handle.wait();

    let store = store.read().unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.latest().unwrap().transcription, "from a wav file");
    assert_eq!(store.latest().unwrap().duration_secs, 2);
}

#[test]
fn transcription_retries_twice_then_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let stt = Arc::new(
        MockSpeechToText::new()
            .with_transport_failures(2)
            .with_response("third time lucky"),
    );
    let source = MockAudioSource::new().with_frame_sequence(vec![FramePhase {
        samples: vec![100i16; 1000],
        count: 1,
    }]);
    let handle = Pipeline::new(pipeline_config())
        .start(
            Box::new(source),
            Services {
                stt: stt.clone(),
                llm: Arc::new(MockChatCompleter::new().with_response("summary")),
                connectivity: Arc::new(MockConnectivity::online()),
                resources: Arc::new(MockResources::ample()),
            },
            store.clone(),
        )
        .unwrap();
    handle.wait();

    assert_eq!(stt.calls(), 3);
    let store = store.read().unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.latest().unwrap().transcription, "third time lucky");
}

#[test]
fn summarization_failure_stores_marker_not_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let source = MockAudioSource::new().with_frame_sequence(vec![FramePhase {
        samples: vec![100i16; 1000],
        count: 1,
    }]);
    let handle = Pipeline::new(pipeline_config())
        .start(
            Box::new(source),
            services(
                MockSpeechToText::new().with_response("spoken words"),
                MockChatCompleter::new().with_failure(),
            ),
            store.clone(),
        )
        .unwrap();
    handle.wait();

    let store = store.read().unwrap();
    assert_eq!(store.len(), 1);
    let record = store.latest().unwrap();
    assert_eq!(record.transcription, "spoken words");
    assert!(record.summary.starts_with("[summary unavailable"));
}

#[test]
fn stop_mid_processing_loses_no_captured_audio() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    // One full chunk goes in flight against a slow transcriber; 500 samples
    // remain in the assembler. Stopping must flush the partial and let the
    // in-flight chunk finish.
    let source = MockAudioSource::new()
        .with_frame_sequence(vec![FramePhase {
            samples: vec![100i16; 1500],
            count: 1,
        }])
        .as_live_source();
    let stt = Arc::new(
        MockSpeechToText::new()
            .with_response("slow words")
            .with_delay(Duration::from_millis(250)),
    );
    let handle = Pipeline::new(pipeline_config())
        .start(
            Box::new(source),
            Services {
                stt: stt.clone(),
                llm: Arc::new(MockChatCompleter::new().with_response("summary")),
                connectivity: Arc::new(MockConnectivity::online()),
                resources: Arc::new(MockResources::ample()),
            },
            store.clone(),
        )
        .unwrap();

    std::thread::sleep(Duration::from_millis(100));
    handle.stop();

    let store = store.read().unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(stt.calls(), 2);
}

fn record_at(h: u32, mi: u32, text: &str, summary: &str) -> TranscriptRecord {
    let t = Local.with_ymd_and_hms(2026, 8, 26, h, mi, 0).unwrap();
    TranscriptRecord::new(t, t, t, text.to_string(), summary.to_string())
}

#[test]
fn empty_store_query_answers_without_remote_call() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(MockChatCompleter::new());
    let engine = QueryEngine::new(temp_store(&dir), llm.clone());

    let answer = engine.answer("what happened in the last hour");
    assert_eq!(answer, NO_DATA_MESSAGE);
    assert_eq!(llm.calls(), 0);
}

#[test]
fn morning_records_match_morning_time_range() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    {
        let mut store = store.write().unwrap();
        store.append(record_at(10, 0, "ten o'clock words", "s1"));
        store.append(record_at(10, 5, "five past ten words", "s2"));
        store.append(record_at(11, 30, "half eleven words", "s3"));
    }

    let filter = QueryFilter {
        time_from: Some("10:00".to_string()),
        time_to: Some("10:30".to_string()),
        ..Default::default()
    };
    let results = store.read().unwrap().query(&filter);
    let texts: Vec<_> = results.into_iter().map(|r| r.transcription).collect();
    assert_eq!(texts, vec!["five past ten words", "ten o'clock words"]);
}

#[test]
fn question_with_time_phrase_summarizes_window() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    {
        let mut store = store.write().unwrap();
        store.append(record_at(9, 0, "old standup notes", "s1"));
        store.append(record_at(11, 50, "lunch order discussion", "s2"));
    }

    let llm = Arc::new(MockChatCompleter::new().with_response("they ordered lunch"));
    let engine = QueryEngine::new(store, llm.clone());

    let now = Local
        .with_ymd_and_hms(2026, 8, 26, 12, 0, 0)
        .unwrap()
        .timestamp();
    let answer = engine.answer_at("recap the last hour", now);

    assert_eq!(answer, "they ordered lunch");
    let (_, user) = llm.prompts().pop().unwrap();
    assert!(user.contains("lunch order discussion"));
    assert!(!user.contains("old standup notes"));
}
