use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use echolog::audio::{AudioSource, WavAudioSource};
use echolog::cli::{Cli, Commands};
use echolog::config::Config;
use echolog::pipeline::{Pipeline, PipelineConfig, Services};
use echolog::query::QueryEngine;
use echolog::remote::{AssumeOnline, HttpChatCompleter, HttpSpeechToText, SystemResources};
use echolog::store::{QueryFilter, TranscriptRecord, TranscriptStore};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { input } => run(config, input),
        Commands::Ask { question } => ask(config, &question),
        Commands::History {
            keyword,
            date_from,
            date_to,
            time_from,
            time_to,
            last,
            limit,
        } => {
            let filter = QueryFilter {
                keyword,
                date_from,
                date_to,
                time_from,
                time_to,
            };
            history(config, filter, last, limit)
        }
        Commands::Clear => clear(config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

fn open_store(config: &Config) -> Arc<RwLock<TranscriptStore>> {
    Arc::new(RwLock::new(TranscriptStore::open(
        &config.store.path,
        config.store.max_records,
        config.store.cache_size,
    )))
}

fn run(config: Config, input: Option<PathBuf>) -> Result<()> {
    let source: Box<dyn AudioSource> = match input {
        Some(path) => Box::new(
            WavAudioSource::from_file(&path)
                .with_context(|| format!("failed to open {}", path.display()))?
                .with_frame_samples(config.audio.frame_samples),
        ),
        None => Box::new(
            WavAudioSource::from_stdin()
                .context("failed to read WAV from stdin")?
                .with_frame_samples(config.audio.frame_samples),
        ),
    };

    let services = Services {
        stt: Arc::new(HttpSpeechToText::new(&config.transcription)?),
        llm: Arc::new(HttpChatCompleter::new(&config.summarization)?),
        connectivity: Arc::new(AssumeOnline),
        resources: Arc::new(SystemResources::new()),
    };
    let store = open_store(&config);

    let pipeline_config = PipelineConfig {
        sample_rate: config.audio.sample_rate,
        chunk_seconds: config.audio.chunk_seconds,
        attempts: config.transcription.attempts,
        retry_pause: Duration::from_millis(config.transcription.retry_pause_ms),
        min_free_memory: config.summarization.min_free_memory,
        ..Default::default()
    };

    let handle = Pipeline::new(pipeline_config).start(source, services, store.clone())?;
    handle.wait();

    let store = match store.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    println!("Stored {} transcript(s).", store.len());
    if let Some(latest) = store.latest() {
        println!("Latest summary: {}", latest.summary);
    }
    Ok(())
}

fn ask(config: Config, question: &str) -> Result<()> {
    let llm = Arc::new(HttpChatCompleter::new(&config.summarization)?);
    let engine = QueryEngine::new(open_store(&config), llm);
    println!("{}", engine.answer(question));
    Ok(())
}

fn history(config: Config, filter: QueryFilter, last: Option<u64>, limit: usize) -> Result<()> {
    let store = open_store(&config);
    let store = match store.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let records: Vec<TranscriptRecord> = match last {
        Some(window_secs) => {
            let mut records = store.time_window(Local::now().timestamp(), window_secs as i64);
            records.reverse();
            records
        }
        None => store.query(&filter),
    };

    if records.is_empty() {
        println!("No matching transcripts.");
        return Ok(());
    }

    for record in records.iter().take(limit) {
        println!("{}  ({}s)", record.timestamp, record.duration_secs);
        println!("  {}", record.transcription);
        println!("  summary: {}", record.summary);
    }
    Ok(())
}

fn clear(config: Config) -> Result<()> {
    let store = open_store(&config);
    let mut store = match store.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let count = store.len();
    store.clear();
    println!("Cleared {} transcript(s).", count);
    Ok(())
}
