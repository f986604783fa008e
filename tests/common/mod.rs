//! Deterministic fakes shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use supportrag::errors::{Result, SupportError};
use supportrag::generation::TextGenerator;
use supportrag::index::{Candidate, IndexEntry, VectorIndex};
use supportrag::knowledge::{DocumentEncoder, Embedder, RecordMetadata};
use supportrag::rag::{ReRankConfig, RankingEngine, SearchParams};

/// Same constant vector for every text; the fake index ignores it anyway
pub struct FakeEmbedder;

impl Embedder for FakeEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// Returns a fixed candidate list with fixed distances
#[derive(Default)]
pub struct FakeIndex {
    candidates: Vec<Candidate>,
    requested: Mutex<Vec<usize>>,
    fail_with: Option<String>,
}

impl FakeIndex {
    pub fn with_candidates(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// The `n` passed to every query so far
    pub fn requested(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn upsert(&self, _entries: Vec<IndexEntry>) -> Result<()> {
        Err(SupportError::Index("read-only fake".to_string()))
    }

    async fn query(&self, _vector: &[f32], n: usize) -> Result<Vec<Candidate>> {
        self.requested.lock().unwrap().push(n);
        if let Some(message) = &self.fail_with {
            return Err(SupportError::Index(message.clone()));
        }
        Ok(self.candidates.iter().take(n).cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.candidates.len() as u64)
    }

    async fn reset(&self) -> Result<()> {
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        100
    }
}

pub fn candidate(id: &str, date: Option<&str>, distance: f32) -> Candidate {
    Candidate {
        id: id.to_string(),
        document: format!("Subject: {}\n\nSupport response: answer {}", id, id),
        metadata: RecordMetadata {
            subject: Some(format!("About {}", id)),
            date: date.map(str::to_string),
            from: Some(format!("{}@example.com", id)),
            customer_email: None,
        },
        distance,
    }
}

pub fn engine(index: Arc<FakeIndex>, recency_weight: f64) -> RankingEngine {
    RankingEngine::with_config(
        DocumentEncoder::new(Arc::new(FakeEmbedder)),
        index,
        SearchParams::default(),
        ReRankConfig {
            recency_weight,
            ..ReRankConfig::default()
        },
    )
}

type Responder = Box<dyn Fn(&str, &str) -> Result<String> + Send + Sync>;

/// Generator whose replies are decided by a closure; records every call
pub struct ScriptedGenerator {
    respond: Responder,
    not_ready: Option<String>,
    calls: Mutex<Vec<(String, String, u32)>>,
}

impl ScriptedGenerator {
    pub fn with_fn<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            not_ready: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::with_fn(move |_, _| Ok(text.clone()))
    }

    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::with_fn(move |_, _| Err(SupportError::Generation(message.clone())))
    }

    /// Fails the readiness check with a configuration error
    pub fn unconfigured(message: &str) -> Self {
        let mut generator = Self::replying("unreachable");
        generator.not_ready = Some(message.to_string());
        generator
    }

    /// (system prompt, user prompt, max tokens) per call
    pub fn calls(&self) -> Vec<(String, String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str, max_tokens: u32) -> Result<String> {
        self.calls.lock().unwrap().push((
            system_prompt.to_string(),
            user_prompt.to_string(),
            max_tokens,
        ));
        (self.respond)(system_prompt, user_prompt)
    }

    fn check_ready(&self) -> Result<()> {
        match &self.not_ready {
            Some(message) => Err(SupportError::Config(message.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
