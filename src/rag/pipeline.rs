// End-to-end query path: rank -> assemble -> generate
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{Result, SupportError};
use crate::generation::TextGenerator;
use crate::rag::context::{AssembledContext, ContextBuilder};
use crate::rag::reranking::RankedHit;
use crate::rag::retrieval::RankingEngine;
use crate::rag::rules::RuleSet;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output budget for the answer model
    pub max_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_tokens: 1024 }
    }
}

/// How a question was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerOutcome {
    /// The answer model produced the text
    Generated,
    /// The provider is misconfigured; the text explains what to fix
    ConfigurationError,
}

/// Prompt ready for the answer model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub context: AssembledContext,
    pub hits: Vec<RankedHit>,
}

/// Pipeline result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportAnswer {
    pub question: String,
    pub text: String,
    pub outcome: AnswerOutcome,
    /// Ids of the documents used as context, best first
    pub document_ids: Vec<String>,
}

/// Retrieval-grounded answering
pub struct SupportPipeline {
    engine: RankingEngine,
    context_builder: ContextBuilder,
    rules: RuleSet,
    generator: Arc<dyn TextGenerator>,
    config: PipelineConfig,
}

impl SupportPipeline {
    pub fn new(
        engine: RankingEngine,
        context_builder: ContextBuilder,
        rules: RuleSet,
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            engine,
            context_builder,
            rules,
            generator,
            config,
        }
    }

    /// Retrieve and assemble the prompt without calling the answer model
    pub async fn prepare(&self, question: &str, top_k: usize) -> Result<PreparedPrompt> {
        let hits = self.engine.rank(question, top_k).await?;
        let context = self.context_builder.build(&hits);
        let user_prompt = self
            .context_builder
            .build_full_payload(&context.text, &self.rules, question);

        Ok(PreparedPrompt {
            system_prompt: self.context_builder.system_prompt(),
            user_prompt,
            context,
            hits,
        })
    }

    /// Answer with the default `top_k`
    pub async fn answer(&self, question: &str) -> Result<SupportAnswer> {
        self.answer_with_top_k(question, self.engine.params().top_k).await
    }

    /// Answer a question.
    ///
    /// A misconfigured generator is reported as an `Ok` answer explaining
    /// the problem, before any retrieval happens. Provider failures are
    /// returned as errors unchanged.
    pub async fn answer_with_top_k(&self, question: &str, top_k: usize) -> Result<SupportAnswer> {
        if let Err(err) = self.generator.check_ready() {
            return match err {
                SupportError::Config(message) => {
                    warn!(provider = self.generator.name(), "generator not configured");
                    Ok(SupportAnswer {
                        question: question.to_string(),
                        text: format!("Error: {}", message),
                        outcome: AnswerOutcome::ConfigurationError,
                        document_ids: Vec::new(),
                    })
                }
                other => Err(other),
            };
        }

        let prompt = self.prepare(question, top_k).await?;
        info!(
            documents = prompt.context.document_count,
            rules = self.rules.len(),
            provider = self.generator.name(),
            "generating answer"
        );

        let text = self
            .generator
            .generate(&prompt.system_prompt, &prompt.user_prompt, self.config.max_tokens)
            .await?;

        Ok(SupportAnswer {
            question: question.to_string(),
            text,
            outcome: AnswerOutcome::Generated,
            document_ids: prompt.context.document_ids,
        })
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Replace the rule set (e.g. after the rules file changed)
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    /// Get current configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        assert_eq!(PipelineConfig::default().max_tokens, 1024);
    }

    #[test]
    fn test_answer_structure() {
        let answer = SupportAnswer {
            question: "q".to_string(),
            text: "a".to_string(),
            outcome: AnswerOutcome::Generated,
            document_ids: vec!["1".to_string()],
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["outcome"], "Generated");
        assert_eq!(json["document_ids"][0], "1");
    }
}
