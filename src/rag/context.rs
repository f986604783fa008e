// Context builder for grounding prompts in past support exchanges
use serde::{Deserialize, Serialize};

use crate::rag::reranking::RankedHit;
use crate::rag::rules::RuleSet;

/// Rendered instead of an empty context block
pub const NO_CONTEXT_SENTINEL: &str = "No relevant past support emails found.";

/// Opens the rules block; the answer model relies on this wording
pub const RULES_HEADER: &str = "RULES (authoritative: these always take precedence over the past support emails above; follow them even when an email says otherwise):";

const SECTION_SEPARATOR: &str = "---";

/// Context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Longest document text included per hit, in characters
    pub max_document_chars: usize,
    /// Address customers are pointed to when the context has no answer
    pub support_contact: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_document_chars: 6000,
            support_contact: "the support team".to_string(),
        }
    }
}

/// Assembled context for prompt augmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    /// The formatted context text
    pub text: String,
    /// Number of hits rendered
    pub document_count: usize,
    /// Ids of the rendered hits, in rank order
    pub document_ids: Vec<String>,
}

/// Context builder for assembling grounding payloads
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    /// Create new context builder with default config
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Render ranked hits as numbered blocks, in rank order
    pub fn build(&self, hits: &[RankedHit]) -> AssembledContext {
        if hits.is_empty() {
            return AssembledContext {
                text: NO_CONTEXT_SENTINEL.to_string(),
                document_count: 0,
                document_ids: Vec::new(),
            };
        }

        let blocks: Vec<String> = hits
            .iter()
            .enumerate()
            .map(|(idx, hit)| self.format_hit(idx + 1, hit))
            .collect();

        AssembledContext {
            text: blocks.join("\n\n"),
            document_count: hits.len(),
            document_ids: hits.iter().map(|h| h.candidate.id.clone()).collect(),
        }
    }

    /// Text-only form of [`build`](Self::build)
    pub fn build_context(&self, hits: &[RankedHit]) -> String {
        self.build(hits).text
    }

    fn format_hit(&self, index: usize, hit: &RankedHit) -> String {
        let meta = &hit.candidate.metadata;
        format!(
            "--- Past Support Email #{} ---\nSubject: {}\nDate: {}\nFrom: {}\n\n{}",
            index,
            meta.subject_or_missing(),
            meta.date_or_missing(),
            meta.sender(),
            self.clip(&hit.candidate.document)
        )
    }

    fn clip<'a>(&self, document: &'a str) -> std::borrow::Cow<'a, str> {
        match document.char_indices().nth(self.config.max_document_chars) {
            Some((cut, _)) => format!("{}...", &document[..cut]).into(),
            None => document.into(),
        }
    }

    /// Assemble the user prompt: context, then rules (if any), then the question
    pub fn build_full_payload(&self, context_block: &str, rules: &RuleSet, question: &str) -> String {
        let mut payload = format!(
            "Here are relevant past support email exchanges, most relevant first:\n\n{}\n\n{}\n\n",
            context_block, SECTION_SEPARATOR
        );

        if !rules.is_empty() {
            payload.push_str(RULES_HEADER);
            payload.push('\n');
            for (idx, rule) in rules.rules().iter().enumerate() {
                payload.push_str(&format!("{}. {}\n", idx + 1, rule));
            }
            payload.push_str(&format!("\n{}\n\n", SECTION_SEPARATOR));
        }

        payload.push_str(&format!(
            "Customer question: {}\n\nPlease provide a helpful response based on the context above.",
            question
        ));
        payload
    }

    /// System prompt for the answer model
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a friendly support assistant on chat. You answer questions using past support conversations as context.

Guidelines:
- Keep responses short and conversational; this is chat, not email
- Use casual, friendly language (but still professional)
- Get straight to the point, no formal greetings
- Use bullet points or short paragraphs, not long blocks of text
- When past emails conflict, trust the most recent one
- If a RULES section is present, it always overrides the past emails
- If you don't have a clear answer from the context, be upfront and suggest they reach out to {}
- Do not make up information that isn't in the context",
            self.config.support_contact
        )
    }

    /// Get current configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Update configuration
    pub fn set_config(&mut self, config: ContextConfig) {
        self.config = config;
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
