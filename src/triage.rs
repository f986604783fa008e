//! Triage gate
//!
//! Decides whether an inbound message deserves the retrieval + generation
//! path at all. Pure acknowledgements, bare greetings, and empty or
//! emoji-only messages are skipped.

use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::generation::TextGenerator;

/// Classifier label for messages that can be ignored
pub const NO_RESPONSE_NEEDED: &str = "NO_RESPONSE_NEEDED";

/// Classifier label for messages that need an answer
pub const RESPONSE_NEEDED: &str = "RESPONSE_NEEDED";

/// Instructions given to the classifier
pub const TRIAGE_SYSTEM_PROMPT: &str = "You are a triage filter. Decide if this chat message needs a support response.
Reply with exactly NO_RESPONSE_NEEDED (and nothing else) if the message is:
- A simple \"thanks\", \"thank you\", \"got it\", \"ok\", \"appreciate it\", or similar
- A greeting with no question (\"hi\", \"hello\", \"hey\")
- An emoji-only message
- Any message that doesn't contain a question or request

Otherwise, reply with exactly RESPONSE_NEEDED (and nothing else).";

/// Default token budget for a single label
pub const DEFAULT_TRIAGE_MAX_TOKENS: u32 = 20;

/// Binary "does this need an answer" classifier
pub struct TriageGate {
    classifier: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl TriageGate {
    pub fn new(classifier: Arc<dyn TextGenerator>) -> Self {
        Self::with_max_tokens(classifier, DEFAULT_TRIAGE_MAX_TOKENS)
    }

    pub fn with_max_tokens(classifier: Arc<dyn TextGenerator>, max_tokens: u32) -> Self {
        Self {
            classifier,
            max_tokens,
        }
    }

    /// True if the message warrants an answer.
    ///
    /// Empty text never reaches the classifier.
    pub async fn needs_response(&self, message_text: &str) -> Result<bool> {
        let text = message_text.trim();
        if text.is_empty() {
            return Ok(false);
        }

        let label = self
            .classifier
            .generate(TRIAGE_SYSTEM_PROMPT, text, self.max_tokens)
            .await?;
        let needed = !label.contains(NO_RESPONSE_NEEDED);
        debug!(label = label.trim(), needed, "triage decision");
        Ok(needed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Labels acknowledgements as NO_RESPONSE_NEEDED, everything else as needed
    struct KeywordClassifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for KeywordClassifier {
        async fn generate(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
            assert_eq!(system, TRIAGE_SYSTEM_PROMPT);
            assert_eq!(max_tokens, DEFAULT_TRIAGE_MAX_TOKENS);
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = user.to_lowercase();
            let ack = ["thanks", "thank you", "ok", "hi"]
                .iter()
                .any(|w| lower.trim_end_matches('!') == *w);
            Ok(if ack { NO_RESPONSE_NEEDED } else { RESPONSE_NEEDED }.to_string())
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    fn gate() -> (TriageGate, Arc<KeywordClassifier>) {
        let classifier = Arc::new(KeywordClassifier {
            calls: AtomicUsize::new(0),
        });
        (TriageGate::new(classifier.clone()), classifier)
    }

    #[tokio::test]
    async fn test_thanks_needs_no_response() {
        let (gate, _) = gate();
        assert!(!gate.needs_response("thanks!").await.unwrap());
    }

    #[tokio::test]
    async fn test_question_needs_response() {
        let (gate, _) = gate();
        assert!(gate.needs_response("how do I reset my password?").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_message_skips_classifier() {
        let (gate, classifier) = gate();
        assert!(!gate.needs_response("   \n").await.unwrap());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_label_with_extra_text() {
        struct Chatty;

        #[async_trait]
        impl TextGenerator for Chatty {
            async fn generate(&self, _: &str, _: &str, _: u32) -> Result<String> {
                Ok("Label: NO_RESPONSE_NEEDED.".to_string())
            }

            fn name(&self) -> &str {
                "chatty"
            }
        }

        let gate = TriageGate::new(Arc::new(Chatty));
        assert!(!gate.needs_response("ok").await.unwrap());
    }
}
