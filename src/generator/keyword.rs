//! Keyword-matching mock generator
//!
//! Looks only at the last message of the history and answers from a few
//! canned templates. Every template names the model that "produced" it.

use super::{GenerationError, Latency, ResponseGenerator};
use crate::store::Message;
use async_trait::async_trait;

/// Which canned reply a message falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Code,
    Help,
    General,
}

impl ReplyKind {
    /// Classify message content by case-insensitive substring match.
    ///
    /// Code keywords win over "help" when both appear.
    pub fn classify(content: &str) -> Self {
        let lowered = content.to_lowercase();
        if lowered.contains("code") || lowered.contains("program") {
            Self::Code
        } else if lowered.contains("help") {
            Self::Help
        } else {
            Self::General
        }
    }
}

/// Generator answering from canned templates after a simulated delay
pub struct KeywordGenerator<L: Latency> {
    latency: L,
}

impl<L: Latency> KeywordGenerator<L> {
    pub fn new(latency: L) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl<L: Latency> ResponseGenerator for KeywordGenerator<L> {
    async fn generate(
        &self,
        history: &[Message],
        model_id: &str,
    ) -> Result<String, GenerationError> {
        self.latency.wait().await;

        let last = history.last().map_or("", |m| m.content.as_str());
        Ok(render_reply(last, model_id))
    }
}

/// Render the canned reply for `content` as produced by `model_id`
pub fn render_reply(content: &str, model_id: &str) -> String {
    match ReplyKind::classify(content) {
        ReplyKind::Code => code_reply(model_id),
        ReplyKind::Help => help_reply(model_id),
        ReplyKind::General => general_reply(content, model_id),
    }
}

fn code_reply(model_id: &str) -> String {
    format!(
        "I'd be happy to help you with coding! Here's a code example to get you started:

```python
def greet(name: str) -> str:
    \"\"\"Return a friendly greeting.\"\"\"
    return f\"Hello, {{name}}!\"


if __name__ == \"__main__\":
    print(greet(\"World\"))
```

This snippet defines a small, typed function and calls it from a main guard. \
Tell me more about what you are building and I can tailor the example to your \
language and framework.

*Response generated by {model_id}*"
    )
}

fn help_reply(model_id: &str) -> String {
    format!(
        "I'm here to help! I can assist you with a wide range of topics:

- Programming and software development
- Writing and editing
- Analysis and research
- Math and problem solving
- Creative projects and brainstorming

What would you like to work on? *(powered by {model_id})*"
    )
}

fn general_reply(content: &str, model_id: &str) -> String {
    let length = content.chars().count();
    format!(
        "Thanks for your message! You wrote {length} characters: \"{content}\"

As {model_id}, I've considered your input. This is a simulated response, so \
there is no real model behind it, but in a full deployment {model_id} would \
analyse your message and reply with a detailed answer. Feel free to ask about \
code or say \"help\" to see what I can do."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{FixedLatency, NoLatency};
    use crate::store::ConversationStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Counts how often a delay was requested
    #[derive(Default)]
    struct CountingLatency {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Latency for CountingLatency {
        fn next_delay(&self) -> Duration {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Duration::ZERO
        }
    }

    fn history(content: &str) -> Vec<Message> {
        let mut store = ConversationStore::new();
        store.append_user(content);
        store.messages().to_vec()
    }

    #[tokio::test]
    async fn code_queries_get_a_fenced_example() {
        let generator = KeywordGenerator::new(NoLatency);
        let reply = generator
            .generate(&history("Can you help me write some code?"), "gpt-4-turbo")
            .await
            .unwrap();

        assert!(reply.contains("code example"));
        assert!(reply.contains("```python"));
        assert!(reply.contains("gpt-4-turbo"));
    }

    #[tokio::test]
    async fn help_queries_list_categories() {
        let generator = KeywordGenerator::new(NoLatency);
        let reply = generator
            .generate(&history("I need help with something"), "claude-3-opus")
            .await
            .unwrap();

        assert!(reply.contains("I'm here to help"));
        assert!(reply.contains("Programming and software development"));
        assert!(reply.contains("claude-3-opus"));
    }

    #[tokio::test]
    async fn other_queries_echo_the_message() {
        let generator = KeywordGenerator::new(NoLatency);
        let reply = generator
            .generate(&history("Hello"), "claude-3-sonnet")
            .await
            .unwrap();

        assert!(reply.contains("claude-3-sonnet"));
        assert!(reply.contains("\"Hello\""));
        assert!(reply.contains("5 characters"));
    }

    #[tokio::test]
    async fn only_the_last_message_is_inspected() {
        let mut store = ConversationStore::new();
        store.append_user("show me some code");
        store.append_assistant("...", "gpt-4-turbo");
        store.append_user("thanks");

        let reply = KeywordGenerator::new(NoLatency)
            .generate(store.messages(), "gpt-4-turbo")
            .await
            .unwrap();
        assert!(!reply.contains("```"));
    }

    #[tokio::test]
    async fn empty_history_gets_general_reply() {
        let reply = KeywordGenerator::new(NoLatency)
            .generate(&[], "gemini-pro")
            .await
            .unwrap();
        assert!(reply.contains("gemini-pro"));
        assert!(reply.contains("0 characters"));
    }

    #[tokio::test]
    async fn each_reply_waits_on_the_latency_once() {
        let generator = KeywordGenerator::new(CountingLatency::default());
        generator.generate(&history("one"), "gpt-4-turbo").await.unwrap();
        generator.generate(&history("two"), "gpt-4-turbo").await.unwrap();
        assert_eq!(generator.latency.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reply_is_held_back_by_the_delay() {
        let generator = KeywordGenerator::new(FixedLatency(Duration::from_millis(50)));
        let start = Instant::now();
        let reply = generator
            .generate(&history("Hello"), "gpt-4-turbo")
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(reply.contains("gpt-4-turbo"));

        // Not ready before the delay has passed
        let early = tokio::time::timeout(
            Duration::from_millis(10),
            generator.generate(&history("Hello"), "gpt-4-turbo"),
        )
        .await;
        assert!(early.is_err());
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(ReplyKind::classify("Write a PROGRAM"), ReplyKind::Code);
        assert_eq!(ReplyKind::classify("CoDe review"), ReplyKind::Code);
        assert_eq!(ReplyKind::classify("HELP!"), ReplyKind::Help);
        assert_eq!(ReplyKind::classify("help me with code"), ReplyKind::Code);
        assert_eq!(ReplyKind::classify("good morning"), ReplyKind::General);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let reply = render_reply("héllo", "m");
        assert!(reply.contains("5 characters"));
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn reply_always_names_the_model(
                content in ".{0,80}",
                model in "[a-z0-9][a-z0-9.-]{0,20}",
            ) {
                prop_assert!(render_reply(&content, &model).contains(&model));
            }

            #[test]
            fn code_keyword_yields_fence(
                prefix in "[a-zA-Z ]{0,20}",
                keyword in prop_oneof![Just("code"), Just("CODE"), Just("Code"), Just("program")],
                suffix in "[a-zA-Z ]{0,20}",
            ) {
                let content = format!("{prefix}{keyword}{suffix}");
                prop_assert!(render_reply(&content, "m").contains("```"));
            }
        }
    }
}
