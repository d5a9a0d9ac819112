use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use smartcart_core::domain::intent::Intent;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::grammar::IntentGrammar;
use crate::remote::{IntentSource, IntentSourceError};

/// Where a resolved intent came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentOrigin {
    Remote,
    Grammar,
}

/// Remote-first intent resolution with a guaranteed local fallback.
///
/// `resolve` holds no mutable state, so dropping its future mid-flight
/// simply discards any late remote answer.
#[derive(Clone)]
pub struct IntentResolver {
    remote: Option<Arc<dyn IntentSource>>,
    grammar: IntentGrammar,
    timeout: Duration,
}

impl IntentResolver {
    pub fn new(grammar: IntentGrammar, remote: Option<Arc<dyn IntentSource>>, timeout: Duration) -> Self {
        Self { remote, grammar, timeout }
    }

    pub fn local(grammar: IntentGrammar) -> Self {
        Self::new(grammar, None, Duration::from_secs(10))
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn grammar(&self) -> &IntentGrammar {
        &self.grammar
    }

    pub async fn resolve(&self, text: &str) -> Intent {
        self.resolve_with_origin(text).await.0
    }

    pub async fn resolve_with_origin(&self, text: &str) -> (Intent, IntentOrigin) {
        let Some(remote) = &self.remote else {
            return (self.grammar.parse(text), IntentOrigin::Grammar);
        };

        match self.try_remote(remote.as_ref(), text).await {
            Ok(intent) => (intent, IntentOrigin::Remote),
            Err(error) => {
                warn!(
                    event_name = "agent.resolver.remote_failed",
                    source = remote.source_name(),
                    error = %error,
                    "remote intent source failed"
                );
                info!(
                    event_name = "agent.resolver.fallback",
                    source = remote.source_name(),
                    "falling back to local grammar"
                );
                (self.grammar.parse(text), IntentOrigin::Grammar)
            }
        }
    }

    async fn try_remote(&self, remote: &dyn IntentSource, text: &str) -> Result<Intent, IntentSourceError> {
        match timeout(self.timeout, remote.parse(text)).await {
            Ok(result) => result,
            Err(_) => Err(IntentSourceError::Timeout(self.timeout.as_millis())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use smartcart_core::config::GrammarConfig;
    use smartcart_core::domain::intent::Intent;

    use super::{IntentOrigin, IntentResolver};
    use crate::grammar::IntentGrammar;
    use crate::llm::LlmClient;
    use crate::remote::{IntentSource, IntentSourceError, LlmIntentSource};

    fn grammar() -> IntentGrammar {
        IntentGrammar::new(&GrammarConfig::default()).expect("default vocabulary compiles")
    }

    fn resolver(remote: Arc<dyn IntentSource>) -> IntentResolver {
        IntentResolver::new(grammar(), Some(remote), Duration::from_millis(50))
    }

    struct FailingSource;

    #[async_trait]
    impl IntentSource for FailingSource {
        async fn parse(&self, _text: &str) -> Result<Intent, IntentSourceError> {
            Err(IntentSourceError::Transport("connection reset".to_string()))
        }

        fn source_name(&self) -> &str {
            "failing"
        }
    }

    struct SlowSource;

    #[async_trait]
    impl IntentSource for SlowSource {
        async fn parse(&self, _text: &str) -> Result<Intent, IntentSourceError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Intent::add("late answer", 9))
        }

        fn source_name(&self) -> &str {
            "slow"
        }
    }

    struct FixedSource(Intent);

    #[async_trait]
    impl IntentSource for FixedSource {
        async fn parse(&self, _text: &str) -> Result<Intent, IntentSourceError> {
            Ok(self.0.clone())
        }

        fn source_name(&self) -> &str {
            "fixed"
        }
    }

    struct NotJsonClient;

    #[async_trait]
    impl LlmClient for NotJsonClient {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok("not json".to_string())
        }
    }

    const UTTERANCES: [&str; 5] =
        ["add 2 bananas", "find toothpaste under $5", "remove apples", "hello", "search for bread"];

    #[tokio::test]
    async fn failing_remote_matches_local_grammar() {
        let resolver = resolver(Arc::new(FailingSource));
        let local = grammar();
        for text in UTTERANCES {
            assert_eq!(resolver.resolve(text).await, local.parse(text), "{text}");
        }
    }

    #[tokio::test]
    async fn not_json_reply_matches_local_grammar() {
        let source = LlmIntentSource::new(Arc::new(NotJsonClient), "not-json");
        let resolver = resolver(Arc::new(source));
        let local = grammar();
        for text in UTTERANCES {
            let (intent, origin) = resolver.resolve_with_origin(text).await;
            assert_eq!(intent, local.parse(text), "{text}");
            assert_eq!(origin, IntentOrigin::Grammar);
        }
    }

    #[tokio::test]
    async fn slow_remote_times_out_and_falls_back() {
        let resolver = resolver(Arc::new(SlowSource));
        let (intent, origin) = resolver.resolve_with_origin("add milk").await;
        assert_eq!(intent, Intent::add("milk", 1));
        assert_eq!(origin, IntentOrigin::Grammar);
    }

    #[tokio::test]
    async fn valid_remote_answer_wins() {
        let remote = Intent::add("banana", 2);
        let resolver = resolver(Arc::new(FixedSource(remote.clone())));
        let (intent, origin) = resolver.resolve_with_origin("add 2 bananas").await;
        assert_eq!(intent, remote);
        assert_eq!(origin, IntentOrigin::Remote);
    }

    #[tokio::test]
    async fn without_remote_the_grammar_answers() {
        let resolver = IntentResolver::local(grammar());
        assert!(!resolver.has_remote());
        assert_eq!(resolver.resolve("add milk").await, Intent::add("milk", 1));
    }

    #[tokio::test]
    async fn abandoned_resolution_leaves_no_trace() {
        let resolver = resolver(Arc::new(SlowSource));
        let abandoned = tokio::time::timeout(Duration::from_millis(5), resolver.resolve("add milk")).await;
        assert!(abandoned.is_err());

        let (intent, origin) = resolver.resolve_with_origin("remove apples").await;
        assert_eq!(intent, Intent::remove("apples"));
        assert_eq!(origin, IntentOrigin::Grammar);
    }
}
