use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One `{role, content}` record of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only conversation log shared across calls.
///
/// Turns are written one exchange at a time under a single lock, so the log
/// always alternates user and assistant. Turns are only ever removed by
/// [`ConversationHistory::reset`].
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Arc<Mutex<Vec<ConversationTurn>>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a question and its answer as one adjacent pair.
    pub async fn append_exchange(&self, question: ConversationTurn, answer: ConversationTurn) {
        let mut turns = self.turns.lock().await;
        turns.push(question);
        turns.push(answer);
    }

    pub async fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.lock().await.clone()
    }

    pub async fn reset(&self) {
        self.turns.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_in_order_and_resets() {
        let history = ConversationHistory::new();
        history
            .append_exchange(ConversationTurn::user("first"), ConversationTurn::assistant("reply"))
            .await;
        history
            .append_exchange(ConversationTurn::user("second"), ConversationTurn::assistant("again"))
            .await;

        let turns = history.snapshot().await;
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[1], ConversationTurn::assistant("reply"));
        assert_eq!(turns[2].content, "second");

        history.reset().await;
        assert!(history.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_exchanges_stay_paired() {
        let history = ConversationHistory::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let history = history.clone();
            handles.push(tokio::spawn(async move {
                history
                    .append_exchange(
                        ConversationTurn::user(format!("q{}", i)),
                        ConversationTurn::assistant(format!("a{}", i)),
                    )
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let turns = history.snapshot().await;
        assert_eq!(turns.len(), 32);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].content, pair[0].content.replacen('q', "a", 1));
        }
    }

    #[test]
    fn turns_serialize_with_lowercase_roles() {
        let json = serde_json::to_string(&ConversationTurn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
