//! Conversation memory and streamed replies

use crate::error::Result;
use crate::provider::{ChatStream, Message};
use futures::StreamExt;
use std::future::Future;
use std::io::Write;

/// Chat history seeded with a system prompt
#[derive(Debug, Clone)]
pub struct Conversation {
    system_prompt: String,
    history: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            history: vec![Message::system(system_prompt.clone())],
            system_prompt,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Forget every turn; only the system prompt remains
    pub fn clear(&mut self) {
        self.history.clear();
        self.history.push(Message::system(self.system_prompt.clone()));
    }

    /// Messages for the next request. Retrieved context is prefixed to the
    /// query here only; it is never stored in the history.
    pub fn request(&self, query: &str, context: Option<&str>) -> Vec<Message> {
        let content = match context {
            Some(context) if !context.is_empty() => format!("{} {}", context, query),
            _ => query.to_string(),
        };

        let mut messages = self.history.clone();
        messages.push(Message::user(content));
        messages
    }

    /// Append a completed turn
    pub fn record(&mut self, query: &str, reply: &str) {
        self.history.push(Message::user(query));
        self.history.push(Message::assistant(reply));
    }

    /// Number of completed turns
    pub fn turns(&self) -> usize {
        (self.history.len() - 1) / 2
    }
}

/// What came back from one streamed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub interrupted: bool,
}

/// Write fragments to `out` as they arrive until the stream ends or `cancel` fires
pub async fn stream_reply<W, F>(mut stream: ChatStream, out: &mut W, cancel: F) -> Result<Reply>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let mut text = String::new();

    loop {
        tokio::select! {
            _ = &mut cancel => {
                return Ok(Reply { text, interrupted: true });
            }
            next = stream.next() => match next {
                Some(Ok(fragment)) => {
                    write!(out, "{}", fragment)?;
                    out.flush()?;
                    text.push_str(&fragment);
                }
                Some(Err(e)) => return Err(e),
                None => break,
            },
        }
    }

    Ok(Reply {
        text,
        interrupted: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::provider::Role;
    use futures::stream;

    #[test]
    fn test_new_conversation_has_system_prompt() {
        let conversation = Conversation::new("be brief");
        assert_eq!(conversation.history(), &[Message::system("be brief")]);
        assert_eq!(conversation.turns(), 0);
    }

    #[test]
    fn test_context_only_in_request() {
        let mut conversation = Conversation::new("be brief");
        let request = conversation.request("What is Rust?", Some("Rust is a language."));

        assert_eq!(request.len(), 2);
        assert_eq!(request[1].role, Role::User);
        assert_eq!(request[1].content, "Rust is a language. What is Rust?");

        conversation.record("What is Rust?", "A language.");
        assert_eq!(conversation.history()[1], Message::user("What is Rust?"));
        assert_eq!(conversation.history()[2], Message::assistant("A language."));
        assert_eq!(conversation.turns(), 1);
    }

    #[test]
    fn test_empty_context_is_not_prefixed() {
        let conversation = Conversation::new("sys");
        assert_eq!(conversation.request("hi", Some(""))[1].content, "hi");
        assert_eq!(conversation.request("hi", None)[1].content, "hi");
    }

    #[test]
    fn test_clear_resets_to_system_prompt() {
        let mut conversation = Conversation::new("sys");
        conversation.record("a", "b");
        conversation.record("c", "d");
        conversation.clear();
        assert_eq!(conversation.history(), &[Message::system("sys")]);
    }

    #[tokio::test]
    async fn test_stream_reply_writes_fragments() {
        let fragments = stream::iter(vec![Ok("Hel".to_string()), Ok("lo".to_string())]).boxed();
        let mut out = Vec::new();

        let reply = stream_reply(fragments, &mut out, std::future::pending())
            .await
            .unwrap();
        assert_eq!(reply.text, "Hello");
        assert!(!reply.interrupted);
        assert_eq!(String::from_utf8(out).unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_stream_reply_cancelled() {
        let fragments = stream::pending().boxed();
        let mut out = Vec::new();

        let reply = stream_reply(fragments, &mut out, std::future::ready(()))
            .await
            .unwrap();
        assert!(reply.interrupted);
        assert!(reply.text.is_empty());
    }

    #[tokio::test]
    async fn test_stream_reply_error() {
        let fragments = stream::iter(vec![
            Ok("partial".to_string()),
            Err(Error::Provider("connection reset".to_string())),
        ])
        .boxed();
        let mut out = Vec::new();

        let err = stream_reply(fragments, &mut out, std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
