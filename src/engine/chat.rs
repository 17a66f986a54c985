//! Chat session: an append-only conversation with a delayed bot reply.
//!
//! `submit` appends the user message at once and schedules the reply on a
//! cancellable timer; it never waits for the reply. Closing (or dropping)
//! the session cancels every pending reply, and a reply that races with
//! `close` sees the closed flag under the conversation lock and does nothing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::intent::IntentMatcher;
use super::timer::TimerScope;
use crate::config::{Config, DEFAULT_CHAT_REPLY_MS};
use crate::db::models::{ChatMessage, Sender};
use crate::error::AppError;

/// Delay before the welcome suggestion is offered to an idle visitor.
pub const WELCOME_PROMPT_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy)]
pub struct ChatTiming {
    pub reply_delay: Duration,
    pub welcome_delay: Duration,
}

impl ChatTiming {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reply_delay: config.chat_reply_delay,
            ..Self::default()
        }
    }
}

impl Default for ChatTiming {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(DEFAULT_CHAT_REPLY_MS),
            welcome_delay: WELCOME_PROMPT_DELAY,
        }
    }
}

struct Conversation {
    messages: Vec<ChatMessage>,
    rng: StdRng,
    closed: bool,
}

pub struct ChatSession {
    conversation: Arc<Mutex<Conversation>>,
    matcher: Arc<IntentMatcher>,
    timers: TimerScope,
    timing: ChatTiming,
}

impl ChatSession {
    pub fn new(matcher: Arc<IntentMatcher>, timing: ChatTiming) -> Self {
        Self::with_rng(matcher, timing, StdRng::from_entropy())
    }

    /// Session with a caller-provided random source for reply selection.
    pub fn with_rng(matcher: Arc<IntentMatcher>, timing: ChatTiming, rng: StdRng) -> Self {
        let seed = ChatMessage::new(Sender::Bot, matcher.table().seed_greeting.clone());
        Self {
            conversation: Arc::new(Mutex::new(Conversation {
                messages: vec![seed],
                rng,
                closed: false,
            })),
            matcher,
            timers: TimerScope::new(),
            timing,
        }
    }

    /// Append the user's message and schedule the bot's reply.
    ///
    /// Blank input is ignored (`Ok(None)`). Submitting to a closed session is
    /// a validation error.
    pub fn submit(&self, text: &str) -> Result<Option<ChatMessage>, AppError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let user_message = {
            let mut conv = self.lock();
            if conv.closed {
                return Err(AppError::Validation("chat session is closed".into()));
            }
            let message = ChatMessage::new(Sender::User, text);
            conv.messages.push(message.clone());
            message
        };

        let conversation = self.conversation.clone();
        let matcher = self.matcher.clone();
        let input = text.to_string();
        self.timers.once(self.timing.reply_delay, move || {
            let mut conv = conversation.lock().unwrap_or_else(|e| e.into_inner());
            if conv.closed {
                return;
            }
            let result = matcher.respond(&input, &mut conv.rng);
            tracing::debug!(intent = ?result.intent, "Bot reply appended");
            conv.messages.push(ChatMessage::new(Sender::Bot, result.reply));
        });

        Ok(Some(user_message))
    }

    /// Offer the welcome suggestion after a pause, if nobody has spoken yet.
    ///
    /// The check runs when the timer fires, so a visitor who starts typing in
    /// the meantime doesn't get interrupted.
    pub fn greet_visitor(&self) {
        let conversation = self.conversation.clone();
        let prompt = self.matcher.table().welcome_prompt.clone();
        self.timers.once(self.timing.welcome_delay, move || {
            let mut conv = conversation.lock().unwrap_or_else(|e| e.into_inner());
            if conv.closed || conv.messages.len() != 1 {
                return;
            }
            conv.messages.push(ChatMessage::new(Sender::Bot, prompt));
        });
    }

    /// Conversation so far, in display order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    /// Replies scheduled but not yet delivered.
    pub fn pending_replies(&self) -> usize {
        self.timers.pending()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Tear the session down. Pending replies are dropped.
    pub fn close(&self) {
        let mut conv = self.lock();
        if conv.closed {
            return;
        }
        conv.closed = true;
        self.timers.teardown();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Conversation> {
        self.conversation.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::responses::{Category, ResponseTable};

    fn session() -> ChatSession {
        let matcher = Arc::new(IntentMatcher::new(Arc::new(ResponseTable::somnath())));
        ChatSession::with_rng(matcher, ChatTiming::default(), StdRng::seed_from_u64(1))
    }

    #[test]
    fn test_timing_from_config() {
        let config = Config {
            chat_reply_delay: Duration::from_millis(250),
            ..Config::default()
        };
        let timing = ChatTiming::from_config(&config);
        assert_eq!(timing.reply_delay, Duration::from_millis(250));
        assert_eq!(timing.welcome_delay, WELCOME_PROMPT_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_with_greeting() {
        let chat = session();
        let messages = chat.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(messages[0].content, ResponseTable::somnath().seed_greeting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_arrives_after_delay() {
        let chat = session();
        let user = chat.submit("How old is it?").unwrap().unwrap();
        assert_eq!(user.sender, Sender::User);

        // User message is visible immediately, reply is not.
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.pending_replies(), 1);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(chat.messages().len(), 2);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let messages = chat.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].sender, Sender::Bot);
        assert!(ResponseTable::somnath()
            .candidates(Category::History)
            .contains(&messages[2].content));
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_follows_calls() {
        let chat = session();
        chat.submit("namaste").unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        chat.submit("thanks").unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let table = ResponseTable::somnath();
        let contents: Vec<_> = chat.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents.len(), 5);
        assert_eq!(contents[1], "namaste");
        assert_eq!(contents[2], "thanks");
        assert_eq!(contents[3], table.fixed.greeting);
        assert_eq!(contents[4], table.fixed.thanks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_ignored() {
        let chat = session();
        assert!(chat.submit("   ").unwrap().is_none());
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.pending_replies(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_reply() {
        let chat = session();
        chat.submit("tell me about the temple").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        chat.close();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(chat.messages().len(), 2);
        assert!(chat.is_closed());
        assert!(matches!(chat.submit("hello"), Err(AppError::Validation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_prompt_only_when_idle() {
        let table = ResponseTable::somnath();

        let idle = session();
        idle.greet_visitor();
        tokio::time::sleep(Duration::from_millis(3001)).await;
        let messages = idle.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, table.welcome_prompt);

        let busy = session();
        busy.greet_visitor();
        busy.submit("namaste").unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(busy
            .messages()
            .iter()
            .all(|m| m.content != table.welcome_prompt));
    }
}
