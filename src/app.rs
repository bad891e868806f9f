use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::assistant::{AssistantClient, ChatRequest};

/// Seeded into the transcript the first time the panel opens.
pub const GREETING: &str = "👋 Hello! I'm HERO — your Housing Essential Resource Organizer, to help navigate housing support across the Bay Area.\n\n⚠️ *This chatbot is an experimental tool. Please verify all information with official housing resources before making decisions.*\n\nHow can I help you today?";

/// Shown under the transcript whenever a request fails, regardless of cause.
pub const REQUEST_FAILED: &str = "Failed to fetch response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
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

    /// Paragraph fragments for rendering. Assistant replies split on the
    /// literal blank-line separator; user messages are always one fragment.
    pub fn fragments(&self) -> Vec<&str> {
        match self.role {
            Role::Assistant => self.content.split("\n\n").collect(),
            Role::User => vec![self.content.as_str()],
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub open: bool,

    // Conversation state
    pub messages: Vec<Message>,
    pub input: String,
    pub input_cursor: usize, // char index into input
    pub loading: bool,
    pub error: String,

    // In-flight request (at most one)
    pub reply_task: Option<JoinHandle<anyhow::Result<String>>>,

    // Transcript scroll state
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat area, set during render
    pub chat_width: u16,  // inner width of the chat area, set during render

    // Animation state (0-2 for the ellipsis)
    pub animation_frame: u8,

    // Areas for mouse hit-testing, updated during render
    pub header_area: Option<Rect>,
    pub badge_area: Option<Rect>,

    pub client: AssistantClient,
}

impl App {
    pub fn new(client: AssistantClient) -> Self {
        Self {
            should_quit: false,
            open: false,
            messages: Vec::new(),
            input: String::new(),
            input_cursor: 0,
            loading: false,
            error: String::new(),
            reply_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            header_area: None,
            badge_area: None,
            client,
        }
    }

    /// Flip the panel open or closed. The first open of a fresh conversation
    /// seeds the greeting; reopening a populated transcript never re-seeds.
    pub fn toggle_open(&mut self) {
        if !self.open && self.messages.is_empty() {
            self.messages.push(Message::assistant(GREETING));
        }
        self.open = !self.open;
    }

    /// Start a submission. Whitespace-only input is a no-op. Otherwise the
    /// user turn is appended and the request to dispatch is handed back; its
    /// history is the transcript as it existed before the new turn. The
    /// input field stays populated until the attempt completes.
    pub fn begin_submission(&mut self) -> Option<ChatRequest> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.loading = true;
        self.error.clear();

        let history = self.messages.clone();
        self.messages.push(Message::user(text.clone()));
        self.scroll_to_bottom();

        Some(ChatRequest {
            message: text,
            history,
        })
    }

    /// Complete a submission attempt. Success appends the assistant turn;
    /// failure surfaces the one generic error string. Loading and the input
    /// field clear on every path.
    pub fn finish_submission(&mut self, result: anyhow::Result<String>) {
        match result {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply));
            }
            Err(err) => {
                tracing::error!("assistant request failed: {err:#}");
                self.error = REQUEST_FAILED.to_string();
            }
        }

        self.loading = false;
        self.input.clear();
        self.input_cursor = 0;
        self.scroll_to_bottom();
    }

    /// Check the in-flight request and fold its outcome into the transcript
    /// once it finishes. A panicked or aborted task counts as a failure.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .is_some_and(JoinHandle::is_finished);
        if !finished {
            return;
        }

        if let Some(task) = self.reply_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(anyhow::anyhow!("reply task did not complete: {err}")),
            };
            self.finish_submission(result);
        }
    }

    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the transcript so the newest content is visible.
    pub fn scroll_to_bottom(&mut self) {
        // Use the actual chat width for wrap estimates, default to 50 if the
        // first render has not happened yet.
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            for fragment in msg.fragments() {
                for line in fragment.lines() {
                    // Character count, not byte length, for UTF-8 content
                    let char_count = line.chars().count();
                    if char_count == 0 {
                        total_lines += 1;
                    } else {
                        total_lines += ((char_count / wrap_width) + 1) as u16;
                    }
                }
                // Blank line after each fragment
                total_lines += 1;
            }
        }

        if self.loading {
            total_lines += 2; // "Hero:" + "Thinking..."
        }
        if !self.error.is_empty() {
            total_lines += 1;
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantClient;
    use anyhow::anyhow;
    use std::time::Duration;

    fn test_app() -> App {
        let client = AssistantClient::new("http://localhost:3005/chatbot", Duration::from_secs(5))
            .expect("client should build");
        App::new(client)
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut app = test_app();
        assert!(app.begin_submission().is_none());
        assert!(app.messages.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn whitespace_input_is_a_no_op() {
        let mut app = test_app();
        app.input = "   \t  ".to_string();
        assert!(app.begin_submission().is_none());
        assert!(app.messages.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn submission_appends_user_turn_with_prior_history() {
        let mut app = test_app();
        app.input = "Where can I find emergency shelter?".to_string();

        let request = app.begin_submission().expect("non-empty input submits");
        assert_eq!(request.message, "Where can I find emergency shelter?");
        assert!(request.history.is_empty());

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, Role::User);
        assert_eq!(app.messages[0].content, "Where can I find emergency shelter?");
        assert!(app.loading);
        assert!(app.error.is_empty());
    }

    #[test]
    fn history_excludes_the_new_user_turn() {
        let mut app = test_app();
        app.messages.push(Message::assistant("Hi there."));
        app.input = "Thanks".to_string();

        let request = app.begin_submission().expect("non-empty input submits");
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].role, Role::Assistant);
        assert_eq!(app.messages.len(), 2);
    }

    #[test]
    fn input_is_trimmed_before_sending() {
        let mut app = test_app();
        app.input = "  help me  ".to_string();
        let request = app.begin_submission().expect("non-empty input submits");
        assert_eq!(request.message, "help me");
        assert_eq!(app.messages[0].content, "help me");
    }

    #[test]
    fn successful_submission_gains_two_ordered_turns() {
        let mut app = test_app();
        app.input = "Where can I find emergency shelter?".to_string();
        app.begin_submission();

        app.finish_submission(Ok("Try calling 211.".to_string()));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[0].role, Role::User);
        assert_eq!(app.messages[0].content, "Where can I find emergency shelter?");
        assert_eq!(app.messages[1].role, Role::Assistant);
        assert_eq!(app.messages[1].content, "Try calling 211.");
        assert!(!app.loading);
        assert!(app.input.is_empty());
        assert!(app.error.is_empty());
    }

    #[test]
    fn failed_submission_keeps_the_user_turn_and_sets_error() {
        let mut app = test_app();
        app.input = "hello".to_string();
        app.begin_submission();

        app.finish_submission(Err(anyhow!("connection refused")));

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, Role::User);
        assert_eq!(app.error, REQUEST_FAILED);
        assert!(!app.loading);
        assert!(app.input.is_empty());
    }

    #[test]
    fn next_submission_clears_a_previous_error() {
        let mut app = test_app();
        app.input = "first".to_string();
        app.begin_submission();
        app.finish_submission(Err(anyhow!("boom")));
        assert!(!app.error.is_empty());

        app.input = "second".to_string();
        app.begin_submission();
        assert!(app.error.is_empty());
    }

    #[test]
    fn first_open_seeds_the_greeting_exactly_once() {
        let mut app = test_app();
        app.toggle_open();
        assert!(app.open);
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, Role::Assistant);
        assert_eq!(app.messages[0].content, GREETING);

        app.toggle_open();
        assert!(!app.open);
        app.toggle_open();
        assert!(app.open);
        assert_eq!(app.messages.len(), 1);
    }

    #[test]
    fn reopening_a_populated_transcript_does_not_reseed() {
        let mut app = test_app();
        app.toggle_open();
        app.messages.push(Message::user("hi"));
        app.toggle_open();
        app.toggle_open();
        assert_eq!(app.messages.len(), 2);
    }

    #[test]
    fn assistant_content_splits_on_blank_lines() {
        let msg = Message::assistant("Para one.\n\nPara two.");
        assert_eq!(msg.fragments(), vec!["Para one.", "Para two."]);
    }

    #[test]
    fn user_content_is_a_single_fragment() {
        let msg = Message::user("Para one.\n\nPara two.");
        assert_eq!(msg.fragments(), vec!["Para one.\n\nPara two."]);
    }

    #[tokio::test]
    async fn poll_reply_folds_a_finished_task_into_the_transcript() {
        let mut app = test_app();
        app.input = "hello".to_string();
        app.begin_submission();

        app.reply_task = Some(tokio::spawn(async { Ok("Welcome!".to_string()) }));
        while app.reply_task.is_some() {
            app.poll_reply().await;
            tokio::task::yield_now().await;
        }

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].content, "Welcome!");
        assert!(!app.loading);
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn poll_reply_treats_an_aborted_task_as_failure() {
        let mut app = test_app();
        app.input = "hello".to_string();
        app.begin_submission();

        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        });
        task.abort();
        app.reply_task = Some(task);

        while app.reply_task.is_some() {
            app.poll_reply().await;
            tokio::task::yield_now().await;
        }

        assert_eq!(app.error, REQUEST_FAILED);
        assert!(!app.loading);
    }
}
