use tokio::task::JoinHandle;
use crate::api::CompletionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// One completed turn: what the user sent and what came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input state
    pub input: String,
    pub cursor: usize, // char index into input

    // Transcript state
    pub transcript: Vec<Exchange>,
    pub pending: Option<String>, // user message awaiting a reply
    pub last_error: Option<String>,

    // In-flight completion request
    pub request_task: Option<JoinHandle<anyhow::Result<String>>>,

    // Chat viewport
    pub scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub client: CompletionClient,
}

impl App {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            transcript: Vec::new(),
            pending: None,
            last_error: None,

            request_task: None,

            scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            client,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.request_task.is_some()
    }

    /// Record a finished exchange. The transcript grows by exactly one pair.
    pub fn push_exchange(&mut self, reply: String) {
        if let Some(user) = self.pending.take() {
            self.transcript.push(Exchange {
                user,
                assistant: reply,
            });
            self.scroll_to_bottom();
        }
    }

    /// Record a failed exchange. The pending message is dropped and nothing
    /// is appended to the transcript.
    pub fn fail_exchange(&mut self, error: String) {
        self.pending = None;
        self.last_error = Some(error);
        self.scroll_to_bottom();
    }

    // Chat scrolling
    pub fn scroll_down(&mut self) {
        let max = self.total_chat_lines().saturating_sub(self.chat_height);
        if self.scroll < max {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.chat_height / 2;
        let max = self.total_chat_lines().saturating_sub(self.chat_height);
        self.scroll = (self.scroll + half_page).min(max);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.chat_height / 2;
        self.scroll = self.scroll.saturating_sub(half_page);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    /// Scroll so the newest exchange (or the Thinking indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let total = self.total_chat_lines();
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.scroll = total.saturating_sub(visible);
    }

    /// Estimate rendered chat lines at the current wrap width.
    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;

        for exchange in &self.transcript {
            total += 1; // "You:" label
            total += wrapped_lines(&exchange.user, wrap_width);
            total += 1; // blank line
            total += 1; // "AI:" label
            total += wrapped_lines(&exchange.assistant, wrap_width);
            total += 1; // blank line
        }

        if let Some(pending) = &self.pending {
            total += 1;
            total += wrapped_lines(pending, wrap_width);
            total += 1;
            total += 2; // "AI:" + "Thinking..."
        }

        if self.last_error.is_some() {
            total += 2;
        }

        total
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

/// Lines a block of text occupies once wrapped. Counts chars, not bytes, so
/// multi-byte input doesn't inflate the estimate.
fn wrapped_lines(text: &str, wrap_width: usize) -> u16 {
    let mut lines: u16 = 0;
    for line in text.lines() {
        let char_count = line.chars().count();
        if char_count == 0 {
            lines += 1;
        } else {
            lines += char_count.div_ceil(wrap_width) as u16;
        }
    }
    lines.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CompletionClient, DEFAULT_ENDPOINT, DEFAULT_MODEL, SYSTEM_PROMPT};

    fn test_app() -> App {
        App::new(CompletionClient::new(
            DEFAULT_ENDPOINT,
            DEFAULT_MODEL,
            SYSTEM_PROMPT,
        ))
    }

    #[test]
    fn test_push_exchange_appends_one_pair() {
        let mut app = test_app();
        app.pending = Some("hello".to_string());
        app.push_exchange("hi there".to_string());

        assert_eq!(app.transcript.len(), 1);
        assert_eq!(
            app.transcript[0],
            Exchange {
                user: "hello".to_string(),
                assistant: "hi there".to_string(),
            }
        );
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_push_exchange_without_pending_is_a_noop() {
        let mut app = test_app();
        app.push_exchange("stray reply".to_string());
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn test_fail_exchange_appends_nothing() {
        let mut app = test_app();
        app.pending = Some("hello".to_string());
        app.fail_exchange("connection refused".to_string());

        assert!(app.transcript.is_empty());
        assert!(app.pending.is_none());
        assert_eq!(app.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_transcript_grows_monotonically() {
        let mut app = test_app();
        for i in 0..5 {
            app.pending = Some(format!("question {}", i));
            app.push_exchange(format!("answer {}", i));
            assert_eq!(app.transcript.len(), i + 1);
        }
    }

    #[test]
    fn test_scroll_to_bottom_with_short_transcript() {
        let mut app = test_app();
        app.chat_height = 20;
        app.chat_width = 50;
        app.pending = Some("hi".to_string());
        app.push_exchange("hello".to_string());
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn test_scroll_to_bottom_with_long_transcript() {
        let mut app = test_app();
        app.chat_height = 10;
        app.chat_width = 50;
        for _ in 0..20 {
            app.pending = Some("q".to_string());
            app.push_exchange("a".to_string());
        }
        assert!(app.scroll > 0);
        assert_eq!(app.scroll, app.total_chat_lines() - 10);
    }

    #[test]
    fn test_wrapped_lines_counts_chars_not_bytes() {
        // 60 three-byte chars at width 50 wrap onto two lines
        let text = "\u{3042}".repeat(60);
        assert_eq!(wrapped_lines(&text, 50), 2);
    }

    #[test]
    fn test_wrapped_lines_exact_multiple_of_width() {
        assert_eq!(wrapped_lines(&"x".repeat(50), 50), 1);
        assert_eq!(wrapped_lines(&"x".repeat(100), 50), 2);
        assert_eq!(wrapped_lines(&"x".repeat(51), 50), 2);
    }

    #[test]
    fn test_tick_animation_only_advances_while_waiting() {
        let mut app = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
