use ratatui::layout::Rect;
use shopchat_core::{ChatBackend, ConversationController, QueryClient, Sender, SUGGESTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Suggestions,
    Log,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Suggestions,
            Focus::Suggestions => Focus::Log,
            Focus::Log => Focus::Input,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Input => Focus::Log,
            Focus::Suggestions => Focus::Input,
            Focus::Log => Focus::Suggestions,
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// What a rendered row of the conversation log holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Label(Sender),
    Text(Sender),
    Blank,
    Typing,
}

/// One terminal row of the conversation log, already wrapped to the log width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub kind: RowKind,
    pub text: String,
}

impl LogRow {
    fn new(kind: RowKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Wrap `text` at word boundaries by display width, keeping its own line breaks.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

pub struct App<B: ChatBackend = QueryClient> {
    pub should_quit: bool,
    pub focus: Focus,
    pub controller: ConversationController<B>,
    /// Shown in the header so the user knows where questions go.
    pub endpoint: String,

    // Input box
    pub input: String,
    pub input_cursor: usize, // character index, not bytes

    // Suggestions
    pub selected_suggestion: usize,
    pub suggestion_areas: Vec<Rect>,

    // Conversation log
    pub log_scroll: usize,
    pub follow_log: bool,
    pub log_area: Option<Rect>,
    pub log_height: u16,
    pub log_width: u16,

    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl<B: ChatBackend> App<B> {
    pub fn new(controller: ConversationController<B>, endpoint: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            focus: Focus::Input,
            controller,
            endpoint: endpoint.into(),
            input: String::new(),
            input_cursor: 0,
            selected_suggestion: 0,
            suggestion_areas: Vec::new(),
            log_scroll: 0,
            follow_log: true,
            log_area: None,
            log_height: 0,
            log_width: 0,
            animation_frame: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.controller.state().is_busy()
    }

    /// Called on every tick: pick up a finished reply and advance the typing animation.
    pub fn tick(&mut self) {
        self.poll_reply();
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }

    pub fn poll_reply(&mut self) {
        if self.controller.poll_reply() {
            self.follow_log = true;
        }
    }

    // Input editing. All of it is locked while a reply is outstanding.

    pub fn can_edit(&self) -> bool {
        !self.is_busy()
    }

    pub fn insert_char(&mut self, c: char) {
        if !self.can_edit() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if !self.can_edit() || self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete_at_cursor(&mut self) {
        if !self.can_edit() || self.input_cursor >= self.input.chars().count() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.remove(byte_pos);
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.input_cursor = 0;
    }

    /// Send the input box contents. The box is only cleared if the message was accepted.
    pub fn submit_input(&mut self) {
        if self.controller.submit(&self.input) {
            self.clear_input();
            self.follow_log = true;
        }
    }

    pub fn send_suggestion(&mut self, idx: usize) {
        let Some(text) = SUGGESTIONS.get(idx) else {
            return;
        };
        self.selected_suggestion = idx;
        if self.controller.submit(text) {
            self.follow_log = true;
        }
    }

    pub fn suggestion_next(&mut self) {
        self.selected_suggestion = (self.selected_suggestion + 1) % SUGGESTIONS.len();
    }

    pub fn suggestion_prev(&mut self) {
        self.selected_suggestion = self
            .selected_suggestion
            .checked_sub(1)
            .unwrap_or(SUGGESTIONS.len() - 1);
    }

    // Conversation log scrolling

    /// The whole log as wrapped rows at the current width, typing indicator included.
    /// Rendering and scrolling both work from this, so they always agree.
    pub fn log_rows(&self) -> Vec<LogRow> {
        let wrap_width = if self.log_width > 0 {
            self.log_width as usize
        } else {
            50
        };

        let mut rows = Vec::new();
        for entry in self.controller.state().entries() {
            let sender = entry.sender();
            let label = match sender {
                Sender::User => "You",
                Sender::Bot => "Bot",
            };
            rows.push(LogRow::new(RowKind::Label(sender), label));
            rows.extend(
                wrap_text(entry.text(), wrap_width)
                    .into_iter()
                    .map(|line| LogRow::new(RowKind::Text(sender), line)),
            );
            rows.push(LogRow::new(RowKind::Blank, ""));
        }

        if self.is_busy() {
            rows.push(LogRow::new(RowKind::Label(Sender::Bot), "Bot"));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((self.animation_frame as usize) + 1);
            rows.push(LogRow::new(RowKind::Typing, format!("Bot is typing{}", dots)));
        }
        rows
    }

    pub fn max_log_scroll(&self) -> usize {
        self.log_rows().len().saturating_sub(self.log_height as usize)
    }

    /// Re-pin the scroll position against a freshly built row count.
    pub fn clamp_log_scroll(&mut self, total_rows: usize) {
        let max = total_rows.saturating_sub(self.log_height as usize);
        if self.follow_log {
            self.log_scroll = max;
        } else {
            self.log_scroll = self.log_scroll.min(max);
        }
    }

    pub fn scroll_log_down(&mut self, lines: usize) {
        let max = self.max_log_scroll();
        self.log_scroll = self.log_scroll.saturating_add(lines).min(max);
        self.follow_log = self.log_scroll >= max;
    }

    pub fn scroll_log_up(&mut self, lines: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(lines);
        self.follow_log = false;
    }

    pub fn scroll_log_top(&mut self) {
        self.log_scroll = 0;
        self.follow_log = false;
    }

    pub fn scroll_log_bottom(&mut self) {
        self.follow_log = true;
        self.log_scroll = self.max_log_scroll();
    }

    pub fn half_page(&self) -> usize {
        (self.log_height as usize / 2).max(1)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::test_app;
    use super::*;
    use shopchat_core::ChatEntry;
    use unicode_width::UnicodeWidthStr;

    #[tokio::test]
    async fn editing_is_utf8_safe() {
        let (mut app, _gate) = test_app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.cursor_left();
        app.delete_before_cursor();
        assert_eq!(app.input, "hélo");
        assert_eq!(app.input_cursor, 2);

        app.cursor_home();
        app.delete_at_cursor();
        assert_eq!(app.input, "élo");
        app.cursor_end();
        assert_eq!(app.input_cursor, 3);
    }

    #[tokio::test]
    async fn submit_clears_input_and_locks_editing() {
        let (mut app, gate) = test_app();
        for c in "where is 12345".chars() {
            app.insert_char(c);
        }

        app.submit_input();
        assert!(app.input.is_empty());
        assert!(app.is_busy());
        assert_eq!(app.controller.state().entries()[1], ChatEntry::user("where is 12345"));

        app.insert_char('x');
        assert!(app.input.is_empty());

        gate.notify_one();
        app.controller.settle().await;
        assert!(!app.is_busy());
        app.insert_char('x');
        assert_eq!(app.input, "x");
    }

    #[tokio::test]
    async fn blank_input_is_kept_and_not_sent() {
        let (mut app, _gate) = test_app();
        app.insert_char(' ');
        app.submit_input();

        assert_eq!(app.input, " ");
        assert_eq!(app.controller.state().entries().len(), 1);
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn suggestion_sends_its_text_once_per_reply() {
        let (mut app, gate) = test_app();

        app.send_suggestion(3);
        app.send_suggestion(0);

        let entries = app.controller.state().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].sender(), Sender::User);
        assert_eq!(entries[1].text(), SUGGESTIONS[3]);

        gate.notify_one();
        app.controller.settle().await;
        app.send_suggestion(3);
        assert_eq!(app.controller.state().entries().len(), 4);
        gate.notify_one();
        app.controller.settle().await;
    }

    #[tokio::test]
    async fn suggestion_selection_wraps() {
        let (mut app, _gate) = test_app();
        app.suggestion_prev();
        assert_eq!(app.selected_suggestion, SUGGESTIONS.len() - 1);
        app.suggestion_next();
        assert_eq!(app.selected_suggestion, 0);
    }

    #[tokio::test]
    async fn scrolling_up_stops_following() {
        let (mut app, _gate) = test_app();
        app.log_width = 10;
        app.log_height = 2;
        app.scroll_log_bottom();
        assert!(app.log_scroll > 0);

        app.scroll_log_up(1);
        assert!(!app.follow_log);
        app.scroll_log_down(usize::MAX);
        assert!(app.follow_log);
        assert_eq!(app.log_scroll, app.max_log_scroll());
    }

    #[test]
    fn wrap_keeps_breaks_and_breaks_at_words() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
        assert_eq!(wrap_text("abcdefghijk", 10), vec!["abcdefghij", "k"]);
    }

    #[test]
    fn wrap_measures_display_width() {
        // The wave emoji is two columns wide
        assert_eq!(wrap_text("Hi! 👋 there", 5), vec!["Hi!", "👋", "there"]);
        for line in wrap_text(shopchat_core::GREETING, 20) {
            assert!(UnicodeWidthStr::width(line.as_str()) <= 20, "{line:?} overflows");
        }
    }

    #[tokio::test]
    async fn log_rows_cover_labels_text_and_typing() {
        let (mut app, gate) = test_app();
        app.log_width = 20;
        app.send_suggestion(0);

        let rows = app.log_rows();
        assert_eq!(rows[0], LogRow::new(RowKind::Label(Sender::Bot), "Bot"));
        assert!(rows.iter().all(|r| UnicodeWidthStr::width(r.text.as_str()) <= 20));
        assert_eq!(rows.last().map(|r| r.kind), Some(RowKind::Typing));
        assert!(rows.iter().any(|r| r.kind == RowKind::Text(Sender::User)));

        gate.notify_one();
        app.controller.settle().await;
        let rows = app.log_rows();
        assert_eq!(rows.last().map(|r| r.kind), Some(RowKind::Blank));
        assert!(rows.iter().all(|r| r.kind != RowKind::Typing));
    }

    #[tokio::test]
    async fn scroll_position_survives_huge_logs() {
        let (mut app, _gate) = test_app();
        app.log_height = 10;
        app.clamp_log_scroll(200_000);
        assert_eq!(app.log_scroll, 200_000 - 10);

        app.scroll_log_up(usize::MAX);
        assert_eq!(app.log_scroll, 0);
        app.clamp_log_scroll(5);
        assert_eq!(app.log_scroll, 0);
    }

    #[test]
    fn focus_cycles_both_ways() {
        assert_eq!(Focus::Input.next().next().next(), Focus::Input);
        assert_eq!(Focus::Input.prev(), Focus::Log);
    }
}
