//! Chat session state owned by the client
//!
//! Holds the transcript, the single-slot conversation context, and the
//! per-message preview/copy flags. Time is passed in explicitly so the
//! timed behaviors (copy confirmation, refocus) are deterministic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::protocol::{ChatRequest, ChatResponse, ConversationContext};
use crate::state::ChatMessage;

/// How long a "copied" confirmation stays visible.
pub const COPY_CONFIRM_DURATION: Duration = Duration::from_millis(2000);

/// Delay between a finished round trip and input focus returning.
pub const REFOCUS_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Replied,
    Failed,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    context: Option<ConversationContext>,
    input_disabled: bool,
    last_error: Option<String>,
    preview_states: HashMap<usize, bool>,
    copied: Option<(usize, Instant)>,
    refocus_at: Option<Instant>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn context(&self) -> Option<&ConversationContext> {
        self.context.as_ref()
    }

    pub fn input_disabled(&self) -> bool {
        self.input_disabled
    }

    /// Error from the most recent failed round trip, cleared on the next submit.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Start a round trip for `text`.
    ///
    /// Returns `None` while a request is in flight or when `text` is blank;
    /// otherwise appends the user message, disables input and returns the
    /// request to send.
    pub fn begin_submit(&mut self, text: &str) -> Option<ChatRequest> {
        if self.input_disabled || text.trim().is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(text));
        self.input_disabled = true;
        self.last_error = None;
        self.refocus_at = None;

        Some(ChatRequest {
            message: text.to_string(),
            context: self.context.clone(),
        })
    }

    /// Complete the in-flight round trip.
    pub fn finish_submit(
        &mut self,
        result: anyhow::Result<ChatResponse>,
        now: Instant,
    ) -> SubmitOutcome {
        let outcome = match result {
            Ok(response) => {
                self.messages.push(ChatMessage::assistant(response.message));
                self.context = response.context;
                SubmitOutcome::Replied
            }
            Err(err) => {
                log::error!("Error sending message to Ollama: {:#}", err);
                self.last_error = Some(format!("{:#}", err));
                SubmitOutcome::Failed
            }
        };

        self.input_disabled = false;
        self.refocus_at = Some(now + REFOCUS_DELAY);
        outcome
    }

    /// True exactly once when the scheduled refocus is due.
    pub fn take_refocus(&mut self, now: Instant) -> bool {
        match self.refocus_at {
            Some(at) if now >= at => {
                self.refocus_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn toggle_preview(&mut self, index: usize) {
        let shown = self.preview_states.entry(index).or_insert(false);
        *shown = !*shown;
    }

    pub fn is_preview_shown(&self, index: usize) -> bool {
        self.preview_states.get(&index).copied().unwrap_or(false)
    }

    pub fn mark_copied(&mut self, index: usize, now: Instant) {
        self.copied = Some((index, now));
    }

    /// Message index whose "copied" confirmation is showing at `now`.
    pub fn copied_index(&self, now: Instant) -> Option<usize> {
        self.copied
            .filter(|(_, at)| now.saturating_duration_since(*at) < COPY_CONFIRM_DURATION)
            .map(|(index, _)| index)
    }

    pub fn is_copied(&self, index: usize, now: Instant) -> bool {
        self.copied_index(now) == Some(index)
    }

    /// Drop an expired copy confirmation.
    pub fn clear_expired(&mut self, now: Instant) {
        if self.copied.is_some() && self.copied_index(now).is_none() {
            self.copied = None;
        }
    }
}
