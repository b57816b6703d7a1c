use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Result};
use ollama_chat_core::preview::{render_preview, write_document};
use ollama_chat_core::{code_blocks, ChatResponse, ChatSession, CodeBlock, Config, ProxyClient, SubmitOutcome};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// A code block located in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef {
    pub message: usize,
    pub block: CodeBlock,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation
    pub session: ChatSession,
    pub proxy: ProxyClient,
    pub pending: Option<JoinHandle<Result<ChatResponse>>>,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Code block selection, as an index into `code_block_refs()`
    pub selected_block: Option<usize>,
    pub status: Option<String>,
    pub preview_dir: PathBuf,

    // Chat view scrolling
    pub scroll: u16,
    pub scroll_target: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // inner height of the chat pane, set during render
    pub total_lines: u16, // wrapped transcript height, set during render

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: &Config, preview_dir: PathBuf) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            session: ChatSession::new(),
            proxy: ProxyClient::new(&config.proxy_url),
            pending: None,

            input: String::new(),
            cursor: 0,

            selected_block: None,
            status: None,
            preview_dir,

            scroll: 0,
            scroll_target: 0,
            follow_bottom: false,
            chat_height: 0,
            total_lines: 0,

            animation_frame: 0,
        }
    }

    /// Send the input box contents unless a request is already in flight.
    pub fn submit(&mut self) {
        let Some(request) = self.session.begin_submit(&self.input) else {
            return;
        };

        log::info!("Sending message ({} chars)", request.message.chars().count());
        let proxy = self.proxy.clone();
        self.pending = Some(tokio::spawn(async move { proxy.send(&request).await }));
        self.input_mode = InputMode::Normal;
        self.status = None;
        self.scroll_to_bottom();
    }

    /// Collect the in-flight reply if its task has finished.
    pub async fn poll_pending(&mut self) {
        let finished = self.pending.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }
        let Some(task) = self.pending.take() else {
            return;
        };

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(anyhow!("Request task failed: {}", e)),
        };

        if self.session.finish_submit(result, Instant::now()) == SubmitOutcome::Replied {
            self.input.clear();
            self.cursor = 0;
        }
        self.scroll_to_bottom();
    }

    /// Called by the Tick event.
    pub fn on_tick(&mut self, now: Instant) {
        if self.session.input_disabled() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.session.clear_expired(now);
        if self.session.take_refocus(now) {
            self.input_mode = InputMode::Editing;
        }
        self.step_scroll();
    }

    pub fn code_block_refs(&self) -> Vec<BlockRef> {
        self.session
            .messages()
            .iter()
            .enumerate()
            .flat_map(|(message, msg)| {
                code_blocks(&msg.content)
                    .into_iter()
                    .map(move |block| BlockRef { message, block })
            })
            .collect()
    }

    pub fn selected_block_ref(&self) -> Option<BlockRef> {
        let index = self.selected_block?;
        self.code_block_refs().into_iter().nth(index)
    }

    pub fn select_next_block(&mut self) {
        let count = self.code_block_refs().len();
        if count == 0 {
            return;
        }
        self.selected_block = Some(match self.selected_block {
            Some(i) if i + 1 < count => i + 1,
            Some(i) => i,
            // Start from the most recent block
            None => count - 1,
        });
    }

    pub fn select_prev_block(&mut self) {
        let count = self.code_block_refs().len();
        if count == 0 {
            return;
        }
        self.selected_block = Some(match self.selected_block {
            Some(i) => i.saturating_sub(1),
            None => count - 1,
        });
    }

    pub fn copy_selected(&mut self, now: Instant) {
        let Some(selected) = self.selected_block_ref() else {
            self.status = Some("Select a code block with n/N first".to_string());
            return;
        };

        match copy_to_clipboard(&selected.block.body) {
            Ok(()) => self.session.mark_copied(selected.message, now),
            Err(e) => {
                log::error!("Clipboard copy failed: {:#}", e);
                self.status = Some(format!("Copy failed: {:#}", e));
            }
        }
    }

    pub fn toggle_selected_preview(&mut self) {
        match self.selected_block_ref() {
            Some(selected) if selected.block.can_preview() => {
                self.session.toggle_preview(selected.message);
            }
            Some(selected) => {
                let tag = if selected.block.language.is_empty() {
                    "untagged"
                } else {
                    selected.block.language.as_str()
                };
                self.status = Some(format!("No preview for {} code", tag));
            }
            None => self.status = Some("Select a code block with n/N first".to_string()),
        }
    }

    /// Write the selected block's sandboxed preview page and open it in a browser.
    pub fn open_selected_preview(&mut self) {
        let Some(selected) = self.selected_block_ref() else {
            self.status = Some("Select a code block with n/N first".to_string());
            return;
        };
        let Some(preview) = render_preview(&selected.block) else {
            self.status = Some("This code block has no preview".to_string());
            return;
        };

        let opened = write_document(&self.preview_dir, selected.message, &preview)
            .and_then(|path| open::that(&path).map(|_| path).map_err(Into::into));
        match opened {
            Ok(path) => self.status = Some(format!("Opened {}", path.display())),
            Err(e) => {
                log::error!("Could not open preview: {:#}", e);
                self.status = Some(format!("Could not open preview: {:#}", e));
            }
        }
    }

    // Input editing
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\r') {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Scrolling
    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let max = self.max_scroll() as i32;
        let next = (self.scroll as i32 + delta).clamp(0, max) as u16;
        self.scroll = next;
        self.scroll_target = next;
        self.follow_bottom = false;
    }

    pub fn max_scroll(&self) -> u16 {
        self.total_lines.saturating_sub(self.chat_height)
    }

    /// Ease `scroll` toward `scroll_target`, halving the distance each tick.
    fn step_scroll(&mut self) {
        if self.scroll == self.scroll_target {
            return;
        }
        let distance = self.scroll.abs_diff(self.scroll_target);
        let step = (distance / 2).max(1);
        if self.scroll < self.scroll_target {
            self.scroll += step;
        } else {
            self.scroll -= step;
        }
    }
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())?;
    Ok(())
}
