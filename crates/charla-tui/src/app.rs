use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;

use charla_core::ai::groq::DEFAULT_MODEL;
use charla_core::{ChatSession, Config, GroqClient, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: ChatSession,

    // Input line state
    pub input: String,
    pub cursor: usize, // char index into input

    // Chat viewport state
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_total_lines: u16,
    pub stick_to_bottom: bool,

    // In-flight completion request
    pub pending: Option<(Ticket, JoinHandle<Result<String>>)>,

    // Animation state (0-2 for ellipsis)
    pub animation_frame: u8,

    // One-line status feedback (copy confirmation etc.)
    pub status: Option<String>,

    // Provider
    pub client: Option<GroqClient>,
    pub model: String,
}

impl App {
    pub fn new() -> Self {
        let config = Config::load().unwrap_or_else(|_| Config::new());

        // Env var wins over the config file
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .or_else(|| config.groq_api_key.clone());
        let client = api_key.as_deref().map(GroqClient::new);

        let model = config
            .default_model
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            session: ChatSession::new(),
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,
            stick_to_bottom: true,
            pending: None,
            animation_frame: 0,
            status: None,
            client,
            model,
        }
    }

    /// Submit the current input line. Gated: does nothing while a request
    /// is outstanding or when the input is blank.
    pub fn submit(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let text = self.input.clone();
        let Some(ticket) = self.session.submit(&text) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.status = None;
        self.stick_to_bottom = true;

        match &self.client {
            Some(client) => {
                let client = client.clone();
                let model = self.model.clone();
                let history = self.session.conversation().messages().to_vec();
                self.pending = Some((
                    ticket,
                    tokio::spawn(async move { client.complete(&model, &history).await }),
                ));
            }
            None => {
                self.session.resolve(
                    ticket,
                    Err(anyhow!(
                        "no API key configured; set GROQ_API_KEY or add groq_api_key to the config file"
                    )),
                );
            }
        }
    }

    /// Called on every tick: if the spawned request has finished, feed its
    /// result back into the session.
    pub async fn poll_completion(&mut self) {
        let finished = matches!(&self.pending, Some((_, handle)) if handle.is_finished());
        if !finished {
            return;
        }
        let (ticket, handle) = self.pending.take().unwrap();
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(anyhow!("completion task panicked: {err}")),
        };
        self.session.resolve(ticket, result);
        self.stick_to_bottom = true;
    }

    /// Discard the conversation. The network request, if any, keeps running
    /// but its reply has nowhere to land: the handle is dropped here and the
    /// session generation guard would reject it anyway.
    pub fn clear_conversation(&mut self) {
        self.session.clear();
        self.pending = None;
        self.chat_scroll = 0;
        self.stick_to_bottom = true;
        self.status = None;
    }

    /// Copy the most recent code block of the latest assistant reply.
    pub fn copy_last_code_block(&mut self) {
        let Some(code) = self
            .session
            .conversation()
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == charla_core::Role::Assistant)
            .and_then(|m| crate::markdown::last_code_block(&m.text))
        else {
            self.status = Some("No code block to copy".to_string());
            return;
        };

        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(code)) {
            Ok(()) => self.status = Some("Copied code block".to_string()),
            Err(err) => self.status = Some(format!("Clipboard error: {err}")),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_down(&mut self) {
        let max_scroll = self.chat_total_lines.saturating_sub(self.chat_height);
        if self.chat_scroll < max_scroll {
            self.chat_scroll += 1;
        }
        self.stick_to_bottom = self.chat_scroll >= max_scroll;
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
        self.stick_to_bottom = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.stick_to_bottom = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.stick_to_bottom = true;
    }
}
