use crate::error::{AssistantError, Result};
use crate::gemini_service::{ChatThread, GeminiService};
use crate::models::*;
use crate::prompt::build_prompt;

/// Everything one browser session holds: history, PDF text and the model thread.
#[derive(Debug)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
    pdf: Option<LoadedPdf>,
    thread: ChatThread,
    context_limit: usize,
    notice: Option<Notice>,
}

impl ChatSession {
    pub fn new(thread: ChatThread, context_limit: usize) -> Self {
        Self {
            history: Vec::new(),
            pdf: None,
            thread,
            context_limit,
            notice: None,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn pdf(&self) -> Option<&LoadedPdf> {
        self.pdf.as_ref()
    }

    pub fn has_pdf(&self) -> bool {
        self.pdf.as_ref().is_some_and(|pdf| !pdf.text.is_empty())
    }

    pub fn thread(&self) -> &ChatThread {
        &self.thread
    }

    pub fn set_pdf(&mut self, pdf: LoadedPdf) {
        log::info!(
            "Session PDF set from {} ({} characters)",
            pdf.source.describe(),
            pdf.char_count()
        );
        self.pdf = Some(pdf);
    }

    pub async fn ask(&mut self, gemini: &GeminiService, question: &str) -> Result<&ChatMessage> {
        if question.trim().is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        let pdf_text = match &self.pdf {
            Some(pdf) if !pdf.text.is_empty() => pdf.text.as_str(),
            _ => return Err(AssistantError::NoPdfLoaded),
        };
        let prompt = build_prompt(pdf_text, question, self.context_limit);

        // The question stays in the history even when the model call fails.
        self.history.push(ChatMessage::user(question));

        let answer = gemini.send_message(&mut self.thread, &prompt).await?;
        self.history.push(ChatMessage::assistant(answer));
        log::info!("Chat turn completed, history length {}", self.history.len());

        Ok(&self.history[self.history.len() - 1])
    }

    /// Drops history and the model thread; the loaded PDF survives.
    pub fn clear(&mut self, gemini: Option<&GeminiService>) {
        self.history.clear();
        self.thread = gemini.map(GeminiService::start_chat).unwrap_or_default();
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}
