use askama::Template;
use pdf_assistant::{ChatMessage, Notice};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

pub const TITLE: &str = "Gemini PDF Assistant";
pub const INTRO: &str = "I'm your AI assistant powered by Google's Gemini model. Load a PDF and ask me anything about it.";

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub title: &'a str,
    pub intro: &'a str,
    pub messages: Vec<MessageView<'a>>,
    pub notice: Option<Notice>,
    /// Static banner shown on every render, e.g. a missing API key.
    pub config_error: Option<String>,
    pub pdf_source: Option<&'a str>,
    pub guide_enabled: bool,
    pub chat_enabled: bool,
}

/// One rendered history entry. Only assistant replies carry markdown HTML.
pub struct MessageView<'a> {
    pub label: &'static str,
    pub is_user: bool,
    pub content: &'a str,
    pub html: String,
}

impl<'a> MessageView<'a> {
    fn from_message(message: &'a ChatMessage) -> Self {
        let is_user = message.role.is_user();
        Self {
            label: message.role.label(),
            is_user,
            content: &message.content,
            html: if is_user {
                String::new()
            } else {
                render_markdown(&message.content)
            },
        }
    }
}

impl<'a> IndexPage<'a> {
    pub fn new(history: &'a [ChatMessage]) -> Self {
        Self {
            title: TITLE,
            intro: INTRO,
            messages: history.iter().map(MessageView::from_message).collect(),
            notice: None,
            config_error: None,
            pdf_source: None,
            guide_enabled: false,
            chat_enabled: true,
        }
    }
}

/// Markdown to HTML. Raw HTML in the source is escaped, script-capable link targets are dropped.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(Tag::Link(kind, dest, title)) => {
            Event::Start(Tag::Link(kind, safe_url(dest), title))
        }
        Event::End(Tag::Link(kind, dest, title)) => {
            Event::End(Tag::Link(kind, safe_url(dest), title))
        }
        Event::Start(Tag::Image(kind, dest, title)) => {
            Event::Start(Tag::Image(kind, safe_url(dest), title))
        }
        Event::End(Tag::Image(kind, dest, title)) => {
            Event::End(Tag::Image(kind, safe_url(dest), title))
        }
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_url(dest: CowStr<'_>) -> CowStr<'_> {
    let scheme = dest.trim_start().to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|prefix| scheme.starts_with(prefix))
    {
        CowStr::Borrowed("#")
    } else {
        dest
    }
}
