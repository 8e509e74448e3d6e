use crate::error::{AssistantError, Result};
use crate::models::{LoadedPdf, PdfSource};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::path::Path;

static GITHUB_BLOB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://github\.com/([^/]+)/([^/]+)/blob/(.+)$").expect("valid regex")
});
const RAW_GITHUB_BASE: &str = "https://raw.githubusercontent.com";

static EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

pub struct PdfLoader {
    client: Client,
    raw_github_base: String,
}

impl PdfLoader {
    pub fn new() -> Self {
        Self::with_raw_github_base(RAW_GITHUB_BASE)
    }

    /// Serves rewritten GitHub `blob` links from `base` instead of the raw host.
    pub fn with_raw_github_base(base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            raw_github_base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn load_from_bytes(&self, bytes: Vec<u8>, filename: &str) -> Result<LoadedPdf> {
        log::info!("Processing uploaded PDF: {} ({} bytes)", filename, bytes.len());

        let text = extract_off_thread(bytes).await?;
        let pdf = LoadedPdf {
            text,
            source: PdfSource::Upload {
                filename: filename.to_string(),
            },
        };
        log::info!("Extracted {} characters from {}", pdf.char_count(), filename);
        Ok(pdf)
    }

    pub async fn load_from_file(&self, file_path: &Path) -> Result<LoadedPdf> {
        let filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());

        let bytes = tokio::fs::read(file_path).await?;
        self.load_from_bytes(bytes, &filename).await
    }

    pub async fn load_from_url(&self, url: &str) -> Result<LoadedPdf> {
        let fetch_url = rewrite_github_blob(url, &self.raw_github_base);
        log::info!("Fetching PDF from {}", fetch_url);

        let response = self.client.get(&fetch_url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            log::error!("PDF fetch from {} failed with HTTP {}", fetch_url, status);
            return Err(AssistantError::FetchStatus {
                url: fetch_url,
                status,
            });
        }

        let bytes = response.bytes().await?.to_vec();
        let text = extract_off_thread(bytes).await?;
        let pdf = LoadedPdf {
            text,
            source: PdfSource::Url {
                url: url.to_string(),
            },
        };
        log::info!("Extracted {} characters from {}", pdf.char_count(), url);
        Ok(pdf)
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

async fn extract_off_thread(bytes: Vec<u8>) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| AssistantError::PdfParse(format!("extraction task failed: {e}")))?
}

/// Extracts the text of every page, in page order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let raw = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AssistantError::PdfParse(e.to_string()))?;
    Ok(clean_text(&raw))
}

fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| *c != '\u{0}' && *c != '\u{FEFF}')
        .collect();
    let trimmed_lines = stripped
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    EXTRA_BLANK_LINES
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// GitHub `blob` URLs serve an HTML viewer; the raw host serves the file.
pub fn raw_github_url(url: &str) -> String {
    rewrite_github_blob(url, RAW_GITHUB_BASE)
}

fn rewrite_github_blob(url: &str, raw_base: &str) -> String {
    match GITHUB_BLOB.captures(url) {
        Some(caps) => format!("{}/{}/{}/{}", raw_base, &caps[1], &caps[2], &caps[3]),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn rewrites_github_blob_urls() {
        assert_eq!(
            raw_github_url("https://github.com/tjbeevor/chatterbox/blob/main/guide.pdf"),
            "https://raw.githubusercontent.com/tjbeevor/chatterbox/main/guide.pdf"
        );
        assert_eq!(
            raw_github_url("https://example.com/files/guide.pdf"),
            "https://example.com/files/guide.pdf"
        );
    }

    #[test]
    fn clean_text_collapses_blank_runs() {
        let cleaned = clean_text("\u{FEFF}Title  \n\n\n\n\nBody\u{0} text\n");
        assert_eq!(cleaned, "Title\n\nBody text");
    }

    const GUIDE_PDF: &[u8] = include_bytes!("../tests/fixtures/guide.pdf");

    #[test]
    fn extracts_text_from_pdf() {
        let text = extract_pdf_text(GUIDE_PDF).unwrap();
        assert!(text.contains("Prompting"));
        assert!(text.contains("instructions"));
    }

    #[tokio::test]
    async fn loads_pdf_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("guide.pdf");
        std::fs::write(&file, GUIDE_PDF).unwrap();

        let pdf = PdfLoader::new().load_from_file(&file).await.unwrap();
        assert!(pdf.text.contains("Prompting"));
        assert_eq!(
            pdf.source,
            PdfSource::Upload {
                filename: "guide.pdf".to_string()
            }
        );
    }

    #[tokio::test]
    async fn github_blob_url_is_fetched_from_raw_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme/docs/main/guide.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(GUIDE_PDF),
            )
            .expect(1)
            .mount(&server)
            .await;

        let loader = PdfLoader::with_raw_github_base(server.uri());
        let url = "https://github.com/acme/docs/blob/main/guide.pdf";
        let pdf = loader.load_from_url(url).await.unwrap();

        assert!(pdf.text.contains("instructions"));
        assert_eq!(pdf.source, PdfSource::Url { url: url.to_string() });
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = extract_pdf_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, AssistantError::PdfParse(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfLoader::new()
            .load_from_file(&dir.path().join("nope.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Io(_)));
    }

    #[tokio::test]
    async fn non_pdf_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.pdf");
        std::fs::write(&file, "plain text pretending to be a pdf").unwrap();

        let err = PdfLoader::new().load_from_file(&file).await.unwrap_err();
        assert!(matches!(err, AssistantError::PdfParse(_)));
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guide.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/guide.pdf", server.uri());
        let err = PdfLoader::new().load_from_url(&url).await.unwrap_err();
        match err {
            AssistantError::FetchStatus { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn html_instead_of_pdf_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guide.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>viewer</html>"))
            .mount(&server)
            .await;

        let url = format!("{}/guide.pdf", server.uri());
        let err = PdfLoader::new().load_from_url(&url).await.unwrap_err();
        assert!(matches!(err, AssistantError::PdfParse(_)));
    }
}
