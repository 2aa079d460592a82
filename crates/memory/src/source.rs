//! Knowledge sources for semantic memory: plain text, local files and URLs.

use agentsuite_core::error::MemoryError;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Extensions we refuse to read as text.
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "png", "jpg", "jpeg", "gif", "webp", "zip",
    "gz", "tar", "mp3", "mp4", "wav", "exe", "bin",
];

/// Where ingested knowledge comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Text(String),
    Url(String),
    File(PathBuf),
}

impl Source {
    /// Classify a raw source string: `http(s)://` is a URL, an existing
    /// path is a file, anything else is plain text.
    pub fn classify(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Self::Url(trimmed.to_string());
        }
        if !trimmed.contains('\n') && trimmed.len() < 4096 {
            let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
            if Path::new(path).is_file() {
                return Self::File(PathBuf::from(path));
            }
        }
        Self::Text(input.to_string())
    }

    /// Short description for logs and error messages.
    pub fn reference(&self) -> String {
        match self {
            Self::Text(text) => {
                let preview: String = text.chars().take(40).collect();
                format!("text:{preview}")
            }
            Self::Url(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Fetch and normalize the source to plain text or markdown.
    pub async fn load(&self, client: &reqwest::Client) -> Result<String, MemoryError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::File(path) => load_file(path).await,
            Self::Url(url) => load_url(client, url).await,
        }
    }
}

/// HTTP client used for URL sources.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("agentsuite/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

async fn load_file(path: &Path) -> Result<String, MemoryError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if BINARY_EXTENSIONS.contains(&extension.as_str()) {
        return Err(MemoryError::UnsupportedSource(path.display().to_string()));
    }

    let content = tokio::fs::read_to_string(path).await.map_err(|e| MemoryError::SourceFetch {
        source_ref: path.display().to_string(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), bytes = content.len(), "Loaded file source");

    if matches!(extension.as_str(), "html" | "htm") {
        html_to_markdown(&path.display().to_string(), &content)
    } else {
        Ok(content)
    }
}

async fn load_url(client: &reqwest::Client, url: &str) -> Result<String, MemoryError> {
    let fetch_error = |reason: String| MemoryError::SourceFetch {
        source_ref: url.to_string(),
        reason,
    };

    let response = client.get(url).send().await.map_err(|e| fetch_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {status}")));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/plain")
        .to_ascii_lowercase();
    if !is_textual(&content_type) {
        return Err(MemoryError::UnsupportedSource(format!("{url} ({content_type})")));
    }

    let body = response.text().await.map_err(|e| fetch_error(e.to_string()))?;
    debug!(url, content_type = %content_type, bytes = body.len(), "Fetched URL source");

    if content_type.contains("html") {
        html_to_markdown(url, &body)
    } else {
        Ok(body)
    }
}

fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || content_type.contains("html")
        || content_type.contains("json")
        || content_type.contains("xml")
        || content_type.contains("markdown")
}

fn html_to_markdown(source_ref: &str, html: &str) -> Result<String, MemoryError> {
    htmd::convert(html).map_err(|e| MemoryError::SourceFetch {
        source_ref: source_ref.to_string(),
        reason: format!("HTML conversion failed: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_sources() {
        assert_eq!(
            Source::classify("https://example.com/doc"),
            Source::Url("https://example.com/doc".into())
        );
        assert_eq!(
            Source::classify("just some words"),
            Source::Text("just some words".into())
        );

        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(Source::classify(path), Source::File(file.path().to_path_buf()));
    }

    #[tokio::test]
    async fn loads_text_and_markdown_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Notes\n\nRust is great.").unwrap();

        let text = Source::File(path).load(&http_client()).await.unwrap();
        assert!(text.contains("Rust is great."));
    }

    #[tokio::test]
    async fn html_files_become_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html><body><h1>Title</h1><p>Hello world</p></body></html>").unwrap();

        let text = Source::File(path).load(&http_client()).await.unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Hello world"));
        assert!(!text.contains("<p>"));
    }

    #[tokio::test]
    async fn binary_files_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let err = Source::File(path).load(&http_client()).await.unwrap_err();
        assert!(matches!(err, MemoryError::UnsupportedSource(_)));
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_error() {
        let err = load_file(Path::new("/definitely/not/here.txt")).await.unwrap_err();
        assert!(matches!(err, MemoryError::SourceFetch { .. }));
    }

    #[test]
    fn textual_content_types() {
        assert!(is_textual("text/html; charset=utf-8"));
        assert!(is_textual("application/json"));
        assert!(!is_textual("application/pdf"));
    }
}
