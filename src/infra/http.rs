use anyhow::{Context, Result};
use dioxus::logger::tracing::{debug, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_DISPOSITION;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::document::{DocumentKind, SheetRow};
use crate::usecase::ports::backend::{Artifact, DocumentBackend, DocumentSnapshot};

pub const BASE_URL_ENV: &str = "QASHEET_API_BASE";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    #[allow(dead_code)]
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize)]
struct DocumentBody {
    #[serde(default)]
    rows: Vec<SheetRow>,
    #[serde(rename = "fileName", default)]
    file_name: String,
}

#[derive(Debug, Serialize)]
struct SaveBody<'a> {
    rows: &'a [SheetRow],
}

pub struct HttpDocumentBackend {
    base_url: String,
    client: Client,
}

impl HttpDocumentBackend {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpDocumentBackend {
            base_url,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl DocumentBackend for HttpDocumentBackend {
    fn fetch_document(&self, kind: DocumentKind) -> Result<DocumentSnapshot> {
        let url = self.url(kind.rows_path());
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("서버에 연결하지 못했습니다: {url}"))?;
        let response = ensure_success(response)?;
        let body: DocumentBody = response.json().context("행 응답을 해석하지 못했습니다")?;

        Ok(DocumentSnapshot {
            rows: body.rows,
            file_name: body.file_name,
        })
    }

    fn store_document(&self, kind: DocumentKind, rows: &[SheetRow]) -> Result<DocumentSnapshot> {
        let url = self.url(kind.rows_path());
        debug!("PUT {url} ({} rows)", rows.len());
        let response = self
            .client
            .put(&url)
            .json(&SaveBody { rows })
            .send()
            .with_context(|| format!("서버에 연결하지 못했습니다: {url}"))?;
        let response = ensure_success(response)?;
        let body: DocumentBody = response.json().context("저장 응답을 해석하지 못했습니다")?;

        Ok(DocumentSnapshot {
            rows: body.rows,
            file_name: body.file_name,
        })
    }

    fn fetch_artifact(&self, kind: DocumentKind) -> Result<Artifact> {
        let url = self.url(kind.download_path());
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("서버에 연결하지 못했습니다: {url}"))?;
        let response = ensure_success(response)?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(file_name_from_content_disposition)
            .map(|name| sanitize_file_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| kind.fallback_file_name());
        let bytes = response
            .bytes()
            .context("다운로드 본문을 읽지 못했습니다")?
            .to_vec();

        Ok(Artifact { file_name, bytes })
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = error_message_from_body(status.as_u16(), &body);
    warn!("백엔드 오류 응답: HTTP {} ({message})", status.as_u16());
    Err(ApiError {
        status: status.as_u16(),
        message,
    }
    .into())
}

fn error_message_from_body(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|parsed| parsed.detail)
        .filter(|detail| !detail.trim().is_empty())
        .unwrap_or_else(|| format!("요청이 실패했습니다 (HTTP {status})"))
}

pub fn file_name_from_content_disposition(header: &str) -> Option<String> {
    // RFC 5987 form first: the backend sends Korean names percent-encoded.
    for part in header.split(';') {
        let part = part.trim();
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let encoded = encoded.trim_matches('"');
            let encoded = encoded
                .strip_prefix("UTF-8''")
                .or_else(|| encoded.strip_prefix("utf-8''"))
                .unwrap_or(encoded);
            if let Ok(decoded) = urlencoding::decode(encoded) {
                let decoded = decoded.trim();
                if !decoded.is_empty() {
                    return Some(decoded.to_string());
                }
            }
        }
    }

    for part in header.split(';') {
        let part = part.trim();
        if let Some(name) = part.strip_prefix("filename=") {
            let name = name.trim().trim_matches('"').trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    None
}

pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| {
            if ch.is_control() || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                ch
            }
        })
        .collect();

    cleaned.trim().trim_end_matches(['.', ' ']).to_string()
}
