use anyhow::Result;

use crate::domain::document::{DocumentKind, SheetRow};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub rows: Vec<SheetRow>,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub trait DocumentBackend: Send + Sync {
    fn fetch_document(&self, kind: DocumentKind) -> Result<DocumentSnapshot>;
    fn store_document(&self, kind: DocumentKind, rows: &[SheetRow]) -> Result<DocumentSnapshot>;
    fn fetch_artifact(&self, kind: DocumentKind) -> Result<Artifact>;
}
