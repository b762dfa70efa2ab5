use anyhow::Error;

use crate::domain::document::{DocumentKind, Field, SheetRow};
use crate::domain::grouping::compute_grouping;
use crate::usecase::ports::backend::{Artifact, DocumentSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
    Saving,
    Error(String),
}

// Completion token for one in-flight backend call. The epoch is captured at
// begin time; reset() advances it, which orphans every outstanding ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTicket {
    epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    kind: DocumentKind,
    status: SessionStatus,
    rows: Vec<SheetRow>,
    file_name: String,
    has_unsaved_changes: bool,
    save_error: Option<String>,
    download_error: Option<String>,
    download_in_flight: bool,
    epoch: u64,
}

impl EditorSession {
    pub fn new(kind: DocumentKind) -> Self {
        EditorSession {
            kind,
            status: SessionStatus::Idle,
            rows: Vec::new(),
            file_name: String::new(),
            has_unsaved_changes: false,
            save_error: None,
            download_error: None,
            download_in_flight: false,
            epoch: 0,
        }
    }

    #[allow(dead_code)]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn download_error(&self) -> Option<&str> {
        self.download_error.as_deref()
    }

    pub fn download_in_flight(&self) -> bool {
        self.download_in_flight
    }

    pub fn begin_load(&mut self) -> Option<OpTicket> {
        match self.status {
            SessionStatus::Idle | SessionStatus::Error(_) => {
                self.status = SessionStatus::Loading;
                Some(OpTicket { epoch: self.epoch })
            }
            _ => None,
        }
    }

    pub fn finish_load(&mut self, ticket: OpTicket, result: Result<DocumentSnapshot, Error>) {
        if ticket.epoch != self.epoch || self.status != SessionStatus::Loading {
            return;
        }
        match result {
            Ok(snapshot) => {
                self.rows = snapshot.rows;
                self.file_name = snapshot.file_name;
                self.has_unsaved_changes = false;
                self.save_error = None;
                self.download_error = None;
                self.status = SessionStatus::Ready;
            }
            Err(err) => {
                self.status = SessionStatus::Error(error_text(&err));
            }
        }
    }

    pub fn edit_cell(&mut self, row_index: usize, field: Field, value: &str) {
        if self.status != SessionStatus::Ready || row_index >= self.rows.len() {
            return;
        }

        if field.is_grouped() {
            // Membership is derived from the pre-edit rows; the next render
            // recomputes spans from the written values.
            let grouping = compute_grouping(&self.rows);
            let axis = if field == Field::MajorCategory {
                grouping.major
            } else {
                grouping.middle
            };
            match axis.run_at(row_index) {
                Some(run) => {
                    for index in run.indices() {
                        self.rows[index].set_value(field, value);
                    }
                }
                None => self.rows[row_index].set_value(field, value),
            }
        } else {
            self.rows[row_index].set_value(field, value);
        }

        self.has_unsaved_changes = true;
    }

    pub fn add_row(&mut self) {
        if self.status != SessionStatus::Ready {
            return;
        }
        self.rows.push(SheetRow::empty(self.kind));
        self.has_unsaved_changes = true;
    }

    pub fn remove_row(&mut self, row_index: usize) {
        if self.status != SessionStatus::Ready || row_index >= self.rows.len() {
            return;
        }
        self.rows.remove(row_index);
        self.has_unsaved_changes = true;
    }

    pub fn begin_save(&mut self) -> Option<OpTicket> {
        if self.status != SessionStatus::Ready {
            return None;
        }
        self.status = SessionStatus::Saving;
        self.save_error = None;
        Some(OpTicket { epoch: self.epoch })
    }

    pub fn finish_save(&mut self, ticket: OpTicket, result: Result<DocumentSnapshot, Error>) {
        if ticket.epoch != self.epoch || self.status != SessionStatus::Saving {
            return;
        }
        self.status = SessionStatus::Ready;
        match result {
            Ok(snapshot) => {
                self.rows = snapshot.rows;
                if !snapshot.file_name.is_empty() {
                    self.file_name = snapshot.file_name;
                }
                self.has_unsaved_changes = false;
                self.save_error = None;
            }
            Err(err) => {
                self.save_error = Some(error_text(&err));
            }
        }
    }

    pub fn begin_download(&mut self) -> Option<OpTicket> {
        if self.status != SessionStatus::Ready
            || self.has_unsaved_changes
            || self.download_in_flight
        {
            return None;
        }
        self.download_in_flight = true;
        self.download_error = None;
        Some(OpTicket { epoch: self.epoch })
    }

    pub fn finish_download(
        &mut self,
        ticket: OpTicket,
        result: Result<Artifact, Error>,
    ) -> Option<Artifact> {
        if ticket.epoch != self.epoch || !self.download_in_flight {
            return None;
        }
        self.download_in_flight = false;
        match result {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                self.download_error = Some(error_text(&err));
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.epoch += 1;
        self.status = SessionStatus::Idle;
        self.rows.clear();
        self.file_name.clear();
        self.has_unsaved_changes = false;
        self.save_error = None;
        self.download_error = None;
        self.download_in_flight = false;
    }
}

fn error_text(err: &Error) -> String {
    format!("{err:#}")
}
