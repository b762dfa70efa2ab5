use dioxus::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use dioxus::logger::tracing::{info, warn};
use directories::ProjectDirs;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

mod domain;
mod infra;
mod ui;
mod usecase;

use domain::document::{DocumentKind, Field, SheetRow};
use domain::grouping::compute_grouping;
use infra::http::HttpDocumentBackend;
use ui::state::session::{EditorSession, SessionStatus};
use usecase::ports::backend::DocumentBackend;

fn main() {
    dioxus::logger::initialize_default();

    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create WebView2 data directory");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("QA 문서 편집"))
                .with_data_directory(webview_data_dir),
        )
        .launch(App);
}

#[component]
fn App() -> Element {
    let mut active_kind = use_signal(|| DocumentKind::FeatureList);

    let active = active_kind();
    let tab_key = active.title();

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 12px;",
            nav {
                style: "display: flex; gap: 8px; padding-bottom: 12px;",
                for (kind, label) in [
                    (DocumentKind::FeatureList, "기능리스트"),
                    (DocumentKind::Testcases, "테스트케이스"),
                ] {
                    button {
                        disabled: kind == active,
                        onclick: move |_| {
                            *active_kind.write() = kind;
                        },
                        if kind == active {
                            "[{label}]"
                        } else {
                            "{label}"
                        }
                    }
                }
            }
            EditorPage { key: "{tab_key}", kind: active }
        }
    }
}

#[component]
fn EditorPage(kind: DocumentKind) -> Element {
    let backend = use_hook(|| Arc::new(HttpDocumentBackend::from_env()));
    let mut session = use_signal(|| EditorSession::new(kind));
    let mut notice = use_signal(String::new);

    let backend_for_init = backend.clone();
    use_effect(move || {
        let Some(ticket) = session.write().begin_load() else {
            return;
        };
        info!("문서 불러오기 시작: {}", kind.title());
        let result = backend_for_init.fetch_document(kind);
        session.write().finish_load(ticket, result);
    });

    let current = session();
    let title = kind.title();
    let editable = *current.status() == SessionStatus::Ready;
    let is_loading = matches!(
        current.status(),
        SessionStatus::Idle | SessionStatus::Loading
    );
    let show_table = matches!(
        current.status(),
        SessionStatus::Ready | SessionStatus::Saving
    );
    let load_error = match current.status() {
        SessionStatus::Error(message) => Some(message.clone()),
        _ => None,
    };
    let file_name = current.file_name().to_string();
    let has_unsaved = current.has_unsaved_changes();
    let downloading = current.download_in_flight();
    let save_error = current.save_error().map(str::to_string);
    let download_error = current.download_error().map(str::to_string);
    let row_count = current.rows().len();
    let plan = build_render_plan(current.rows(), kind);
    let column_count = kind.columns().len();

    let backend_for_save = backend.clone();
    let backend_for_download = backend.clone();
    let backend_for_reload = backend.clone();
    let backend_for_retry = backend.clone();

    rsx! {
        div {
            div {
                style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; padding: 8px 0;",
                h2 { style: "margin: 0 12px 0 0; font-size: 18px;", "{title}" }
                button {
                    disabled: !editable || !has_unsaved,
                    onclick: move |_| {
                        let Some(ticket) = session.write().begin_save() else {
                            return;
                        };
                        let rows = session().rows().to_vec();
                        let result = backend_for_save.store_document(kind, &rows);
                        session.write().finish_save(ticket, result);
                    },
                    "저장"
                }
                button {
                    disabled: !editable || has_unsaved || downloading,
                    onclick: move |_| {
                        let Some(ticket) = session.write().begin_download() else {
                            return;
                        };
                        let result = backend_for_download.fetch_artifact(kind);
                        let Some(artifact) = session.write().finish_download(ticket, result) else {
                            return;
                        };
                        let Some(path) = FileDialog::new()
                            .set_file_name(artifact.file_name.as_str())
                            .save_file() else {
                            *notice.write() = "다운로드 저장을 취소했습니다".to_string();
                            return;
                        };
                        match std::fs::write(&path, &artifact.bytes) {
                            Ok(()) => {
                                *notice.write() = format!("다운로드 완료: {}", path.display());
                            }
                            Err(err) => {
                                warn!("다운로드 파일 저장 실패: {err}");
                                *notice.write() = format!("파일 저장 실패: {err}");
                            }
                        }
                    },
                    "다운로드"
                }
                button {
                    disabled: !editable,
                    onclick: move |_| {
                        session.write().add_row();
                    },
                    "행 추가"
                }
                button {
                    disabled: is_loading,
                    onclick: move |_| {
                        if session().has_unsaved_changes() {
                            let confirmed = MessageDialog::new()
                                .set_level(MessageLevel::Warning)
                                .set_title("다시 불러오기")
                                .set_description("저장되지 않은 변경 사항이 사라집니다. 계속할까요?")
                                .set_buttons(MessageButtons::YesNo)
                                .show();
                            if confirmed != MessageDialogResult::Yes {
                                return;
                            }
                        }
                        session.write().reset();
                        *notice.write() = String::new();
                        let Some(ticket) = session.write().begin_load() else {
                            return;
                        };
                        let result = backend_for_reload.fetch_document(kind);
                        session.write().finish_load(ticket, result);
                    },
                    "다시 불러오기"
                }
                if !file_name.is_empty() {
                    span { style: "color: #555;", "원본: {file_name}" }
                }
                if has_unsaved {
                    span { style: "color: #b45309;", "저장되지 않은 변경 사항" }
                }
                if !notice().is_empty() {
                    span { "{notice}" }
                }
            }

            if let Some(message) = save_error {
                div { style: "color: #b91c1c; padding: 4px 0;", "저장 실패: {message}" }
            }
            if let Some(message) = download_error {
                div { style: "color: #b91c1c; padding: 4px 0;", "다운로드 실패: {message}" }
            }

            if is_loading {
                p { "불러오는 중..." }
            }

            if let Some(message) = load_error {
                div {
                    p { style: "color: #b91c1c;", "불러오기 실패: {message}" }
                    button {
                        onclick: move |_| {
                            let Some(ticket) = session.write().begin_load() else {
                                return;
                            };
                            let result = backend_for_retry.fetch_document(kind);
                            session.write().finish_load(ticket, result);
                        },
                        "다시 시도"
                    }
                }
            }

            if show_table {
                table { style: "border-collapse: collapse; width: 100%; border: 1px solid #bbb;",
                    thead {
                        tr {
                            for column in kind.columns() {
                                th {
                                    style: "border: 1px solid #bbb; padding: 6px; background: #f2f2f2;",
                                    "{column.label}"
                                }
                            }
                            th { style: "border: 1px solid #bbb; padding: 6px; background: #f2f2f2; width: 48px;" }
                        }
                    }
                    tbody {
                        if row_count == 0 {
                            tr {
                                td {
                                    style: "border: 1px solid #bbb; padding: 6px;",
                                    colspan: column_count + 1,
                                    "행이 없습니다"
                                }
                            }
                        } else {
                            for (row_index, cells) in plan.into_iter().enumerate() {
                                tr {
                                    for cell in cells {
                                        td {
                                            style: "border: 1px solid #bbb; padding: 4px; vertical-align: top;",
                                            rowspan: cell.row_span,
                                            input {
                                                style: "width: 100%; border: none; box-sizing: border-box; background: transparent;",
                                                value: "{cell.value}",
                                                disabled: !editable,
                                                onchange: move |event| {
                                                    session
                                                        .write()
                                                        .edit_cell(cell.row_index, cell.field, &event.value());
                                                },
                                            }
                                        }
                                    }
                                    td {
                                        style: "border: 1px solid #bbb; padding: 4px; text-align: center;",
                                        button {
                                            disabled: !editable,
                                            onclick: move |_| {
                                                let confirmed = MessageDialog::new()
                                                    .set_level(MessageLevel::Warning)
                                                    .set_title("행 삭제")
                                                    .set_description("이 행을 삭제할까요?")
                                                    .set_buttons(MessageButtons::YesNo)
                                                    .show();
                                                if confirmed != MessageDialogResult::Yes {
                                                    return;
                                                }
                                                session.write().remove_row(row_index);
                                            },
                                            "삭제"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CellPlan {
    row_index: usize,
    field: Field,
    value: String,
    row_span: usize,
}

// One entry per rendered cell; rows covered by a span above them simply emit
// fewer cells.
fn build_render_plan(rows: &[SheetRow], kind: DocumentKind) -> Vec<Vec<CellPlan>> {
    let grouping = compute_grouping(rows);
    let mut plan = Vec::with_capacity(rows.len());

    for (row_index, row) in rows.iter().enumerate() {
        let mut cells = Vec::new();
        for column in kind.columns() {
            let axis = match column.field {
                Field::MajorCategory => Some(&grouping.major),
                Field::MiddleCategory => Some(&grouping.middle),
                Field::Payload(_) => None,
            };
            let row_span = match axis {
                Some(axis) => {
                    if axis.is_grouped(row_index) && !axis.is_first(row_index) {
                        continue;
                    }
                    axis.row_span(row_index)
                }
                None => 1,
            };
            cells.push(CellPlan {
                row_index,
                field: column.field,
                value: row.value(column.field).to_string(),
                row_span,
            });
        }
        plan.push(cells);
    }

    plan
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "qasheet", "qasheet")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_test_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("qasheet-{prefix}-{nanos}"))
    }

    fn row(major: &str, middle: &str) -> SheetRow {
        let mut row = SheetRow::empty(DocumentKind::FeatureList);
        row.major_category = major.to_string();
        row.middle_category = middle.to_string();
        row
    }

    fn cell<'a>(plan: &'a [Vec<CellPlan>], row_index: usize, field: Field) -> Option<&'a CellPlan> {
        plan[row_index].iter().find(|cell| cell.field == field)
    }

    #[test]
    fn render_plan_merges_grouped_cells_and_skips_covered_rows() {
        let rows = vec![row("X", "M1"), row("X", "M1"), row("X", "M2")];

        let plan = build_render_plan(&rows, DocumentKind::FeatureList);

        let major = cell(&plan, 0, Field::MajorCategory).expect("row 0 should render the major cell");
        assert_eq!(major.row_span, 3);
        assert!(cell(&plan, 1, Field::MajorCategory).is_none(), "row 1 is covered");
        assert!(cell(&plan, 2, Field::MajorCategory).is_none(), "row 2 is covered");

        let middle = cell(&plan, 0, Field::MiddleCategory).expect("row 0 should render the middle cell");
        assert_eq!(middle.row_span, 2);
        assert!(cell(&plan, 1, Field::MiddleCategory).is_none(), "row 1 is covered");
        let middle_singleton =
            cell(&plan, 2, Field::MiddleCategory).expect("row 2 renders its own middle cell");
        assert_eq!(middle_singleton.row_span, 1);
    }

    #[test]
    fn render_plan_keeps_payload_columns_on_every_row() {
        let rows = vec![row("X", "M"), row("X", "M")];

        let plan = build_render_plan(&rows, DocumentKind::FeatureList);

        for row_index in 0..rows.len() {
            for key in ["minorCategory", "featureDescription"] {
                let found = cell(&plan, row_index, Field::Payload(key))
                    .unwrap_or_else(|| panic!("row {row_index} should render {key}"));
                assert_eq!(found.row_span, 1);
            }
        }
    }

    #[test]
    fn render_plan_leaves_blank_rows_ungrouped() {
        let rows = vec![row("", ""), row("", "")];

        let plan = build_render_plan(&rows, DocumentKind::FeatureList);

        for row_index in 0..rows.len() {
            let major = cell(&plan, row_index, Field::MajorCategory)
                .expect("blank rows render plain major cells");
            assert_eq!(major.row_span, 1);
        }
    }

    #[test]
    fn render_plan_of_empty_rows_is_empty() {
        let plan = build_render_plan(&[], DocumentKind::Testcases);

        assert!(plan.is_empty());
    }

    #[test]
    fn render_plan_values_come_from_the_first_row_of_each_run() {
        let rows = vec![row(" X ", "m"), row("X", "m")];

        let plan = build_render_plan(&rows, DocumentKind::FeatureList);

        let major = cell(&plan, 0, Field::MajorCategory).expect("merged cell should exist");
        assert_eq!(major.value, " X ", "displayed value is stored verbatim, not trimmed");
    }

    #[test]
    fn ensure_webview_data_dir_creates_webview2_subdir() {
        let temp_dir = unique_test_dir("webview-data-dir");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");

        let webview_dir =
            ensure_webview_data_dir(&temp_dir).expect("webview data dir should be created");

        assert_eq!(webview_dir, temp_dir.join("webview2"));
        assert!(webview_dir.is_dir(), "webview2 directory should exist");

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }
}
