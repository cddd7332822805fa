//! Generation workflows behind the HTTP handlers.
//!
//! Each workflow checks its preconditions, takes the busy flag, calls the
//! content service, commits the result in one step and emits exactly one
//! toast describing the outcome. Failures leave every collection untouched.

use tokio::task::JoinSet;
use tracing::{error, info, instrument, Instrument, Span};

use crate::catalog::{admin_type, DOCUMENT_TYPES};
use crate::content::ContentService;
use crate::domain::{option_index, AdminDocument, GeneratedDocument, QuestionCounts, QuestionDraft, QuestionItem, SetupContext, SetupField};
use crate::error::{AppError, ModelError};
use crate::export::{self, WordExport};
use crate::protocol::DashboardOut;
use crate::state::{AppState, BusyGuard};
use crate::util::{now_millis, random_base36};

pub const COLOR_SUCCESS: &str = "#10B981";
pub const COLOR_ERROR: &str = "#EF4444";
pub const COLOR_WARNING: &str = "#F59E0B";
pub const COLOR_INFO: &str = "#6366F1";

const MSG_SETUP_INCOMPLETE: &str = "Lengkapi setup pembelajaran terlebih dahulu!";

async fn fail<T>(state: &AppState, err: AppError) -> Result<T, AppError> {
  fail_with(state, err, COLOR_ERROR).await
}

/// Toast the failure in `color`, then hand it back to the caller.
async fn fail_with<T>(state: &AppState, err: AppError, color: &str) -> Result<T, AppError> {
  let text = match &err {
    AppError::Validation(m) | AppError::NotFound(m) => Some(format!("⚠️ {m}")),
    AppError::Generation { message, .. } => Some(format!("❌ {message}")),
    AppError::Persistence(m) => {
      error!(target: "storage", error = %m, "Persistence error reached a workflow");
      None
    }
  };
  let Some(text) = text else { return Err(err) };
  state.show_toast(&text, color).await;
  Err(err)
}

fn require_ai(state: &AppState) -> Result<ContentService, AppError> {
  state.ai.clone().ok_or_else(|| AppError::Generation {
    message: "Layanan AI belum dikonfigurasi.".into(),
    source: Some(ModelError::NotConfigured),
  })
}

fn begin(state: &AppState) -> Result<BusyGuard, AppError> {
  state
    .try_begin_busy()
    .ok_or_else(|| AppError::validation("Masih ada proses yang berjalan. Tunggu sebentar."))
}

/// Shared precondition chain: ready setup, configured AI, free busy flag.
async fn prepare(state: &AppState, ctx: &SetupContext) -> Result<(ContentService, BusyGuard), AppError> {
  if !ctx.is_ready() {
    return Err(AppError::validation(MSG_SETUP_INCOMPLETE));
  }
  let ai = require_ai(state)?;
  let guard = begin(state)?;
  Ok((ai, guard))
}

#[instrument(level = "info", skip(state, value), fields(value_len = value.len()))]
pub async fn update_setup(state: &AppState, field: SetupField, value: String) -> SetupContext {
  state.update_setup(field, value).await
}

#[instrument(level = "info", skip(state))]
pub async fn fetch_outline(state: &AppState) -> Result<String, AppError> {
  let ctx = state.setup().await;
  if !ctx.is_ready() {
    let err = AppError::validation("Lengkapi data Jenjang, Kelas, dan Mapel terlebih dahulu!");
    return fail_with(state, err, COLOR_WARNING).await;
  }
  let (ai, _busy) = match prepare(state, &ctx).await {
    Ok(v) => v,
    Err(e) => return fail(state, e).await,
  };

  match ai.fetch_curriculum_outline(&ctx).await {
    Ok(text) => {
      state.show_toast("✅ Capaian Pembelajaran berhasil diambil!", COLOR_SUCCESS).await;
      Ok(text)
    }
    Err(e) => fail(state, e).await,
  }
}

/// One document per catalog type, generated concurrently. Any failure aborts
/// the remaining calls and nothing is committed.
#[instrument(level = "info", skip(state))]
pub async fn generate_all_documents(state: &AppState) -> Result<Vec<GeneratedDocument>, AppError> {
  let ctx = state.setup().await;
  let (ai, _busy) = match prepare(state, &ctx).await {
    Ok(v) => v,
    Err(e) => return fail(state, e).await,
  };

  let mut set = JoinSet::new();
  for (idx, doc_type) in DOCUMENT_TYPES.iter().enumerate() {
    let ai = ai.clone();
    let ctx = ctx.clone();
    set.spawn(
      async move { (idx, ai.generate_document(doc_type.id, doc_type.name, &ctx).await) }
        .instrument(Span::current()),
    );
  }

  let mut contents: Vec<Option<String>> = vec![None; DOCUMENT_TYPES.len()];
  while let Some(joined) = set.join_next().await {
    let outcome = match joined {
      Ok((idx, Ok(html))) => {
        contents[idx] = Some(html);
        continue;
      }
      Ok((idx, Err(e))) => {
        error!(target: "generation", doc_type = DOCUMENT_TYPES[idx].id, error = %e, "Document generation failed; discarding batch");
        e
      }
      Err(join_err) => AppError::generation(
        "Terjadi kesalahan saat generate dokumen.",
        ModelError::Transport(join_err.to_string()),
      ),
    };
    set.abort_all();
    return fail(state, outcome).await;
  }

  let stamp = now_millis();
  let docs: Vec<GeneratedDocument> = DOCUMENT_TYPES
    .iter()
    .zip(contents)
    .map(|(t, content)| GeneratedDocument {
      id: format!("{}-{}", t.id, stamp),
      name: t.name.to_string(),
      icon: t.icon,
      color: t.color.to_string(),
      level: ctx.level.clone(),
      grade: ctx.grade.clone(),
      subject: ctx.subject.clone(),
      topic: ctx.topic.clone(),
      content: content.unwrap_or_default(),
    })
    .collect();

  state.append_documents(docs.clone()).await;
  info!(target: "generation", count = docs.len(), "Document batch committed");
  state.show_toast("✨ Semua dokumen berhasil dibuat dengan AI!", COLOR_SUCCESS).await;
  Ok(docs)
}

#[instrument(level = "info", skip(state), fields(total = counts.total()))]
pub async fn generate_question_bank(state: &AppState, counts: QuestionCounts) -> Result<Vec<QuestionItem>, AppError> {
  let ctx = state.setup().await;
  if !ctx.is_ready() {
    return fail(state, AppError::validation(MSG_SETUP_INCOMPLETE)).await;
  }
  if counts.total() == 0 {
    return fail(state, AppError::validation("Masukkan jumlah soal minimal 1.")).await;
  }
  let (ai, _busy) = match prepare(state, &ctx).await {
    Ok(v) => v,
    Err(e) => return fail(state, e).await,
  };

  let drafts = match ai.generate_question_batch(&ctx, counts).await {
    Ok(d) => d,
    Err(e) => return fail(state, e).await,
  };

  let stamp = now_millis();
  let items: Vec<QuestionItem> = drafts.into_iter().map(|d| to_question_item(d, &ctx, stamp)).collect();
  state.prepend_questions(items.clone()).await;
  state
    .show_toast(&format!("✅ Berhasil membuat {} soal baru!", items.len()), COLOR_SUCCESS)
    .await;
  Ok(items)
}

fn to_question_item(d: QuestionDraft, ctx: &SetupContext, stamp: i64) -> QuestionItem {
  QuestionItem {
    id: format!("soal-{}-{}", stamp, random_base36(9)),
    question_type: d.question_type,
    category: d.category,
    difficulty: d.difficulty,
    subject: ctx.subject.clone(),
    grade: ctx.grade.clone(),
    question_text: d.question,
    options: d.options,
    correct_option: d.correct_answer.and_then(option_index),
    answer_text: d.answer,
  }
}

#[instrument(level = "info", skip(state))]
pub async fn delete_question(state: &AppState, id: &str) -> Result<(), AppError> {
  if !state.remove_question(id).await {
    return fail(state, AppError::NotFound(format!("Soal {id} tidak ditemukan."))).await;
  }
  state.show_toast("🗑️ Soal berhasil dihapus!", COLOR_WARNING).await;
  Ok(())
}

#[instrument(level = "info", skip(state))]
pub async fn clear_questions(state: &AppState) -> usize {
  let n = state.clear_questions().await;
  state.show_toast("🗑️ Semua soal berhasil dihapus!", COLOR_WARNING).await;
  n
}

#[instrument(level = "info", skip(state))]
pub async fn export_exam_package(state: &AppState) -> Result<WordExport, AppError> {
  let questions = state.questions().await;
  if questions.is_empty() {
    return fail(state, AppError::validation("Belum ada soal untuk didownload.")).await;
  }
  let ctx = state.setup().await;
  if ctx.subject.is_empty() {
    return fail(state, AppError::validation("Data setup tidak lengkap.")).await;
  }
  let ai = match require_ai(state) {
    Ok(ai) => ai,
    Err(e) => return fail(state, e).await,
  };
  let _busy = match begin(state) {
    Ok(g) => g,
    Err(e) => return fail(state, e).await,
  };

  match ai.generate_exam_package(&ctx, &questions).await {
    Ok(html) => {
      state.show_toast("📦 Paket Soal Lengkap berhasil didownload!", COLOR_INFO).await;
      Ok(export::export_exam_package(&ctx, &html))
    }
    Err(e) => fail(state, e).await,
  }
}

#[instrument(level = "info", skip(state))]
pub async fn generate_admin_document(state: &AppState, type_id: &str) -> Result<AdminDocument, AppError> {
  let ctx = state.setup().await;
  if !ctx.is_ready() {
    return fail(state, AppError::validation(MSG_SETUP_INCOMPLETE)).await;
  }
  let Some(kind) = admin_type(type_id) else {
    return fail(state, AppError::validation(format!("Jenis dokumen administrasi tidak dikenal: {type_id}"))).await;
  };
  let (ai, _busy) = match prepare(state, &ctx).await {
    Ok(v) => v,
    Err(e) => return fail(state, e).await,
  };

  let content = match ai.generate_admin_document(kind.id, kind.name, &ctx).await {
    Ok(html) => html,
    Err(e) => return fail(state, e).await,
  };

  let doc = AdminDocument {
    id: format!("admin-{}", now_millis()),
    type_id: kind.id.to_string(),
    name: kind.name.to_string(),
    icon: kind.icon,
    color: kind.color.to_string(),
    level: ctx.level.clone(),
    grade: ctx.grade.clone(),
    subject: ctx.subject.clone(),
    content,
  };
  state.append_admin_document(doc.clone()).await;
  state.show_toast(&format!("✅ {} berhasil dibuat!", kind.name), kind.color).await;
  Ok(doc)
}

#[instrument(level = "info", skip(state))]
pub async fn export_document(state: &AppState, id: &str) -> Result<WordExport, AppError> {
  let Some(doc) = state.find_document(id).await else {
    return fail(state, AppError::NotFound("Dokumen tidak ditemukan.".into())).await;
  };
  state.show_toast("📥 Dokumen Word berhasil didownload!", COLOR_INFO).await;
  Ok(export::export_document(&doc))
}

#[instrument(level = "info", skip(state))]
pub async fn export_admin_document(state: &AppState, id: &str) -> Result<WordExport, AppError> {
  let Some(doc) = state.find_admin_document(id).await else {
    return fail(state, AppError::NotFound("Dokumen administrasi tidak ditemukan.".into())).await;
  };
  state.show_toast("📥 File Word berhasil didownload!", COLOR_SUCCESS).await;
  Ok(export::export_admin_document(&doc))
}

/// Counts for the dashboard; display only.
pub async fn dashboard(state: &AppState) -> DashboardOut {
  DashboardOut {
    documents: state.documents().await.len(),
    questions: state.questions().await.len(),
    admin_documents: state.admin_documents().await.len(),
    setup_complete: state.setup().await.is_complete(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use crate::config::{AgentConfig, Prompts};
  use crate::content::tests::{batch_json, ctx, ScriptedModel};
  use crate::state::tests::question;
  use crate::storage::MemoryStore;

  async fn state_with(model: Arc<ScriptedModel>) -> AppState {
    let ai = ContentService::new(model, Prompts::default());
    let state = AppState::load(Arc::new(MemoryStore::new()), Some(ai), &AgentConfig::default());
    let c = ctx();
    state.update_setup(SetupField::Level, c.level).await;
    state.update_setup(SetupField::Grade, c.grade).await;
    state.update_setup(SetupField::Subject, c.subject).await;
    state.update_setup(SetupField::Topic, c.topic).await;
    state
  }

  #[tokio::test]
  async fn zero_question_request_never_reaches_the_model() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let state = state_with(model.clone()).await;
    let err = generate_question_bank(&state, QuestionCounts::default()).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(model.calls(), 0);
    assert!(!state.is_busy());
    assert_eq!(state.toasts().await.len(), 1);
  }

  #[tokio::test]
  async fn batch_is_prepended_in_returned_order() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(batch_json(4))]));
    let state = state_with(model).await;
    state.prepend_questions(vec![question("lama")]).await;

    let counts = QuestionCounts { multiple_choice_regular: 2, multiple_choice_advanced: 1, essay_regular: 0, essay_advanced: 1 };
    let items = generate_question_bank(&state, counts).await.unwrap();
    assert_eq!(items.len(), 4);

    let bank = state.questions().await;
    assert_eq!(bank.len(), 5);
    let texts: Vec<&str> = bank.iter().map(|q| q.question_text.as_str()).collect();
    assert_eq!(texts, ["Soal 1", "Soal 2", "Soal 3", "Soal 4", "Pertanyaan lama"]);
    assert_eq!(bank[0].correct_option, Some(2));
    assert_eq!(bank[1].correct_option, None);
    assert_eq!(bank[0].subject, "Matematika");
    assert!(bank[0].id.starts_with("soal-"));
    assert_ne!(bank[0].id, bank[2].id);
    assert!(!state.is_busy());
  }

  #[tokio::test]
  async fn one_failed_document_commits_nothing() {
    let mut replies: Vec<Result<String, ModelError>> = (0..4).map(|i| Ok(format!("<p>{i}</p>"))).collect();
    replies.insert(2, Err(ModelError::Http { status: 500, message: "boom".into() }));
    let model = Arc::new(ScriptedModel::new(replies));
    let state = state_with(model).await;

    let err = generate_all_documents(&state).await.unwrap_err();
    assert!(matches!(err, AppError::Generation { .. }));
    assert!(state.documents().await.is_empty());
    assert!(!state.is_busy());
    let toasts = state.toasts().await;
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].color, COLOR_ERROR);
  }

  #[tokio::test]
  async fn all_documents_commit_in_catalog_order() {
    let model = Arc::new(ScriptedModel::always("<h1>Dok</h1>", 5));
    let state = state_with(model.clone()).await;
    let docs = generate_all_documents(&state).await.unwrap();
    assert_eq!(model.calls(), 5);

    let names: Vec<String> = state.documents().await.into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["Modul Ajar", "KKTP", "ATP", "Program Tahunan", "Program Semester"]);
    assert!(docs.iter().all(|d| d.content == "<h1>Dok</h1>" && d.topic == "Pecahan"));
    assert!(docs[0].id.starts_with("modul-"));
  }

  #[tokio::test]
  async fn busy_flag_rejects_a_second_workflow() {
    let model = Arc::new(ScriptedModel::always("<p/>", 1));
    let state = state_with(model.clone()).await;
    let held = state.try_begin_busy().unwrap();
    let err = generate_admin_document(&state, "jadwal").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(model.calls(), 0);
    drop(held);

    let doc = generate_admin_document(&state, "jadwal").await.unwrap();
    assert_eq!(doc.name, "Jadwal Mengajar");
    assert_eq!(doc.type_id, "jadwal");
    assert_eq!(state.admin_documents().await.len(), 1);
  }

  #[tokio::test]
  async fn unknown_admin_type_and_missing_setup_are_validation_errors() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let state = state_with(model).await;
    assert!(matches!(generate_admin_document(&state, "gaji").await, Err(AppError::Validation(_))));

    let bare = AppState::load(Arc::new(MemoryStore::new()), None, &AgentConfig::default());
    assert!(matches!(generate_all_documents(&bare).await, Err(AppError::Validation(_))));
    assert!(matches!(fetch_outline(&bare).await, Err(AppError::Validation(_))));
  }

  #[tokio::test]
  async fn outline_without_setup_warns_in_amber() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let ai = ContentService::new(model.clone(), Prompts::default());
    let state = AppState::load(Arc::new(MemoryStore::new()), Some(ai), &AgentConfig::default());
    assert!(matches!(fetch_outline(&state).await, Err(AppError::Validation(_))));
    assert_eq!(model.calls(), 0);
    let toasts = state.toasts().await;
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].color, COLOR_WARNING);

    // Other preconditions keep the error colour.
    assert!(generate_admin_document(&state, "jadwal").await.is_err());
    assert_eq!(state.toasts().await[1].color, COLOR_ERROR);
  }

  #[tokio::test]
  async fn missing_ai_is_a_generation_error() {
    let state = AppState::load(Arc::new(MemoryStore::new()), None, &AgentConfig::default());
    state.update_setup(SetupField::Level, "primary".into()).await;
    state.update_setup(SetupField::Grade, "1".into()).await;
    state.update_setup(SetupField::Subject, "PJOK".into()).await;
    let err = generate_all_documents(&state).await.unwrap_err();
    assert!(matches!(err, AppError::Generation { source: Some(ModelError::NotConfigured), .. }));
    assert!(!state.is_busy());
  }

  #[tokio::test]
  async fn exam_package_needs_questions_then_exports() {
    let model = Arc::new(ScriptedModel::new(vec![Ok("<h2>RINGKASAN MATERI</h2>".into())]));
    let state = state_with(model).await;
    assert!(matches!(export_exam_package(&state).await, Err(AppError::Validation(_))));

    state.prepend_questions(vec![question("q1")]).await;
    let out = export_exam_package(&state).await.unwrap();
    assert_eq!(out.filename, "Paket_Soal_Lengkap_Matematika_Kelas3.doc");
    assert!(out.payload.contains("<h2>RINGKASAN MATERI</h2>"));
  }

  #[tokio::test]
  async fn delete_unknown_question_is_not_found() {
    let state = state_with(Arc::new(ScriptedModel::new(vec![]))).await;
    state.prepend_questions(vec![question("a"), question("b")]).await;
    assert!(matches!(delete_question(&state, "zzz").await, Err(AppError::NotFound(_))));
    delete_question(&state, "a").await.unwrap();
    assert_eq!(clear_questions(&state).await, 1);
  }

  #[tokio::test]
  async fn dashboard_counts() {
    let state = state_with(Arc::new(ScriptedModel::new(vec![]))).await;
    state.prepend_questions(vec![question("a")]).await;
    let d = dashboard(&state).await;
    assert_eq!((d.documents, d.questions, d.admin_documents), (0, 1, 0));
    assert!(d.setup_complete);
  }
}
