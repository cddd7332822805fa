//! AI content service: builds prompts from the setup context, calls the
//! external model and turns its reply into documents or question drafts.
//!
//! The service is stateless (no caching, no retry). Every failure, including
//! an empty reply or an undecodable question array, is reported as
//! `AppError::Generation` with a user-facing message.

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::catalog::level_label;
use crate::config::Prompts;
use crate::domain::{QuestionCounts, QuestionDraft, QuestionItem, SetupContext};
use crate::error::{AppError, ModelError};
use crate::phase::resolve_phase;
use crate::util::{fill_template, strip_code_fence, trunc_for_log};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The external generative model. Returns raw text; interpretation happens here.
pub trait ContentModel: Send + Sync {
  fn name(&self) -> &str;
  fn generate_text<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ModelError>>;
  fn generate_json<'a>(&'a self, prompt: &'a str, schema: &'a Value) -> BoxFuture<'a, Result<String, ModelError>>;
}

/// Schema of one question batch reply: an array of question objects.
pub fn question_batch_schema() -> Value {
  json!({
    "type": "array",
    "items": {
      "type": "object",
      "properties": {
        "type": { "type": "string" },
        "category": { "type": "string" },
        "difficulty": { "type": "string" },
        "question": { "type": "string" },
        "options": { "type": "array", "items": { "type": "string" } },
        "correctAnswer": { "type": ["number", "null"] },
        "answer": { "type": "string" }
      },
      "required": ["type", "category", "difficulty", "question", "options", "answer"]
    }
  })
}

#[derive(Clone)]
pub struct ContentService {
  model: Arc<dyn ContentModel>,
  prompts: Arc<Prompts>,
}

impl ContentService {
  pub fn new(model: Arc<dyn ContentModel>, prompts: Prompts) -> Self {
    Self { model, prompts: Arc::new(prompts) }
  }

  pub fn model_name(&self) -> &str { self.model.name() }

  /// Capaian Pembelajaran outline (markdown) for the chosen level/grade/subject.
  #[instrument(level = "info", skip(self, ctx), fields(level = %ctx.level, grade = %ctx.grade, subject = %ctx.subject))]
  pub async fn fetch_curriculum_outline(&self, ctx: &SetupContext) -> Result<String, AppError> {
    let prompt = fill_template(&self.prompts.outline_template, &as_refs(&context_pairs(ctx)));
    self.text(&prompt, "Gagal mengambil CP.").await
  }

  /// One curriculum document as raw HTML.
  #[instrument(level = "info", skip(self, ctx), fields(level = %ctx.level, grade = %ctx.grade))]
  pub async fn generate_document(&self, doc_type_id: &str, doc_name: &str, ctx: &SetupContext) -> Result<String, AppError> {
    let mut pairs = context_pairs(ctx);
    pairs.push(("doc_name", doc_name.to_string()));
    let prompt = fill_template(&self.prompts.document_template, &as_refs(&pairs));
    let html = self.text(&prompt, "Gagal menghubungi layanan AI.").await?;
    Ok(strip_code_fence(&html).to_string())
  }

  /// A batch of questions in the order the model returned them.
  #[instrument(level = "info", skip(self, ctx), fields(total = counts.total(), subject = %ctx.subject))]
  pub async fn generate_question_batch(&self, ctx: &SetupContext, counts: QuestionCounts) -> Result<Vec<QuestionDraft>, AppError> {
    let total = counts.total();
    if total == 0 {
      return Err(AppError::validation("Jumlah soal tidak boleh kosong"));
    }

    let mut pairs = context_pairs(ctx);
    pairs.extend([
      ("total", total.to_string()),
      ("mc_regular", counts.multiple_choice_regular.to_string()),
      ("mc_advanced", counts.multiple_choice_advanced.to_string()),
      ("essay_regular", counts.essay_regular.to_string()),
      ("essay_advanced", counts.essay_advanced.to_string()),
    ]);
    let prompt = fill_template(&self.prompts.question_batch_template, &as_refs(&pairs));
    let schema = question_batch_schema();

    const FAIL: &str = "Gagal membuat soal. Coba kurangi jumlah permintaan.";
    let raw = self.model.generate_json(&prompt, &schema).await.map_err(|e| {
      error!(target: "generation", error = %e, "Question batch call failed");
      AppError::generation(FAIL, e)
    })?;
    if raw.trim().is_empty() {
      return Err(AppError::generation(FAIL, ModelError::EmptyPayload));
    }

    let drafts = parse_question_batch(&raw).map_err(|e| {
      error!(target: "generation", error = %e, payload = %trunc_for_log(&raw, 200), "Question batch did not decode");
      AppError::generation(FAIL, e)
    })?;
    if drafts.len() != total as usize {
      warn!(target: "generation", requested = total, received = drafts.len(), "Model returned a different number of questions");
    }
    info!(target: "generation", count = drafts.len(), "Question batch generated");
    Ok(drafts)
  }

  /// One administrative document as raw HTML.
  #[instrument(level = "info", skip(self, ctx), fields(level = %ctx.level, grade = %ctx.grade))]
  pub async fn generate_admin_document(&self, type_id: &str, type_name: &str, ctx: &SetupContext) -> Result<String, AppError> {
    let mut pairs = context_pairs(ctx);
    pairs.push(("doc_name", type_name.to_string()));
    let prompt = fill_template(&self.prompts.admin_template, &as_refs(&pairs));
    let html = self.text(&prompt, "Gagal membuat dokumen administrasi.").await?;
    Ok(strip_code_fence(&html).to_string())
  }

  /// Consolidated exam package (summary, blueprint, script, key, analysis, rubric).
  #[instrument(level = "info", skip(self, ctx, questions), fields(questions = questions.len()))]
  pub async fn generate_exam_package(&self, ctx: &SetupContext, questions: &[QuestionItem]) -> Result<String, AppError> {
    let block = questions_context(questions);
    let mut pairs = context_pairs(ctx);
    pairs.push(("questions", block));
    let prompt = fill_template(&self.prompts.exam_package_template, &as_refs(&pairs));
    let html = self.text(&prompt, "Gagal membuat paket soal lengkap.").await?;
    Ok(strip_code_fence(&html).to_string())
  }

  async fn text(&self, prompt: &str, fail_msg: &str) -> Result<String, AppError> {
    match self.model.generate_text(prompt).await {
      Ok(t) if t.trim().is_empty() => {
        error!(target: "generation", "Model returned an empty payload");
        Err(AppError::generation(fail_msg, ModelError::EmptyPayload))
      }
      Ok(t) => Ok(t),
      Err(e) => {
        error!(target: "generation", error = %e, "Model call failed");
        Err(AppError::generation(fail_msg, e))
      }
    }
  }
}

/// Placeholder values shared by every template.
fn context_pairs(ctx: &SetupContext) -> Vec<(&'static str, String)> {
  let phase = resolve_phase(&ctx.level, &ctx.grade);
  vec![
    ("level", level_label(&ctx.level).to_string()),
    ("grade", ctx.grade.clone()),
    ("phase", phase.as_str().to_string()),
    ("subject", ctx.subject.clone()),
    ("topic", ctx.topic.clone()),
  ]
}

fn as_refs<'a>(pairs: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
  pairs.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

/// Textual listing of the question bank embedded in the exam package prompt.
fn questions_context(questions: &[QuestionItem]) -> String {
  questions
    .iter()
    .enumerate()
    .map(|(i, q)| {
      format!(
        "No {}. [{} - {}] {} \nOpsi: {} \nKunci: {}",
        i + 1,
        q.question_type,
        q.category,
        q.question_text,
        q.options.join(", "),
        q.answer_text
      )
    })
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Accepts a bare array or an object wrapping it under `questions`.
fn parse_question_batch(raw: &str) -> Result<Vec<QuestionDraft>, ModelError> {
  let value: Value = serde_json::from_str(strip_code_fence(raw)).map_err(|e| ModelError::Decode(e.to_string()))?;
  let array = match value {
    Value::Array(_) => value,
    Value::Object(mut map) => map
      .remove("questions")
      .filter(Value::is_array)
      .ok_or_else(|| ModelError::Decode("object without a `questions` array".into()))?,
    _ => return Err(ModelError::Decode("expected a JSON array of questions".into())),
  };
  serde_json::from_value(array).map_err(|e| ModelError::Decode(e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  /// Scripted model: pops one canned reply per call and records prompts.
  pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    pub prompts: Mutex<Vec<String>>,
    pub delay_ms: u64,
  }

  impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
      Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(vec![]), delay_ms: 0 }
    }

    pub fn always(reply: &str, n: usize) -> Self {
      Self::new((0..n).map(|_| Ok(reply.to_string())).collect())
    }

    pub fn calls(&self) -> usize { self.prompts.lock().unwrap().len() }

    fn next(&self, prompt: &str) -> Result<String, ModelError> {
      self.prompts.lock().unwrap().push(prompt.to_string());
      self.replies.lock().unwrap().pop_front().unwrap_or(Err(ModelError::Transport("script exhausted".into())))
    }
  }

  impl ContentModel for ScriptedModel {
    fn name(&self) -> &str { "scripted" }

    fn generate_text<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ModelError>> {
      Box::pin(async move {
        if self.delay_ms > 0 {
          tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.next(prompt)
      })
    }

    fn generate_json<'a>(&'a self, prompt: &'a str, _schema: &'a Value) -> BoxFuture<'a, Result<String, ModelError>> {
      Box::pin(async move { self.next(prompt) })
    }
  }

  pub fn ctx() -> SetupContext {
    SetupContext {
      level: "primary".into(),
      grade: "3".into(),
      subject: "Matematika".into(),
      topic: "Pecahan".into(),
    }
  }

  pub fn batch_json(n: usize) -> String {
    let items: Vec<Value> = (0..n)
      .map(|i| json!({
        "type": if i % 2 == 0 { "Pilihan Ganda" } else { "Essay" },
        "category": "Reguler",
        "difficulty": "Sedang",
        "question": format!("Soal {}", i + 1),
        "options": if i % 2 == 0 { json!(["a", "b", "c", "d"]) } else { json!([]) },
        "correctAnswer": if i % 2 == 0 { json!(2) } else { Value::Null },
        "answer": format!("Jawaban {}", i + 1),
      }))
      .collect();
    Value::Array(items).to_string()
  }

  fn service(model: Arc<ScriptedModel>) -> ContentService {
    ContentService::new(model, Prompts::default())
  }

  #[tokio::test]
  async fn zero_counts_fail_before_any_call() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let err = service(model.clone())
      .generate_question_batch(&ctx(), QuestionCounts::default())
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(model.calls(), 0);
  }

  #[tokio::test]
  async fn batch_prompt_encodes_context_and_counts() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(batch_json(4))]));
    let counts = QuestionCounts { multiple_choice_regular: 2, multiple_choice_advanced: 1, essay_regular: 0, essay_advanced: 1 };
    let drafts = service(model.clone()).generate_question_batch(&ctx(), counts).await.unwrap();
    assert_eq!(drafts.len(), 4);
    assert_eq!(drafts[0].question, "Soal 1");
    assert_eq!(drafts[1].correct_answer, None);

    let prompt = model.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("(4 butir)"));
    assert!(prompt.contains("Pilihan Ganda (Reguler): 2 soal"));
    assert!(prompt.contains("Pilihan Ganda TKA (Tes Kemampuan Akademik): 1 soal"));
    assert!(prompt.contains("Uraian/Essay (Reguler): 0 soal"));
    assert!(prompt.contains("Jenjang: SD/MI"));
    assert!(prompt.contains("Kelas: 3 (Fase B)"));
    assert!(prompt.contains("Materi: Pecahan"));
  }

  #[tokio::test]
  async fn wrapped_batch_is_accepted() {
    let wrapped = format!("{{\"questions\": {}}}", batch_json(2));
    let model = Arc::new(ScriptedModel::new(vec![Ok(wrapped)]));
    let counts = QuestionCounts { essay_regular: 2, ..Default::default() };
    let drafts = service(model).generate_question_batch(&ctx(), counts).await.unwrap();
    assert_eq!(drafts.len(), 2);
  }

  #[tokio::test]
  async fn malformed_batch_is_a_generation_error() {
    let model = Arc::new(ScriptedModel::new(vec![Ok("not json".into())]));
    let counts = QuestionCounts { essay_regular: 1, ..Default::default() };
    let err = service(model).generate_question_batch(&ctx(), counts).await.unwrap_err();
    assert!(matches!(err, AppError::Generation { .. }));
  }

  #[tokio::test]
  async fn empty_text_reply_hard_fails() {
    let model = Arc::new(ScriptedModel::new(vec![Ok("   ".into())]));
    let err = service(model).generate_document("modul", "Modul Ajar", &ctx()).await.unwrap_err();
    assert!(matches!(err, AppError::Generation { source: Some(ModelError::EmptyPayload), .. }));
  }

  #[tokio::test]
  async fn transport_failure_maps_to_generation_error() {
    let model = Arc::new(ScriptedModel::new(vec![Err(ModelError::Transport("timeout".into()))]));
    let err = service(model).fetch_curriculum_outline(&ctx()).await.unwrap_err();
    assert_eq!(err.to_string(), "Gagal mengambil CP.");
  }

  #[tokio::test]
  async fn document_prompt_and_fence_stripping() {
    let model = Arc::new(ScriptedModel::new(vec![Ok("```html\n<h1>Modul</h1>\n```".into())]));
    let html = service(model.clone()).generate_document("modul", "Modul Ajar", &ctx()).await.unwrap();
    assert_eq!(html, "<h1>Modul</h1>");
    let prompt = model.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("\"Modul Ajar\""));
    assert!(prompt.contains("Materi Pokok: Pecahan"));
    assert!(prompt.contains("Fase B"));
  }

  #[tokio::test]
  async fn exam_package_lists_every_question() {
    let model = Arc::new(ScriptedModel::new(vec![Ok("<p>paket</p>".into())]));
    let q = QuestionItem {
      id: "soal-1".into(),
      question_type: "Pilihan Ganda".into(),
      category: "TKA".into(),
      difficulty: "Sulit".into(),
      subject: "Matematika".into(),
      grade: "3".into(),
      question_text: "Berapa 1/2 + 1/4?".into(),
      options: vec!["1/4".into(), "3/4".into(), "1".into(), "2/6".into()],
      correct_option: Some(1),
      answer_text: "3/4".into(),
    };
    let html = service(model.clone()).generate_exam_package(&ctx(), &[q]).await.unwrap();
    assert_eq!(html, "<p>paket</p>");
    let prompt = model.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("No 1. [Pilihan Ganda - TKA] Berapa 1/2 + 1/4?"));
    assert!(prompt.contains("Opsi: 1/4, 3/4, 1, 2/6"));
    assert!(prompt.contains("RUBRIK PENILAIAN"));
    assert!(prompt.contains("SD/MI - Matematika - Kelas 3 (Fase B)"));
  }

  #[tokio::test]
  async fn outline_prompt_names_the_topic() {
    let model = Arc::new(ScriptedModel::new(vec![Ok("# CP".into())]));
    let outline = service(model.clone()).fetch_curriculum_outline(&ctx()).await.unwrap();
    assert_eq!(outline, "# CP");
    let prompt = model.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("\"Pecahan\""));
    assert!(prompt.contains("fase B"));
  }
}
