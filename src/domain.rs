//! Domain models: setup context, generated documents, question items, admin documents, toasts.
//!
//! Everything persisted is serialized in camelCase so stored JSON keeps the
//! field names the SPA has always written.

use serde::{Deserialize, Deserializer, Serialize};

/// Icon identifiers known to the frontend. Unknown names collapse to `HelpCircle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum IconRef {
  BookOpen,
  Star,
  Zap,
  FileText,
  Calendar,
  Users,
  Book,
  CheckSquare,
  Edit,
  ClipboardList,
  Settings,
  #[default]
  HelpCircle,
}

impl IconRef {
  pub fn as_str(self) -> &'static str {
    match self {
      IconRef::BookOpen => "BookOpen",
      IconRef::Star => "Star",
      IconRef::Zap => "Zap",
      IconRef::FileText => "FileText",
      IconRef::Calendar => "Calendar",
      IconRef::Users => "Users",
      IconRef::Book => "Book",
      IconRef::CheckSquare => "CheckSquare",
      IconRef::Edit => "Edit",
      IconRef::ClipboardList => "ClipboardList",
      IconRef::Settings => "Settings",
      IconRef::HelpCircle => "HelpCircle",
    }
  }

  pub fn from_name(name: &str) -> Self {
    match name {
      "BookOpen" => IconRef::BookOpen,
      "Star" => IconRef::Star,
      "Zap" => IconRef::Zap,
      "FileText" => IconRef::FileText,
      "Calendar" => IconRef::Calendar,
      "Users" => IconRef::Users,
      "Book" => IconRef::Book,
      "CheckSquare" => IconRef::CheckSquare,
      "Edit" => IconRef::Edit,
      "ClipboardList" => IconRef::ClipboardList,
      "Settings" => IconRef::Settings,
      _ => IconRef::HelpCircle,
    }
  }
}

impl From<String> for IconRef {
  fn from(s: String) -> Self { IconRef::from_name(&s) }
}

impl From<IconRef> for &'static str {
  fn from(i: IconRef) -> Self { i.as_str() }
}

/// Which setup field a client wants to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupField {
  Level,
  Grade,
  Subject,
  Topic,
}

/// The (level, grade, subject, topic) tuple every generation request reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupContext {
  #[serde(alias = "jenjang")]
  pub level: String,
  #[serde(alias = "kelas")]
  pub grade: String,
  #[serde(alias = "mapel")]
  pub subject: String,
  #[serde(alias = "materi")]
  pub topic: String,
}

impl SetupContext {
  /// Grade and subject options depend on the level, so both are cleared.
  pub fn set_level(&mut self, level: impl Into<String>) {
    self.level = level.into();
    self.grade.clear();
    self.subject.clear();
  }

  pub fn update(&mut self, field: SetupField, value: impl Into<String>) {
    match field {
      SetupField::Level => self.set_level(value),
      SetupField::Grade => self.grade = value.into(),
      SetupField::Subject => self.subject = value.into(),
      SetupField::Topic => self.topic = value.into(),
    }
  }

  /// Level, grade and subject chosen; enough to generate.
  pub fn is_ready(&self) -> bool {
    !self.level.is_empty() && !self.grade.is_empty() && !self.subject.is_empty()
  }

  pub fn is_complete(&self) -> bool {
    self.is_ready() && !self.topic.is_empty()
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
  pub id: String,
  pub name: String,
  #[serde(rename = "iconName", default)]
  pub icon: IconRef,
  #[serde(default)]
  pub color: String,
  #[serde(default, alias = "jenjang")] pub level: String,
  #[serde(default, alias = "kelas")] pub grade: String,
  #[serde(default, alias = "mapel")] pub subject: String,
  #[serde(default, alias = "materi")] pub topic: String,
  #[serde(default)]
  pub content: String,
}

/// Stored banks are read leniently: `null` text fields read as empty and a
/// `correctAnswer` that is not an option index reads as `None`, so one odd
/// item never costs the whole slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionItem {
  pub id: String,
  /// "Pilihan Ganda" | "Essay"
  #[serde(rename = "type", default, deserialize_with = "null_as_default")]
  pub question_type: String,
  /// "Reguler" | "TKA"
  #[serde(default, deserialize_with = "null_as_default")]
  pub category: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub difficulty: String,
  #[serde(default, alias = "mapel")] pub subject: String,
  #[serde(default, alias = "kelas")] pub grade: String,
  #[serde(rename = "question", default, deserialize_with = "null_as_default")]
  pub question_text: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub options: Vec<String>,
  /// Index 0..=3 for multiple choice, absent for essays.
  #[serde(rename = "correctAnswer", default, deserialize_with = "lenient_option_index")]
  pub correct_option: Option<u8>,
  #[serde(rename = "answer", default, deserialize_with = "null_as_default")]
  pub answer_text: String,
}

/// Only whole numbers 0..=3 name an option.
pub fn option_index(n: f64) -> Option<u8> {
  (n.fract() == 0.0 && (0.0..=3.0).contains(&n)).then_some(n as u8)
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn lenient_option_index<'de, D>(de: D) -> Result<Option<u8>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<serde_json::Value>::deserialize(de)?;
  Ok(raw.as_ref().and_then(serde_json::Value::as_f64).and_then(option_index))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDocument {
  pub id: String,
  pub type_id: String,
  pub name: String,
  #[serde(rename = "iconName", default)]
  pub icon: IconRef,
  #[serde(default)]
  pub color: String,
  #[serde(default, alias = "jenjang")] pub level: String,
  #[serde(default, alias = "kelas")] pub grade: String,
  #[serde(default, alias = "mapel")] pub subject: String,
  #[serde(default)]
  pub content: String,
}

/// Per-category counts for one question batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionCounts {
  pub multiple_choice_regular: u32,
  pub multiple_choice_advanced: u32,
  pub essay_regular: u32,
  pub essay_advanced: u32,
}

impl QuestionCounts {
  pub fn total(&self) -> u32 {
    self.multiple_choice_regular
      + self.multiple_choice_advanced
      + self.essay_regular
      + self.essay_advanced
  }
}

/// One question as the model returns it, before ids and context are stamped on.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
  #[serde(rename = "type")]
  pub question_type: String,
  pub category: String,
  pub difficulty: String,
  pub question: String,
  #[serde(default)]
  pub options: Vec<String>,
  #[serde(default)]
  pub correct_answer: Option<f64>,
  pub answer: String,
}

/// Transient notification shown by the frontend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Toast {
  pub id: i64,
  pub message: String,
  pub color: String,
}
