//! Word-compatible export: wraps generated HTML in a minimal Office-flavoured
//! HTML document served as `application/msword` with a `.doc` name.

use axum::{
  http::{header, HeaderValue},
  response::{IntoResponse, Response},
};

use crate::domain::{AdminDocument, GeneratedDocument, SetupContext};
use crate::util::underscore_whitespace;

pub const WORD_CONTENT_TYPE: &str = "application/msword";

/// Fixed style block: serif body text and collapsed table borders.
pub const WORD_STYLE: &str = "<style>
  body { font-family: 'Times New Roman', serif; font-size: 12pt; line-height: 1.5; }
  h1, h2, h3 { color: #000; }
  table { border-collapse: collapse; width: 100%; margin: 15px 0; }
  td, th { border: 1px solid #000; padding: 6px; vertical-align: top; }
  th { background-color: #f0f0f0; font-weight: bold; }
  .page-break { page-break-before: always; }
</style>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordExport {
  pub filename: String,
  pub content_type: &'static str,
  pub payload: String,
}

/// The body is copied verbatim between the wrapper's `<body>` tags.
pub fn export_as_word(filename_base: &str, title: &str, body: &str) -> WordExport {
  let payload = format!(
    "<html xmlns:o='urn:schemas-microsoft-com:office:office' xmlns:w='urn:schemas-microsoft-com:office:word' xmlns='http://www.w3.org/TR/REC-html40'>\n\
     <head><meta charset='utf-8'><title>{title}</title>\n{WORD_STYLE}\n</head><body>\n{body}\n</body></html>",
    title = escape_title(title),
  );
  WordExport {
    filename: format!("{filename_base}.doc"),
    content_type: WORD_CONTENT_TYPE,
    payload,
  }
}

/// `<DocumentName>_<Subject>_Kelas<Grade>`
pub fn filename_base(name: &str, subject: &str, grade: &str) -> String {
  format!(
    "{}_{}_Kelas{}",
    underscore_whitespace(name),
    underscore_whitespace(subject),
    underscore_whitespace(grade)
  )
}

pub fn export_document(doc: &GeneratedDocument) -> WordExport {
  export_as_word(&filename_base(&doc.name, &doc.subject, &doc.grade), &doc.name, &doc.content)
}

pub fn export_admin_document(doc: &AdminDocument) -> WordExport {
  export_as_word(&filename_base(&doc.name, &doc.subject, &doc.grade), &doc.name, &doc.content)
}

/// `Paket_Soal_Lengkap_<Subject>_Kelas<Grade>.doc`. The `Kelas` prefix keeps the
/// package name in line with every other download.
pub fn export_exam_package(ctx: &SetupContext, html: &str) -> WordExport {
  export_as_word(
    &filename_base("Paket Soal Lengkap", &ctx.subject, &ctx.grade),
    "Paket Soal Lengkap",
    html,
  )
}

fn escape_title(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Non-ASCII characters are not allowed in a plain `filename=`; they become `_`.
fn ascii_filename(name: &str) -> String {
  name
    .chars()
    .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
    .collect()
}

impl IntoResponse for WordExport {
  fn into_response(self) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", ascii_filename(&self.filename));
    let disposition = HeaderValue::from_str(&disposition)
      .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static(self.content_type)),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      self.payload,
    )
      .into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn payload_contains_style_and_verbatim_body() {
    let out = export_as_word("Doc", "Doc", "<p>X</p>");
    assert_eq!(out.filename, "Doc.doc");
    assert_eq!(out.content_type, "application/msword");
    assert!(out.payload.contains(WORD_STYLE));
    assert!(out.payload.contains("<p>X</p>"));
    assert!(out.payload.contains("border-collapse: collapse"));
    assert!(out.payload.contains("serif"));
  }

  #[test]
  fn filename_follows_name_subject_grade() {
    assert_eq!(filename_base("Modul Ajar", "Bahasa Indonesia", "7"), "Modul_Ajar_Bahasa_Indonesia_Kelas7");
    let ctx = SetupContext { subject: "IPA".into(), grade: "8".into(), ..Default::default() };
    assert_eq!(export_exam_package(&ctx, "").filename, "Paket_Soal_Lengkap_IPA_Kelas8.doc");
  }

  #[test]
  fn title_is_escaped_but_body_is_not() {
    let out = export_as_word("x", "A<B", "<b>bold</b>");
    assert!(out.payload.contains("<title>A&lt;B</title>"));
    assert!(out.payload.contains("<b>bold</b>"));
  }

  #[test]
  fn download_headers() {
    let resp = export_as_word("Program_Semester_IPS_Kelas9", "t", "<p/>").into_response();
    let headers = resp.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/msword");
    assert_eq!(
      headers[header::CONTENT_DISPOSITION],
      "attachment; filename=\"Program_Semester_IPS_Kelas9.doc\""
    );
  }
}
