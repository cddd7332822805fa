//! Small utility helpers used across modules.

use rand::Rng;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) { end -= 1; }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

/// Wall-clock milliseconds; used for ids and toast stamps.
pub fn now_millis() -> i64 {
  chrono::Utc::now().timestamp_millis()
}

/// Random lowercase base36 suffix, e.g. for question ids.
pub fn random_base36(len: usize) -> String {
  const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
  let mut rng = rand::thread_rng();
  (0..len)
    .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
    .collect()
}

/// Models sometimes wrap HTML in a ```html fence despite being told not to.
pub fn strip_code_fence(text: &str) -> &str {
  let t = text.trim();
  let Some(rest) = t.strip_prefix("```") else { return t };
  let Some(body) = rest.strip_suffix("```") else { return t };
  // drop the language tag line ("html", "json", ...)
  match body.find('\n') {
    Some(nl) if !body[..nl].contains('<') => body[nl + 1..].trim(),
    _ => body.trim(),
  }
}

/// Whitespace runs become a single underscore; used in download filenames.
pub fn underscore_whitespace(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join("_")
}
