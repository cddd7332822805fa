//! Curriculum phase derived from (education level, grade).

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
  Foundation,
  A,
  B,
  C,
  D,
  E,
  F,
  General,
}

impl Phase {
  pub fn as_str(self) -> &'static str {
    match self {
      Phase::Foundation => "Foundation",
      Phase::A => "A",
      Phase::B => "B",
      Phase::C => "C",
      Phase::D => "D",
      Phase::E => "E",
      Phase::F => "F",
      Phase::General => "General",
    }
  }
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Total and pure. An unparsable grade never satisfies a numeric threshold,
/// so it lands on the last branch of its level (C for primary, F for secondary).
pub fn resolve_phase(level: &str, grade: &str) -> Phase {
  let grade_num = leading_int(grade);
  match level {
    "early-childhood" => Phase::Foundation,
    "primary" => match grade_num {
      Some(n) if n <= 2 => Phase::A,
      Some(n) if n <= 4 => Phase::B,
      _ => Phase::C,
    },
    "lower-secondary" => Phase::D,
    "upper-secondary" | "vocational" => match grade_num {
      Some(10) => Phase::E,
      _ => Phase::F,
    },
    _ => Phase::General,
  }
}

/// Leading integer of a string: optional whitespace, optional sign, digits.
/// Trailing text is ignored ("10 IPA" -> 10); no digits -> None.
fn leading_int(s: &str) -> Option<i64> {
  let s = s.trim_start();
  let (negative, rest) = match s.as_bytes().first() {
    Some(b'-') => (true, &s[1..]),
    Some(b'+') => (false, &s[1..]),
    _ => (false, s),
  };
  let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
  if digits.is_empty() {
    return None;
  }
  let n = digits.parse::<i64>().ok()?;
  Some(if negative { -n } else { n })
}
