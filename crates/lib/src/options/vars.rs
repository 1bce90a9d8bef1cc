use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static VAR_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid variable pattern"));

/// `${NAME}` substitution values for one sandbox pass.
///
/// Values are exposed to scripts as the read-only `vars` table. They are
/// expanded inside the string literals of every script the sandbox loads,
/// and again in project labels and field values when the model is
/// extracted. Code and comments are never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
  values: BTreeMap<&'static str, String>,
}

impl Variables {
  pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
    self.values.insert(name, value.into());
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
    self.values.iter().map(|(k, v)| (*k, v.as_str()))
  }

  /// Replace every known `${NAME}`; unknown names are kept verbatim.
  pub fn expand(&self, input: &str) -> String {
    self.substitute(input, str::to_string)
  }

  fn substitute(&self, input: &str, encode: impl Fn(&str) -> String) -> String {
    if !input.contains("${") {
      return input.to_string();
    }
    VAR_PATTERN
      .replace_all(input, |caps: &Captures| match self.get(&caps[1]) {
        Some(value) => encode(value),
        None => caps[0].to_string(),
      })
      .into_owned()
  }

  /// Expand `${NAME}` inside the string literals of Lua `source`.
  ///
  /// Quoted and long-bracket strings are expanded; identifiers, numbers and
  /// comments are copied unchanged. Values spliced into quoted strings are
  /// escaped for the enclosing quote.
  pub fn expand_literals(&self, source: &str) -> String {
    if !source.contains("${") {
      return source.to_string();
    }
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    while i < bytes.len() {
      match bytes[i] {
        b'-' if bytes.get(i + 1) == Some(&b'-') => {
          let end = match long_bracket(bytes, i + 2) {
            Some(level) => long_bracket_close(bytes, i + 4 + level, level).map_or(bytes.len(), |close| close + level + 2),
            None => line_end(bytes, i),
          };
          out.push_str(&source[i..end]);
          i = end;
        }
        quote @ (b'\'' | b'"') => {
          let end = quoted_end(bytes, i + 1, quote);
          out.push(quote as char);
          out.push_str(&self.substitute(&source[i + 1..end], |value| escape_quoted(value, quote as char)));
          i = end;
          if bytes.get(i) == Some(&quote) {
            out.push(quote as char);
            i += 1;
          }
        }
        b'[' => {
          let Some(level) = long_bracket(bytes, i) else {
            out.push('[');
            i += 1;
            continue;
          };
          let start = i + level + 2;
          match long_bracket_close(bytes, start, level) {
            Some(close) => {
              out.push_str(&source[i..start]);
              out.push_str(&self.expand(&source[start..close]));
              out.push_str(&source[close..close + level + 2]);
              i = close + level + 2;
            }
            None => {
              out.push_str(&source[i..]);
              i = bytes.len();
            }
          }
        }
        _ => {
          let next = bytes[i + 1..]
            .iter()
            .position(|b| matches!(b, b'-' | b'\'' | b'"' | b'['))
            .map_or(bytes.len(), |offset| i + 1 + offset);
          out.push_str(&source[i..next]);
          i = next;
        }
      }
    }
    out
  }
}

/// Level of the long bracket opening at `at` (`[[` is 0, `[==[` is 2).
fn long_bracket(bytes: &[u8], at: usize) -> Option<usize> {
  if bytes.get(at) != Some(&b'[') {
    return None;
  }
  let level = bytes[at + 1..].iter().take_while(|&&b| b == b'=').count();
  (bytes.get(at + 1 + level) == Some(&b'[')).then_some(level)
}

/// Start of the `]=*]` closing a long bracket of `level`, searching from `from`.
fn long_bracket_close(bytes: &[u8], from: usize, level: usize) -> Option<usize> {
  (from..bytes.len()).find(|&i| {
    bytes[i] == b']'
      && bytes[i + 1..].iter().take_while(|&&b| b == b'=').count() == level
      && bytes.get(i + 1 + level) == Some(&b']')
  })
}

fn line_end(bytes: &[u8], from: usize) -> usize {
  bytes[from..]
    .iter()
    .position(|&b| b == b'\n')
    .map_or(bytes.len(), |offset| from + offset)
}

/// Index of the quote closing a string that starts at `from`, or of the line
/// end for an unfinished string.
fn quoted_end(bytes: &[u8], from: usize, quote: u8) -> usize {
  let mut i = from;
  while i < bytes.len() {
    match bytes[i] {
      b'\\' => i += 2,
      b'\n' => return i,
      b if b == quote => return i,
      _ => i += 1,
    }
  }
  bytes.len()
}

fn escape_quoted(value: &str, quote: char) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '\\' => out.push_str("\\\\"),
      '\n' => out.push_str("\\n"),
      c if c == quote => {
        out.push('\\');
        out.push(c);
      }
      _ => out.push(c),
    }
  }
  out
}
