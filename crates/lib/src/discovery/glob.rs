//! Glob patterns compiled to anchored regular expressions.

use regex::Regex;

/// True when `entry` contains glob metacharacters.
pub fn is_glob(entry: &str) -> bool {
  entry.contains(['*', '?', '['])
}

/// Directory prefix of a glob that contains no wildcards; walking starts here.
pub fn literal_base(pattern: &str) -> &str {
  let mut end = 0;
  for (i, c) in pattern.char_indices() {
    if matches!(c, '*' | '?' | '[') {
      break;
    }
    if c == '/' {
      end = i;
    }
  }
  &pattern[..end]
}

/// Translate a glob into a regex over `/`-separated relative paths.
///
/// `**` spans directories, `*` and `?` stay within one component, and
/// `[!...]` negates a class.
pub fn to_regex(pattern: &str) -> Result<Regex, regex::Error> {
  let mut out = String::from("^");
  let chars: Vec<char> = pattern.chars().collect();
  let mut i = 0;
  while i < chars.len() {
    match chars[i] {
      '*' if chars.get(i + 1) == Some(&'*') => {
        if chars.get(i + 2) == Some(&'/') {
          out.push_str("(?:.*/)?");
          i += 3;
        } else {
          out.push_str(".*");
          i += 2;
        }
        continue;
      }
      '*' => out.push_str("[^/]*"),
      '?' => out.push_str("[^/]"),
      '[' => {
        out.push('[');
        if chars.get(i + 1) == Some(&'!') {
          out.push('^');
          i += 1;
        }
        i += 1;
        while i < chars.len() && chars[i] != ']' {
          if chars[i] == '\\' {
            out.push('\\');
          }
          out.push(chars[i]);
          i += 1;
        }
        out.push(']');
      }
      c => out.push_str(&regex::escape(&c.to_string())),
    }
    i += 1;
  }
  out.push('$');
  Regex::new(&out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_globs() {
    assert!(is_glob("src/*.cpp"));
    assert!(is_glob("src/file?.c"));
    assert!(is_glob("src/[ab].c"));
    assert!(!is_glob("src/engine"));
  }

  #[test]
  fn base_stops_before_first_wildcard_component() {
    assert_eq!(literal_base("src/engine/*.cpp"), "src/engine");
    assert_eq!(literal_base("src/**/x.c"), "src");
    assert_eq!(literal_base("*.cpp"), "");
    assert_eq!(literal_base("src/eng*/a.c"), "src");
  }

  #[test]
  fn star_stays_in_component() {
    let re = to_regex("src/*.cpp").unwrap();
    assert!(re.is_match("src/main.cpp"));
    assert!(!re.is_match("src/sub/main.cpp"));
    assert!(!re.is_match("src/main.cpp.bak"));
  }

  #[test]
  fn double_star_spans_directories() {
    let re = to_regex("src/**/*.c").unwrap();
    assert!(re.is_match("src/a.c"));
    assert!(re.is_match("src/x/y/a.c"));
    assert!(!re.is_match("lib/a.c"));
  }

  #[test]
  fn classes_and_negation() {
    let re = to_regex("src/[ab].c").unwrap();
    assert!(re.is_match("src/a.c"));
    assert!(!re.is_match("src/c.c"));
    let re = to_regex("src/[!ab].c").unwrap();
    assert!(re.is_match("src/c.c"));
    assert!(!re.is_match("src/a.c"));
  }

  #[test]
  fn dots_are_literal() {
    let re = to_regex("a.c").unwrap();
    assert!(!re.is_match("abc"));
  }
}
