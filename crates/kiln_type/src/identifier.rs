use std::fmt;

/// A possibly namespaced name, e.g. `io::file::open`.
///
/// Segments are stored outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
  segments: Vec<String>,
}

impl Identifier {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      segments: vec![name.into()],
    }
  }

  pub fn from_path<I, S>(path: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let segments: Vec<String> = path.into_iter().map(Into::into).collect();
    debug_assert!(!segments.is_empty(), "identifier with no segments");
    Self { segments }
  }

  /// The innermost name (`open` in `io::file::open`).
  pub fn name(&self) -> &str {
    self.segments.last().map(String::as_str).unwrap_or("")
  }

  pub fn namespace(&self) -> &[String] {
    &self.segments[..self.segments.len().saturating_sub(1)]
  }

  pub fn segments(&self) -> &[String] {
    &self.segments
  }

  /// Linker symbol for this identifier (`io.file.open`).
  pub fn to_symbol(&self) -> String {
    self.segments.join(".")
  }
}

impl fmt::Display for Identifier {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}", self.segments.join("::"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_symbol_joins_namespaces_with_dots() {
    let ident = Identifier::from_path(["io", "file", "open"]);
    assert_eq!(ident.to_symbol(), "io.file.open");
    assert_eq!(ident.to_string(), "io::file::open");
    assert_eq!(ident.name(), "open");
    assert_eq!(ident.namespace(), &["io".to_string(), "file".to_string()]);
  }

  #[test]
  fn test_plain_name_has_no_namespace() {
    let ident = Identifier::new("main");
    assert_eq!(ident.to_symbol(), "main");
    assert!(ident.namespace().is_empty());
  }
}
