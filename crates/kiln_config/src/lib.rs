//! Backend configuration, loadable from TOML.

use serde::{Deserialize, Serialize};

/// Components that can emit `debug[...]` traces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugTrace {
  Types,
  Gen,
  Verify,
}

impl DebugTrace {
  pub fn name(self) -> &'static str {
    match self {
      DebugTrace::Types => "types",
      DebugTrace::Gen => "gen",
      DebugTrace::Verify => "verify",
    }
  }
}

/// Which stderr messages are shown, from nothing at all up to per-instruction traces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
  Silent,
  Phase,
  Info,
  Debug,
  Trace,
}

/// Coarse output mode picked from `quiet` and `verbose`.
///
/// - `Quiet`: errors only
/// - `Detailed`: phase progress (default)
/// - `Verbose`: phase progress plus internal steps
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
  Quiet,
  #[default]
  Detailed,
  Verbose,
}

/// Knobs for the expression lowering pass.
///
/// ```toml
/// [gen]
/// bounds_checks = false
/// runtime_namespace = "rt"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
  /// Emit a runtime check before every slice or bounded array index.
  pub bounds_checks: bool,
  /// Namespace of the runtime helpers (`rt.memcpy`, `rt.abort`, ...).
  pub runtime_namespace: String,
}

impl Default for GenConfig {
  fn default() -> Self {
    Self {
      bounds_checks: true,
      runtime_namespace: "rt".to_string(),
    }
  }
}

impl GenConfig {
  /// Linker symbol of a runtime helper, e.g. `rt.memcpy`.
  pub fn runtime_symbol(
    &self,
    name: &str,
  ) -> String {
    if self.runtime_namespace.is_empty() {
      name.to_string()
    } else {
      format!("{}.{}", self.runtime_namespace, name)
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
  /// Turns on every trace category and at least debug verbosity.
  pub debug: bool,
  pub debug_trace: Vec<DebugTrace>,
  pub quiet: bool,
  /// 0 shows phases, 1 adds info, 2 debug, 3 traces.
  pub verbose: u8,
  pub gen: GenConfig,
}

impl KilnConfig {
  /// Configuration with default lowering knobs.
  pub fn new(
    debug: bool,
    debug_trace: Vec<DebugTrace>,
    quiet: bool,
    verbose: u8,
  ) -> Self {
    Self {
      debug,
      debug_trace,
      quiet,
      verbose,
      gen: GenConfig::default(),
    }
  }

  /// Parse a configuration file. Missing keys keep their defaults.
  pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(source)
  }

  pub fn verbosity(&self) -> Verbosity {
    if self.quiet {
      return Verbosity::Silent;
    }
    let level = if self.debug { self.verbose.max(2) } else { self.verbose };
    match level {
      0 => Verbosity::Phase,
      1 => Verbosity::Info,
      2 => Verbosity::Debug,
      _ => Verbosity::Trace,
    }
  }

  pub fn output_level(&self) -> OutputLevel {
    match self.verbosity() {
      Verbosity::Silent => OutputLevel::Quiet,
      Verbosity::Phase => OutputLevel::Detailed,
      _ => OutputLevel::Verbose,
    }
  }

  /// Whether `debug[trace]` lines are printed.
  pub fn traces(
    &self,
    trace: DebugTrace,
  ) -> bool {
    !self.quiet && (self.debug || self.debug_trace.contains(&trace))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = KilnConfig::default();
    assert!(config.gen.bounds_checks);
    assert_eq!(config.gen.runtime_symbol("memcpy"), "rt.memcpy");
    assert_eq!(config.verbosity(), Verbosity::Phase);
    assert_eq!(config.output_level(), OutputLevel::Detailed);
  }

  #[test]
  fn test_output_level_follows_flags() {
    assert_eq!(KilnConfig::new(false, vec![], true, 2).output_level(), OutputLevel::Quiet);
    assert_eq!(KilnConfig::new(false, vec![], false, 1).output_level(), OutputLevel::Verbose);
    assert_eq!(KilnConfig::new(false, vec![], false, 0).output_level(), OutputLevel::Detailed);
  }

  #[test]
  fn test_verbosity() {
    assert_eq!(KilnConfig::new(true, vec![DebugTrace::Gen], true, 3).verbosity(), Verbosity::Silent);
    assert_eq!(KilnConfig::new(true, vec![], false, 0).verbosity(), Verbosity::Debug);
    assert_eq!(KilnConfig::new(true, vec![], false, 3).verbosity(), Verbosity::Trace);
    assert_eq!(KilnConfig::new(false, vec![], false, 9).verbosity(), Verbosity::Trace);
  }

  #[test]
  fn test_trace_categories() {
    let config = KilnConfig::new(false, vec![DebugTrace::Gen], false, 0);
    assert!(config.traces(DebugTrace::Gen));
    assert!(!config.traces(DebugTrace::Types));

    assert!(KilnConfig::new(true, vec![], false, 0).traces(DebugTrace::Verify));
    assert!(!KilnConfig::new(true, vec![DebugTrace::Gen], true, 0).traces(DebugTrace::Gen));
  }

  #[test]
  fn test_from_toml_str() {
    let config = KilnConfig::from_toml_str(
      r#"
verbose = 2
debug_trace = ["gen", "verify"]

[gen]
bounds_checks = false
runtime_namespace = ""
"#,
    )
    .unwrap();

    assert_eq!(config.verbose, 2);
    assert_eq!(config.debug_trace, vec![DebugTrace::Gen, DebugTrace::Verify]);
    assert!(!config.gen.bounds_checks);
    assert_eq!(config.gen.runtime_symbol("abort"), "abort");
  }

  #[test]
  fn test_from_toml_str_rejects_unknown_trace() {
    assert!(KilnConfig::from_toml_str("debug_trace = [\"lexer\"]").is_err());
  }
}
