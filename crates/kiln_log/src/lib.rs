//! stderr logging for the backend.
//!
//! Phase lines (`phase_log!`, `phase_ok!`, `phase_warn!`) show unless the
//! configuration is quiet. `log_dbg!` and `log_trc!` need the matching
//! [`Verbosity`]; `trace_dbg!` is keyed on a [`kiln_config::DebugTrace`]
//! category instead. Nothing here writes to stdout, which is kept for IR dumps.

pub use kiln_config::Verbosity;
use kiln_config::KilnConfig;

#[doc(hidden)]
pub use colored;

/// Whether messages at `level` are shown under `config`.
pub fn enabled(
  config: &KilnConfig,
  level: Verbosity,
) -> bool {
  config.verbosity() >= level
}

#[doc(hidden)]
#[macro_export]
macro_rules! __phase_line {
  ($config:expr, $indent:expr, $color:ident, $($fmt:tt)+) => {{
    if $crate::enabled($config, $crate::Verbosity::Phase) {
      use $crate::colored::Colorize;
      eprintln!(
        "{:indent$}{} {}",
        "",
        "-->".$color().bold(),
        format!($($fmt)+),
        indent = $indent
      );
    }
  }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __level_line {
  ($config:expr, $level:ident, $tag:literal, $($fmt:tt)+) => {{
    if $crate::enabled($config, $crate::Verbosity::$level) {
      eprintln!("{}: {}", $tag, format!($($fmt)+));
    }
  }};
}

/// Progress line for a step inside a phase, indented by 4 unless told otherwise.
///
/// ```ignore
/// phase_log!(&config, "lowering {} declarations", count);
/// phase_log!(&config, indent = 8, "function {}", name);
/// ```
#[macro_export]
macro_rules! phase_log {
  ($config:expr, indent = $indent:expr, $($fmt:tt)+) => {
    $crate::__phase_line!($config, $indent, bright_green, $($fmt)+)
  };
  ($config:expr, $($fmt:tt)+) => {
    $crate::__phase_line!($config, 4, bright_green, $($fmt)+)
  };
}

/// A phase finished.
#[macro_export]
macro_rules! phase_ok {
  ($config:expr, $($fmt:tt)+) => {
    $crate::__phase_line!($config, 0, bright_green, $($fmt)+)
  };
}

/// A phase finished with problems worth a look.
#[macro_export]
macro_rules! phase_warn {
  ($config:expr, $($fmt:tt)+) => {
    $crate::__phase_line!($config, 0, bright_yellow, $($fmt)+)
  };
}

/// `debug[category]: message`, shown when the category is traced.
///
/// ```ignore
/// trace_dbg!(&config, DebugTrace::Gen, "lowering {}", name);
/// // debug[gen]: lowering main
/// ```
#[macro_export]
macro_rules! trace_dbg {
  ($config:expr, $trace:expr, $($fmt:tt)+) => {{
    let trace = $trace;
    if $config.traces(trace) {
      eprintln!("debug[{}]: {}", trace.name(), format!($($fmt)+));
    }
  }};
}

#[macro_export]
macro_rules! log_dbg {
  ($config:expr, $($fmt:tt)+) => {
    $crate::__level_line!($config, Debug, "debug", $($fmt)+)
  };
}

/// ```ignore
/// log_trc!(&config, "unrolled copy of {} bytes", size);
/// // trace: unrolled copy of 24 bytes
/// ```
#[macro_export]
macro_rules! log_trc {
  ($config:expr, $($fmt:tt)+) => {
    $crate::__level_line!($config, Trace, "trace", $($fmt)+)
  };
}

#[cfg(test)]
mod tests {
  use kiln_config::DebugTrace;

  use super::*;

  #[test]
  fn test_quiet_hides_phases() {
    let config = KilnConfig::new(false, vec![], true, 0);
    assert!(!enabled(&config, Verbosity::Phase));
  }

  #[test]
  fn test_levels_are_cumulative() {
    let config = KilnConfig::new(false, vec![], false, 2);
    assert!(enabled(&config, Verbosity::Phase));
    assert!(enabled(&config, Verbosity::Info));
    assert!(enabled(&config, Verbosity::Debug));
    assert!(!enabled(&config, Verbosity::Trace));
  }

  #[test]
  fn test_macros_expand() {
    let config = KilnConfig::new(false, vec![DebugTrace::Gen], true, 3);
    phase_log!(&config, "step {}", 1);
    phase_log!(&config, indent = 8, "nested");
    phase_ok!(&config, "done");
    phase_warn!(&config, "{} problems", 2);
    trace_dbg!(&config, DebugTrace::Gen, "traced {}", "value");
    log_dbg!(&config, "debug");
    log_trc!(&config, "trace {}", 3);
  }
}
