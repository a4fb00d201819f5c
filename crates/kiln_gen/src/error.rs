use std::fmt;

use kiln_hir::Location;

/// Failures of the lowering pass. None of them are recoverable: the unit is
/// either malformed or uses a construct this backend does not lower.
#[derive(Debug, Clone, PartialEq)]
pub enum GenError {
  /// The checked unit broke an assumption lowering relies on.
  Invariant { message: String },

  /// A construct the checker accepts but lowering does not handle yet.
  Unimplemented { construct: String, loc: Option<Location> },

  /// A value of this type cannot be lowered in this position.
  UnsupportedType { context: String, type_repr: String },
}

impl GenError {
  pub fn invariant(message: impl Into<String>) -> Self {
    Self::Invariant {
      message: message.into(),
    }
  }

  pub fn unimplemented(
    construct: impl Into<String>,
    loc: Option<Location>,
  ) -> Self {
    Self::Unimplemented {
      construct: construct.into(),
      loc,
    }
  }

  pub fn unsupported_type(
    context: impl Into<String>,
    type_repr: impl Into<String>,
  ) -> Self {
    Self::UnsupportedType {
      context: context.into(),
      type_repr: type_repr.into(),
    }
  }
}

impl fmt::Display for GenError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      GenError::Invariant { message } => {
        write!(f, "GEN0001 Lowering invariant violated: {}", message)
      },
      GenError::Unimplemented { construct, loc: Some(loc) } => {
        write!(f, "GEN0002 Not implemented: {} (at {})", construct, loc)
      },
      GenError::Unimplemented { construct, loc: None } => {
        write!(f, "GEN0002 Not implemented: {}", construct)
      },
      GenError::UnsupportedType { context, type_repr } => {
        write!(f, "GEN0003 Unsupported type in {}: {}", context, type_repr)
      },
    }
  }
}

impl std::error::Error for GenError {}

pub type GenResult<T> = Result<T, GenError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_codes() {
    assert_eq!(
      GenError::invariant("no function").to_string(),
      "GEN0001 Lowering invariant violated: no function"
    );
    assert_eq!(
      GenError::unimplemented("match", Some(Location::new("main.ha", 4, 2))).to_string(),
      "GEN0002 Not implemented: match (at main.ha:4:2)"
    );
    assert_eq!(
      GenError::unsupported_type("data item", "(int | void)").to_string(),
      "GEN0003 Unsupported type in data item: (int | void)"
    );
  }
}
