use std::fmt;

/// Machine-level operand classes.
///
/// `Byte` and `Half` only appear in memory accesses and data definitions;
/// sub-word values live in `Word` temporaries. Aggregates travel as `Long`
/// addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
  Byte,
  Half,
  Word,
  Long,
  Single,
  Double,
  Void,
}

impl IrType {
  pub fn suffix(self) -> &'static str {
    match self {
      IrType::Byte => "b",
      IrType::Half => "h",
      IrType::Word => "w",
      IrType::Long => "l",
      IrType::Single => "s",
      IrType::Double => "d",
      IrType::Void => "",
    }
  }

  pub fn size(self) -> u64 {
    match self {
      IrType::Byte => 1,
      IrType::Half => 2,
      IrType::Word | IrType::Single => 4,
      IrType::Long | IrType::Double => 8,
      IrType::Void => 0,
    }
  }

  pub fn is_float(self) -> bool {
    matches!(self, IrType::Single | IrType::Double)
  }
}

impl fmt::Display for IrType {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.suffix())
  }
}
