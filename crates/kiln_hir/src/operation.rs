#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperation {
  // Arithmetic
  Add,
  Sub,
  Mul,
  Div,
  Mod,

  // Bitwise
  BitAnd,
  BitOr,
  BitXor,
  Shl,
  Shr,

  // Logical
  And,
  Or,
  Xor,

  // Comparison
  Equal,
  NotEqual,
  Less,
  LessEqual,
  Greater,
  GreaterEqual,
}

impl BinaryOperation {
  /// `&&` and `||`, which only evaluate their right operand on demand.
  pub fn is_short_circuit(self) -> bool {
    matches!(self, BinaryOperation::And | BinaryOperation::Or)
  }

  pub fn is_comparison(self) -> bool {
    matches!(
      self,
      BinaryOperation::Equal
        | BinaryOperation::NotEqual
        | BinaryOperation::Less
        | BinaryOperation::LessEqual
        | BinaryOperation::Greater
        | BinaryOperation::GreaterEqual
    )
  }

  pub fn symbol(self) -> &'static str {
    match self {
      BinaryOperation::Add => "+",
      BinaryOperation::Sub => "-",
      BinaryOperation::Mul => "*",
      BinaryOperation::Div => "/",
      BinaryOperation::Mod => "%",
      BinaryOperation::BitAnd => "&",
      BinaryOperation::BitOr => "|",
      BinaryOperation::BitXor => "^",
      BinaryOperation::Shl => "<<",
      BinaryOperation::Shr => ">>",
      BinaryOperation::And => "&&",
      BinaryOperation::Or => "||",
      BinaryOperation::Xor => "^^",
      BinaryOperation::Equal => "==",
      BinaryOperation::NotEqual => "!=",
      BinaryOperation::Less => "<",
      BinaryOperation::LessEqual => "<=",
      BinaryOperation::Greater => ">",
      BinaryOperation::GreaterEqual => ">=",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperation {
  /// `&x`
  Address,
  /// `*x`
  Deref,
  /// `~x`
  BitNot,
  /// `!x`
  Not,
  /// `-x`
  Neg,
  /// `+x`
  Plus,
}
