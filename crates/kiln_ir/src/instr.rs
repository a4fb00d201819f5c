use crate::{IrType, Value};

/// Comparison predicates. Integer predicates are signed (`S*`) or unsigned
/// (`U*`); float predicates carry no signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
  Eq,
  Ne,
  Slt,
  Sle,
  Sgt,
  Sge,
  Ult,
  Ule,
  Ugt,
  Uge,
  Lt,
  Le,
  Gt,
  Ge,
}

impl Comparison {
  pub fn mnemonic(self) -> &'static str {
    match self {
      Comparison::Eq => "eq",
      Comparison::Ne => "ne",
      Comparison::Slt => "slt",
      Comparison::Sle => "sle",
      Comparison::Sgt => "sgt",
      Comparison::Sge => "sge",
      Comparison::Ult => "ult",
      Comparison::Ule => "ule",
      Comparison::Ugt => "ugt",
      Comparison::Uge => "uge",
      Comparison::Lt => "lt",
      Comparison::Le => "le",
      Comparison::Gt => "gt",
      Comparison::Ge => "ge",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
  SignedByte,
  UnsignedByte,
  SignedHalf,
  UnsignedHalf,
  SignedWord,
  UnsignedWord,
  Long,
  Single,
  Double,
}

impl LoadKind {
  pub fn mnemonic(self) -> &'static str {
    match self {
      LoadKind::SignedByte => "loadsb",
      LoadKind::UnsignedByte => "loadub",
      LoadKind::SignedHalf => "loadsh",
      LoadKind::UnsignedHalf => "loaduh",
      LoadKind::SignedWord => "loadsw",
      LoadKind::UnsignedWord => "loaduw",
      LoadKind::Long => "loadl",
      LoadKind::Single => "loads",
      LoadKind::Double => "loadd",
    }
  }

  /// Bytes read from memory.
  pub fn width(self) -> u64 {
    match self {
      LoadKind::SignedByte | LoadKind::UnsignedByte => 1,
      LoadKind::SignedHalf | LoadKind::UnsignedHalf => 2,
      LoadKind::SignedWord | LoadKind::UnsignedWord | LoadKind::Single => 4,
      LoadKind::Long | LoadKind::Double => 8,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
  Byte,
  Half,
  Word,
  Long,
  Single,
  Double,
}

impl StoreKind {
  pub fn mnemonic(self) -> &'static str {
    match self {
      StoreKind::Byte => "storeb",
      StoreKind::Half => "storeh",
      StoreKind::Word => "storew",
      StoreKind::Long => "storel",
      StoreKind::Single => "stores",
      StoreKind::Double => "stored",
    }
  }

  /// Bytes written to memory.
  pub fn width(self) -> u64 {
    match self {
      StoreKind::Byte => 1,
      StoreKind::Half => 2,
      StoreKind::Word | StoreKind::Single => 4,
      StoreKind::Long | StoreKind::Double => 8,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtKind {
  SignedByte,
  UnsignedByte,
  SignedHalf,
  UnsignedHalf,
  SignedWord,
  UnsignedWord,
}

impl ExtKind {
  pub fn mnemonic(self) -> &'static str {
    match self {
      ExtKind::SignedByte => "extsb",
      ExtKind::UnsignedByte => "extub",
      ExtKind::SignedHalf => "extsh",
      ExtKind::UnsignedHalf => "extuh",
      ExtKind::SignedWord => "extsw",
      ExtKind::UnsignedWord => "extuw",
    }
  }
}

/// Operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
  Add,
  Sub,
  Mul,
  Div,
  Udiv,
  Rem,
  Urem,
  And,
  Or,
  Xor,
  Sar,
  Shr,
  Shl,
  Neg,
  Cmp(Comparison, IrType),
  Ext(ExtKind),
  Load(LoadKind),
  Store(StoreKind),
  Alloc4,
  Alloc8,
  Alloc16,
  Copy,
  /// `args[0]` is the call target, the remaining operands are the arguments.
  Call,
  Ret,
  Jmp,
  Jnz,
  Hlt,
}

impl Op {
  pub fn mnemonic(self) -> String {
    let name = match self {
      Op::Add => "add",
      Op::Sub => "sub",
      Op::Mul => "mul",
      Op::Div => "div",
      Op::Udiv => "udiv",
      Op::Rem => "rem",
      Op::Urem => "urem",
      Op::And => "and",
      Op::Or => "or",
      Op::Xor => "xor",
      Op::Sar => "sar",
      Op::Shr => "shr",
      Op::Shl => "shl",
      Op::Neg => "neg",
      Op::Cmp(cmp, ty) => return format!("c{}{}", cmp.mnemonic(), ty.suffix()),
      Op::Ext(kind) => kind.mnemonic(),
      Op::Load(kind) => kind.mnemonic(),
      Op::Store(kind) => kind.mnemonic(),
      Op::Alloc4 => "alloc4",
      Op::Alloc8 => "alloc8",
      Op::Alloc16 => "alloc16",
      Op::Copy => "copy",
      Op::Call => "call",
      Op::Ret => "ret",
      Op::Jmp => "jmp",
      Op::Jnz => "jnz",
      Op::Hlt => "hlt",
    };
    name.to_string()
  }

  /// Ends a block: nothing after it in the same block is reachable.
  pub fn is_terminator(self) -> bool {
    matches!(self, Op::Ret | Op::Jmp | Op::Jnz | Op::Hlt)
  }

  pub fn is_alloc(self) -> bool {
    matches!(self, Op::Alloc4 | Op::Alloc8 | Op::Alloc16)
  }
}

/// One instruction: optional destination, operation, ordered operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instr {
  pub out: Option<Value>,
  pub op: Op,
  pub args: Vec<Value>,
}

impl Instr {
  pub fn new(
    out: Option<Value>,
    op: Op,
    args: Vec<Value>,
  ) -> Self {
    Self { out, op, args }
  }

  /// The call target of a `call`.
  pub fn callee(&self) -> Option<&Value> {
    match self.op {
      Op::Call => self.args.first(),
      _ => None,
    }
  }

  /// Address operand of a `store` (its second operand).
  pub fn store_address(&self) -> Option<&Value> {
    match self.op {
      Op::Store(_) => self.args.get(1),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mnemonics() {
    assert_eq!(Op::Cmp(Comparison::Ult, IrType::Long).mnemonic(), "cultl");
    assert_eq!(Op::Cmp(Comparison::Eq, IrType::Word).mnemonic(), "ceqw");
    assert_eq!(Op::Load(LoadKind::UnsignedHalf).mnemonic(), "loaduh");
    assert_eq!(Op::Store(StoreKind::Byte).mnemonic(), "storeb");
    assert_eq!(Op::Ext(ExtKind::SignedByte).mnemonic(), "extsb");
  }

  #[test]
  fn test_widths_match_mnemonics() {
    assert_eq!(LoadKind::UnsignedByte.width(), 1);
    assert_eq!(LoadKind::SignedWord.width(), 4);
    assert_eq!(StoreKind::Half.width(), 2);
    assert_eq!(StoreKind::Double.width(), 8);
  }

  #[test]
  fn test_callee_is_first_operand() {
    let call = Instr::new(None, Op::Call, vec![Value::Global("f".to_string()), Value::word(1)]);
    assert_eq!(call.callee(), Some(&Value::Global("f".to_string())));
    assert!(Op::Jnz.is_terminator());
    assert!(!Op::Call.is_terminator());
  }
}
