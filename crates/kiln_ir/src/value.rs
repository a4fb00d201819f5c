use ordered_float::OrderedFloat;

use crate::{IrType, LabelId, TempId};

/// Metadata for a temporary: its unique name and class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Temp {
  pub name: String,
  pub ty: IrType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
  pub name: String,
}

/// An immediate operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstValue {
  Word(u32),
  Long(u64),
  Single(OrderedFloat<f32>),
  Double(OrderedFloat<f64>),
}

impl ConstValue {
  pub fn ir_type(&self) -> IrType {
    match self {
      ConstValue::Word(_) => IrType::Word,
      ConstValue::Long(_) => IrType::Long,
      ConstValue::Single(_) => IrType::Single,
      ConstValue::Double(_) => IrType::Double,
    }
  }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
  Const(ConstValue),
  Temp(TempId),
  /// Address of a program-level symbol.
  Global(String),
  Label(LabelId),
  /// Separates fixed from variadic arguments of a C-variadic call.
  Variadic,
}

impl Value {
  pub fn word(v: u32) -> Self {
    Value::Const(ConstValue::Word(v))
  }

  pub fn long(v: u64) -> Self {
    Value::Const(ConstValue::Long(v))
  }

  pub fn is_const(&self) -> bool {
    matches!(self, Value::Const(_))
  }

  pub fn as_temp(&self) -> Option<TempId> {
    match self {
      Value::Temp(id) => Some(*id),
      _ => None,
    }
  }
}

impl From<TempId> for Value {
  fn from(id: TempId) -> Self {
    Value::Temp(id)
  }
}

impl From<ConstValue> for Value {
  fn from(value: ConstValue) -> Self {
    Value::Const(value)
  }
}
