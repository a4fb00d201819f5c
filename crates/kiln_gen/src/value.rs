use kiln_ir::{ConstValue, TempId, Value};
use kiln_type::TypeId;

use crate::{GenError, GenResult};

#[derive(Debug, Clone, PartialEq)]
pub enum GenValueKind {
  /// An immediate. `None` is the value of a void expression.
  Const(Option<ConstValue>),
  Temp(TempId),
  Global(String),
}

/// Result of lowering an expression: an operand together with the source
/// type it carries.
///
/// For aggregate types the operand is the address of the object. Values
/// returned by the address resolver are always addresses, typed as the
/// object they point at.
#[derive(Debug, Clone, PartialEq)]
pub struct GenValue {
  pub kind: GenValueKind,
  pub ty: TypeId,
}

impl GenValue {
  pub fn void(ty: TypeId) -> Self {
    Self {
      kind: GenValueKind::Const(None),
      ty,
    }
  }

  pub fn constant(
    value: ConstValue,
    ty: TypeId,
  ) -> Self {
    Self {
      kind: GenValueKind::Const(Some(value)),
      ty,
    }
  }

  pub fn temp(
    temp: TempId,
    ty: TypeId,
  ) -> Self {
    Self {
      kind: GenValueKind::Temp(temp),
      ty,
    }
  }

  pub fn global(
    name: impl Into<String>,
    ty: TypeId,
  ) -> Self {
    Self {
      kind: GenValueKind::Global(name.into()),
      ty,
    }
  }

  /// Same operand, reinterpreted as another type.
  pub fn with_type(
    self,
    ty: TypeId,
  ) -> Self {
    Self { kind: self.kind, ty }
  }

  pub fn is_const(&self) -> bool {
    matches!(self.kind, GenValueKind::Const(_))
  }

  pub fn is_void(&self) -> bool {
    matches!(self.kind, GenValueKind::Const(None))
  }

  /// IR operand for this value.
  pub fn operand(&self) -> GenResult<Value> {
    match &self.kind {
      GenValueKind::Const(Some(c)) => Ok(Value::Const(*c)),
      GenValueKind::Const(None) => Err(GenError::invariant("void value used as an operand")),
      GenValueKind::Temp(temp) => Ok(Value::Temp(*temp)),
      GenValueKind::Global(name) => Ok(Value::Global(name.clone())),
    }
  }
}
