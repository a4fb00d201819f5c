//! Address computation for identifiers, indexing, fields and tuple values.

use kiln_hir::{Access, ExprId, Location, ObjectId, ObjectKind};
use kiln_ir::{Comparison, ExtKind, IrType, LoadKind, Op, TempId, Value};
use kiln_type::{
  Storage, TypeKind,
  layout::{SLICE_DATA_OFFSET, SLICE_LENGTH_OFFSET},
};

use crate::{GenContext, GenError, GenResult, GenValue};

/// Reason codes passed to the runtime's fixed abort handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
  OutOfBounds = 0,
}

impl GenContext<'_> {
  /// Address of the object named by `access`, typed as that object.
  pub(crate) fn gen_access_addr(
    &mut self,
    expr: ExprId,
    access: &Access,
  ) -> GenResult<GenValue> {
    match access {
      Access::Ident(object) => self.gen_access_ident(*object),
      Access::Index { array, index } => self.gen_access_index(expr, *array, *index),
      Access::Field { object, field } => self.gen_access_field(*object, field),
      Access::Value { tuple, index } => self.gen_access_value(*tuple, *index),
    }
  }

  fn gen_access_ident(
    &mut self,
    object: ObjectId,
  ) -> GenResult<GenValue> {
    let obj = self.unit.object(object);
    match obj.kind {
      ObjectKind::Bind => self
        .lookup_binding(object)
        .cloned()
        .ok_or_else(|| GenError::invariant(format!("binding `{}` is not in scope", obj.ident))),
      ObjectKind::Decl => Ok(GenValue::global(self.object_symbol(object), obj.ty)),
      ObjectKind::Const | ObjectKind::Type => Err(GenError::invariant(format!(
        "`{}` has no storage and cannot be addressed",
        obj.ident
      ))),
    }
  }

  /// Linker name of a program-level object.
  pub(crate) fn object_symbol(
    &self,
    object: ObjectId,
  ) -> String {
    match self.unit.declaration_for(object) {
      Some(decl) => decl.symbol_name(),
      None => self.unit.object(object).ident.to_symbol(),
    }
  }

  /// Follow pointers until the value is no longer a pointer.
  pub(crate) fn gen_autoderef(
    &mut self,
    mut value: GenValue,
  ) -> GenResult<GenValue> {
    while let Some(referent) = self.store.referent(value.ty) {
      value = self.gen_load(value.with_type(referent))?;
    }
    Ok(value)
  }

  fn gen_access_index(
    &mut self,
    expr: ExprId,
    array: ExprId,
    index: ExprId,
  ) -> GenResult<GenValue> {
    let object = self.gen_expr(array)?;
    let object = self.gen_autoderef(object)?;
    let base_addr = object.operand()?;

    let store = self.store;
    let (base, length) = match &store.dealiased(object.ty).kind {
      TypeKind::Slice(_) => {
        let data = self.new_temp("data.", IrType::Long)?;
        self.emit(
          Some(Value::Temp(data)),
          Op::Add,
          vec![base_addr.clone(), Value::long(SLICE_DATA_OFFSET)],
        )?;
        self.emit(
          Some(Value::Temp(data)),
          Op::Load(LoadKind::Long),
          vec![Value::Temp(data)],
        )?;
        let length = self.gen_header_word(base_addr, SLICE_LENGTH_OFFSET, "len.")?;
        (Value::Temp(data), Some(Value::Temp(length)))
      },
      TypeKind::Array(a) => (base_addr, a.length.map(Value::long)),
      _ => {
        return Err(GenError::unsupported_type("index", self.store.format(object.ty)));
      },
    };

    let member = self
      .store
      .members(object.ty)
      .ok_or_else(|| GenError::invariant("indexed object has no member type"))?;
    let member_size = self.size_of(member);

    let index = self.gen_expr(index)?;
    let index = self.gen_widen_index(index)?;

    let address = Value::Temp(self.new_temp(".", IrType::Long)?);
    self.emit(Some(address.clone()), Op::Mul, vec![index.clone(), Value::long(member_size)])?;
    self.emit(Some(address.clone()), Op::Add, vec![base, address.clone()])?;

    if let Some(length) = length.filter(|_| self.config.gen.bounds_checks) {
      let loc = self.expr(expr).loc.clone();
      self.gen_bounds_check(index, length, &loc)?;
    }

    let result = self.expr(expr).result;
    match address {
      Value::Temp(temp) => Ok(GenValue::temp(temp, result)),
      _ => Err(GenError::invariant("element address is not a temporary")),
    }
  }

  /// Index operands are `size`; narrower integers are widened to a long.
  fn gen_widen_index(
    &mut self,
    index: GenValue,
  ) -> GenResult<Value> {
    let operand = index.operand()?;
    if self.qtype(index.ty) != IrType::Word {
      return Ok(operand);
    }

    let ext = if self.store.is_signed(index.ty) {
      ExtKind::SignedWord
    } else {
      ExtKind::UnsignedWord
    };
    let wide = Value::Temp(self.new_temp("ext.", IrType::Long)?);
    self.emit(Some(wide.clone()), Op::Ext(ext), vec![operand])?;
    Ok(wide)
  }

  /// Load a word of a slice or string header.
  pub(crate) fn gen_header_word(
    &mut self,
    header: Value,
    offset: u64,
    prefix: &str,
  ) -> GenResult<TempId> {
    let addr = if offset == 0 {
      header
    } else {
      let addr = Value::Temp(self.new_temp(".", IrType::Long)?);
      self.emit(Some(addr.clone()), Op::Add, vec![header, Value::long(offset)])?;
      addr
    };
    let word = self.new_temp(prefix, IrType::Long)?;
    self.emit(Some(Value::Temp(word)), Op::Load(LoadKind::Long), vec![addr])?;
    Ok(word)
  }

  /// Abort through the runtime unless `index < length`.
  fn gen_bounds_check(
    &mut self,
    index: Value,
    length: Value,
    loc: &Location,
  ) -> GenResult<()> {
    let valid = Value::Temp(self.new_temp(".", IrType::Word)?);
    let ok = self.new_label("valid.")?;
    let bad = self.new_label("invalid.")?;

    self.emit(
      Some(valid.clone()),
      Op::Cmp(Comparison::Ult, IrType::Long),
      vec![index, length],
    )?;
    self.emit(None, Op::Jnz, vec![valid, Value::Label(ok), Value::Label(bad)])?;
    self.place_label(bad)?;
    self.gen_fixed_abort(loc, AbortReason::OutOfBounds)?;
    self.place_label(ok)
  }

  /// Call the runtime's fixed abort handler with `path:line:col` and a reason code.
  pub(crate) fn gen_fixed_abort(
    &mut self,
    loc: &Location,
    reason: AbortReason,
  ) -> GenResult<()> {
    let str_ty = self.store.const_str();
    let message = self.alloc_slot("object.", str_ty)?;
    self.gen_string_at(&loc.to_string(), &message)?;

    let abort = self.runtime("abort_fixed");
    self.emit(None, Op::Call, vec![abort, message.operand()?, Value::long(reason as u64)])
  }

  fn gen_access_field(
    &mut self,
    object: ExprId,
    field: &str,
  ) -> GenResult<GenValue> {
    let object = self.gen_expr(object)?;
    let object = self.gen_autoderef(object)?;
    let store = self.store;
    let field = store
      .field(object.ty, field)
      .ok_or_else(|| GenError::invariant(format!("{} has no field `{}`", store.format(object.ty), field)))?;
    let (offset, ty) = (field.offset, field.ty);

    let address = self.address_temp("field.", ty)?;
    self.emit(
      Some(address.operand()?),
      Op::Add,
      vec![object.operand()?, Value::long(offset)],
    )?;
    Ok(address)
  }

  fn gen_access_value(
    &mut self,
    tuple: ExprId,
    index: usize,
  ) -> GenResult<GenValue> {
    let object = self.gen_expr(tuple)?;
    let object = self.gen_autoderef(object)?;
    if self.store.storage(object.ty) != Storage::Tuple {
      return Err(GenError::unsupported_type("tuple access", self.store.format(object.ty)));
    }
    let store = self.store;
    let value = store
      .tuple_value(object.ty, index)
      .ok_or_else(|| GenError::invariant(format!("{} has no value {}", store.format(object.ty), index)))?;
    let (offset, ty) = (value.offset, value.ty);

    let address = self.address_temp("value.", ty)?;
    self.emit(
      Some(address.operand()?),
      Op::Add,
      vec![object.operand()?, Value::long(offset)],
    )?;
    Ok(address)
  }
}
