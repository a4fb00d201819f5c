//! Expression lowering.
//!
//! Every expression can be lowered in value mode ([`GenContext::gen_expr`]),
//! producing an operand, or in destination mode ([`GenContext::gen_expr_at`]),
//! writing its result into an existing object.

use kiln_hir::{Access, Binding, BinaryOperation, ExprId, ExprKind, Measure, UnaryOperation};
use kiln_ir::{Comparison, ConstValue, Data, Definition, IrType, Op, Value};
use kiln_type::{Storage, TypeId, TypeKind, Variadism, layout::SLICE_LENGTH_OFFSET};

use crate::{
  GenContext, GenError, GenResult, GenValue,
  qtype::{binarithm_for_op, extension_for_type},
};

impl GenContext<'_> {
  /// Lower an expression, returning its value.
  pub(crate) fn gen_expr(
    &mut self,
    id: ExprId,
  ) -> GenResult<GenValue> {
    let expr = self.expr(id);
    match &expr.kind {
      ExprKind::Access(access) => {
        let object = self.gen_access_addr(id, access)?;
        self.gen_load(object)
      },
      ExprKind::Assert {
        cond,
        message,
        is_static,
      } => self.gen_assert(id, *cond, *message, *is_static),
      ExprKind::Assign {
        op,
        object,
        value,
        indirect,
      } => self.gen_assign(id, *op, *object, *value, *indirect),
      ExprKind::Binarithm { op, lvalue, rvalue } => self.gen_binarithm(id, *op, *lvalue, *rvalue),
      ExprKind::Binding(bindings) => self.gen_binding(id, bindings),
      ExprKind::Call { lvalue, args } => self.gen_call(id, *lvalue, args),
      ExprKind::Constant(value) => self.gen_const(id, value),
      ExprKind::List(exprs) => self.gen_list(id, exprs, None),
      ExprKind::Measure(measure) => self.gen_measure(id, measure),
      ExprKind::Return(value) => self.gen_return(id, *value),
      ExprKind::Unarithm { op, operand } => self.gen_unarithm(id, *op, *operand),
      ExprKind::Struct { .. } | ExprKind::Tuple(_) => {
        let object = self.alloc_slot("object.", expr.result)?;
        self.gen_expr_at(id, &object)?;
        Ok(object)
      },
      ExprKind::Alloc { .. }
      | ExprKind::Append { .. }
      | ExprKind::Break(_)
      | ExprKind::Cast { .. }
      | ExprKind::Continue(_)
      | ExprKind::Defer(_)
      | ExprKind::Delete { .. }
      | ExprKind::For { .. }
      | ExprKind::Free(_)
      | ExprKind::If { .. }
      | ExprKind::Insert { .. }
      | ExprKind::Match { .. }
      | ExprKind::Slice { .. }
      | ExprKind::Switch { .. }
      | ExprKind::Yield { .. } => Err(GenError::unimplemented(
        format!("{} expression", expr.kind.name()),
        Some(expr.loc.clone()),
      )),
    }
  }

  /// Lower an expression, writing its result into the object at `out`.
  pub(crate) fn gen_expr_at(
    &mut self,
    id: ExprId,
    out: &GenValue,
  ) -> GenResult<()> {
    if out.is_const() {
      return Err(GenError::invariant("destination of an expression is a constant"));
    }

    let expr = self.expr(id);
    match &expr.kind {
      ExprKind::Constant(value) => self.gen_const_at(id, value, out),
      ExprKind::List(exprs) => self.gen_list(id, exprs, Some(out)).map(|_| ()),
      ExprKind::Struct { autofill, fields } => {
        if *autofill {
          self.gen_zero_fill(out)?;
        }
        self.gen_fields_at(expr.result, fields, out)
      },
      ExprKind::Tuple(values) => self.gen_tuple_at(expr.result, values, out),
      _ => {
        let value = self.gen_expr(id)?;
        if !expr.terminates {
          self.gen_store(out.clone(), value)?;
        }
        Ok(())
      },
    }
  }

  fn gen_assert(
    &mut self,
    id: ExprId,
    cond: Option<ExprId>,
    message: Option<ExprId>,
    is_static: bool,
  ) -> GenResult<GenValue> {
    let result = self.expr(id).result;
    if is_static {
      return Ok(GenValue::void(result));
    }
    let message = message.ok_or_else(|| GenError::invariant("runtime assertion without a message"))?;

    match cond {
      Some(cond) => {
        let failed = self.new_label("failed.")?;
        let passed = self.new_label("passed.")?;
        let cond = self.gen_expr(cond)?;
        self.emit(
          None,
          Op::Jnz,
          vec![cond.operand()?, Value::Label(passed), Value::Label(failed)],
        )?;
        self.place_label(failed)?;
        self.gen_abort(message)?;
        self.place_label(passed)?;
      },
      None => self.gen_abort(message)?,
    }
    Ok(GenValue::void(result))
  }

  fn gen_abort(
    &mut self,
    message: ExprId,
  ) -> GenResult<()> {
    let message = self.gen_expr(message)?;
    let abort = self.runtime("abort");
    self.emit(None, Op::Call, vec![abort, message.operand()?])
  }

  fn gen_assign(
    &mut self,
    id: ExprId,
    op: Option<BinaryOperation>,
    object: ExprId,
    value: ExprId,
    indirect: bool,
  ) -> GenResult<GenValue> {
    let expr = self.expr(id);
    let target = self.expr(object);

    let place = if indirect {
      let pointer = self.gen_expr(object)?;
      let referent = self.store.referent(pointer.ty).ok_or_else(|| {
        GenError::invariant(format!(
          "indirect assignment through {}",
          self.store.format(pointer.ty)
        ))
      })?;
      pointer.with_type(referent)
    } else {
      match &target.kind {
        ExprKind::Access(access) => self.gen_access_addr(object, access)?,
        ExprKind::Slice { .. } => {
          return Err(GenError::unimplemented("slice assignment", Some(expr.loc.clone())));
        },
        kind => {
          return Err(GenError::invariant(format!("cannot assign to a {} expression", kind.name())));
        },
      }
    };

    match op {
      None => self.gen_expr_at(value, &place)?,
      Some(BinaryOperation::And | BinaryOperation::Or) => {
        return Err(GenError::unimplemented(
          "compound logical assignment",
          Some(expr.loc.clone()),
        ));
      },
      Some(op) => {
        if self.store.is_aggregate(place.ty) {
          return Err(GenError::unsupported_type(
            "compound assignment",
            self.store.format(place.ty),
          ));
        }
        let lhs = self.gen_load(place.clone())?;
        let rhs = self.gen_expr(value)?;
        let instr = binarithm_for_op(self.store, op, place.ty)?;
        let result = self.value_temp(".", place.ty)?;
        self.emit(Some(result.operand()?), instr, vec![lhs.operand()?, rhs.operand()?])?;
        self.gen_store(place, result)?;
      },
    }
    Ok(GenValue::void(expr.result))
  }

  fn gen_binarithm(
    &mut self,
    id: ExprId,
    op: BinaryOperation,
    lvalue: ExprId,
    rvalue: ExprId,
  ) -> GenResult<GenValue> {
    let result = self.expr(id).result;
    if op.is_short_circuit() {
      return self.gen_short_circuit(result, op, lvalue, rvalue);
    }

    let ltype = self.expr(lvalue).result;
    let rtype = self.expr(rvalue).result;
    if self.store.storage(ltype) == Storage::String {
      return self.gen_string_compare(result, op, lvalue, rvalue);
    }

    let lhs = self.gen_expr(lvalue)?.operand()?;
    let rhs = self.gen_expr(rvalue)?.operand()?;
    let (lhs, rhs) = if op.is_comparison() {
      (self.gen_extend(lhs, ltype)?, self.gen_extend(rhs, rtype)?)
    } else {
      (lhs, rhs)
    };

    let instr = binarithm_for_op(self.store, op, ltype)?;
    let value = self.value_temp(".", result)?;
    self.emit(Some(value.operand()?), instr, vec![lhs, rhs])?;
    Ok(value)
  }

  /// Widen a 1 or 2 byte integer to a full word before comparing it.
  fn gen_extend(
    &mut self,
    value: Value,
    ty: TypeId,
  ) -> GenResult<Value> {
    let Some(ext) = extension_for_type(self.store, ty) else {
      return Ok(value);
    };
    let wide = Value::Temp(self.new_temp("ext.", IrType::Word)?);
    self.emit(Some(wide.clone()), Op::Ext(ext), vec![value])?;
    Ok(wide)
  }

  /// `&&` and `||`: the right operand runs only when the left one does not
  /// decide the result.
  fn gen_short_circuit(
    &mut self,
    result: TypeId,
    op: BinaryOperation,
    lvalue: ExprId,
    rvalue: ExprId,
  ) -> GenResult<GenValue> {
    let value = self.value_temp(".", result)?;
    let out = value.operand()?;
    let rlabel = self.new_label("rvalue.")?;
    let slabel = self.new_label("short.")?;

    let lhs = self.gen_expr(lvalue)?;
    self.emit(Some(out.clone()), Op::Copy, vec![lhs.operand()?])?;
    let targets = match op {
      BinaryOperation::And => vec![Value::Label(rlabel), Value::Label(slabel)],
      _ => vec![Value::Label(slabel), Value::Label(rlabel)],
    };
    let mut args = vec![out.clone()];
    args.extend(targets);
    self.emit(None, Op::Jnz, args)?;

    self.place_label(rlabel)?;
    let rhs = self.gen_expr(rvalue)?;
    if !self.expr(rvalue).terminates {
      self.emit(Some(out), Op::Copy, vec![rhs.operand()?])?;
      self.emit(None, Op::Jmp, vec![Value::Label(slabel)])?;
    }
    self.place_label(slabel)?;
    Ok(value)
  }

  fn gen_string_compare(
    &mut self,
    result: TypeId,
    op: BinaryOperation,
    lvalue: ExprId,
    rvalue: ExprId,
  ) -> GenResult<GenValue> {
    if !matches!(op, BinaryOperation::Equal | BinaryOperation::NotEqual) {
      return Err(GenError::unsupported_type(
        format!("`{}` comparison", op.symbol()),
        "str",
      ));
    }

    let lhs = self.gen_expr(lvalue)?;
    let rhs = self.gen_expr(rvalue)?;
    let value = self.value_temp(".", result)?;
    let strcmp = self.runtime("strcmp");
    self.emit(
      Some(value.operand()?),
      Op::Call,
      vec![strcmp, lhs.operand()?, rhs.operand()?],
    )?;
    if op == BinaryOperation::NotEqual {
      self.emit(Some(value.operand()?), Op::Xor, vec![value.operand()?, Value::word(1)])?;
    }
    Ok(value)
  }

  fn gen_binding(
    &mut self,
    id: ExprId,
    bindings: &[Binding],
  ) -> GenResult<GenValue> {
    for binding in bindings {
      let ty = self.unit.object(binding.object).ty;
      if binding.is_static {
        let name = self.gen_name("static.");
        let mut items = Vec::new();
        self.gen_data_items(binding.initializer, &mut items)?;
        self.push_def(Definition::Data(Data::new(name.clone(), items)));
        self.push_binding(binding.object, GenValue::global(name, ty));
        continue;
      }

      let slot = self.alloc_slot("binding.", ty)?;
      self.gen_expr_at(binding.initializer, &slot)?;
      self.push_binding(binding.object, slot);
    }
    Ok(GenValue::void(self.expr(id).result))
  }

  fn gen_call(
    &mut self,
    id: ExprId,
    lvalue: ExprId,
    args: &[ExprId],
  ) -> GenResult<GenValue> {
    let result = self.expr(id).result;
    let callee = self.gen_expr(lvalue)?;
    let callee = self.gen_autoderef(callee)?;

    let store = self.store;
    let ftype = store
      .function(callee.ty)
      .ok_or_else(|| GenError::unsupported_type("call", store.format(callee.ty)))?;

    let returns = if store.is_void(ftype.result) {
      None
    } else {
      Some(self.value_temp("returns.", result)?)
    };

    let mut operands = vec![callee.operand()?];
    let mut fixed = ftype.params.len();
    let mut variadic_marked = false;
    for arg in args {
      let value = self.gen_expr(*arg)?;
      operands.push(value.operand()?);
      fixed = fixed.saturating_sub(1);
      if fixed == 0 && !variadic_marked && ftype.variadism == Variadism::C {
        operands.push(Value::Variadic);
        variadic_marked = true;
      }
    }

    let out = returns.as_ref().map(GenValue::operand).transpose()?;
    self.emit(out, Op::Call, operands)?;
    Ok(returns.unwrap_or_else(|| GenValue::void(result)))
  }

  /// Lower a list in order. Bindings made inside go out of scope at its end.
  fn gen_list(
    &mut self,
    id: ExprId,
    exprs: &[ExprId],
    out: Option<&GenValue>,
  ) -> GenResult<GenValue> {
    let depth = self.binding_depth();
    let mut value = GenValue::void(self.expr(id).result);

    for (n, expr) in exprs.iter().enumerate() {
      let last = n + 1 == exprs.len();
      match out {
        Some(out) if last => {
          self.gen_expr_at(*expr, out)?;
          value = out.clone();
        },
        _ => value = self.gen_expr(*expr)?,
      }
      if self.expr(*expr).terminates {
        break;
      }
    }

    self.pop_bindings(depth);
    Ok(value)
  }

  fn gen_measure(
    &mut self,
    id: ExprId,
    measure: &Measure,
  ) -> GenResult<GenValue> {
    let result = self.expr(id).result;
    let store = self.store;

    match measure {
      Measure::Len(value) => {
        let ty = self.deref_type(self.expr(*value).result);
        match &store.dealiased(ty).kind {
          TypeKind::Array(array) => match array.length {
            Some(length) => Ok(GenValue::constant(ConstValue::Long(length), result)),
            None => Err(GenError::invariant("len of an unbounded array")),
          },
          TypeKind::Slice(_) | TypeKind::String => {
            let header = self.gen_expr(*value)?;
            let header = self.gen_autoderef(header)?;
            let length = self.gen_header_word(header.operand()?, SLICE_LENGTH_OFFSET, "len.")?;
            Ok(GenValue::temp(length, result))
          },
          _ => Err(GenError::unsupported_type("len", store.format(ty))),
        }
      },
      Measure::Size(ty) => {
        let layout = store.dealiased(*ty).layout();
        if !layout.is_sized() {
          return Err(GenError::invariant(format!("size of unsized {}", store.format(*ty))));
        }
        Ok(GenValue::constant(ConstValue::Long(layout.size), result))
      },
      Measure::Offset(access) => {
        let offset = match &self.expr(*access).kind {
          ExprKind::Access(Access::Field { object, field }) => {
            let ty = self.deref_type(self.expr(*object).result);
            store.field(ty, field).map(|f| f.offset)
          },
          ExprKind::Access(Access::Value { tuple, index }) => {
            let ty = self.deref_type(self.expr(*tuple).result);
            store.tuple_value(ty, *index).map(|v| v.offset)
          },
          _ => None,
        };
        let offset = offset.ok_or_else(|| GenError::invariant("offset of something other than a member"))?;
        Ok(GenValue::constant(ConstValue::Long(offset), result))
      },
    }
  }

  /// Type reached by following pointers from `ty`.
  fn deref_type(
    &self,
    mut ty: TypeId,
  ) -> TypeId {
    while let Some(referent) = self.store.referent(ty) {
      ty = referent;
    }
    ty
  }

  fn gen_return(
    &mut self,
    id: ExprId,
    value: Option<ExprId>,
  ) -> GenResult<GenValue> {
    let args = match value {
      Some(value) => {
        let value = self.gen_expr(value)?;
        if value.is_void() {
          vec![]
        } else {
          vec![value.operand()?]
        }
      },
      None => vec![],
    };
    self.emit(None, Op::Ret, args)?;
    Ok(GenValue::void(self.expr(id).result))
  }

  fn gen_unarithm(
    &mut self,
    id: ExprId,
    op: UnaryOperation,
    operand: ExprId,
  ) -> GenResult<GenValue> {
    let result = self.expr(id).result;

    match op {
      UnaryOperation::Address => {
        let target = self.expr(operand);
        let address = match &target.kind {
          ExprKind::Access(access) => self.gen_access_addr(operand, access)?,
          _ => {
            let object = self.alloc_slot("object.", target.result)?;
            self.gen_expr_at(operand, &object)?;
            object
          },
        };
        Ok(address.with_type(result))
      },
      UnaryOperation::Deref => {
        let pointer = self.gen_expr(operand)?;
        let referent = self.store.referent(pointer.ty).ok_or_else(|| {
          GenError::invariant(format!("dereference of {}", self.store.format(pointer.ty)))
        })?;
        self.gen_load(pointer.with_type(referent))
      },
      UnaryOperation::BitNot => {
        let value = self.gen_expr(operand)?;
        let ones = match self.qtype(result) {
          IrType::Word => Value::word(u32::MAX),
          _ => Value::long(u64::MAX),
        };
        let out = self.value_temp(".", result)?;
        self.emit(Some(out.operand()?), Op::Xor, vec![value.operand()?, ones])?;
        Ok(out)
      },
      UnaryOperation::Not => {
        let value = self.gen_expr(operand)?;
        let out = self.value_temp(".", result)?;
        self.emit(
          Some(out.operand()?),
          Op::Cmp(Comparison::Eq, IrType::Word),
          vec![value.operand()?, Value::word(0)],
        )?;
        Ok(out)
      },
      UnaryOperation::Neg => {
        let value = self.gen_expr(operand)?;
        let out = self.value_temp(".", result)?;
        self.emit(Some(out.operand()?), Op::Neg, vec![value.operand()?])?;
        Ok(out)
      },
      UnaryOperation::Plus => self.gen_expr(operand),
    }
  }

  fn gen_tuple_at(
    &mut self,
    ty: TypeId,
    values: &[ExprId],
    out: &GenValue,
  ) -> GenResult<()> {
    let store = self.store;
    let TypeKind::Tuple(members) = &store.dealiased(ty).kind else {
      return Err(GenError::invariant("tuple literal of non-tuple type"));
    };
    if members.len() != values.len() {
      return Err(GenError::invariant(format!(
        "tuple literal has {} values for {}",
        values.len(),
        store.format(ty)
      )));
    }

    let vtemp = self.new_temp("value.", IrType::Long)?;
    for (member, value) in members.iter().zip(values) {
      self.emit(
        Some(Value::Temp(vtemp)),
        Op::Add,
        vec![out.operand()?, Value::long(member.offset)],
      )?;
      self.gen_expr_at(*value, &GenValue::temp(vtemp, member.ty))?;
    }
    Ok(())
  }
}
