//! Constants, both as instruction operands and as static data.

use kiln_hir::{ConstantValue, ExprId, ExprKind, FieldValue};
use kiln_ir::{ConstValue, Data, DataItem, Definition, IrType, Op, StoreKind, Value};
use kiln_type::{
  Storage, TypeId, TypeKind,
  layout::{SLICE_CAPACITY_OFFSET, SLICE_DATA_OFFSET, SLICE_LENGTH_OFFSET},
};
use ordered_float::OrderedFloat;

use crate::{GenContext, GenError, GenResult, GenValue, qtype::store_for_type};

impl GenContext<'_> {
  /// Value of a constant expression. Aggregate constants are materialized in
  /// a fresh stack object whose address is returned.
  pub(crate) fn gen_const(
    &mut self,
    expr: ExprId,
    value: &ConstantValue,
  ) -> GenResult<GenValue> {
    let ty = self.expr(expr).result;
    if self.store.is_aggregate(ty) {
      let object = self.alloc_slot("object.", ty)?;
      self.gen_const_at(expr, value, &object)?;
      return Ok(object);
    }

    match value {
      ConstantValue::Void => Ok(GenValue::void(ty)),
      ConstantValue::Address { object, offset } => {
        let symbol = self.object_symbol(*object);
        if *offset == 0 {
          return Ok(GenValue::global(symbol, ty));
        }
        let address = self.value_temp(".", ty)?;
        self.emit(
          Some(address.operand()?),
          Op::Add,
          vec![Value::Global(symbol), Value::long(*offset as u64)],
        )?;
        Ok(address)
      },
      scalar => Ok(GenValue::constant(self.scalar_const(ty, scalar)?, ty)),
    }
  }

  /// Immediate for a scalar constant of type `ty`, sized by its register class.
  fn scalar_const(
    &self,
    ty: TypeId,
    value: &ConstantValue,
  ) -> GenResult<ConstValue> {
    let class = self.qtype(ty);
    if class.is_float() {
      let ConstantValue::Float(f) = value else {
        return Err(GenError::invariant(format!(
          "{:?} is not a constant of type {}",
          value,
          self.store.format(ty)
        )));
      };
      return Ok(match class {
        IrType::Single => ConstValue::Single(OrderedFloat(*f as f32)),
        _ => ConstValue::Double(OrderedFloat(*f)),
      });
    }

    let bits = match value {
      ConstantValue::Bool(b) => *b as u64,
      ConstantValue::Int(i) => *i as u64,
      ConstantValue::Uint(u) => *u,
      ConstantValue::Rune(r) => *r as u64,
      ConstantValue::Null => 0,
      _ => {
        return Err(GenError::invariant(format!(
          "{:?} is not a constant of type {}",
          value,
          self.store.format(ty)
        )));
      },
    };

    match class {
      IrType::Word => Ok(ConstValue::Word(bits as u32)),
      IrType::Long => Ok(ConstValue::Long(bits)),
      _ => Err(GenError::unsupported_type("scalar constant", self.store.format(ty))),
    }
  }

  /// Write a constant into the object at `out`.
  pub(crate) fn gen_const_at(
    &mut self,
    expr: ExprId,
    value: &ConstantValue,
    out: &GenValue,
  ) -> GenResult<()> {
    let ty = self.expr(expr).result;
    if !self.store.is_aggregate(ty) {
      let value = self.gen_const(expr, value)?;
      return self.gen_store(out.clone(), value);
    }

    match (self.store.storage(ty), value) {
      (Storage::String, ConstantValue::String(s)) => self.gen_string_at(s, out),
      (Storage::Array, ConstantValue::Array(items)) => self.gen_const_array_at(ty, items, out),
      (Storage::Struct, ConstantValue::Struct(fields)) => self.gen_fields_at(ty, fields, out),
      _ => Err(GenError::unsupported_type("constant", self.store.format(ty))),
    }
  }

  fn gen_const_array_at(
    &mut self,
    ty: TypeId,
    items: &[ExprId],
    out: &GenValue,
  ) -> GenResult<()> {
    let store = self.store;
    let TypeKind::Array(array) = &store.dealiased(ty).kind else {
      return Err(GenError::invariant("array constant of non-array type"));
    };
    if array.length.is_some_and(|len| len != items.len() as u64) {
      return Err(GenError::invariant(format!(
        "array constant has {} items for {}",
        items.len(),
        store.format(ty)
      )));
    }

    let member = array.members;
    let member_size = self.size_of(member);
    let item = self.address_temp("item.", member)?;
    for (n, value) in items.iter().enumerate() {
      self.emit(
        Some(item.operand()?),
        Op::Add,
        vec![out.operand()?, Value::long(n as u64 * member_size)],
      )?;
      self.gen_expr_at(*value, &item)?;
    }
    Ok(())
  }

  /// Write each named field of a struct value at its offset from `out`.
  pub(crate) fn gen_fields_at(
    &mut self,
    ty: TypeId,
    fields: &[FieldValue],
    out: &GenValue,
  ) -> GenResult<()> {
    let store = self.store;
    let ftemp = self.new_temp("field.", IrType::Long)?;
    for value in fields {
      let field = store.field(ty, &value.name).ok_or_else(|| {
        GenError::invariant(format!("{} has no field `{}`", store.format(ty), value.name))
      })?;
      self.emit(
        Some(Value::Temp(ftemp)),
        Op::Add,
        vec![out.operand()?, Value::long(field.offset)],
      )?;
      self.gen_expr_at(value.value, &GenValue::temp(ftemp, field.ty))?;
    }
    Ok(())
  }

  /// Write a string header for `s` at `out`. The bytes go to a fresh data
  /// definition; an empty string has a null data pointer.
  pub(crate) fn gen_string_at(
    &mut self,
    s: &str,
    out: &GenValue,
  ) -> GenResult<()> {
    let length = Value::long(s.len() as u64);
    let data = match self.gen_string_data(s) {
      Some(symbol) => Value::Global(symbol),
      None => Value::long(0),
    };

    let header = out.operand()?;
    for (offset, value) in [
      (SLICE_LENGTH_OFFSET, length.clone()),
      (SLICE_CAPACITY_OFFSET, length),
      (SLICE_DATA_OFFSET, data),
    ] {
      let addr = if offset == 0 {
        header.clone()
      } else {
        let addr = Value::Temp(self.new_temp(".", IrType::Long)?);
        self.emit(Some(addr.clone()), Op::Add, vec![header.clone(), Value::long(offset)])?;
        addr
      };
      self.emit(None, Op::Store(StoreKind::Long), vec![value, addr])?;
    }
    Ok(())
  }

  /// Emit `s` as a `strdata` definition, returning its symbol.
  fn gen_string_data(
    &mut self,
    s: &str,
  ) -> Option<String> {
    if s.is_empty() {
      return None;
    }
    let name = self.gen_name("strdata.");
    self.push_def(Definition::Data(Data::new(
      name.clone(),
      vec![DataItem::Str(s.as_bytes().to_vec())],
    )));
    Some(name)
  }

  /// Header items `{ len, cap, data }` of a string or slice in static data.
  fn header_items(
    length: u64,
    data: Option<String>,
  ) -> Vec<DataItem> {
    let data = match data {
      Some(sym) => DataItem::SymOffset { sym, offset: 0 },
      None => DataItem::Value(IrType::Long, Value::long(0)),
    };
    vec![
      DataItem::Value(IrType::Long, Value::long(length)),
      DataItem::Value(IrType::Long, Value::long(length)),
      data,
    ]
  }

  /// Static data items for a `strdata` string plus its header.
  pub(crate) fn gen_string_items(
    &mut self,
    s: &str,
  ) -> Vec<DataItem> {
    let data = self.gen_string_data(s);
    Self::header_items(s.len() as u64, data)
  }

  /// Append the static representation of a constant expression to `items`.
  pub(crate) fn gen_data_items(
    &mut self,
    expr: ExprId,
    items: &mut Vec<DataItem>,
  ) -> GenResult<()> {
    let expr = self.expr(expr);
    let ExprKind::Constant(value) = &expr.kind else {
      return Err(GenError::invariant(format!(
        "static initializer is a {} expression",
        expr.kind.name()
      )));
    };
    let ty = expr.result;
    let store = self.store;

    match (&store.dealiased(ty).kind, value) {
      (_, ConstantValue::Void) => {},
      (_, ConstantValue::Address { object, offset }) => {
        items.push(DataItem::SymOffset {
          sym: self.object_symbol(*object),
          offset: *offset,
        });
      },
      (TypeKind::String, ConstantValue::String(s)) => {
        items.extend(self.gen_string_items(s));
      },
      (TypeKind::Array(array), ConstantValue::Array(elems)) => {
        if array.length.is_some_and(|len| len != elems.len() as u64) {
          return Err(GenError::invariant(format!(
            "array constant has {} items for {}",
            elems.len(),
            store.format(ty)
          )));
        }
        for elem in elems {
          self.gen_data_items(*elem, items)?;
        }
      },
      (TypeKind::Slice(_), ConstantValue::Array(elems)) => {
        let mut members = Vec::new();
        for elem in elems {
          self.gen_data_items(*elem, &mut members)?;
        }
        let data = if elems.is_empty() {
          None
        } else {
          let name = self.gen_name("sldata.");
          self.push_def(Definition::Data(Data::new(name.clone(), members)));
          Some(name)
        };
        items.extend(Self::header_items(elems.len() as u64, data));
      },
      (TypeKind::Struct(s), ConstantValue::Struct(values)) => {
        let mut placed: Vec<(u64, u64, ExprId)> = Vec::with_capacity(values.len());
        for value in values {
          let field = s.fields.iter().find(|f| f.name == value.name).ok_or_else(|| {
            GenError::invariant(format!("{} has no field `{}`", store.format(ty), value.name))
          })?;
          placed.push((field.offset, self.size_of(field.ty), value.value));
        }
        placed.sort_by_key(|(offset, _, _)| *offset);

        let mut cursor = 0;
        for (offset, size, value) in placed {
          if offset > cursor {
            items.push(DataItem::Zeroed(offset - cursor));
          }
          self.gen_data_items(value, items)?;
          cursor = offset + size;
        }
        let size = store.dealiased(ty).size;
        if size > cursor {
          items.push(DataItem::Zeroed(size - cursor));
        }
      },
      (TypeKind::Enum(_) | TypeKind::Tagged(_), _) => {
        return Err(GenError::unimplemented(
          format!("static data of type {}", store.format(ty)),
          Some(expr.loc.clone()),
        ));
      },
      (_, scalar) if !store.is_aggregate(ty) => {
        let class = match store_for_type(store, ty)? {
          StoreKind::Byte => IrType::Byte,
          StoreKind::Half => IrType::Half,
          StoreKind::Word => IrType::Word,
          StoreKind::Long => IrType::Long,
          StoreKind::Single => IrType::Single,
          StoreKind::Double => IrType::Double,
        };
        let value = self.scalar_const(ty, scalar)?;
        items.push(DataItem::Value(class, Value::Const(value)));
      },
      _ => {
        return Err(GenError::unsupported_type("static data", store.format(ty)));
      },
    }
    Ok(())
  }
}
