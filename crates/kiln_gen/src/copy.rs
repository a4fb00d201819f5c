//! Loads, stores and object copies.

use kiln_ir::{Instr, IrType, LoadKind, Op, StoreKind, Value};
use kiln_log::log_trc;
use kiln_type::{Storage, TypeId};

use crate::{
  GenContext, GenError, GenResult, GenValue,
  qtype::{alloc_for_align, load_for_type, store_for_type},
};

/// Objects larger than this many bytes are copied with `memcpy` instead of an
/// unrolled load/store sequence.
pub const COPY_UNROLL_THRESHOLD: u64 = 128;

impl GenContext<'_> {
  /// Reserve a stack slot for an object of type `ty`. The allocation goes to
  /// the function prelude; the returned value is its address.
  pub(crate) fn alloc_slot(
    &mut self,
    prefix: &str,
    ty: TypeId,
  ) -> GenResult<GenValue> {
    let layout = self.store.dealiased(ty).layout();
    if !layout.is_sized() {
      return Err(GenError::unsupported_type("stack allocation", self.store.format(ty)));
    }

    let slot = self.address_temp(prefix, ty)?;
    let instr = Instr::new(
      Some(slot.operand()?),
      alloc_for_align(layout.align),
      vec![Value::long(layout.size)],
    );
    self.emit_prelude(instr)?;
    Ok(slot)
  }

  /// Read the value of the object at `object`.
  ///
  /// Aggregates are represented by their address, so for them this returns
  /// `object` unchanged.
  pub(crate) fn gen_load(
    &mut self,
    object: GenValue,
  ) -> GenResult<GenValue> {
    match self.store.storage(object.ty) {
      Storage::Array
      | Storage::Function
      | Storage::Slice
      | Storage::String
      | Storage::Struct
      | Storage::Tagged
      | Storage::Tuple
      | Storage::Union => Ok(object),
      Storage::Void => Ok(GenValue::void(object.ty)),
      Storage::Enum => Err(GenError::unimplemented("load of an enum value", None)),
      _ => {
        let load = load_for_type(self.store, object.ty)?;
        let value = self.value_temp("load.", object.ty)?;
        self.emit(Some(value.operand()?), Op::Load(load), vec![object.operand()?])?;
        Ok(value)
      },
    }
  }

  /// Write `value` into the object at `object`.
  pub(crate) fn gen_store(
    &mut self,
    object: GenValue,
    value: GenValue,
  ) -> GenResult<()> {
    match self.store.storage(object.ty) {
      Storage::Array | Storage::Slice | Storage::String | Storage::Struct | Storage::Tuple => {
        self.gen_copy_aligned(object, value)
      },
      Storage::Union => self.gen_copy_memcpy(object, value),
      Storage::Void => Ok(()),
      Storage::Tagged => Err(GenError::unimplemented("store of a tagged union", None)),
      Storage::Enum => Err(GenError::unimplemented("store of an enum value", None)),
      Storage::Function => Err(GenError::invariant("store to a function")),
      _ => {
        let store = store_for_type(self.store, object.ty)?;
        self.emit(None, Op::Store(store), vec![value.operand()?, object.operand()?])
      },
    }
  }

  /// Copy `size(dest)` bytes from `src` to `dest`, one alignment unit at a
  /// time, falling back to `memcpy` above [`COPY_UNROLL_THRESHOLD`].
  pub(crate) fn gen_copy_aligned(
    &mut self,
    dest: GenValue,
    src: GenValue,
  ) -> GenResult<()> {
    let layout = self.store.dealiased(dest.ty).layout();
    if layout.size > COPY_UNROLL_THRESHOLD {
      return self.gen_copy_memcpy(dest, src);
    }

    let (load, store, class) = match layout.align {
      1 => (LoadKind::UnsignedByte, StoreKind::Byte, IrType::Word),
      2 => (LoadKind::UnsignedHalf, StoreKind::Half, IrType::Word),
      4 => (LoadKind::UnsignedWord, StoreKind::Word, IrType::Word),
      8 => (LoadKind::Long, StoreKind::Long, IrType::Long),
      align => {
        return Err(GenError::invariant(format!(
          "cannot copy {} with alignment {}",
          self.store.format(dest.ty),
          align
        )));
      },
    };
    log_trc!(self.config, "unrolled copy of {} bytes", layout.size);

    let destp = Value::Temp(self.new_temp(".", IrType::Long)?);
    let srcp = Value::Temp(self.new_temp(".", IrType::Long)?);
    let temp = Value::Temp(self.new_temp(".", class)?);
    self.emit(Some(destp.clone()), Op::Copy, vec![dest.operand()?])?;
    self.emit(Some(srcp.clone()), Op::Copy, vec![src.operand()?])?;

    let step = layout.align;
    let mut offset = 0;
    while offset < layout.size {
      self.emit(Some(temp.clone()), Op::Load(load), vec![srcp.clone()])?;
      self.emit(None, Op::Store(store), vec![temp.clone(), destp.clone()])?;
      offset += step;
      if offset < layout.size {
        self.emit(Some(destp.clone()), Op::Add, vec![destp.clone(), Value::long(step)])?;
        self.emit(Some(srcp.clone()), Op::Add, vec![srcp.clone(), Value::long(step)])?;
      }
    }
    Ok(())
  }

  pub(crate) fn gen_copy_memcpy(
    &mut self,
    dest: GenValue,
    src: GenValue,
  ) -> GenResult<()> {
    let size = self.size_of(dest.ty);
    log_trc!(self.config, "memcpy of {} bytes", size);
    let memcpy = self.runtime("memcpy");
    self.emit(None, Op::Call, vec![memcpy, dest.operand()?, src.operand()?, Value::long(size)])
  }

  /// Zero every byte of the object at `object`.
  pub(crate) fn gen_zero_fill(
    &mut self,
    object: &GenValue,
  ) -> GenResult<()> {
    let size = self.size_of(object.ty);
    let memset = self.runtime("memset");
    self.emit(None, Op::Call, vec![memset, object.operand()?, Value::long(0), Value::long(size)])
  }
}
