//! Mapping from source types to IR classes and memory operations.

use kiln_hir::BinaryOperation;
use kiln_ir::{Comparison, ExtKind, IrType, LoadKind, Op, StoreKind};
use kiln_type::{Storage, TypeId, TypeStore};

use crate::{GenError, GenResult};

/// Class of the register holding a value of type `ty`.
///
/// Sub-word integers live in `w` registers; aggregates and functions are
/// represented by their address.
pub fn qtype(
  store: &TypeStore,
  ty: TypeId,
) -> IrType {
  match store.value_storage(ty) {
    Storage::Bool
    | Storage::Char
    | Storage::I8
    | Storage::U8
    | Storage::I16
    | Storage::U16
    | Storage::I32
    | Storage::U32
    | Storage::Int
    | Storage::Uint
    | Storage::Rune => IrType::Word,
    Storage::I64 | Storage::U64 | Storage::Size | Storage::Uintptr | Storage::Null | Storage::Pointer => IrType::Long,
    Storage::F32 => IrType::Single,
    Storage::F64 => IrType::Double,
    Storage::Void => IrType::Void,
    Storage::Alias
    | Storage::Array
    | Storage::Enum
    | Storage::Function
    | Storage::Slice
    | Storage::String
    | Storage::Struct
    | Storage::Tagged
    | Storage::Tuple
    | Storage::Union => IrType::Long,
  }
}

/// Load instruction reading a scalar of type `ty` at full width.
pub fn load_for_type(
  store: &TypeStore,
  ty: TypeId,
) -> GenResult<LoadKind> {
  let signed = store.is_signed(ty);
  match (store.value_storage(ty), store.dealiased(ty).size) {
    (Storage::F32, _) => Ok(LoadKind::Single),
    (Storage::F64, _) => Ok(LoadKind::Double),
    (_, 1) if signed => Ok(LoadKind::SignedByte),
    (_, 1) => Ok(LoadKind::UnsignedByte),
    (_, 2) if signed => Ok(LoadKind::SignedHalf),
    (_, 2) => Ok(LoadKind::UnsignedHalf),
    (_, 4) if signed => Ok(LoadKind::SignedWord),
    (_, 4) => Ok(LoadKind::UnsignedWord),
    (_, 8) => Ok(LoadKind::Long),
    _ => Err(GenError::unsupported_type("scalar load", store.format(ty))),
  }
}

/// Store instruction writing exactly `size(ty)` bytes.
pub fn store_for_type(
  store: &TypeStore,
  ty: TypeId,
) -> GenResult<StoreKind> {
  match (store.value_storage(ty), store.dealiased(ty).size) {
    (Storage::F32, _) => Ok(StoreKind::Single),
    (Storage::F64, _) => Ok(StoreKind::Double),
    (_, 1) => Ok(StoreKind::Byte),
    (_, 2) => Ok(StoreKind::Half),
    (_, 4) => Ok(StoreKind::Word),
    (_, 8) => Ok(StoreKind::Long),
    _ => Err(GenError::unsupported_type("scalar store", store.format(ty))),
  }
}

/// Stack allocation instruction for a slot with the given alignment.
pub fn alloc_for_align(align: u64) -> Op {
  match align {
    0..=4 => Op::Alloc4,
    8 => Op::Alloc8,
    _ => Op::Alloc16,
  }
}

/// Sign or zero extension widening a 1 or 2 byte integer to a word.
pub fn extension_for_type(
  store: &TypeStore,
  ty: TypeId,
) -> Option<ExtKind> {
  let signed = store.is_signed(ty);
  match store.dealiased(ty).size {
    1 if signed => Some(ExtKind::SignedByte),
    1 => Some(ExtKind::UnsignedByte),
    2 if signed => Some(ExtKind::SignedHalf),
    2 => Some(ExtKind::UnsignedHalf),
    _ => None,
  }
}

/// Instruction computing `op` on two operands of type `ty`.
pub fn binarithm_for_op(
  store: &TypeStore,
  op: BinaryOperation,
  ty: TypeId,
) -> GenResult<Op> {
  let class = qtype(store, ty);
  let float = class.is_float();
  let signed = store.is_signed(ty);

  let pick = |float_cmp: Comparison, signed_cmp: Comparison, unsigned_cmp: Comparison| {
    if float {
      float_cmp
    } else if signed {
      signed_cmp
    } else {
      unsigned_cmp
    }
  };

  let op = match op {
    BinaryOperation::Add => Op::Add,
    BinaryOperation::Sub => Op::Sub,
    BinaryOperation::Mul => Op::Mul,
    BinaryOperation::Div if float || signed => Op::Div,
    BinaryOperation::Div => Op::Udiv,
    BinaryOperation::Mod if float => {
      return Err(GenError::unsupported_type("remainder", store.format(ty)));
    },
    BinaryOperation::Mod if signed => Op::Rem,
    BinaryOperation::Mod => Op::Urem,
    BinaryOperation::BitAnd => Op::And,
    BinaryOperation::BitOr => Op::Or,
    BinaryOperation::BitXor | BinaryOperation::Xor => Op::Xor,
    BinaryOperation::Shl => Op::Shl,
    BinaryOperation::Shr if signed => Op::Sar,
    BinaryOperation::Shr => Op::Shr,
    BinaryOperation::Equal => Op::Cmp(Comparison::Eq, class),
    BinaryOperation::NotEqual => Op::Cmp(Comparison::Ne, class),
    BinaryOperation::Less => Op::Cmp(pick(Comparison::Lt, Comparison::Slt, Comparison::Ult), class),
    BinaryOperation::LessEqual => Op::Cmp(pick(Comparison::Le, Comparison::Sle, Comparison::Ule), class),
    BinaryOperation::Greater => Op::Cmp(pick(Comparison::Gt, Comparison::Sgt, Comparison::Ugt), class),
    BinaryOperation::GreaterEqual => Op::Cmp(pick(Comparison::Ge, Comparison::Sge, Comparison::Uge), class),
    BinaryOperation::And | BinaryOperation::Or => {
      return Err(GenError::invariant("short-circuit operator has no single instruction"));
    },
  };

  Ok(op)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sub_word_integers_use_word_class() {
    let store = TypeStore::new();
    assert_eq!(qtype(&store, store.u8()), IrType::Word);
    assert_eq!(qtype(&store, store.bool()), IrType::Word);
    assert_eq!(qtype(&store, store.size()), IrType::Long);
    assert_eq!(qtype(&store, store.str()), IrType::Long);
    assert_eq!(qtype(&store, store.f32()), IrType::Single);
    assert_eq!(qtype(&store, store.void()), IrType::Void);
  }

  #[test]
  fn test_memory_width_follows_size() {
    let mut store = TypeStore::new();
    assert_eq!(load_for_type(&store, store.i8()).unwrap(), LoadKind::SignedByte);
    assert_eq!(load_for_type(&store, store.u16()).unwrap(), LoadKind::UnsignedHalf);
    assert_eq!(load_for_type(&store, store.i32()).unwrap(), LoadKind::SignedWord);
    assert_eq!(load_for_type(&store, store.bool()).unwrap(), LoadKind::UnsignedByte);
    assert_eq!(store_for_type(&store, store.u8()).unwrap(), StoreKind::Byte);
    assert_eq!(store_for_type(&store, store.f64()).unwrap(), StoreKind::Double);

    let i32 = store.i32();
    let ptr = store.lookup_pointer(i32, Default::default());
    assert_eq!(load_for_type(&store, ptr).unwrap(), LoadKind::Long);
    assert!(load_for_type(&store, store.str()).is_err());
  }

  #[test]
  fn test_alloc_for_align() {
    assert_eq!(alloc_for_align(1), Op::Alloc4);
    assert_eq!(alloc_for_align(4), Op::Alloc4);
    assert_eq!(alloc_for_align(8), Op::Alloc8);
    assert_eq!(alloc_for_align(16), Op::Alloc16);
  }

  #[test]
  fn test_signedness_picks_instruction() {
    let store = TypeStore::new();
    assert_eq!(binarithm_for_op(&store, BinaryOperation::Div, store.int()).unwrap(), Op::Div);
    assert_eq!(binarithm_for_op(&store, BinaryOperation::Div, store.uint()).unwrap(), Op::Udiv);
    assert_eq!(binarithm_for_op(&store, BinaryOperation::Shr, store.i64()).unwrap(), Op::Sar);
    assert_eq!(
      binarithm_for_op(&store, BinaryOperation::Less, store.u8()).unwrap(),
      Op::Cmp(Comparison::Ult, IrType::Word)
    );
    assert_eq!(
      binarithm_for_op(&store, BinaryOperation::GreaterEqual, store.f64()).unwrap(),
      Op::Cmp(Comparison::Ge, IrType::Double)
    );
    assert!(binarithm_for_op(&store, BinaryOperation::And, store.bool()).is_err());
  }
}
