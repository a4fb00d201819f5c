use std::collections::HashMap;

use bitflags::bitflags;

use crate::{
  Id, Identifier, Store,
  layout::{self, Layout, WORD_SIZE},
  storage::Storage,
};

pub type TypeId = Id<Type>;

bitflags! {
  /// Qualifiers carried by every type.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct TypeFlags: u8 {
    const CONST = 1 << 0;
  }
}

bitflags! {
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct PointerFlags: u8 {
    const NULLABLE = 1 << 0;
  }
}

bitflags! {
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct FunctionFlags: u8 {
    const NORETURN = 1 << 0;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variadism {
  #[default]
  None,
  /// C-style `...`, passed through the platform varargs convention.
  C,
  /// Trailing arguments collected into a slice.
  Slice,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
  pub name: String,
  pub ty: TypeId,
  pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
  pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleValue {
  pub ty: TypeId,
  pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasType {
  pub ident: Identifier,
  pub secondary: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
  pub members: TypeId,
  /// `None` for unbounded arrays (`[*]T`).
  pub length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
  pub ident: Identifier,
  pub storage: Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
  pub result: TypeId,
  pub params: Vec<TypeId>,
  pub variadism: Variadism,
  pub flags: FunctionFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointerType {
  pub referent: TypeId,
  pub flags: PointerFlags,
}

/// Kind-specific payload of a type. One variant per [`Storage`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
  Bool,
  Char,
  F32,
  F64,
  I8,
  I16,
  I32,
  I64,
  Int,
  Null,
  Rune,
  Size,
  String,
  U8,
  U16,
  U32,
  U64,
  Uint,
  Uintptr,
  Void,

  Alias(AliasType),
  Array(ArrayType),
  Enum(EnumType),
  Function(FunctionType),
  Pointer(PointerType),
  Slice(TypeId),
  Struct(StructType),
  /// Members are flattened, sorted by identity and de-duplicated.
  Tagged(Vec<TypeId>),
  Tuple(Vec<TupleValue>),
  Union(StructType),
}

impl TypeKind {
  pub fn storage(&self) -> Storage {
    match self {
      TypeKind::Bool => Storage::Bool,
      TypeKind::Char => Storage::Char,
      TypeKind::F32 => Storage::F32,
      TypeKind::F64 => Storage::F64,
      TypeKind::I8 => Storage::I8,
      TypeKind::I16 => Storage::I16,
      TypeKind::I32 => Storage::I32,
      TypeKind::I64 => Storage::I64,
      TypeKind::Int => Storage::Int,
      TypeKind::Null => Storage::Null,
      TypeKind::Rune => Storage::Rune,
      TypeKind::Size => Storage::Size,
      TypeKind::String => Storage::String,
      TypeKind::U8 => Storage::U8,
      TypeKind::U16 => Storage::U16,
      TypeKind::U32 => Storage::U32,
      TypeKind::U64 => Storage::U64,
      TypeKind::Uint => Storage::Uint,
      TypeKind::Uintptr => Storage::Uintptr,
      TypeKind::Void => Storage::Void,
      TypeKind::Alias(_) => Storage::Alias,
      TypeKind::Array(_) => Storage::Array,
      TypeKind::Enum(_) => Storage::Enum,
      TypeKind::Function(_) => Storage::Function,
      TypeKind::Pointer(_) => Storage::Pointer,
      TypeKind::Slice(_) => Storage::Slice,
      TypeKind::Struct(_) => Storage::Struct,
      TypeKind::Tagged(_) => Storage::Tagged,
      TypeKind::Tuple(_) => Storage::Tuple,
      TypeKind::Union(_) => Storage::Union,
    }
  }

  pub fn builtin(storage: Storage) -> Option<TypeKind> {
    let kind = match storage {
      Storage::Bool => TypeKind::Bool,
      Storage::Char => TypeKind::Char,
      Storage::F32 => TypeKind::F32,
      Storage::F64 => TypeKind::F64,
      Storage::I8 => TypeKind::I8,
      Storage::I16 => TypeKind::I16,
      Storage::I32 => TypeKind::I32,
      Storage::I64 => TypeKind::I64,
      Storage::Int => TypeKind::Int,
      Storage::Null => TypeKind::Null,
      Storage::Rune => TypeKind::Rune,
      Storage::Size => TypeKind::Size,
      Storage::String => TypeKind::String,
      Storage::U8 => TypeKind::U8,
      Storage::U16 => TypeKind::U16,
      Storage::U32 => TypeKind::U32,
      Storage::U64 => TypeKind::U64,
      Storage::Uint => TypeKind::Uint,
      Storage::Uintptr => TypeKind::Uintptr,
      Storage::Void => TypeKind::Void,
      Storage::Alias
      | Storage::Array
      | Storage::Enum
      | Storage::Function
      | Storage::Pointer
      | Storage::Slice
      | Storage::Struct
      | Storage::Tagged
      | Storage::Tuple
      | Storage::Union => return None,
    };
    Some(kind)
  }
}

/// A canonical type record. Only [`TypeStore`] creates these; size and
/// alignment are fixed when the record is interned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
  pub kind: TypeKind,
  pub flags: TypeFlags,
  pub size: u64,
  pub align: u64,
}

impl Type {
  #[inline]
  pub fn storage(&self) -> Storage {
    self.kind.storage()
  }

  #[inline]
  pub fn is_const(&self) -> bool {
    self.flags.contains(TypeFlags::CONST)
  }

  #[inline]
  pub fn layout(&self) -> Layout {
    Layout::new(self.size, self.align)
  }

  #[inline]
  pub fn is_sized(&self) -> bool {
    self.layout().is_sized()
  }
}

/// Hash-consing registry of every type in a compilation session.
///
/// Structurally equal requests always return the same [`TypeId`], so handle
/// equality is type equality.
#[derive(Debug, Clone)]
pub struct TypeStore {
  types: Store<Type>,
  interned: HashMap<(TypeKind, TypeFlags), TypeId>,
}

impl TypeStore {
  pub fn new() -> Self {
    let mut store = Self {
      types: Store::new(),
      interned: HashMap::new(),
    };
    store.init_builtins();
    store
  }

  fn init_builtins(&mut self) {
    // Seeded pairwise so `builtin` can find a handle arithmetically.
    for storage in Storage::BUILTINS {
      let (Some(kind), Some((size, align))) = (TypeKind::builtin(storage), storage.builtin_layout()) else {
        continue;
      };
      for flags in [TypeFlags::empty(), TypeFlags::CONST] {
        let id = self.types.alloc(Type {
          kind: kind.clone(),
          flags,
          size,
          align,
        });
        self.interned.insert((kind.clone(), flags), id);
      }
    }
  }

  /// Pre-seeded builtin type, without hashing. `None` for compound storages.
  pub fn builtin(
    &self,
    storage: Storage,
    is_const: bool,
  ) -> Option<TypeId> {
    let index = storage.builtin_index()?;
    Some(TypeId::new((index * 2 + usize::from(is_const)) as u32))
  }

  fn builtin_or_panic(
    &self,
    storage: Storage,
  ) -> TypeId {
    match self.builtin(storage, false) {
      Some(id) => id,
      None => unreachable!("{} is not a builtin storage", storage),
    }
  }

  #[inline]
  pub fn get(
    &self,
    id: &TypeId,
  ) -> &Type {
    self.types.get(id)
  }

  pub fn len(&self) -> usize {
    self.types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.types.is_empty()
  }

  fn intern(
    &mut self,
    kind: TypeKind,
    flags: TypeFlags,
    layout: Layout,
  ) -> TypeId {
    if let Some(&id) = self.interned.get(&(kind.clone(), flags)) {
      return id;
    }
    let id = self.types.alloc(Type {
      kind: kind.clone(),
      flags,
      size: layout.size,
      align: layout.align,
    });
    self.interned.insert((kind, flags), id);
    id
  }

  fn layout_of(
    &self,
    id: TypeId,
  ) -> Layout {
    self.get(&id).layout()
  }

  // === Constructors ===

  pub fn lookup_pointer(
    &mut self,
    referent: TypeId,
    flags: PointerFlags,
  ) -> TypeId {
    self.intern(
      TypeKind::Pointer(PointerType { referent, flags }),
      TypeFlags::empty(),
      Layout::new(WORD_SIZE, WORD_SIZE),
    )
  }

  pub fn lookup_array(
    &mut self,
    members: TypeId,
    length: Option<u64>,
  ) -> TypeId {
    let layout = layout::array(self.layout_of(members), length);
    self.intern(
      TypeKind::Array(ArrayType { members, length }),
      TypeFlags::empty(),
      layout,
    )
  }

  pub fn lookup_slice(
    &mut self,
    members: TypeId,
  ) -> TypeId {
    self.intern(
      TypeKind::Slice(members),
      TypeFlags::empty(),
      Layout::new(3 * WORD_SIZE, WORD_SIZE),
    )
  }

  pub fn lookup_alias(
    &mut self,
    ident: Identifier,
    secondary: TypeId,
  ) -> TypeId {
    let layout = self.layout_of(secondary);
    self.intern(
      TypeKind::Alias(AliasType { ident, secondary }),
      TypeFlags::empty(),
      layout,
    )
  }

  /// Tagged union over `members`. Nested tagged unions are flattened and the
  /// member set is ordered and de-duplicated before interning.
  pub fn lookup_tagged(
    &mut self,
    members: Vec<TypeId>,
  ) -> TypeId {
    let mut flat = Vec::with_capacity(members.len());
    for member in members {
      match &self.get(&member).kind {
        TypeKind::Tagged(nested) => flat.extend(nested.iter().copied()),
        _ => flat.push(member),
      }
    }
    flat.sort();
    flat.dedup();

    let layouts: Vec<Layout> = flat.iter().map(|m| self.layout_of(*m)).collect();
    self.intern(TypeKind::Tagged(flat), TypeFlags::empty(), layout::tagged(&layouts))
  }

  pub fn lookup_tuple(
    &mut self,
    values: Vec<TypeId>,
  ) -> TypeId {
    let layouts: Vec<Layout> = values.iter().map(|v| self.layout_of(*v)).collect();
    let (layout, offsets) = layout::sequential(&layouts);
    let values = values
      .into_iter()
      .zip(offsets)
      .map(|(ty, offset)| TupleValue { ty, offset })
      .collect();
    self.intern(TypeKind::Tuple(values), TypeFlags::empty(), layout)
  }

  /// Struct with fields in declaration order.
  pub fn lookup_struct(
    &mut self,
    fields: Vec<(String, TypeId)>,
  ) -> TypeId {
    let layouts: Vec<Layout> = fields.iter().map(|(_, ty)| self.layout_of(*ty)).collect();
    let (layout, offsets) = layout::sequential(&layouts);
    let fields = fields
      .into_iter()
      .zip(offsets)
      .map(|((name, ty), offset)| StructField { name, ty, offset })
      .collect();
    self.intern(TypeKind::Struct(StructType { fields }), TypeFlags::empty(), layout)
  }

  pub fn lookup_union(
    &mut self,
    fields: Vec<(String, TypeId)>,
  ) -> TypeId {
    let layouts: Vec<Layout> = fields.iter().map(|(_, ty)| self.layout_of(*ty)).collect();
    let layout = layout::overlapping(&layouts);
    let fields = fields
      .into_iter()
      .map(|(name, ty)| StructField { name, ty, offset: 0 })
      .collect();
    self.intern(TypeKind::Union(StructType { fields }), TypeFlags::empty(), layout)
  }

  pub fn lookup_function(
    &mut self,
    func: FunctionType,
  ) -> TypeId {
    self.intern(TypeKind::Function(func), TypeFlags::empty(), Layout::UNDEFINED)
  }

  pub fn lookup_enum(
    &mut self,
    ident: Identifier,
    storage: Storage,
  ) -> TypeId {
    debug_assert!(storage.is_integer() || storage == Storage::Rune, "enum over {}", storage);
    let (size, align) = storage.builtin_layout().unwrap_or((WORD_SIZE, WORD_SIZE));
    self.intern(
      TypeKind::Enum(EnumType { ident, storage }),
      TypeFlags::empty(),
      Layout::new(size, align),
    )
  }

  /// The same type re-tagged with different qualifier flags.
  pub fn lookup_with_flags(
    &mut self,
    id: TypeId,
    flags: TypeFlags,
  ) -> TypeId {
    let ty = self.get(&id);
    if ty.flags == flags {
      return id;
    }
    if ty.storage().is_builtin() {
      return self
        .builtin(ty.storage(), flags.contains(TypeFlags::CONST))
        .unwrap_or(id);
    }
    let kind = ty.kind.clone();
    let layout = ty.layout();
    self.intern(kind, flags, layout)
  }

  // === Queries ===

  /// Follow aliases down to the first non-alias type.
  pub fn dealias(
    &self,
    mut id: TypeId,
  ) -> TypeId {
    while let TypeKind::Alias(alias) = &self.get(&id).kind {
      id = alias.secondary;
    }
    id
  }

  #[inline]
  pub fn dealiased(
    &self,
    id: TypeId,
  ) -> &Type {
    self.get(&self.dealias(id))
  }

  /// Storage kind after dealiasing; what every dispatch site should match on.
  #[inline]
  pub fn storage(
    &self,
    id: TypeId,
  ) -> Storage {
    self.dealiased(id).storage()
  }

  /// Values of aggregate types are handled by address rather than in registers.
  pub fn is_aggregate(
    &self,
    id: TypeId,
  ) -> bool {
    matches!(
      self.storage(id),
      Storage::Array
        | Storage::Function
        | Storage::Slice
        | Storage::String
        | Storage::Struct
        | Storage::Tagged
        | Storage::Tuple
        | Storage::Union
    )
  }

  /// Storage used to represent values: enums collapse to their underlying integer.
  pub fn value_storage(
    &self,
    id: TypeId,
  ) -> Storage {
    match &self.dealiased(id).kind {
      TypeKind::Enum(e) => e.storage,
      kind => kind.storage(),
    }
  }

  pub fn is_signed(
    &self,
    id: TypeId,
  ) -> bool {
    self.value_storage(id).is_signed()
  }

  pub fn is_integer(
    &self,
    id: TypeId,
  ) -> bool {
    self.value_storage(id).is_integer()
  }

  pub fn is_float(
    &self,
    id: TypeId,
  ) -> bool {
    self.value_storage(id).is_float()
  }

  pub fn is_void(
    &self,
    id: TypeId,
  ) -> bool {
    self.storage(id) == Storage::Void
  }

  pub fn referent(
    &self,
    id: TypeId,
  ) -> Option<TypeId> {
    match &self.dealiased(id).kind {
      TypeKind::Pointer(p) => Some(p.referent),
      _ => None,
    }
  }

  pub fn function(
    &self,
    id: TypeId,
  ) -> Option<&FunctionType> {
    match &self.dealiased(id).kind {
      TypeKind::Function(f) => Some(f),
      _ => None,
    }
  }

  /// Field of a struct or union, looked up by name.
  pub fn field(
    &self,
    id: TypeId,
    name: &str,
  ) -> Option<&StructField> {
    match &self.dealiased(id).kind {
      TypeKind::Struct(s) | TypeKind::Union(s) => s.fields.iter().find(|f| f.name == name),
      _ => None,
    }
  }

  pub fn tuple_value(
    &self,
    id: TypeId,
    index: usize,
  ) -> Option<&TupleValue> {
    match &self.dealiased(id).kind {
      TypeKind::Tuple(values) => values.get(index),
      _ => None,
    }
  }

  /// Element type of an array or slice.
  pub fn members(
    &self,
    id: TypeId,
  ) -> Option<TypeId> {
    match &self.dealiased(id).kind {
      TypeKind::Array(a) => Some(a.members),
      TypeKind::Slice(members) => Some(*members),
      _ => None,
    }
  }

  /// Render a type in source syntax, for dumps and diagnostics.
  pub fn format(
    &self,
    id: TypeId,
  ) -> String {
    let ty = self.get(&id);
    let prefix = if ty.is_const() { "const " } else { "" };
    let body = match &ty.kind {
      TypeKind::Alias(alias) => alias.ident.to_string(),
      TypeKind::Enum(e) => e.ident.to_string(),
      TypeKind::Array(a) => match a.length {
        Some(len) => format!("[{}]{}", len, self.format(a.members)),
        None => format!("[*]{}", self.format(a.members)),
      },
      TypeKind::Slice(members) => format!("[]{}", self.format(*members)),
      TypeKind::Pointer(p) => {
        let nullable = if p.flags.contains(PointerFlags::NULLABLE) {
          "nullable "
        } else {
          ""
        };
        format!("{}*{}", nullable, self.format(p.referent))
      },
      TypeKind::Struct(s) => format!("struct {{ {} }}", self.format_fields(s)),
      TypeKind::Union(s) => format!("union {{ {} }}", self.format_fields(s)),
      TypeKind::Tagged(members) => {
        let members: Vec<String> = members.iter().map(|m| self.format(*m)).collect();
        format!("({})", members.join(" | "))
      },
      TypeKind::Tuple(values) => {
        let values: Vec<String> = values.iter().map(|v| self.format(v.ty)).collect();
        format!("({})", values.join(", "))
      },
      TypeKind::Function(f) => {
        let mut params: Vec<String> = f.params.iter().map(|p| self.format(*p)).collect();
        match f.variadism {
          Variadism::None => {},
          Variadism::C => params.push("...".to_string()),
          Variadism::Slice => {
            if let Some(last) = params.last_mut() {
              last.push_str("...");
            }
          },
        }
        let noreturn = if f.flags.contains(FunctionFlags::NORETURN) {
          "@noreturn "
        } else {
          ""
        };
        format!("{}fn({}) {}", noreturn, params.join(", "), self.format(f.result))
      },
      kind => kind.storage().name().to_string(),
    };
    format!("{}{}", prefix, body)
  }

  fn format_fields(
    &self,
    s: &StructType,
  ) -> String {
    s.fields
      .iter()
      .map(|f| format!("{}: {}", f.name, self.format(f.ty)))
      .collect::<Vec<_>>()
      .join(", ")
  }

  // === Builtin shortcuts ===

  #[inline]
  pub fn bool(&self) -> TypeId {
    self.builtin_or_panic(Storage::Bool)
  }
  #[inline]
  pub fn char(&self) -> TypeId {
    self.builtin_or_panic(Storage::Char)
  }
  #[inline]
  pub fn f32(&self) -> TypeId {
    self.builtin_or_panic(Storage::F32)
  }
  #[inline]
  pub fn f64(&self) -> TypeId {
    self.builtin_or_panic(Storage::F64)
  }
  #[inline]
  pub fn i8(&self) -> TypeId {
    self.builtin_or_panic(Storage::I8)
  }
  #[inline]
  pub fn i16(&self) -> TypeId {
    self.builtin_or_panic(Storage::I16)
  }
  #[inline]
  pub fn i32(&self) -> TypeId {
    self.builtin_or_panic(Storage::I32)
  }
  #[inline]
  pub fn i64(&self) -> TypeId {
    self.builtin_or_panic(Storage::I64)
  }
  #[inline]
  pub fn int(&self) -> TypeId {
    self.builtin_or_panic(Storage::Int)
  }
  #[inline]
  pub fn null(&self) -> TypeId {
    self.builtin_or_panic(Storage::Null)
  }
  #[inline]
  pub fn rune(&self) -> TypeId {
    self.builtin_or_panic(Storage::Rune)
  }
  #[inline]
  pub fn size(&self) -> TypeId {
    self.builtin_or_panic(Storage::Size)
  }
  #[inline]
  pub fn str(&self) -> TypeId {
    self.builtin_or_panic(Storage::String)
  }
  #[inline]
  pub fn const_str(&self) -> TypeId {
    self.builtin(Storage::String, true).unwrap_or_else(|| self.str())
  }
  #[inline]
  pub fn u8(&self) -> TypeId {
    self.builtin_or_panic(Storage::U8)
  }
  #[inline]
  pub fn u16(&self) -> TypeId {
    self.builtin_or_panic(Storage::U16)
  }
  #[inline]
  pub fn u32(&self) -> TypeId {
    self.builtin_or_panic(Storage::U32)
  }
  #[inline]
  pub fn u64(&self) -> TypeId {
    self.builtin_or_panic(Storage::U64)
  }
  #[inline]
  pub fn uint(&self) -> TypeId {
    self.builtin_or_panic(Storage::Uint)
  }
  #[inline]
  pub fn uintptr(&self) -> TypeId {
    self.builtin_or_panic(Storage::Uintptr)
  }
  #[inline]
  pub fn void(&self) -> TypeId {
    self.builtin_or_panic(Storage::Void)
  }
}

impl Default for TypeStore {
  fn default() -> Self {
    Self::new()
  }
}
