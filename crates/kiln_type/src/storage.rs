/// Storage kind of a type: how values of the type are represented in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Storage {
  // Builtins
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

  // Compound
  Alias,
  Array,
  Enum,
  Function,
  Pointer,
  Slice,
  Struct,
  Tagged,
  Tuple,
  Union,
}

impl Storage {
  /// Builtin storages, in the order they are seeded into every [`crate::TypeStore`].
  pub const BUILTINS: [Storage; 20] = [
    Storage::Bool,
    Storage::Char,
    Storage::F32,
    Storage::F64,
    Storage::I8,
    Storage::I16,
    Storage::I32,
    Storage::I64,
    Storage::Int,
    Storage::Null,
    Storage::Rune,
    Storage::Size,
    Storage::String,
    Storage::U8,
    Storage::U16,
    Storage::U32,
    Storage::U64,
    Storage::Uint,
    Storage::Uintptr,
    Storage::Void,
  ];

  /// Position of a builtin storage in [`Storage::BUILTINS`].
  pub fn builtin_index(self) -> Option<usize> {
    Self::BUILTINS.iter().position(|s| *s == self)
  }

  pub fn is_builtin(self) -> bool {
    self.builtin_index().is_some()
  }

  pub fn is_integer(self) -> bool {
    matches!(
      self,
      Storage::Char
        | Storage::I8
        | Storage::I16
        | Storage::I32
        | Storage::I64
        | Storage::Int
        | Storage::Size
        | Storage::U8
        | Storage::U16
        | Storage::U32
        | Storage::U64
        | Storage::Uint
        | Storage::Uintptr
    )
  }

  pub fn is_signed(self) -> bool {
    matches!(
      self,
      Storage::I8 | Storage::I16 | Storage::I32 | Storage::I64 | Storage::Int | Storage::F32 | Storage::F64
    )
  }

  pub fn is_float(self) -> bool {
    matches!(self, Storage::F32 | Storage::F64)
  }

  /// Size and alignment of a builtin on the 64-bit target, `None` for compound storages.
  pub fn builtin_layout(self) -> Option<(u64, u64)> {
    let layout = match self {
      Storage::Bool | Storage::Char | Storage::I8 | Storage::U8 => (1, 1),
      Storage::I16 | Storage::U16 => (2, 2),
      Storage::I32 | Storage::U32 | Storage::Int | Storage::Uint | Storage::Rune | Storage::F32 => (4, 4),
      Storage::I64 | Storage::U64 | Storage::Size | Storage::Uintptr | Storage::F64 | Storage::Null => (8, 8),
      Storage::String => (3 * crate::layout::WORD_SIZE, crate::layout::WORD_SIZE),
      Storage::Void => (0, 1),
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
    Some(layout)
  }

  pub fn name(self) -> &'static str {
    match self {
      Storage::Bool => "bool",
      Storage::Char => "char",
      Storage::F32 => "f32",
      Storage::F64 => "f64",
      Storage::I8 => "i8",
      Storage::I16 => "i16",
      Storage::I32 => "i32",
      Storage::I64 => "i64",
      Storage::Int => "int",
      Storage::Null => "null",
      Storage::Rune => "rune",
      Storage::Size => "size",
      Storage::String => "str",
      Storage::U8 => "u8",
      Storage::U16 => "u16",
      Storage::U32 => "u32",
      Storage::U64 => "u64",
      Storage::Uint => "uint",
      Storage::Uintptr => "uintptr",
      Storage::Void => "void",
      Storage::Alias => "alias",
      Storage::Array => "array",
      Storage::Enum => "enum",
      Storage::Function => "function",
      Storage::Pointer => "pointer",
      Storage::Slice => "slice",
      Storage::Struct => "struct",
      Storage::Tagged => "tagged union",
      Storage::Tuple => "tuple",
      Storage::Union => "union",
    }
  }
}

impl std::fmt::Display for Storage {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.write_str(self.name())
  }
}
