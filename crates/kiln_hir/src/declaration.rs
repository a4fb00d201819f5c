use bitflags::bitflags;
use kiln_type::{Identifier, TypeId};

use crate::{ExprId, Location, ObjectId};

bitflags! {
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct FnFlags: u8 {
    /// Runs before `main`, registered in `.init_array`.
    const INIT = 1 << 0;
    /// Runs at exit, registered in `.fini_array`.
    const FINI = 1 << 1;
    /// Unit test entry, registered in `.test_array`.
    const TEST = 1 << 2;
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
  pub ty: TypeId,
  pub params: Vec<ObjectId>,
  /// `None` for prototypes.
  pub body: Option<ExprId>,
  pub flags: FnFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDecl {
  pub ty: TypeId,
  /// Constant initializer, already folded by the checker. `None` for forward declarations.
  pub value: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
  pub ty: TypeId,
  pub value: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
  Function(FunctionDecl),
  Global(GlobalDecl),
  Type(TypeId),
  Const(ConstDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
  pub ident: Identifier,
  /// Explicit linker name (`@symbol("...")`), overriding the mangled identifier.
  pub symbol: Option<String>,
  pub exported: bool,
  pub loc: Location,
  pub kind: DeclKind,
}

impl Declaration {
  /// Name of this declaration in the emitted program.
  pub fn symbol_name(&self) -> String {
    match &self.symbol {
      Some(symbol) => symbol.clone(),
      None => self.ident.to_symbol(),
    }
  }
}
