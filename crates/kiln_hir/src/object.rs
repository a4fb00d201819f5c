use kiln_type::{Id, Identifier, Store, TypeId};

pub type ObjectId = Id<ScopeObject>;
pub type ObjectStore = Store<ScopeObject>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
  /// A local binding or function parameter.
  Bind,
  /// A program-level declaration (function or global).
  Decl,
  Const,
  Type,
}

/// A declared name as resolved by the checker.
///
/// Expressions refer to objects by [`ObjectId`], so two bindings with the same
/// name in nested scopes are always distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeObject {
  pub ident: Identifier,
  pub kind: ObjectKind,
  pub ty: TypeId,
}
