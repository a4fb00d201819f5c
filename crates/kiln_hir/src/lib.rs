pub mod declaration;
pub mod object;
pub mod operation;

use std::{collections::HashMap, fmt};

use kiln_type::{Id, Identifier, Store, TypeId};

pub use declaration::{ConstDecl, DeclKind, Declaration, FnFlags, FunctionDecl, GlobalDecl};
pub use object::{ObjectId, ObjectKind, ObjectStore, ScopeObject};
pub use operation::{BinaryOperation, UnaryOperation};

pub type ExprId = Id<Expression>;

/// Source position of an expression, reported by runtime aborts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
  pub path: String,
  pub line: u32,
  pub column: u32,
}

impl Location {
  pub fn new(
    path: impl Into<String>,
    line: u32,
    column: u32,
  ) -> Self {
    Self {
      path: path.into(),
      line,
      column,
    }
  }
}

impl fmt::Display for Location {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}:{}:{}", self.path, self.line, self.column)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Access {
  Ident(ObjectId),
  Index { array: ExprId, index: ExprId },
  Field { object: ExprId, field: String },
  /// Tuple element, `t.0`.
  Value { tuple: ExprId, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
  Bool(bool),
  Int(i64),
  Uint(u64),
  Float(f64),
  Rune(u32),
  Null,
  Void,
  String(String),
  /// Address of a program-level object plus a byte offset, folded by the checker.
  Address { object: ObjectId, offset: i64 },
  /// Array constant; every element is itself a constant expression.
  Array(Vec<ExprId>),
  Struct(Vec<FieldValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
  pub name: String,
  pub value: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
  pub object: ObjectId,
  pub initializer: ExprId,
  pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
  /// `x: T`
  Cast,
  /// `x as T`
  Assertion,
  /// `x is T`
  Test,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Measure {
  Len(ExprId),
  Size(TypeId),
  /// `offset(x.f)`; the operand is a field or tuple access.
  Offset(ExprId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
  pub object: Option<ObjectId>,
  pub ty: Option<TypeId>,
  pub value: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
  /// Empty for the default case.
  pub options: Vec<ExprId>,
  pub value: ExprId,
}

/// Payload of a checked expression. One variant per expression form.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
  Access(Access),
  Alloc {
    init: ExprId,
    capacity: Option<ExprId>,
  },
  Append {
    object: ExprId,
    values: Vec<ExprId>,
    variadic: Option<ExprId>,
  },
  Assert {
    cond: Option<ExprId>,
    message: Option<ExprId>,
    is_static: bool,
  },
  Assign {
    op: Option<BinaryOperation>,
    object: ExprId,
    value: ExprId,
    /// `*p = v`: `object` is the pointer, not the place.
    indirect: bool,
  },
  Binarithm {
    op: BinaryOperation,
    lvalue: ExprId,
    rvalue: ExprId,
  },
  Binding(Vec<Binding>),
  Break(Option<String>),
  Call {
    lvalue: ExprId,
    args: Vec<ExprId>,
  },
  Cast {
    kind: CastKind,
    value: ExprId,
    secondary: TypeId,
  },
  Constant(ConstantValue),
  Continue(Option<String>),
  Defer(ExprId),
  Delete {
    object: ExprId,
    is_static: bool,
  },
  For {
    label: Option<String>,
    bindings: Option<ExprId>,
    cond: ExprId,
    afterthought: Option<ExprId>,
    body: ExprId,
  },
  Free(ExprId),
  If {
    cond: ExprId,
    true_branch: ExprId,
    false_branch: Option<ExprId>,
  },
  Insert {
    object: ExprId,
    values: Vec<ExprId>,
  },
  List(Vec<ExprId>),
  Match {
    value: ExprId,
    cases: Vec<MatchCase>,
  },
  Measure(Measure),
  Return(Option<ExprId>),
  Slice {
    object: ExprId,
    start: Option<ExprId>,
    end: Option<ExprId>,
  },
  Struct {
    autofill: bool,
    fields: Vec<FieldValue>,
  },
  Switch {
    value: ExprId,
    cases: Vec<SwitchCase>,
  },
  Tuple(Vec<ExprId>),
  Unarithm {
    op: UnaryOperation,
    operand: ExprId,
  },
  Yield {
    label: Option<String>,
    value: Option<ExprId>,
  },
}

impl ExprKind {
  pub fn name(&self) -> &'static str {
    match self {
      ExprKind::Access(_) => "access",
      ExprKind::Alloc { .. } => "alloc",
      ExprKind::Append { .. } => "append",
      ExprKind::Assert { .. } => "assert",
      ExprKind::Assign { .. } => "assign",
      ExprKind::Binarithm { .. } => "binarithm",
      ExprKind::Binding(_) => "binding",
      ExprKind::Break(_) => "break",
      ExprKind::Call { .. } => "call",
      ExprKind::Cast { .. } => "cast",
      ExprKind::Constant(_) => "constant",
      ExprKind::Continue(_) => "continue",
      ExprKind::Defer(_) => "defer",
      ExprKind::Delete { .. } => "delete",
      ExprKind::For { .. } => "for",
      ExprKind::Free(_) => "free",
      ExprKind::If { .. } => "if",
      ExprKind::Insert { .. } => "insert",
      ExprKind::List(_) => "list",
      ExprKind::Match { .. } => "match",
      ExprKind::Measure(_) => "measure",
      ExprKind::Return(_) => "return",
      ExprKind::Slice { .. } => "slice",
      ExprKind::Struct { .. } => "struct",
      ExprKind::Switch { .. } => "switch",
      ExprKind::Tuple(_) => "tuple",
      ExprKind::Unarithm { .. } => "unarithm",
      ExprKind::Yield { .. } => "yield",
    }
  }
}

/// A type-checked expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
  pub kind: ExprKind,
  pub result: TypeId,
  /// Control never reaches the end of this expression.
  pub terminates: bool,
  pub loc: Location,
}

/// A checked compilation unit: every expression, object and declaration the
/// lowering pass needs.
#[derive(Debug, Clone, Default)]
pub struct Unit {
  pub objects: ObjectStore,
  pub exprs: Store<Expression>,
  declarations: Vec<Declaration>,
  /// First declaration of each identifier, by position in `declarations`.
  declared: HashMap<Identifier, usize>,
}

impl Unit {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_object(
    &mut self,
    ident: Identifier,
    kind: ObjectKind,
    ty: TypeId,
  ) -> ObjectId {
    self.objects.alloc(ScopeObject { ident, kind, ty })
  }

  pub fn object(
    &self,
    id: ObjectId,
  ) -> &ScopeObject {
    self.objects.get(&id)
  }

  pub fn alloc(
    &mut self,
    expr: Expression,
  ) -> ExprId {
    self.exprs.alloc(expr)
  }

  /// Allocate an expression with no source location.
  pub fn add_expr(
    &mut self,
    kind: ExprKind,
    result: TypeId,
  ) -> ExprId {
    self.add_expr_at(kind, result, Location::default())
  }

  /// Allocate an expression, deriving `terminates` from its children the way
  /// the checker does for straight-line code.
  pub fn add_expr_at(
    &mut self,
    kind: ExprKind,
    result: TypeId,
    loc: Location,
  ) -> ExprId {
    let terminates = match &kind {
      ExprKind::Return(_) | ExprKind::Break(_) | ExprKind::Continue(_) | ExprKind::Yield { .. } => true,
      ExprKind::List(exprs) => exprs.iter().any(|e| self.get(*e).terminates),
      _ => false,
    };
    self.alloc(Expression {
      kind,
      result,
      terminates,
      loc,
    })
  }

  pub fn get(
    &self,
    id: ExprId,
  ) -> &Expression {
    self.exprs.get(&id)
  }

  pub fn add_declaration(
    &mut self,
    decl: Declaration,
  ) {
    self
      .declared
      .entry(decl.ident.clone())
      .or_insert(self.declarations.len());
    self.declarations.push(decl);
  }

  /// Declarations in the order they were added.
  pub fn declarations(&self) -> &[Declaration] {
    &self.declarations
  }

  /// Program-level declaration bound to an object of kind [`ObjectKind::Decl`].
  pub fn declaration_for(
    &self,
    object: ObjectId,
  ) -> Option<&Declaration> {
    let index = *self.declared.get(&self.object(object).ident)?;
    self.declarations.get(index)
  }
}
