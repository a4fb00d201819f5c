#![allow(dead_code)]

use kiln_config::KilnConfig;
use kiln_gen::{GenError, gen_and_verify};
use kiln_hir::{
  Access, BinaryOperation, Binding, ConstantValue, DeclKind, Declaration, ExprId, ExprKind, FieldValue, FnFlags,
  FunctionDecl, GlobalDecl, Location, ObjectId, ObjectKind, UnaryOperation, Unit,
};
use kiln_ir::{Function, Instr, Op, Program, Value, display::print_function};
use kiln_type::{FunctionFlags, FunctionType, Identifier, TypeId, TypeStore, Variadism};

/// Hand-built checked unit plus everything needed to lower it.
pub struct Fixture {
  pub store: TypeStore,
  pub unit: Unit,
  pub config: KilnConfig,
}

impl Fixture {
  pub fn new() -> Self {
    Self {
      store: TypeStore::new(),
      unit: Unit::new(),
      config: KilnConfig::new(false, vec![], true, 0),
    }
  }

  pub fn expr(
    &mut self,
    kind: ExprKind,
    result: TypeId,
  ) -> ExprId {
    self.unit.add_expr(kind, result)
  }

  /// Give an expression a source location.
  pub fn at(
    &mut self,
    expr: ExprId,
    path: &str,
    line: u32,
    column: u32,
  ) -> ExprId {
    self.unit.exprs.get_mut(&expr).loc = Location::new(path, line, column);
    expr
  }

  pub fn constant(
    &mut self,
    value: ConstantValue,
    ty: TypeId,
  ) -> ExprId {
    self.expr(ExprKind::Constant(value), ty)
  }

  pub fn int(
    &mut self,
    value: i64,
    ty: TypeId,
  ) -> ExprId {
    self.constant(ConstantValue::Int(value), ty)
  }

  pub fn string(
    &mut self,
    value: &str,
  ) -> ExprId {
    let ty = self.store.const_str();
    self.constant(ConstantValue::String(value.to_string()), ty)
  }

  pub fn local(
    &mut self,
    name: &str,
    ty: TypeId,
  ) -> ObjectId {
    self.unit.add_object(Identifier::new(name), ObjectKind::Bind, ty)
  }

  pub fn ident(
    &mut self,
    object: ObjectId,
  ) -> ExprId {
    let ty = self.unit.object(object).ty;
    self.expr(ExprKind::Access(Access::Ident(object)), ty)
  }

  pub fn field(
    &mut self,
    object: ExprId,
    field: &str,
    ty: TypeId,
  ) -> ExprId {
    self.expr(
      ExprKind::Access(Access::Field {
        object,
        field: field.to_string(),
      }),
      ty,
    )
  }

  pub fn index(
    &mut self,
    array: ExprId,
    index: ExprId,
    ty: TypeId,
  ) -> ExprId {
    self.expr(ExprKind::Access(Access::Index { array, index }), ty)
  }

  pub fn tuple_value(
    &mut self,
    tuple: ExprId,
    index: usize,
    ty: TypeId,
  ) -> ExprId {
    self.expr(ExprKind::Access(Access::Value { tuple, index }), ty)
  }

  pub fn deref(
    &mut self,
    pointer: ExprId,
    ty: TypeId,
  ) -> ExprId {
    self.expr(
      ExprKind::Unarithm {
        op: UnaryOperation::Deref,
        operand: pointer,
      },
      ty,
    )
  }

  pub fn bind(
    &mut self,
    object: ObjectId,
    initializer: ExprId,
  ) -> ExprId {
    let void = self.store.void();
    self.expr(
      ExprKind::Binding(vec![Binding {
        object,
        initializer,
        is_static: false,
      }]),
      void,
    )
  }

  pub fn assign(
    &mut self,
    object: ExprId,
    value: ExprId,
  ) -> ExprId {
    let void = self.store.void();
    self.expr(
      ExprKind::Assign {
        op: None,
        object,
        value,
        indirect: false,
      },
      void,
    )
  }

  pub fn binarithm(
    &mut self,
    op: BinaryOperation,
    lvalue: ExprId,
    rvalue: ExprId,
    result: TypeId,
  ) -> ExprId {
    self.expr(ExprKind::Binarithm { op, lvalue, rvalue }, result)
  }

  pub fn ret(
    &mut self,
    value: Option<ExprId>,
  ) -> ExprId {
    let void = self.store.void();
    self.expr(ExprKind::Return(value), void)
  }

  pub fn list(
    &mut self,
    exprs: Vec<ExprId>,
  ) -> ExprId {
    let void = self.store.void();
    self.expr(ExprKind::List(exprs), void)
  }

  pub fn struct_literal(
    &mut self,
    ty: TypeId,
    autofill: bool,
    fields: Vec<(&str, ExprId)>,
  ) -> ExprId {
    let fields = fields
      .into_iter()
      .map(|(name, value)| FieldValue {
        name: name.to_string(),
        value,
      })
      .collect();
    self.expr(ExprKind::Struct { autofill, fields }, ty)
  }

  pub fn function_type(
    &mut self,
    result: TypeId,
    params: Vec<TypeId>,
    variadism: Variadism,
  ) -> TypeId {
    self.store.lookup_function(FunctionType {
      result,
      params,
      variadism,
      flags: FunctionFlags::empty(),
    })
  }

  /// Declare a function with a body and return the object naming it.
  pub fn function(
    &mut self,
    name: &str,
    params: Vec<ObjectId>,
    result: TypeId,
    body: ExprId,
  ) -> ObjectId {
    self.function_with_flags(name, params, result, body, FnFlags::empty())
  }

  pub fn function_with_flags(
    &mut self,
    name: &str,
    params: Vec<ObjectId>,
    result: TypeId,
    body: ExprId,
    flags: FnFlags,
  ) -> ObjectId {
    let param_types = params.iter().map(|p| self.unit.object(*p).ty).collect();
    let ty = self.function_type(result, param_types, Variadism::None);
    self.declare(name, ty, Some(body), params, flags)
  }

  /// Declare a prototype, e.g. a C function.
  pub fn prototype(
    &mut self,
    name: &str,
    ty: TypeId,
  ) -> ObjectId {
    self.declare(name, ty, None, vec![], FnFlags::empty())
  }

  fn declare(
    &mut self,
    name: &str,
    ty: TypeId,
    body: Option<ExprId>,
    params: Vec<ObjectId>,
    flags: FnFlags,
  ) -> ObjectId {
    let ident = Identifier::new(name);
    let object = self.unit.add_object(ident.clone(), ObjectKind::Decl, ty);
    self.unit.add_declaration(Declaration {
      ident,
      symbol: None,
      exported: false,
      loc: Location::default(),
      kind: DeclKind::Function(FunctionDecl {
        ty,
        params,
        body,
        flags,
      }),
    });
    object
  }

  pub fn global(
    &mut self,
    name: &str,
    ty: TypeId,
    value: Option<ExprId>,
  ) -> ObjectId {
    let ident = Identifier::new(name);
    let object = self.unit.add_object(ident.clone(), ObjectKind::Decl, ty);
    self.unit.add_declaration(Declaration {
      ident,
      symbol: None,
      exported: true,
      loc: Location::default(),
      kind: DeclKind::Global(GlobalDecl { ty, value }),
    });
    object
  }

  /// Lower the unit, asserting that the result verifies.
  pub fn lower(&self) -> Program {
    let (program, verified) = gen_and_verify(&self.unit, &self.store, &self.config).expect("lowering failed");
    assert_eq!(verified, Ok(()), "lowered program does not verify:\n{}", program);
    program
  }

  pub fn lower_err(&self) -> GenError {
    match gen_and_verify(&self.unit, &self.store, &self.config) {
      Ok((program, _)) => panic!("expected lowering to fail, got:\n{}", program),
      Err(err) => err,
    }
  }
}

pub fn function<'a>(
  program: &'a Program,
  name: &str,
) -> &'a Function {
  program
    .function(name)
    .unwrap_or_else(|| panic!("no function ${} in:\n{}", name, program))
}

pub fn format_function(
  program: &Program,
  name: &str,
) -> String {
  print_function(function(program, name))
}

pub fn count_op(
  func: &Function,
  op: Op,
) -> usize {
  func.instrs().filter(|i| i.op == op).count()
}

pub fn instrs_with(
  func: &Function,
  op: Op,
) -> Vec<&Instr> {
  func.instrs().filter(|i| i.op == op).collect()
}

pub fn runtime_calls<'a>(
  func: &'a Function,
  helper: &'a str,
) -> Vec<&'a Instr> {
  func.calls_to(helper).collect()
}

pub fn global(name: &str) -> Value {
  Value::Global(name.to_string())
}
