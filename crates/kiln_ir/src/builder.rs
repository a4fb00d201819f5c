use kiln_type::Store;

use crate::{Function, Instr, IrType, Label, LabelId, Op, Param, Statement, Temp, TempId, Value};

/// Builder for a single function's IR.
///
/// Operands are typed handles, so a temporary or label can only be used
/// after it was created through this builder.
pub struct FunctionBuilder {
  name: String,
  exported: bool,
  returns: IrType,
  params: Vec<Param>,
  variadic: bool,

  prelude: Vec<Statement>,
  body: Vec<Statement>,

  temps: Store<Temp>,
  labels: Store<Label>,
}

impl FunctionBuilder {
  pub fn new(
    name: String,
    exported: bool,
  ) -> Self {
    Self {
      name,
      exported,
      returns: IrType::Void,
      params: Vec::new(),
      variadic: false,
      prelude: Vec::new(),
      body: Vec::new(),
      temps: Store::new(),
      labels: Store::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_returns(
    &mut self,
    returns: IrType,
  ) {
    self.returns = returns;
  }

  pub fn returns(&self) -> IrType {
    self.returns
  }

  pub fn set_variadic(
    &mut self,
    variadic: bool,
  ) {
    self.variadic = variadic;
  }

  /// Declare the next incoming parameter. Its temporary holds the argument.
  pub fn add_param(
    &mut self,
    name: String,
    ty: IrType,
  ) -> TempId {
    let temp = self.new_temp(name.clone(), ty);
    self.params.push(Param { name, ty, temp });
    temp
  }

  /// Allocate a new temporary. `name` must be unique within the function.
  pub fn new_temp(
    &mut self,
    name: String,
    ty: IrType,
  ) -> TempId {
    self.temps.alloc(Temp { name, ty })
  }

  pub fn temp_type(
    &self,
    temp: TempId,
  ) -> IrType {
    self.temps.get(&temp).ty
  }

  /// Allocate a new label. It must be placed exactly once.
  pub fn new_label(
    &mut self,
    name: String,
  ) -> LabelId {
    self.labels.alloc(Label { name })
  }

  /// Append an instruction to the body.
  pub fn push(
    &mut self,
    instr: Instr,
  ) {
    self.body.push(Statement::Instr(instr));
  }

  pub fn emit(
    &mut self,
    out: Option<Value>,
    op: Op,
    args: Vec<Value>,
  ) {
    self.push(Instr::new(out, op, args));
  }

  /// Append an instruction to the prelude (stack allocations).
  pub fn push_prelude(
    &mut self,
    instr: Instr,
  ) {
    self.prelude.push(Statement::Instr(instr));
  }

  pub fn place_label(
    &mut self,
    label: LabelId,
  ) {
    self.body.push(Statement::Label(label));
  }

  pub fn place_prelude_label(
    &mut self,
    label: LabelId,
  ) {
    self.prelude.push(Statement::Label(label));
  }

  /// Whether the last body statement is a `ret`.
  pub fn last_is_return(&self) -> bool {
    matches!(self.body.last(), Some(Statement::Instr(instr)) if instr.op == Op::Ret)
  }

  /// Finish building and return the completed function.
  pub fn finish(self) -> Function {
    Function {
      name: self.name,
      exported: self.exported,
      returns: self.returns,
      params: self.params,
      variadic: self.variadic,
      prelude: self.prelude,
      body: self.body,
      temps: self.temps,
      labels: self.labels,
    }
  }
}
