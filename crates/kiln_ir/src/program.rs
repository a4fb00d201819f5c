use kiln_type::Store;

use crate::{Instr, IrType, Label, LabelId, Op, Temp, TempId, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
  Label(LabelId),
  Instr(Instr),
}

impl Statement {
  pub fn as_instr(&self) -> Option<&Instr> {
    match self {
      Statement::Instr(instr) => Some(instr),
      Statement::Label(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub name: String,
  pub ty: IrType,
  pub temp: TempId,
}

/// A lowered function.
///
/// `prelude` holds the start label and every stack allocation; `body` holds
/// the rest, starting with the body label.
#[derive(Debug, Clone)]
pub struct Function {
  pub name: String,
  pub exported: bool,
  pub returns: IrType,
  pub params: Vec<Param>,
  pub variadic: bool,
  pub prelude: Vec<Statement>,
  pub body: Vec<Statement>,
  pub temps: Store<Temp>,
  pub labels: Store<Label>,
}

impl Function {
  pub fn temp(
    &self,
    id: TempId,
  ) -> &Temp {
    self.temps.get(&id)
  }

  pub fn label(
    &self,
    id: LabelId,
  ) -> &Label {
    self.labels.get(&id)
  }

  /// Every statement, prelude first.
  pub fn statements(&self) -> impl Iterator<Item = &Statement> {
    self.prelude.iter().chain(self.body.iter())
  }

  pub fn instrs(&self) -> impl Iterator<Item = &Instr> {
    self.statements().filter_map(Statement::as_instr)
  }

  /// Class of an operand, as the printer and verifier see it.
  pub fn value_type(
    &self,
    value: &Value,
  ) -> IrType {
    match value {
      Value::Const(c) => c.ir_type(),
      Value::Temp(id) => self.temp(*id).ty,
      Value::Global(_) | Value::Label(_) => IrType::Long,
      Value::Variadic => IrType::Void,
    }
  }

  /// Calls whose target is the global `symbol`.
  pub fn calls_to<'a>(
    &'a self,
    symbol: &'a str,
  ) -> impl Iterator<Item = &'a Instr> + 'a {
    self
      .instrs()
      .filter(move |i| i.op == Op::Call && matches!(i.callee(), Some(Value::Global(name)) if name == symbol))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataItem {
  Value(IrType, Value),
  /// Raw bytes.
  Str(Vec<u8>),
  /// A run of zero bytes.
  Zeroed(u64),
  /// Address of `sym` plus a byte offset.
  SymOffset { sym: String, offset: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
  pub name: String,
  pub flags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
  pub name: String,
  pub exported: bool,
  pub align: Option<u64>,
  pub section: Option<Section>,
  pub items: Vec<DataItem>,
}

impl Data {
  pub fn new(
    name: impl Into<String>,
    items: Vec<DataItem>,
  ) -> Self {
    Self {
      name: name.into(),
      exported: false,
      align: None,
      section: None,
      items,
    }
  }
}

#[derive(Debug, Clone)]
pub enum Definition {
  Function(Function),
  Data(Data),
}

impl Definition {
  pub fn name(&self) -> &str {
    match self {
      Definition::Function(f) => &f.name,
      Definition::Data(d) => &d.name,
    }
  }
}

/// Ordered list of program definitions, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Program {
  pub defs: Vec<Definition>,
}

impl Program {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(
    &mut self,
    def: Definition,
  ) {
    self.defs.push(def);
  }

  pub fn functions(&self) -> impl Iterator<Item = &Function> {
    self.defs.iter().filter_map(|d| match d {
      Definition::Function(f) => Some(f),
      Definition::Data(_) => None,
    })
  }

  pub fn data(&self) -> impl Iterator<Item = &Data> {
    self.defs.iter().filter_map(|d| match d {
      Definition::Data(data) => Some(data),
      Definition::Function(_) => None,
    })
  }

  pub fn function(
    &self,
    name: &str,
  ) -> Option<&Function> {
    self.functions().find(|f| f.name == name)
  }

  pub fn data_def(
    &self,
    name: &str,
  ) -> Option<&Data> {
    self.data().find(|d| d.name == name)
  }
}
