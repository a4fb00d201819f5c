use kiln_config::KilnConfig;
use kiln_hir::{ExprId, Expression, ObjectId, Unit};
use kiln_ir::{Definition, FunctionBuilder, Instr, IrType, LabelId, Op, Program, TempId, Value};
use kiln_type::{TypeId, TypeStore};

use crate::{GenError, GenResult, GenValue, qtype::qtype};

/// A local binding visible to the expression being lowered.
#[derive(Debug, Clone)]
struct GenBinding {
  object: ObjectId,
  value: GenValue,
}

/// State of the lowering pass for one unit.
pub struct GenContext<'a> {
  pub(crate) store: &'a TypeStore,
  pub(crate) unit: &'a Unit,
  pub(crate) config: &'a KilnConfig,

  /// The program being built.
  pub(crate) out: Program,

  /// Function currently being lowered.
  pub(crate) current: Option<FunctionBuilder>,

  /// Innermost binding last.
  bindings: Vec<GenBinding>,

  /// Source of unique suffixes for temporaries, labels and data symbols.
  id: u32,
}

impl<'a> GenContext<'a> {
  pub fn new(
    unit: &'a Unit,
    store: &'a TypeStore,
    config: &'a KilnConfig,
  ) -> Self {
    Self {
      store,
      unit,
      config,
      out: Program::new(),
      current: None,
      bindings: Vec::new(),
      id: 0,
    }
  }

  pub fn finish(self) -> Program {
    self.out
  }

  pub(crate) fn expr(
    &self,
    id: ExprId,
  ) -> &'a Expression {
    self.unit.get(id)
  }

  /// `prefix` followed by a fresh number, e.g. `binding.4`.
  pub(crate) fn gen_name(
    &mut self,
    prefix: &str,
  ) -> String {
    let name = format!("{}{}", prefix, self.id);
    self.id += 1;
    name
  }

  pub(crate) fn qtype(
    &self,
    ty: TypeId,
  ) -> IrType {
    qtype(self.store, ty)
  }

  pub(crate) fn size_of(
    &self,
    ty: TypeId,
  ) -> u64 {
    self.store.dealiased(ty).size
  }

  pub(crate) fn builder(&mut self) -> GenResult<&mut FunctionBuilder> {
    self
      .current
      .as_mut()
      .ok_or_else(|| GenError::invariant("instruction emitted outside of a function"))
  }

  pub(crate) fn new_temp(
    &mut self,
    prefix: &str,
    ty: IrType,
  ) -> GenResult<TempId> {
    let name = self.gen_name(prefix);
    Ok(self.builder()?.new_temp(name, ty))
  }

  /// Fresh temporary holding a value of type `ty`.
  pub(crate) fn value_temp(
    &mut self,
    prefix: &str,
    ty: TypeId,
  ) -> GenResult<GenValue> {
    let class = self.qtype(ty);
    let temp = self.new_temp(prefix, class)?;
    Ok(GenValue::temp(temp, ty))
  }

  /// Fresh temporary holding the address of an object of type `ty`.
  pub(crate) fn address_temp(
    &mut self,
    prefix: &str,
    ty: TypeId,
  ) -> GenResult<GenValue> {
    let temp = self.new_temp(prefix, IrType::Long)?;
    Ok(GenValue::temp(temp, ty))
  }

  pub(crate) fn new_label(
    &mut self,
    prefix: &str,
  ) -> GenResult<LabelId> {
    let name = self.gen_name(prefix);
    Ok(self.builder()?.new_label(name))
  }

  pub(crate) fn place_label(
    &mut self,
    label: LabelId,
  ) -> GenResult<()> {
    self.builder()?.place_label(label);
    Ok(())
  }

  pub(crate) fn emit(
    &mut self,
    out: Option<Value>,
    op: Op,
    args: Vec<Value>,
  ) -> GenResult<()> {
    self.builder()?.emit(out, op, args);
    Ok(())
  }

  pub(crate) fn emit_prelude(
    &mut self,
    instr: Instr,
  ) -> GenResult<()> {
    self.builder()?.push_prelude(instr);
    Ok(())
  }

  /// Operand naming a runtime helper.
  pub(crate) fn runtime(
    &self,
    name: &str,
  ) -> Value {
    Value::Global(self.config.gen.runtime_symbol(name))
  }

  pub(crate) fn push_def(
    &mut self,
    def: Definition,
  ) {
    self.out.push(def);
  }

  pub(crate) fn push_binding(
    &mut self,
    object: ObjectId,
    value: GenValue,
  ) {
    self.bindings.push(GenBinding { object, value });
  }

  /// Storage of a local binding, innermost first.
  pub(crate) fn lookup_binding(
    &self,
    object: ObjectId,
  ) -> Option<&GenValue> {
    self.bindings.iter().rev().find(|b| b.object == object).map(|b| &b.value)
  }

  pub(crate) fn binding_depth(&self) -> usize {
    self.bindings.len()
  }

  /// Drop bindings introduced since `depth` was taken.
  pub(crate) fn pop_bindings(
    &mut self,
    depth: usize,
  ) {
    self.bindings.truncate(depth);
  }
}
