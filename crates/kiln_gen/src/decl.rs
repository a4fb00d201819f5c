//! Program-level declarations: functions and globals.

use kiln_config::DebugTrace;
use kiln_hir::{DeclKind, Declaration, FnFlags, FunctionDecl, GlobalDecl};
use kiln_ir::{Data, DataItem, Definition, FunctionBuilder, IrType, Op, Section, Value};
use kiln_log::trace_dbg;
use kiln_type::Variadism;

use crate::{GenContext, GenError, GenResult, GenValue};

impl GenContext<'_> {
  pub fn gen_decl(
    &mut self,
    decl: &Declaration,
  ) -> GenResult<()> {
    match &decl.kind {
      DeclKind::Function(func) => self.gen_function_decl(decl, func),
      DeclKind::Global(global) => self.gen_global_decl(decl, global),
      DeclKind::Type(_) | DeclKind::Const(_) => Ok(()),
    }
  }

  fn gen_function_decl(
    &mut self,
    decl: &Declaration,
    func: &FunctionDecl,
  ) -> GenResult<()> {
    let Some(body) = func.body else {
      return Ok(());
    };

    let (store, unit) = (self.store, self.unit);
    let ftype = store
      .function(func.ty)
      .ok_or_else(|| GenError::invariant(format!("`{}` does not have a function type", decl.ident)))?;

    let name = if func.flags.contains(FnFlags::TEST) {
      self.gen_name("testfunc.")
    } else if func.flags.contains(FnFlags::INIT) {
      self.gen_name("initfunc.")
    } else if func.flags.contains(FnFlags::FINI) {
      self.gen_name("finifunc.")
    } else {
      decl.symbol_name()
    };
    trace_dbg!(self.config, DebugTrace::Gen, "lowering function {} as ${}", decl.ident, name);

    self.current = Some(FunctionBuilder::new(name.clone(), decl.exported));
    let depth = self.binding_depth();

    let start = self.new_label("start.")?;
    self.builder()?.place_prelude_label(start);
    if !store.is_void(ftype.result) {
      let returns = self.qtype(ftype.result);
      self.builder()?.set_returns(returns);
    }
    self.builder()?.set_variadic(ftype.variadism == Variadism::C);

    for &param in &func.params {
      let object = unit.object(param);
      let class = self.qtype(object.ty);
      let temp = self.builder()?.add_param(object.ident.name().to_string(), class);
      let value = GenValue::temp(temp, object.ty);

      if store.is_aggregate(object.ty) {
        self.push_binding(param, value);
      } else {
        let slot = self.alloc_slot("param.", object.ty)?;
        self.gen_store(slot.clone(), value)?;
        self.push_binding(param, slot);
      }
    }

    let body_label = self.new_label("body.")?;
    self.place_label(body_label)?;

    let value = self.gen_expr(body)?;
    if self.expr(body).terminates {
      if !self.builder()?.last_is_return() {
        self.emit(None, Op::Ret, vec![])?;
      }
    } else if store.is_void(ftype.result) || value.is_void() {
      self.emit(None, Op::Ret, vec![])?;
    } else {
      self.emit(None, Op::Ret, vec![value.operand()?])?;
    }

    self.pop_bindings(depth);
    let function = self
      .current
      .take()
      .ok_or_else(|| GenError::invariant("function builder vanished"))?
      .finish();
    self.push_def(Definition::Function(function));

    if func.flags.contains(FnFlags::INIT) {
      self.gen_registration(format!(".init.{}", name), ".init_array", None, vec![], &name);
    }
    if func.flags.contains(FnFlags::FINI) {
      self.gen_registration(format!(".fini.{}", name), ".fini_array", None, vec![], &name);
    }
    if func.flags.contains(FnFlags::TEST) {
      let ident = self.gen_string_items(&decl.ident.to_string());
      self.gen_registration(
        format!(".test.{}", name),
        ".test_array",
        Some("aw"),
        ident,
        &name,
      );
    }
    Ok(())
  }

  /// Entry in a linker-collected array pointing at `function`.
  fn gen_registration(
    &mut self,
    name: String,
    section: &str,
    flags: Option<&str>,
    mut items: Vec<DataItem>,
    function: &str,
  ) {
    items.push(DataItem::Value(IrType::Long, Value::Global(function.to_string())));
    let mut data = Data::new(name, items);
    data.align = Some(8);
    data.section = Some(Section {
      name: section.to_string(),
      flags: flags.map(str::to_string),
    });
    self.push_def(Definition::Data(data));
  }

  fn gen_global_decl(
    &mut self,
    decl: &Declaration,
    global: &GlobalDecl,
  ) -> GenResult<()> {
    let Some(value) = global.value else {
      return Ok(());
    };

    let mut items = Vec::new();
    self.gen_data_items(value, &mut items)?;

    let mut data = Data::new(decl.symbol_name(), items);
    data.exported = decl.exported;
    self.push_def(Definition::Data(data));
    Ok(())
  }
}
