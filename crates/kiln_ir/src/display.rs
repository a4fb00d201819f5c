//! QBE-flavoured text dump of a [`Program`], for logs and snapshot tests.

use std::fmt::{self, Display, Formatter, Write};

use crate::{ConstValue, Data, DataItem, Definition, Function, Instr, Op, Program, Statement, Value};

pub fn print_program(program: &Program) -> String {
  program.to_string()
}

pub fn print_function(func: &Function) -> String {
  func.to_string()
}

impl Display for Program {
  fn fmt(
    &self,
    f: &mut Formatter<'_>,
  ) -> fmt::Result {
    for (idx, def) in self.defs.iter().enumerate() {
      if idx > 0 {
        writeln!(f)?;
      }
      match def {
        Definition::Function(func) => write!(f, "{}", func)?,
        Definition::Data(data) => write!(f, "{}", data)?,
      }
    }
    Ok(())
  }
}

impl Display for Function {
  fn fmt(
    &self,
    f: &mut Formatter<'_>,
  ) -> fmt::Result {
    if self.exported {
      write!(f, "export ")?;
    }
    write!(f, "function ")?;
    if !self.returns.suffix().is_empty() {
      write!(f, "{} ", self.returns)?;
    }

    let mut params: Vec<String> = self.params.iter().map(|p| format!("{} %{}", p.ty, p.name)).collect();
    if self.variadic {
      params.push("...".to_string());
    }
    writeln!(f, "${}({}) {{", self.name, params.join(", "))?;

    for stmt in self.statements() {
      match stmt {
        Statement::Label(label) => writeln!(f, "@{}", self.label(*label).name)?,
        Statement::Instr(instr) => writeln!(f, "\t{}", InstrDisplay { func: self, instr })?,
      }
    }

    writeln!(f, "}}")
  }
}

struct InstrDisplay<'a> {
  func: &'a Function,
  instr: &'a Instr,
}

struct ValueDisplay<'a> {
  func: &'a Function,
  value: &'a Value,
}

impl Display for ValueDisplay<'_> {
  fn fmt(
    &self,
    f: &mut Formatter<'_>,
  ) -> fmt::Result {
    match self.value {
      Value::Const(c) => write!(f, "{}", ConstDisplay(c)),
      Value::Temp(id) => write!(f, "%{}", self.func.temp(*id).name),
      Value::Global(name) => write!(f, "${}", name),
      Value::Label(id) => write!(f, "@{}", self.func.label(*id).name),
      Value::Variadic => f.write_str("..."),
    }
  }
}

struct ConstDisplay<'a>(&'a ConstValue);

impl Display for ConstDisplay<'_> {
  fn fmt(
    &self,
    f: &mut Formatter<'_>,
  ) -> fmt::Result {
    match self.0 {
      ConstValue::Word(v) => write!(f, "{}", *v as i32),
      ConstValue::Long(v) => write!(f, "{}", *v as i64),
      ConstValue::Single(v) => write!(f, "s_{}", v),
      ConstValue::Double(v) => write!(f, "d_{}", v),
    }
  }
}

impl Display for InstrDisplay<'_> {
  fn fmt(
    &self,
    f: &mut Formatter<'_>,
  ) -> fmt::Result {
    let func = self.func;
    let instr = self.instr;
    let show = |value: &Value| ValueDisplay { func, value }.to_string();

    if let Some(out) = &instr.out {
      write!(f, "{} ={} ", show(out), func.value_type(out))?;
    }
    write!(f, "{}", instr.op.mnemonic())?;

    match instr.op {
      Op::Call => {
        let mut args = instr.args.iter();
        let target = args.next().map(show).unwrap_or_default();
        let args: Vec<String> = args
          .map(|arg| match arg {
            Value::Variadic => "...".to_string(),
            arg => format!("{} {}", func.value_type(arg), show(arg)),
          })
          .collect();
        write!(f, " {}({})", target, args.join(", "))
      },
      _ => {
        if !instr.args.is_empty() {
          let args: Vec<String> = instr.args.iter().map(show).collect();
          write!(f, " {}", args.join(", "))?;
        }
        Ok(())
      },
    }
  }
}

impl Display for Data {
  fn fmt(
    &self,
    f: &mut Formatter<'_>,
  ) -> fmt::Result {
    if self.exported {
      write!(f, "export ")?;
    }
    if let Some(section) = &self.section {
      write!(f, "section \"{}\" ", section.name)?;
      if let Some(flags) = &section.flags {
        write!(f, "\"{}\" ", flags)?;
      }
    }
    write!(f, "data ${} = ", self.name)?;
    if let Some(align) = self.align {
      write!(f, "align {} ", align)?;
    }

    let items: Vec<String> = self.items.iter().map(format_item).collect();
    writeln!(f, "{{ {} }}", items.join(", "))
  }
}

fn format_item(item: &DataItem) -> String {
  match item {
    DataItem::Value(ty, value) => {
      let value = match value {
        Value::Const(c) => ConstDisplay(c).to_string(),
        Value::Global(name) => format!("${}", name),
        other => format!("{:?}", other),
      };
      format!("{} {}", ty, value)
    },
    DataItem::Str(bytes) => format!("b \"{}\"", escape(bytes)),
    DataItem::Zeroed(n) => format!("z {}", n),
    DataItem::SymOffset { sym, offset: 0 } => format!("l ${}", sym),
    DataItem::SymOffset { sym, offset } => format!("l ${} + {}", sym, offset),
  }
}

fn escape(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len());
  for &b in bytes {
    match b {
      b'"' => out.push_str("\\\""),
      b'\\' => out.push_str("\\\\"),
      0x20..=0x7e => out.push(b as char),
      _ => {
        let _ = write!(out, "\\x{:02x}", b);
      },
    }
  }
  out
}
