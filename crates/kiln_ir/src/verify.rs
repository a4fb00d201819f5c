use std::{collections::HashSet, fmt};

use crate::{Function, Instr, LabelId, Op, Program, Statement, TempId, Value};

/// Structural problems found in a lowered program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
  /// Temporary read before any instruction defined it.
  TempUsedBeforeDef { function: String, temp: String },

  /// Label placed more than once.
  DuplicateLabel { function: String, label: String },

  /// Label referenced by a jump but never placed.
  UnplacedLabel { function: String, label: String },

  /// A store or copy whose destination is an immediate.
  ConstantDestination { function: String, instruction: String },

  /// Body does not end in `ret`, `jmp` or `hlt`.
  MissingTerminator { function: String },
}

impl fmt::Display for VerifyError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      VerifyError::TempUsedBeforeDef { function, temp } => {
        write!(f, "IR0001 temporary %{} used before definition in ${}", temp, function)
      },
      VerifyError::DuplicateLabel { function, label } => {
        write!(f, "IR0002 label @{} placed twice in ${}", label, function)
      },
      VerifyError::UnplacedLabel { function, label } => {
        write!(f, "IR0003 label @{} referenced but never placed in ${}", label, function)
      },
      VerifyError::ConstantDestination { function, instruction } => {
        write!(f, "IR0004 constant destination in ${}: {}", function, instruction)
      },
      VerifyError::MissingTerminator { function } => {
        write!(f, "IR0005 ${} does not end in a terminator", function)
      },
    }
  }
}

impl std::error::Error for VerifyError {}

/// IR verification result.
pub type VerifyResult = Result<(), Vec<VerifyError>>;

/// Verifier for lowered programs.
pub struct IrVerifier<'a> {
  program: &'a Program,
  errors: Vec<VerifyError>,
}

impl<'a> IrVerifier<'a> {
  pub fn new(program: &'a Program) -> Self {
    Self {
      program,
      errors: Vec::new(),
    }
  }

  /// Verify every function in the program.
  pub fn verify(mut self) -> VerifyResult {
    for func in self.program.functions() {
      self.verify_function(func);
    }

    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(self.errors)
    }
  }

  fn verify_function(
    &mut self,
    func: &Function,
  ) {
    let mut defined: HashSet<TempId> = func.params.iter().map(|p| p.temp).collect();
    let mut placed: HashSet<LabelId> = HashSet::new();
    let mut referenced: Vec<LabelId> = Vec::new();

    for stmt in func.statements() {
      match stmt {
        Statement::Label(label) => {
          if !placed.insert(*label) {
            self.errors.push(VerifyError::DuplicateLabel {
              function: func.name.clone(),
              label: func.label(*label).name.clone(),
            });
          }
        },
        Statement::Instr(instr) => {
          self.verify_instr(func, instr, &defined, &mut referenced);
          if let Some(Value::Temp(out)) = &instr.out {
            defined.insert(*out);
          }
        },
      }
    }

    let mut reported = HashSet::new();
    for label in referenced {
      if !placed.contains(&label) && reported.insert(label) {
        self.errors.push(VerifyError::UnplacedLabel {
          function: func.name.clone(),
          label: func.label(label).name.clone(),
        });
      }
    }

    let terminated = matches!(
      func.body.last(),
      Some(Statement::Instr(instr)) if matches!(instr.op, Op::Ret | Op::Jmp | Op::Hlt)
    );
    if !terminated {
      self.errors.push(VerifyError::MissingTerminator {
        function: func.name.clone(),
      });
    }
  }

  fn verify_instr(
    &mut self,
    func: &Function,
    instr: &Instr,
    defined: &HashSet<TempId>,
    referenced: &mut Vec<LabelId>,
  ) {
    for arg in &instr.args {
      match arg {
        Value::Temp(temp) if !defined.contains(temp) => {
          // A temp that is both read and written by the same instruction
          // (`%p =l add %p, 8`) must still have been defined earlier.
          self.errors.push(VerifyError::TempUsedBeforeDef {
            function: func.name.clone(),
            temp: func.temp(*temp).name.clone(),
          });
        },
        Value::Label(label) => referenced.push(*label),
        _ => {},
      }
    }

    let constant_destination = match instr.op {
      Op::Store(_) => instr.store_address().is_some_and(Value::is_const),
      _ => instr.out.as_ref().is_some_and(Value::is_const),
    };
    if constant_destination {
      self.errors.push(VerifyError::ConstantDestination {
        function: func.name.clone(),
        instruction: instr.op.mnemonic(),
      });
    }
  }
}

/// Verify a lowered program, returning every problem found.
pub fn verify_program(program: &Program) -> VerifyResult {
  IrVerifier::new(program).verify()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Definition, FunctionBuilder, IrType, StoreKind};

  fn program_with(func: Function) -> Program {
    let mut program = Program::new();
    program.push(Definition::Function(func));
    program
  }

  #[test]
  fn test_well_formed_function_verifies() {
    let mut b = FunctionBuilder::new("f".to_string(), false);
    let x = b.add_param("x".to_string(), IrType::Word);
    let t = b.new_temp(".1".to_string(), IrType::Word);
    b.emit(Some(t.into()), Op::Add, vec![x.into(), Value::word(1)]);
    b.emit(None, Op::Ret, vec![t.into()]);

    assert_eq!(verify_program(&program_with(b.finish())), Ok(()));
  }

  #[test]
  fn test_use_before_def() {
    let mut b = FunctionBuilder::new("f".to_string(), false);
    let t = b.new_temp(".1".to_string(), IrType::Word);
    let u = b.new_temp(".2".to_string(), IrType::Word);
    b.emit(Some(u.into()), Op::Copy, vec![t.into()]);
    b.emit(None, Op::Ret, vec![]);

    let errors = verify_program(&program_with(b.finish())).unwrap_err();
    assert_eq!(
      errors,
      vec![VerifyError::TempUsedBeforeDef {
        function: "f".to_string(),
        temp: ".1".to_string(),
      }]
    );
  }

  #[test]
  fn test_labels_and_terminator() {
    let mut b = FunctionBuilder::new("f".to_string(), false);
    let a = b.new_label("a.1".to_string());
    let missing = b.new_label("missing.2".to_string());
    b.place_label(a);
    b.place_label(a);
    b.emit(None, Op::Jnz, vec![Value::word(1), Value::Label(a), Value::Label(missing)]);

    let errors = verify_program(&program_with(b.finish())).unwrap_err();
    assert!(errors.contains(&VerifyError::DuplicateLabel {
      function: "f".to_string(),
      label: "a.1".to_string(),
    }));
    assert!(errors.contains(&VerifyError::UnplacedLabel {
      function: "f".to_string(),
      label: "missing.2".to_string(),
    }));
    assert!(errors.contains(&VerifyError::MissingTerminator {
      function: "f".to_string()
    }));
  }

  #[test]
  fn test_store_to_constant() {
    let mut b = FunctionBuilder::new("f".to_string(), false);
    b.emit(None, Op::Store(StoreKind::Word), vec![Value::word(1), Value::long(16)]);
    b.emit(None, Op::Ret, vec![]);

    let errors = verify_program(&program_with(b.finish())).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("IR0004"));
  }
}
