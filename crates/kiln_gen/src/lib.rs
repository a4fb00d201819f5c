//! Lowering of checked expressions and declarations to linear IR.
//!
//! Entry points are [`gen`], which lowers every declaration of a [`Unit`],
//! and [`gen_and_verify`], which also runs the IR verifier over the result.

mod access;
mod constant;
mod context;
mod copy;
mod decl;
mod error;
mod expr;
pub mod qtype;
mod value;

use kiln_config::{DebugTrace, KilnConfig};
use kiln_hir::Unit;
use kiln_ir::{Program, VerifyResult, verify_program};
use kiln_log::{log_dbg, phase_warn, trace_dbg};
use kiln_type::TypeStore;

pub use access::AbortReason;
pub use context::GenContext;
pub use copy::COPY_UNROLL_THRESHOLD;
pub use error::{GenError, GenResult};
pub use value::{GenValue, GenValueKind};

/// Lower every declaration of `unit`, in declaration order.
pub fn gen(
  unit: &Unit,
  store: &TypeStore,
  config: &KilnConfig,
) -> GenResult<Program> {
  let mut ctx = GenContext::new(unit, store, config);
  for decl in unit.declarations() {
    ctx.gen_decl(decl)?;
  }

  let program = ctx.finish();
  log_dbg!(config, "lowered {} declarations into {} definitions", unit.declarations().len(), program.defs.len());
  trace_dbg!(config, DebugTrace::Gen, "lowered program:\n{}", program);
  Ok(program)
}

/// Lower `unit` and verify the resulting program.
pub fn gen_and_verify(
  unit: &Unit,
  store: &TypeStore,
  config: &KilnConfig,
) -> GenResult<(Program, VerifyResult)> {
  let program = gen(unit, store, config)?;
  let result = verify_program(&program);

  if let Err(errors) = &result {
    for error in errors {
      trace_dbg!(config, DebugTrace::Verify, "{}", error);
    }
    phase_warn!(config, "IR verification found {} problem(s)", errors.len());
  }

  Ok((program, result))
}
