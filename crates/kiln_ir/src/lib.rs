pub mod builder;
pub mod display;
pub mod instr;
pub mod program;
pub mod types;
pub mod value;
pub mod verify;

use kiln_type::Id;

pub use builder::FunctionBuilder;
pub use instr::{Comparison, ExtKind, Instr, LoadKind, Op, StoreKind};
pub use program::{Data, DataItem, Definition, Function, Param, Program, Section, Statement};
pub use types::IrType;
pub use value::{ConstValue, Label, Temp, Value};
pub use verify::{VerifyError, VerifyResult, verify_program};

/// Unique identifier for a temporary within a function.
pub type TempId = Id<Temp>;

/// Unique identifier for a label within a function.
pub type LabelId = Id<Label>;
