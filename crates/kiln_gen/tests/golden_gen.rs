mod common;

use common::{Fixture, format_function};
use insta::assert_snapshot;
use kiln_hir::{BinaryOperation, ConstantValue, ExprKind, Measure};

#[test]
fn test_scalar_binding_and_return() {
  let mut fx = Fixture::new();
  let i32 = fx.store.i32();
  let x = fx.local("x", i32);
  let one = fx.int(1, i32);
  let two = fx.int(2, i32);
  let sum = fx.binarithm(BinaryOperation::Add, one, two, i32);
  let bind = fx.bind(x, sum);
  let read = fx.ident(x);
  let ret = fx.ret(Some(read));
  let body = fx.list(vec![bind, ret]);
  fx.function("f", vec![], i32, body);

  let program = fx.lower();
  assert_snapshot!(format_function(&program, "f"), @r"
  function w $f() {
  @start.0
  	%binding.2 =l alloc4 4
  @body.1
  	%.3 =w add 1, 2
  	storew %.3, %binding.2
  	%load.4 =w loadsw %binding.2
  	ret %load.4
  }
  ");
}

#[test]
fn test_struct_autofill_zeroes_then_writes_fields() {
  let mut fx = Fixture::new();
  let i32 = fx.store.i32();
  let void = fx.store.void();
  let point = fx
    .store
    .lookup_struct(vec![("x".to_string(), i32), ("y".to_string(), i32)]);
  let p = fx.local("p", point);
  let seven = fx.int(7, i32);
  let literal = fx.struct_literal(point, true, vec![("y", seven)]);
  let bind = fx.bind(p, literal);
  let body = fx.list(vec![bind]);
  fx.function("f", vec![], void, body);

  let program = fx.lower();
  assert_snapshot!(format_function(&program, "f"), @r"
  function $f() {
  @start.0
  	%binding.2 =l alloc4 8
  @body.1
  	call $rt.memset(l %binding.2, l 0, l 8)
  	%field.3 =l add %binding.2, 4
  	storew 7, %field.3
  	ret
  }
  ");
}

#[test]
fn test_string_constant_writes_header() {
  let mut fx = Fixture::new();
  let void = fx.store.void();
  let text = fx.store.const_str();
  let s = fx.local("s", text);
  let hi = fx.string("hi");
  let bind = fx.bind(s, hi);
  let body = fx.list(vec![bind]);
  fx.function("f", vec![], void, body);

  let program = fx.lower();
  assert_snapshot!(format_function(&program, "f"), @r"
  function $f() {
  @start.0
  	%binding.2 =l alloc8 24
  @body.1
  	storel 2, %binding.2
  	%.4 =l add %binding.2, 8
  	storel 2, %.4
  	%.5 =l add %binding.2, 16
  	storel $strdata.3, %.5
  	ret
  }
  ");
  let data = program.data_def("strdata.3").expect("string data");
  assert_eq!(data.to_string(), "data $strdata.3 = { b \"hi\" }\n");
}

#[test]
fn test_short_circuit_and() {
  let mut fx = Fixture::new();
  let void = fx.store.void();
  let bool = fx.store.bool();
  let r = fx.local("r", bool);
  let lhs = fx.constant(ConstantValue::Bool(true), bool);
  let rhs = fx.constant(ConstantValue::Bool(false), bool);
  let and = fx.binarithm(BinaryOperation::And, lhs, rhs, bool);
  let bind = fx.bind(r, and);
  let body = fx.list(vec![bind]);
  fx.function("f", vec![], void, body);

  let program = fx.lower();
  assert_snapshot!(format_function(&program, "f"), @r"
  function $f() {
  @start.0
  	%binding.2 =l alloc4 1
  @body.1
  	%.3 =w copy 1
  	jnz %.3, @rvalue.4, @short.5
  @rvalue.4
  	%.3 =w copy 0
  	jmp @short.5
  @short.5
  	storeb %.3, %binding.2
  	ret
  }
  ");
}

#[test]
fn test_bounds_checked_array_index() {
  let mut fx = Fixture::new();
  let i32 = fx.store.i32();
  let size = fx.store.size();
  let array = fx.store.lookup_array(i32, Some(4));
  let a = fx.local("a", array);
  let base = fx.ident(a);
  let two = fx.int(2, size);
  let index = fx.index(base, two, i32);
  fx.at(index, "main.ha", 3, 9);
  let ret = fx.ret(Some(index));
  let body = fx.list(vec![ret]);
  fx.function("f", vec![a], i32, body);

  let program = fx.lower();
  assert_snapshot!(format_function(&program, "f"), @r"
  function w $f(l %a) {
  @start.0
  	%object.6 =l alloc8 24
  @body.1
  	%.2 =l mul 2, 4
  	%.2 =l add %a, %.2
  	%.3 =w cultl 2, 4
  	jnz %.3, @valid.4, @invalid.5
  @invalid.5
  	storel 11, %object.6
  	%.8 =l add %object.6, 8
  	storel 11, %.8
  	%.9 =l add %object.6, 16
  	storel $strdata.7, %.9
  	call $rt.abort_fixed(l %object.6, l 0)
  @valid.4
  	%load.10 =w loadsw %.2
  	ret %load.10
  }
  ");
}

#[test]
fn test_scalar_param_gets_a_slot() {
  let mut fx = Fixture::new();
  let i32 = fx.store.i32();
  let n = fx.local("n", i32);
  let read = fx.ident(n);
  let ret = fx.ret(Some(read));
  let body = fx.list(vec![ret]);
  fx.function("f", vec![n], i32, body);

  let program = fx.lower();
  assert_snapshot!(format_function(&program, "f"), @r"
  function w $f(w %n) {
  @start.0
  	%param.1 =l alloc4 4
  	storew %n, %param.1
  @body.2
  	%load.3 =w loadsw %param.1
  	ret %load.3
  }
  ");
}

#[test]
fn test_slice_length() {
  let mut fx = Fixture::new();
  let i32 = fx.store.i32();
  let size = fx.store.size();
  let slice = fx.store.lookup_slice(i32);
  let s = fx.local("s", slice);
  let read = fx.ident(s);
  let len = fx.expr(ExprKind::Measure(Measure::Len(read)), size);
  let ret = fx.ret(Some(len));
  let body = fx.list(vec![ret]);
  fx.function("f", vec![s], size, body);

  let program = fx.lower();
  assert_snapshot!(format_function(&program, "f"), @r"
  function l $f(l %s) {
  @start.0
  @body.1
  	%len.2 =l loadl %s
  	ret %len.2
  }
  ");
}
