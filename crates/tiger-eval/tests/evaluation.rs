//! End-to-end evaluation tests driving the full pipeline: lex, parse,
//! resolve, evaluate.

use tiger_eval::natives::{
    native_entry, root_decls, standard_bindings, NativeCtx, NativeImpl, RootEntry, SharedBuffer,
};
use tiger_eval::{EvalError, Interpreter, Value};
use tiger_par::{Param, Parser, TypeRef};
use tiger_util::Symbol;

#[derive(Debug)]
struct Outcome {
    value: Value,
    stdout: String,
}

fn run_with(source: &str, bindings: Vec<RootEntry>) -> Result<Outcome, EvalError> {
    let program = Parser::new(source, None).parse().expect(source);
    let resolved = tiger_sem::resolve(&program, &root_decls(&bindings)).expect(source);

    let stdout = SharedBuffer::new();
    let ctx = NativeCtx::with_streams(
        Box::new(stdout.clone()),
        Box::new(SharedBuffer::new()),
        false,
    );
    let mut interp = Interpreter::new(resolved.scopes, ctx);
    let value = interp.run(&program, &bindings)?;
    assert_eq!(
        interp.active_frames(),
        0,
        "every frame must be popped on exit"
    );
    Ok(Outcome {
        value,
        stdout: stdout.contents(),
    })
}

fn run(source: &str) -> Outcome {
    run_with(source, standard_bindings()).expect(source)
}

#[test]
fn arithmetic_expression() {
    assert_eq!(run("2 + 2 * 3").value, Value::Int(8));
}

#[test]
fn for_loop_sums() {
    let outcome = run("let var a := 0 in (for i := 1 to 9 do a := a + i; a) end");
    assert_eq!(outcome.value, Value::Int(45));
}

#[test]
fn while_loop_counts_to_one_hundred() {
    let outcome = run("let var a := 0 in (while a < 100 do a := a + 1; a) end");
    assert_eq!(outcome.value, Value::Int(100));
}

#[test]
fn function_call_adds() {
    let outcome = run("let function add(a:int, b:int):int = a + b in add(1, 1) end");
    assert_eq!(outcome.value, Value::Int(2));
}

#[test]
fn recursive_function_counts_up() {
    let outcome =
        run("let function f(n:int):int = if n < 100 then f(n + 1) else n in f(1) end");
    assert_eq!(outcome.value, Value::Int(100));
}

#[test]
fn for_loop_prints_digits() {
    let outcome = run("for i := 1 to 3 do print(i)");
    assert_eq!(outcome.stdout, "123");
    assert_eq!(outcome.value, Value::Nil);
}

#[test]
fn closure_captures_the_outer_binding() {
    let outcome = run(
        "let var y := 42 in
           let function f(x:int) = print(y) in
             let var y := 43 in f(y) end
           end
         end",
    );
    assert_eq!(outcome.stdout, "42");
}

#[test]
fn nested_for_loops_print_a_table() {
    let outcome = run(
        "for row := 1 to 3 do
           (for col := 1 to 3 do print(row * col);
            print(\"\\n\"))",
    );
    assert_eq!(outcome.stdout, "123\n246\n369\n");
}

#[test]
fn fibonacci_by_recursion() {
    let outcome = run(
        "let function fib(n:int):int =
               if n < 2 then n else fib(n - 1) + fib(n - 2)
         in fib(20) end",
    );
    assert_eq!(outcome.value, Value::Int(6765));
}

#[test]
fn deep_recursion_keeps_frames_balanced() {
    let outcome = run(
        "let function down(n:int):int = if n = 0 then 0 else down(n - 1)
         in down(1000) end",
    );
    assert_eq!(outcome.value, Value::Int(0));
}

#[test]
fn functions_mutate_variables_seen_through_their_closure() {
    // The inner let rebinds `a`, but `x` was declared where the outer `a`
    // is visible, so the outer one is mutated.
    let outcome = run(
        "let var a := 42 function x() = a := 99 in
           (let var a := 0 in x() end; a)
         end",
    );
    assert_eq!(outcome.value, Value::Int(99));
}

#[test]
fn custom_natives_register_like_standard_ones() {
    fn square(_ctx: &mut NativeCtx, value: &Value) -> Result<Value, tiger_eval::NativeError> {
        match value.as_int() {
            Some(n) => Ok(Value::Int(n * n)),
            None => Err(tiger_eval::NativeError("square expects an integer".into())),
        }
    }

    let mut bindings = standard_bindings();
    bindings.push(native_entry(
        "square",
        vec![Param::new(
            Symbol::intern("a"),
            TypeRef::new(Symbol::intern("int")),
        )],
        Some(TypeRef::new(Symbol::intern("int"))),
        NativeImpl::One(square),
    ));

    let outcome = run_with("square(7)", bindings).unwrap();
    assert_eq!(outcome.value, Value::Int(49));
}

#[test]
fn native_arity_is_checked() {
    let err = run_with("print()", standard_bindings()).unwrap_err();
    assert_eq!(
        err,
        EvalError::ArityMismatch {
            name: Symbol::intern("print"),
            expected: 1,
            given: 0,
        }
    );
}

#[test]
fn insertion_sort_end_to_end() {
    // A small but real program: sort an array in place and print the result.
    let outcome = run(
        "let
           type ints = array of int
           var n := 8
           var a := ints[8] of 0
           function fill() =
             (a[0] := 5; a[1] := 3; a[2] := 8; a[3] := 1;
              a[4] := 9; a[5] := 2; a[6] := 7; a[7] := 4)
           function sort() =
             for i := 1 to n - 1 do
               let var j := i in
                 while j > 0 & (if a[j - 1] > a[j] then 1 else 0) do
                   let var tmp := a[j] in
                     (a[j] := a[j - 1];
                      a[j - 1] := tmp;
                      j := j - 1)
                   end
               end
         in
           (fill(); sort(); for i := 0 to n - 1 do print(a[i]))
         end",
    );
    assert_eq!(outcome.stdout, "12345789");
}
