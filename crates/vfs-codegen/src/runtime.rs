//! The one runtime surface VFS programs link against: a variadic `printf`
//! declaration for the `Print` statement.
//!
//! Grounded in `examples/original_source/vfs/ast/Generator.cpp`'s
//! `visit(Print&)`, which does `module->getOrInsertFunction("printf", ...)`
//! inline at the first `Print` site. We hoist that into a helper invoked
//! once per module (idempotent via `Module::get_function`) rather than
//! re-declaring on every `Print`, matching `lmlang-codegen::runtime`'s
//! convention of a single `declare_*` entry point called from the top of
//! compilation.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

/// Declare (or fetch the existing declaration of) the external, variadic
/// `printf(ptr, ...) -> i32` used to implement `Print`.
pub fn declare_printf<'ctx>(context: &'ctx Context, module: &Module<'ctx>) -> FunctionValue<'ctx> {
    if let Some(f) = module.get_function("printf") {
        return f;
    }
    let ptr_ty = context.ptr_type(AddressSpace::default());
    let fn_type = context.i32_type().fn_type(&[ptr_ty.into()], true);
    module.add_function("printf", fn_type, None)
}

/// The `printf` conversion specifier for a lowered value's LLVM type:
/// `%d` for integers (this covers `bool`, which lowers to `i1`), `%g` for
/// floating point, `%s` for pointers. Mirrors the original's
/// `isIntegerTy`/`isFloatingPointTy`/`isPointerTy` dispatch verbatim.
pub fn format_specifier(value: inkwell::values::BasicValueEnum) -> &'static str {
    match value {
        inkwell::values::BasicValueEnum::IntValue(_) => "%d",
        inkwell::values::BasicValueEnum::FloatValue(_) => "%g",
        inkwell::values::BasicValueEnum::PointerValue(_) => "%s",
        _ => "%d",
    }
}
