//! Semantic lowering core for VFS: turns a [`vfs_ast::Program`] into an
//! `inkwell` LLVM IR `Module`.
//!
//! # Modules
//!
//! - [`error`] -- the lowering error taxonomy (`LoweringError`)
//! - [`types`] -- `TypeSys`: coercion, casts, arithmetic/comparison opcode
//!   selection, and the struct-layout registry
//! - [`scope`] -- the lexical scope stack of stack-slot bindings
//! - [`lower`] -- the lowering visitor itself
//! - [`runtime`] -- the one external runtime surface (`printf`) VFS programs
//!   link against
//!
//! There is no object-emission or linking stage here (spec.md §1 puts those
//! out of scope); [`lower_to_ir_string`] is the crate's single entry point,
//! returning the textual IR a downstream backend or test would consume.

pub mod error;
pub mod lower;
pub mod runtime;
pub mod scope;
pub mod types;

use inkwell::context::Context;

pub use error::LoweringError;
pub use lower::Lowering;

/// Lower `program` to LLVM IR and return its textual form.
///
/// Creates a fresh, function-scoped `inkwell::context::Context` for the
/// single lowering pass (mirroring `lmlang-codegen::compiler`'s discipline
/// of never letting LLVM types outlive one compilation), drives
/// [`Lowering::generate`], and prints the resulting module with
/// `Module::print_to_string`.
pub fn lower_to_ir_string(program: &vfs_ast::Program) -> Result<String, LoweringError> {
    let context = Context::create();
    let lowering = Lowering::new(&context, "main");
    let module = lowering.generate(program)?;
    let ir = module.print_to_string().to_string();
    tracing::debug!(bytes = ir.len(), "lowering produced IR module");
    Ok(ir)
}
