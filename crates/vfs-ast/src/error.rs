//! Core error types for vfs-ast.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! failure modes internal to the AST arena and struct registry -- distinct
//! from `vfs_codegen::LoweringError`, which covers failures during lowering
//! itself. The split mirrors `lmlang-core::CoreError`'s own separation from
//! `lmlang-codegen::CodegenError`.

use thiserror::Error;

/// Errors produced by the vfs-ast crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two struct declarations in the same program share a name.
    #[error("duplicate struct name: '{name}'")]
    DuplicateStructName { name: String },

    /// A struct type was referenced but never declared.
    #[error("struct not found: '{name}'")]
    StructNotFound { name: String },

    /// A struct member was referenced but the struct has no field by that
    /// name.
    #[error("struct '{struct_name}' has no member '{member}'")]
    UnknownMember { struct_name: String, member: String },
}
