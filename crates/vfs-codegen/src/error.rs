//! Errors produced while lowering a [`vfs_ast::Program`] to LLVM IR.
//!
//! Every variant here corresponds 1:1 to a failure mode named in the
//! lowering visitor's error taxonomy: the first failure terminates the
//! pass (SPEC_FULL.md §7) -- there is no partial IR output, and nothing is
//! recovered locally.

use vfs_ast::CoreError;

/// Errors raised by [`crate::lower::Lowering::generate`] and its helpers.
#[derive(Debug, thiserror::Error)]
pub enum LoweringError {
    /// `VarDecl` with no type annotation and no initializer.
    #[error("cannot infer type for '{name}': declaration has no annotation and no initializer")]
    NoTypeForInference { name: String },

    /// An identifier was referenced that resolves in no enclosing scope.
    #[error("undefined symbol: '{name}'")]
    UndefinedSymbol { name: String },

    /// A name was inserted twice at the same scope level.
    #[error("redeclared in the same scope: '{name}'")]
    Redeclared { name: String },

    /// A call (direct or `VersionInv`) named a virtual symbol that is
    /// neither a defined function nor a registered intrinsic alias.
    #[error("function not defined: '{name}'")]
    FunctionNotDefined { name: String },

    /// The coercion table has no entry for this pair of numeric kinds.
    #[error("no conversion between {left} and {right}")]
    NoConversion { left: String, right: String },

    /// The cast table has no entry for this pair.
    #[error("unknown cast from {from} to {to}")]
    UnknownCast { from: String, to: String },

    /// A `BinaryOp` carried an operator the comparison-predicate table
    /// doesn't recognize.
    #[error("unknown binary operator: '{op}'")]
    UnknownBinaryOp { op: String },

    /// A struct accessor (`StructMember`/`StructAssignment`) was used on a
    /// variable whose declared type is not a struct.
    #[error("not a struct: '{name}'")]
    NotAStruct { name: String },

    /// A struct accessor named a field the struct doesn't have.
    #[error("struct '{struct_name}' has no member '{member}'")]
    UnknownMember { struct_name: String, member: String },

    /// A `BinaryOp` whose coerced operand type admits no well-defined IR
    /// for the requested operator -- e.g. arithmetic on `bool`, or an
    /// array-of-array type. See SPEC_FULL.md §4.4 supplement #1 and §3.1.
    #[error("type error: {0}")]
    TypeError(String),

    /// An `inkwell` builder call failed (e.g. malformed instruction).
    #[error("LLVM error: {0}")]
    Llvm(String),

    /// A failure from the AST arena/struct-registry layer (duplicate
    /// struct declaration, unresolved struct reference).
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience for mapping an `inkwell::builder::BuilderError` into
/// [`LoweringError::Llvm`] at every `?` call site.
pub(crate) fn llvm_err(e: impl std::fmt::Display) -> LoweringError {
    LoweringError::Llvm(e.to_string())
}
