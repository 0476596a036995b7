//! Arena-addressed AST and surface type model for the VFS lowering core.
//!
//! This crate owns the data the external parser (out of scope, see
//! SPEC_FULL.md §1) is expected to produce: a [`Program`] of struct and
//! function declarations whose expressions/statements live in an
//! [`AstArena`], addressed by [`ExprId`]/[`StmtId`]. It has no LLVM
//! dependency -- `vfs-codegen` is the crate that knows how to turn a
//! `Program` into IR.

pub mod ast;
pub mod error;
pub mod id;
pub mod types;

pub use ast::{
    ArithOp, AstArena, BinOp, Block, CmpOp, Expr, FunctionDecl, Parameter, Program, Stmt,
    StructDecl,
};
pub use error::CoreError;
pub use id::{ExprId, StmtId};
pub use types::Type;
