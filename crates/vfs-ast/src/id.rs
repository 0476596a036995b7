//! Stable ID newtypes for AST arena entities.
//!
//! `Expr`s and `Stmt`s live in flat arena vectors rather than behind
//! `shared_ptr`/virtual dispatch; `ExprId`/`StmtId` are distinct newtype
//! wrappers over `u32` indices into those vectors, so an `ExprId` cannot be
//! accidentally used where a `StmtId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of an `Expr` in an `AstArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprId(pub u32);

/// Index of a `Stmt` in an `AstArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StmtId(pub u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
