//! The VFS AST, arena-addressed.
//!
//! The original implementation builds a tree of heap-allocated, virtually
//! dispatched `Expression`/`Statement` nodes connected by `shared_ptr`
//! (`examples/original_source/vfs/ast/SyntaxTree.hpp`). Per the redesign
//! notes this crate instead holds every `Expr`/`Stmt` in a flat arena and
//! refers to children by [`ExprId`]/[`StmtId`], the same newtype-index style
//! `lmlang-core::id` uses for its own graph nodes. There is no
//! virtual dispatch: the lowering visitor in `vfs-codegen` matches on the
//! `Expr`/`Stmt` enum tag directly.

use serde::{Deserialize, Serialize};

use crate::id::{ExprId, StmtId};
use crate::types::Type;

/// The five arithmetic operators VFS supports, mapped 1:1 onto
/// `TypeSys`'s arithmetic opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// The six comparison operators, mapped onto `TypeSys`'s predicate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// A binary operator: either an arithmetic op or a comparison. Kept as one
/// enum (rather than splitting `BinaryOp` into two AST node kinds) because
/// the original parses both through a single `BinaryOp{left, op, right}`
/// node and `TypeSys` is what decides, at lowering time, whether `op` names
/// an arithmetic opcode or a comparison predicate -- that dispatch belongs to
/// the visitor, not the tree shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Arith(ArithOp),
    Cmp(CmpOp),
}

/// An expression node. Addressed by [`ExprId`]; children are `ExprId`s into
/// the same arena rather than boxed subtrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Integer(i32),
    Float(f32),
    Bool(bool),
    /// A string literal; lowered to a uniqued `.str` global constant.
    Str(String),
    Identifier(String),
    BinaryOp {
        left: ExprId,
        op: BinOp,
        right: ExprId,
    },
    /// An array literal. The first element's lowered type is authoritative;
    /// later elements that don't coerce/cast to it are a `NoConversion`
    /// error (retained quirk, see SPEC_FULL.md §4.4).
    Array(Vec<ExprId>),
    ArrayIndex {
        variable: String,
        index: ExprId,
    },
    StructMember {
        variable: String,
        member: String,
    },
    FunctionCall {
        name: String,
        version: String,
        arguments: Vec<ExprId>,
    },
    /// Invokes a specific version of the *currently lowering* function --
    /// used for self-recursive version dispatch without naming the function.
    VersionInv {
        version: String,
        arguments: Vec<ExprId>,
    },
}

/// A statement node. Addressed by [`StmtId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    VarDecl {
        name: String,
        /// `None` means the type is inferred from `init` (initializer-based
        /// inference is the only inference VFS performs -- see Non-goals).
        declared_type: Option<Type>,
        init: Option<ExprId>,
    },
    Assignment {
        variable: String,
        expression: ExprId,
    },
    ArrayAssignment {
        variable: String,
        index: ExprId,
        expression: ExprId,
    },
    StructAssignment {
        variable: String,
        member: String,
        expression: ExprId,
    },
    Expression(ExprId),
    Return(Option<ExprId>),
    If {
        condition: ExprId,
        then_block: Block,
        else_block: Option<Block>,
    },
    For {
        variable: String,
        initial: ExprId,
        condition: ExprId,
        increment: ExprId,
        block: Block,
    },
    Print(ExprId),
}

/// An ordered sequence of statements. Kept as a plain `Vec<StmtId>` --
/// unlike the expression/statement nodes themselves, a block is cheap to
/// clone and needs no arena indirection of its own.
pub type Block = Vec<StmtId>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    /// Empty string means no version suffix (mirrors the original's
    /// `version.empty()` check rather than introducing an `Option` the
    /// original doesn't have).
    pub version: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub body: Block,
}

impl FunctionDecl {
    /// `name` or `name.version`, with `Main` mapping to the unmangled `main`
    /// entry point name regardless of version. See SPEC_FULL.md §3.3.
    pub fn virtual_name(&self) -> String {
        if self.name == "Main" {
            return "main".to_string();
        }
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.version)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub members: Vec<Parameter>,
}

/// The arena backing a [`Program`]: every `Expr`/`Stmt` referenced anywhere
/// in the program lives here, addressed by its `ExprId`/`StmtId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }
}

/// The whole input to lowering: a set of struct declarations and a set of
/// function declarations, plus the arena they reference into. Mirrors the
/// driver contract's `generate(functions, structs)` call (SPEC_FULL.md §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub arena: AstArena,
    pub structs: Vec<StructDecl>,
    pub functions: Vec<FunctionDecl>,
}
