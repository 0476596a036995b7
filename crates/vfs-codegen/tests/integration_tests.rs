//! End-to-end lowering scenarios, built directly against the
//! `vfs_ast::AstArena`/`Program` API (no parser exists in this crate -- see
//! SPEC_FULL.md §4.5) and asserted against the printed LLVM IR text and
//! structural properties of the emitted module. Mirrors spec.md §8's six
//! named end-to-end scenarios plus the invariants/boundary cases from the
//! same section that the per-module unit tests (`lower/mod.rs`,
//! `scope.rs`, `types.rs`) don't already cover in isolation.

use vfs_ast::{
    ArithOp, AstArena, BinOp, CmpOp, Expr, FunctionDecl, Parameter, Program, Stmt, StmtId,
    StructDecl, Type,
};
use vfs_codegen::{lower_to_ir_string, LoweringError};

fn main_with(arena: AstArena, return_type: Type, body: Vec<StmtId>) -> Program {
    Program {
        arena,
        structs: vec![],
        functions: vec![FunctionDecl {
            name: "Main".into(),
            version: String::new(),
            parameters: vec![],
            return_type,
            body,
        }],
    }
}

// ---------------------------------------------------------------------------
// 1. Trivial main
// ---------------------------------------------------------------------------

#[test]
fn trivial_main_returns_constant() {
    let mut arena = AstArena::new();
    let zero = arena.alloc_expr(Expr::Integer(0));
    let ret = arena.alloc_stmt(Stmt::Return(Some(zero)));
    let program = main_with(arena, Type::Int, vec![ret]);

    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("entry:"));
    assert!(ir.contains("ret i32 0"));
}

// ---------------------------------------------------------------------------
// 2. Arithmetic with coercion
// ---------------------------------------------------------------------------

#[test]
fn arithmetic_coerces_int_operand_to_float_and_print_widens_to_double() {
    let mut arena = AstArena::new();
    let one = arena.alloc_expr(Expr::Integer(1));
    let two_point_oh = arena.alloc_expr(Expr::Float(2.0));
    let sum = arena.alloc_expr(Expr::BinaryOp {
        left: one,
        op: BinOp::Arith(ArithOp::Add),
        right: two_point_oh,
    });
    let decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "x".into(),
        declared_type: Some(Type::Float),
        init: Some(sum),
    });
    let x_ident = arena.alloc_expr(Expr::Identifier("x".into()));
    let print = arena.alloc_stmt(Stmt::Print(x_ident));
    let program = main_with(arena, Type::Void, vec![decl, print]);

    let ir = lower_to_ir_string(&program).unwrap();
    // The int literal is cast to float before the add; the add is `fadd`.
    assert!(ir.contains("sitofp i32 1 to float"));
    assert!(ir.contains("fadd float"));
    // Print widens the float to double before calling the variadic printf.
    assert!(ir.contains("fpext float"));
    assert!(ir.contains("call i32 (ptr, ...) @printf"));
}

// ---------------------------------------------------------------------------
// 3. Versioned dispatch
// ---------------------------------------------------------------------------

#[test]
fn version_inv_calls_the_named_version_of_the_current_function() {
    let mut arena = AstArena::new();

    let one = arena.alloc_expr(Expr::Integer(1));
    let ret_spanish = arena.alloc_stmt(Stmt::Return(Some(one)));

    let invocation = arena.alloc_expr(Expr::VersionInv {
        version: "spanish".into(),
        arguments: vec![],
    });
    let ret_greet = arena.alloc_stmt(Stmt::Return(Some(invocation)));

    // `greet.spanish` must be lowered (and so registered in the module)
    // before `greet`'s body references it -- lowering is one pass over
    // `functions` in source order with no forward-declaration step,
    // mirroring `Generator::generate`'s single sequential loop.
    let program = Program {
        arena,
        structs: vec![],
        functions: vec![
            FunctionDecl {
                name: "greet".into(),
                version: "spanish".into(),
                parameters: vec![],
                return_type: Type::Int,
                body: vec![ret_spanish],
            },
            FunctionDecl {
                name: "greet".into(),
                version: String::new(),
                parameters: vec![],
                return_type: Type::Int,
                body: vec![ret_greet],
            },
        ],
    };

    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("define i32 @greet()"));
    assert!(ir.contains("define i32 @greet.spanish()"));
    assert!(ir.contains("call i32 @greet.spanish()"));
}

// ---------------------------------------------------------------------------
// 4. If/else with nested scope
// ---------------------------------------------------------------------------

#[test]
fn if_else_shadows_only_inside_its_own_branch() {
    let mut arena = AstArena::new();

    let zero = arena.alloc_expr(Expr::Integer(0));
    let outer_decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "x".into(),
        declared_type: Some(Type::Int),
        init: Some(zero),
    });

    let x_ident = arena.alloc_expr(Expr::Identifier("x".into()));
    let zero_again = arena.alloc_expr(Expr::Integer(0));
    let cond = arena.alloc_expr(Expr::BinaryOp {
        left: x_ident,
        op: BinOp::Cmp(CmpOp::Eq),
        right: zero_again,
    });

    let one = arena.alloc_expr(Expr::Integer(1));
    let then_decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "x".into(),
        declared_type: Some(Type::Int),
        init: Some(one),
    });

    let two = arena.alloc_expr(Expr::Integer(2));
    let else_decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "x".into(),
        declared_type: Some(Type::Int),
        init: Some(two),
    });

    let if_stmt = arena.alloc_stmt(Stmt::If {
        condition: cond,
        then_block: vec![then_decl],
        else_block: Some(vec![else_decl]),
    });

    let outer_x_again = arena.alloc_expr(Expr::Identifier("x".into()));
    let ret = arena.alloc_stmt(Stmt::Return(Some(outer_x_again)));

    let program = main_with(arena, Type::Int, vec![outer_decl, if_stmt, ret]);

    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("then:"));
    assert!(ir.contains("else:"));
    assert!(ir.contains("ifcont:"));
    // Three distinct `alloca i32` slots: outer x, then's x, else's x.
    assert_eq!(ir.matches("alloca i32").count(), 3);
}

#[test]
fn if_without_else_branches_to_merge_block_on_the_false_edge() {
    let mut arena = AstArena::new();
    let one = arena.alloc_expr(Expr::Integer(1));
    let zero = arena.alloc_expr(Expr::Integer(0));
    let cond = arena.alloc_expr(Expr::BinaryOp {
        left: one,
        op: BinOp::Cmp(CmpOp::Eq),
        right: zero,
    });
    let body_stub = arena.alloc_stmt(Stmt::Expression(zero));
    let if_stmt = arena.alloc_stmt(Stmt::If {
        condition: cond,
        then_block: vec![body_stub],
        else_block: None,
    });
    let program = main_with(arena, Type::Void, vec![if_stmt]);

    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("then:"));
    assert!(!ir.contains("else:"));
    assert!(ir.contains("ifcont:"));
    // The conditional branch's false edge must target `ifcont` directly.
    assert!(ir.contains("br i1") && ir.contains("label %ifcont"));
}

#[test]
fn comparing_a_bool_local_to_an_int_literal_zero_extends_the_bool() {
    let mut arena = AstArena::new();
    let flag_init = arena.alloc_expr(Expr::Bool(true));
    let flag_decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "flag".into(),
        declared_type: Some(Type::Bool),
        init: Some(flag_init),
    });
    let flag_ident = arena.alloc_expr(Expr::Identifier("flag".into()));
    let one = arena.alloc_expr(Expr::Integer(1));
    let cond = arena.alloc_expr(Expr::BinaryOp {
        left: flag_ident,
        op: BinOp::Cmp(CmpOp::Eq),
        right: one,
    });
    let then_stub = arena.alloc_stmt(Stmt::Expression(one));
    let if_stmt = arena.alloc_stmt(Stmt::If {
        condition: cond,
        then_block: vec![then_stub],
        else_block: None,
    });
    let program = main_with(arena, Type::Void, vec![flag_decl, if_stmt]);

    // `flag` (Bool) vs `1` (Int) must not hit `NoConversion` -- the mixed
    // Bool/Int comparison path zero-extends the bool before `icmp`, bypassing
    // the coercion table entirely (SPEC_FULL.md §4.4 supplement #2).
    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("zext"));
    assert!(ir.contains("icmp eq i32"));
}

// ---------------------------------------------------------------------------
// 5. For loop
// ---------------------------------------------------------------------------

#[test]
fn for_loop_allocates_counter_and_back_edges_to_the_header() {
    let mut arena = AstArena::new();

    let zero = arena.alloc_expr(Expr::Integer(0));
    let s_decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "s".into(),
        declared_type: Some(Type::Int),
        init: Some(zero),
    });

    let i_init = arena.alloc_expr(Expr::Integer(0));

    let i_ident_cond = arena.alloc_expr(Expr::Identifier("i".into()));
    let three = arena.alloc_expr(Expr::Integer(3));
    let cond = arena.alloc_expr(Expr::BinaryOp {
        left: i_ident_cond,
        op: BinOp::Cmp(CmpOp::Lt),
        right: three,
    });

    let one = arena.alloc_expr(Expr::Integer(1));

    let s_ident = arena.alloc_expr(Expr::Identifier("s".into()));
    let i_ident_body = arena.alloc_expr(Expr::Identifier("i".into()));
    let s_plus_i = arena.alloc_expr(Expr::BinaryOp {
        left: s_ident,
        op: BinOp::Arith(ArithOp::Add),
        right: i_ident_body,
    });
    let s_assign = arena.alloc_stmt(Stmt::Assignment {
        variable: "s".into(),
        expression: s_plus_i,
    });

    let for_stmt = arena.alloc_stmt(Stmt::For {
        variable: "i".into(),
        initial: i_init,
        condition: cond,
        increment: one,
        block: vec![s_assign],
    });

    let ret = arena.alloc_expr(Expr::Identifier("s".into()));
    let ret_stmt = arena.alloc_stmt(Stmt::Return(Some(ret)));

    let program = main_with(arena, Type::Int, vec![s_decl, for_stmt, ret_stmt]);

    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("forloop:"));
    assert!(ir.contains("forcont:"));
    // Condition is lowered twice per spec.md §9's retained double-evaluation.
    assert_eq!(ir.matches("icmp slt i32").count(), 2);
    // Back-edge: the bottom-of-loop branch targets `forloop` again.
    assert!(ir.contains("br i1") && ir.contains("label %forloop"));
}

#[test]
fn for_loop_with_initially_false_condition_still_allocates_the_counter() {
    let mut arena = AstArena::new();
    let zero = arena.alloc_expr(Expr::Integer(0));
    let ten = arena.alloc_expr(Expr::Integer(10));
    let i_ident = arena.alloc_expr(Expr::Identifier("i".into()));
    let cond = arena.alloc_expr(Expr::BinaryOp {
        left: i_ident,
        op: BinOp::Cmp(CmpOp::Gt),
        right: ten,
    });
    let one = arena.alloc_expr(Expr::Integer(1));
    let noop_ident = arena.alloc_expr(Expr::Integer(0));
    let body_stmt = arena.alloc_stmt(Stmt::Expression(noop_ident));
    let for_stmt = arena.alloc_stmt(Stmt::For {
        variable: "i".into(),
        initial: zero,
        condition: cond,
        increment: one,
        block: vec![body_stmt],
    });
    let program = main_with(arena, Type::Void, vec![for_stmt]);

    let ir = lower_to_ir_string(&program).unwrap();
    // `i`'s slot is allocated and initialized regardless of the pre-test result.
    assert!(ir.contains("alloca i32"));
    assert!(ir.contains("store i32 0"));
}

// ---------------------------------------------------------------------------
// 6. Struct member access
// ---------------------------------------------------------------------------

#[test]
fn struct_member_store_and_load_use_the_registered_field_index() {
    let mut arena = AstArena::new();
    let decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "p".into(),
        declared_type: Some(Type::struct_named("Pt")),
        init: None,
    });
    let seven = arena.alloc_expr(Expr::Integer(7));
    let assign = arena.alloc_stmt(Stmt::StructAssignment {
        variable: "p".into(),
        member: "x".into(),
        expression: seven,
    });
    let load = arena.alloc_expr(Expr::StructMember {
        variable: "p".into(),
        member: "x".into(),
    });
    let ret = arena.alloc_stmt(Stmt::Return(Some(load)));

    let program = Program {
        arena,
        structs: vec![StructDecl {
            name: "Pt".into(),
            members: vec![
                Parameter {
                    name: "x".into(),
                    ty: Type::Int,
                },
                Parameter {
                    name: "y".into(),
                    ty: Type::Int,
                },
            ],
        }],
        functions: vec![FunctionDecl {
            name: "Main".into(),
            version: String::new(),
            parameters: vec![],
            return_type: Type::Int,
            body: vec![decl, assign, ret],
        }],
    };

    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("%Pt = type { i32, i32 }"));
    // `x` is field 0: both the store-site and load-site GEP index it as 0.
    assert!(ir.contains("getelementptr inbounds %Pt"));
    assert!(ir.contains("i32 0, i32 0"));
    assert!(ir.contains("store i32 7"));
}

// ---------------------------------------------------------------------------
// Array literal and array indexing
// ---------------------------------------------------------------------------

#[test]
fn array_index_loads_the_element_at_the_given_position() {
    let mut arena = AstArena::new();
    let size = arena.alloc_expr(Expr::Integer(3));
    let decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "a".into(),
        declared_type: Some(Type::array(Type::Int, size)),
        init: None,
    });
    let idx = arena.alloc_expr(Expr::Integer(1));
    let index_expr = arena.alloc_expr(Expr::ArrayIndex {
        variable: "a".into(),
        index: idx,
    });
    let ret = arena.alloc_stmt(Stmt::Return(Some(index_expr)));
    let program = main_with(arena, Type::Int, vec![decl, ret]);

    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("alloca i32, i32 3"));
    assert!(ir.contains("getelementptr inbounds i32"));
}

#[test]
fn array_literal_with_mismatched_element_type_fails_with_no_conversion() {
    // The *first* element's type is authoritative (spec.md §9 supplement
    // #3): a `string`-typed first element sets a pointer target type, and
    // a later `int` element admits no cast into it.
    let mut arena = AstArena::new();
    let string_elem = arena.alloc_expr(Expr::Str("nope".into()));
    let int_elem = arena.alloc_expr(Expr::Integer(1));
    let array = arena.alloc_expr(Expr::Array(vec![string_elem, int_elem]));
    let decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "a".into(),
        declared_type: None,
        init: Some(array),
    });
    let program = main_with(arena, Type::Void, vec![decl]);

    let err = lower_to_ir_string(&program).unwrap_err();
    assert!(matches!(err, LoweringError::NoConversion { .. }));
}

// ---------------------------------------------------------------------------
// Error taxonomy (spec.md §7)
// ---------------------------------------------------------------------------

#[test]
fn local_array_of_array_declaration_fails() {
    let mut arena = AstArena::new();
    let inner_size = arena.alloc_expr(Expr::Integer(2));
    let outer_size = arena.alloc_expr(Expr::Integer(3));
    let declared_type = Type::array(Type::array(Type::Int, inner_size), outer_size);
    let decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "a".into(),
        declared_type: Some(declared_type),
        init: None,
    });
    let program = main_with(arena, Type::Void, vec![decl]);

    let err = lower_to_ir_string(&program).unwrap_err();
    assert!(matches!(err, LoweringError::TypeError(_)));
}

#[test]
fn var_decl_without_annotation_or_initializer_fails() {
    let mut arena = AstArena::new();
    let decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "x".into(),
        declared_type: None,
        init: None,
    });
    let program = main_with(arena, Type::Void, vec![decl]);

    let err = lower_to_ir_string(&program).unwrap_err();
    assert!(matches!(err, LoweringError::NoTypeForInference { name } if name == "x"));
}

#[test]
fn referencing_an_undeclared_identifier_fails() {
    let mut arena = AstArena::new();
    let ident = arena.alloc_expr(Expr::Identifier("ghost".into()));
    let ret = arena.alloc_stmt(Stmt::Return(Some(ident)));
    let program = main_with(arena, Type::Int, vec![ret]);

    let err = lower_to_ir_string(&program).unwrap_err();
    assert!(matches!(err, LoweringError::UndefinedSymbol { name } if name == "ghost"));
}

#[test]
fn calling_an_undefined_function_fails() {
    let mut arena = AstArena::new();
    let call = arena.alloc_expr(Expr::FunctionCall {
        name: "nope".into(),
        version: String::new(),
        arguments: vec![],
    });
    let stmt = arena.alloc_stmt(Stmt::Expression(call));
    let program = main_with(arena, Type::Void, vec![stmt]);

    let err = lower_to_ir_string(&program).unwrap_err();
    assert!(matches!(err, LoweringError::FunctionNotDefined { name } if name == "nope"));
}

#[test]
fn struct_member_access_on_a_non_struct_local_fails() {
    let mut arena = AstArena::new();
    let zero = arena.alloc_expr(Expr::Integer(0));
    let decl = arena.alloc_stmt(Stmt::VarDecl {
        name: "n".into(),
        declared_type: Some(Type::Int),
        init: Some(zero),
    });
    let member = arena.alloc_expr(Expr::StructMember {
        variable: "n".into(),
        member: "x".into(),
    });
    let stmt = arena.alloc_stmt(Stmt::Expression(member));
    let program = main_with(arena, Type::Void, vec![decl, stmt]);

    let err = lower_to_ir_string(&program).unwrap_err();
    assert!(matches!(err, LoweringError::NotAStruct { name } if name == "n"));
}

// ---------------------------------------------------------------------------
// Empty body boundary case
// ---------------------------------------------------------------------------

#[test]
fn empty_function_body_emits_entry_ret_void() {
    let program = main_with(AstArena::new(), Type::Void, vec![]);
    let ir = lower_to_ir_string(&program).unwrap();
    assert!(ir.contains("entry:"));
    assert!(ir.contains("ret void"));
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn relowering_the_same_program_is_textually_identical() {
    let mut arena = AstArena::new();
    let forty_two = arena.alloc_expr(Expr::Integer(42));
    let ret = arena.alloc_stmt(Stmt::Return(Some(forty_two)));
    let program = main_with(arena, Type::Int, vec![ret]);

    let first = lower_to_ir_string(&program).unwrap();
    let second = lower_to_ir_string(&program).unwrap();
    assert_eq!(first, second);
}
