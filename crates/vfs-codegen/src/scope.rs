//! The lexical scope stack.
//!
//! Grounded in `examples/original_source/vfs/context/Scope.hpp`: each
//! `Scope` there is a `name -> Value*` map with an (unused in practice)
//! parent pointer, and the generator keeps a `Vec<shared_ptr<Scope>>`
//! stack, pushing a scope whose parent is whatever was on top. Per
//! SPEC_FULL.md §3.3 that parent-chain is reproduced here with a plain
//! `Vec<HashMap<..>>` and top-down linear search -- no parent pointers, no
//! shared ownership, since a later frame can never outlive an earlier one.

use std::collections::HashMap;

use inkwell::types::BasicTypeEnum;
use inkwell::values::PointerValue;

use crate::error::LoweringError;

/// What a slot's pointee actually is, beyond its LLVM-level `value_type`.
///
/// Needed only because opaque pointers no longer encode a pointee type:
/// indexing into an array or reaching into a struct field requires the
/// element type / struct name explicitly, so it travels alongside the
/// slot rather than being recoverable from the `PointerValue` itself.
#[derive(Debug, Clone)]
pub enum Aggregate<'ctx> {
    Array { element_type: BasicTypeEnum<'ctx> },
    Struct { name: String },
}

/// A single named binding: the stack slot plus the type of value stored
/// directly in it (scalar type for scalar locals, `ptr` for array/struct
/// locals -- see SPEC_FULL.md §3.3's "storage model").
#[derive(Debug, Clone)]
pub struct Slot<'ctx> {
    pub ptr: PointerValue<'ctx>,
    pub value_type: BasicTypeEnum<'ctx>,
    pub aggregate: Option<Aggregate<'ctx>>,
}

/// The scope stack. Pushed on function entry and on each `if`/`for` body
/// entry; popped on body exit. Plain nested blocks do **not** push a scope
/// (SPEC_FULL.md §9 / spec.md §9 "Scope push inside control flow").
#[derive(Debug, Default)]
pub struct ScopeStack<'ctx> {
    frames: Vec<HashMap<String, Slot<'ctx>>>,
}

impl<'ctx> ScopeStack<'ctx> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.frames.pop();
    }

    /// Insert `name` into the current (topmost) scope. Fails if `name` is
    /// already bound *at that level* -- shadowing a name from an enclosing
    /// scope is fine, redeclaring within the same one is not.
    pub fn add(&mut self, name: &str, slot: Slot<'ctx>) -> Result<(), LoweringError> {
        let top = self
            .frames
            .last_mut()
            .expect("add() called with no active scope");
        if top.contains_key(name) {
            return Err(LoweringError::Redeclared {
                name: name.to_string(),
            });
        }
        top.insert(name.to_string(), slot);
        Ok(())
    }

    /// Walk the stack top-down, returning the first binding found.
    pub fn get(&self, name: &str) -> Option<&Slot<'ctx>> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell::context::Context;

    #[test]
    fn lookup_searches_up_the_stack() {
        let context = Context::create();
        let module = context.create_module("t");
        let builder = context.create_builder();
        let fn_type = context.void_type().fn_type(&[], false);
        let function = module.add_function("f", fn_type, None);
        let bb = context.append_basic_block(function, "entry");
        builder.position_at_end(bb);

        let mut scopes: ScopeStack = ScopeStack::new();
        scopes.push_scope();
        let outer_ptr = builder.build_alloca(context.i32_type(), "x").unwrap();
        scopes
            .add(
                "x",
                Slot {
                    ptr: outer_ptr,
                    value_type: context.i32_type().into(),
                    aggregate: None,
                },
            )
            .unwrap();

        scopes.push_scope();
        assert!(scopes.get("x").is_some());
        scopes.pop_scope();
        assert!(scopes.get("x").is_some());
    }

    #[test]
    fn shadowing_in_a_nested_scope_does_not_redeclare() {
        let context = Context::create();
        let module = context.create_module("t");
        let builder = context.create_builder();
        let fn_type = context.void_type().fn_type(&[], false);
        let function = module.add_function("f", fn_type, None);
        let bb = context.append_basic_block(function, "entry");
        builder.position_at_end(bb);

        let mut scopes: ScopeStack = ScopeStack::new();
        scopes.push_scope();
        let outer_ptr = builder.build_alloca(context.i32_type(), "x").unwrap();
        scopes
            .add(
                "x",
                Slot {
                    ptr: outer_ptr,
                    value_type: context.i32_type().into(),
                    aggregate: None,
                },
            )
            .unwrap();

        scopes.push_scope();
        let inner_ptr = builder.build_alloca(context.i32_type(), "x_inner").unwrap();
        let result = scopes.add(
            "x",
            Slot {
                ptr: inner_ptr,
                value_type: context.i32_type().into(),
                aggregate: None,
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn redeclaring_in_the_same_scope_fails() {
        let context = Context::create();
        let module = context.create_module("t");
        let builder = context.create_builder();
        let fn_type = context.void_type().fn_type(&[], false);
        let function = module.add_function("f", fn_type, None);
        let bb = context.append_basic_block(function, "entry");
        builder.position_at_end(bb);

        let mut scopes: ScopeStack = ScopeStack::new();
        scopes.push_scope();
        let ptr_a = builder.build_alloca(context.i32_type(), "x").unwrap();
        scopes
            .add(
                "x",
                Slot {
                    ptr: ptr_a,
                    value_type: context.i32_type().into(),
                    aggregate: None,
                },
            )
            .unwrap();

        let ptr_b = builder.build_alloca(context.i32_type(), "x2").unwrap();
        let result = scopes.add(
            "x",
            Slot {
                ptr: ptr_b,
                value_type: context.i32_type().into(),
                aggregate: None,
            },
        );
        assert!(matches!(result, Err(LoweringError::Redeclared { .. })));
    }

    #[test]
    fn popped_scope_is_no_longer_visible() {
        let context = Context::create();
        let module = context.create_module("t");
        let builder = context.create_builder();
        let fn_type = context.void_type().fn_type(&[], false);
        let function = module.add_function("f", fn_type, None);
        let bb = context.append_basic_block(function, "entry");
        builder.position_at_end(bb);

        let mut scopes: ScopeStack = ScopeStack::new();
        scopes.push_scope();
        scopes.push_scope();
        let ptr = builder.build_alloca(context.i32_type(), "y").unwrap();
        scopes
            .add(
                "y",
                Slot {
                    ptr,
                    value_type: context.i32_type().into(),
                    aggregate: None,
                },
            )
            .unwrap();
        scopes.pop_scope();
        assert!(scopes.get("y").is_none());
    }
}
