//! Statement lowering: one method per `Stmt` variant, grounded in the
//! matching `Generator::visit(...)` overload in
//! `examples/original_source/vfs/ast/Generator.cpp`.

use inkwell::values::BasicValueEnum;

use vfs_ast::{Block, Program, Stmt, StmtId, Type};

use crate::error::{llvm_err, LoweringError};
use crate::scope::{Aggregate, Slot};

use super::{Lowering, LoweredValue};

impl<'ctx> Lowering<'ctx> {
    pub(crate) fn lower_block(&mut self, program: &Program, block: &Block) -> Result<(), LoweringError> {
        for stmt_id in block {
            self.lower_stmt(program, *stmt_id)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, program: &Program, id: StmtId) -> Result<(), LoweringError> {
        match program.arena.stmt(id) {
            Stmt::VarDecl {
                name,
                declared_type,
                init,
            } => self.lower_var_decl(program, name, declared_type, init),
            Stmt::Assignment { variable, expression } => {
                self.lower_assignment(program, variable, *expression)
            }
            Stmt::ArrayAssignment {
                variable,
                index,
                expression,
            } => self.lower_array_assignment(program, variable, *index, *expression),
            Stmt::StructAssignment {
                variable,
                member,
                expression,
            } => self.lower_struct_assignment(program, variable, member, *expression),
            Stmt::Expression(e) => {
                self.lower_expr(program, *e)?;
                Ok(())
            }
            Stmt::Return(e) => self.lower_return(program, e),
            Stmt::If {
                condition,
                then_block,
                else_block,
            } => self.lower_if(program, *condition, then_block, else_block),
            Stmt::For {
                variable,
                initial,
                condition,
                increment,
                block,
            } => self.lower_for(program, variable, *initial, *condition, *increment, block),
            Stmt::Print(e) => self.lower_print(program, *e),
        }
    }

    /// `VarDecl`. An array or struct annotation replaces whatever the
    /// initializer computed with a fresh allocation sized/typed from the
    /// annotation -- the initializer is still evaluated for its side
    /// effects (matching the original, which computes `initial` before
    /// branching on the declared type), its value is simply discarded.
    /// See `crate::scope`'s doc comment for why the named slot itself is
    /// an alloca of `ptr`, not of the element/struct type directly: one
    /// `load` on it is what yields the storage pointer.
    fn lower_var_decl(
        &mut self,
        program: &Program,
        name: &str,
        declared_type: &Option<Type>,
        init: &Option<vfs_ast::ExprId>,
    ) -> Result<(), LoweringError> {
        let initial = match init {
            Some(e) => Some(self.lower_expr(program, *e)?.require_value()?),
            None => None,
        };

        let (slot_type, aggregate, storage): (
            inkwell::types::BasicTypeEnum<'ctx>,
            Option<Aggregate<'ctx>>,
            Option<BasicValueEnum<'ctx>>,
        ) = match declared_type {
            Some(arr @ Type::Array { element, size }) => {
                // Validate the *full* declared type, not just `element` in
                // isolation -- `TypeSys::ir_type`'s array-of-array rejection
                // only fires when it's handed the outer `Array` type itself
                // (it checks whether *its* element is an array), the same
                // way `lower_function`/`lower_struct_decl` validate the
                // full parameter/member type rather than its element alone.
                self.types.ir_type(arr, self.context)?;
                let element_ir = self.types.ir_type(element, self.context)?;
                let size_value = self.lower_expr(program, *size)?.require_value()?.into_int_value();
                let array_ptr = self
                    .builder
                    .build_array_alloca(element_ir, size_value, "arr")
                    .map_err(llvm_err)?;
                (
                    self.ptr_type().into(),
                    Some(Aggregate::Array {
                        element_type: element_ir,
                    }),
                    Some(array_ptr.into()),
                )
            }
            Some(Type::Struct { name: struct_name }) => {
                let st = self.types.struct_type(struct_name)?;
                let inst_ptr = self.builder.build_alloca(st, "struct_inst").map_err(llvm_err)?;
                (
                    self.ptr_type().into(),
                    Some(Aggregate::Struct {
                        name: struct_name.clone(),
                    }),
                    Some(inst_ptr.into()),
                )
            }
            Some(ty) => {
                let ir = self.types.ir_type(ty, self.context)?;
                let storage = match initial {
                    Some(v) => Some(self.types.cast_to(&self.builder, v, ty, self.context)?),
                    None => None,
                };
                (ir, None, storage)
            }
            None => {
                let v = initial.ok_or_else(|| LoweringError::NoTypeForInference {
                    name: name.to_string(),
                })?;
                (v.get_type(), None, Some(v))
            }
        };

        let ptr = self.builder.build_alloca(slot_type, name).map_err(llvm_err)?;
        if let Some(v) = storage {
            self.builder.build_store(ptr, v).map_err(llvm_err)?;
        }

        self.scopes.add(
            name,
            Slot {
                ptr,
                value_type: slot_type,
                aggregate,
            },
        )
    }

    fn lower_assignment(
        &mut self,
        program: &Program,
        variable: &str,
        expression: vfs_ast::ExprId,
    ) -> Result<(), LoweringError> {
        let value = self.lower_expr(program, expression)?.require_value()?;
        let slot = self.lookup_slot(variable)?;
        self.builder.build_store(slot.ptr, value).map_err(llvm_err)?;
        Ok(())
    }

    fn lower_array_assignment(
        &mut self,
        program: &Program,
        variable: &str,
        index: vfs_ast::ExprId,
        expression: vfs_ast::ExprId,
    ) -> Result<(), LoweringError> {
        let slot = self.lookup_slot(variable)?;
        let element_type = match &slot.aggregate {
            Some(Aggregate::Array { element_type }) => *element_type,
            _ => return Err(LoweringError::TypeError(format!("'{variable}' is not an array"))),
        };

        let array_ptr = self
            .builder
            .build_load(self.ptr_type(), slot.ptr, "arr_load")
            .map_err(llvm_err)?
            .into_pointer_value();

        let value = self.lower_expr(program, expression)?.require_value()?;
        let index = self.lower_expr(program, index)?.require_value()?.into_int_value();

        let elem_ptr = unsafe {
            self.builder
                .build_in_bounds_gep(element_type, array_ptr, &[index], "elem")
                .map_err(llvm_err)?
        };
        self.builder.build_store(elem_ptr, value).map_err(llvm_err)?;
        Ok(())
    }

    fn lower_struct_assignment(
        &mut self,
        program: &Program,
        variable: &str,
        member: &str,
        expression: vfs_ast::ExprId,
    ) -> Result<(), LoweringError> {
        let slot = self.lookup_slot(variable)?;
        let struct_name = match &slot.aggregate {
            Some(Aggregate::Struct { name }) => name.clone(),
            _ => {
                return Err(LoweringError::NotAStruct {
                    name: variable.to_string(),
                })
            }
        };

        let struct_ty = self.types.struct_type(&struct_name)?;
        let struct_ptr = self
            .builder
            .build_load(self.ptr_type(), slot.ptr, "struct_load")
            .map_err(llvm_err)?
            .into_pointer_value();
        let member_index = self.types.member_index(&struct_name, member)?;
        let value = self.lower_expr(program, expression)?.require_value()?;
        let field_ptr = self
            .builder
            .build_struct_gep(struct_ty, struct_ptr, member_index as u32, "field")
            .map_err(llvm_err)?;
        self.builder.build_store(field_ptr, value).map_err(llvm_err)?;
        Ok(())
    }

    /// `Return`. A struct-typed expression gets a second, by-value load
    /// (the first load, inside `lower_identifier`, only recovers the
    /// struct's storage pointer); an array-typed expression returns that
    /// storage pointer unchanged, since an array has no fixed-size
    /// by-value representation to load into.
    fn lower_return(&mut self, program: &Program, expr: &Option<vfs_ast::ExprId>) -> Result<(), LoweringError> {
        match expr {
            None => {
                self.builder.build_return(None).map_err(llvm_err)?;
            }
            Some(e) => match self.lower_expr(program, *e)? {
                LoweredValue::Void => {
                    self.builder.build_return(None).map_err(llvm_err)?;
                }
                LoweredValue::Value { value, aggregate } => {
                    let value = match aggregate {
                        Some(Aggregate::Struct { name }) => {
                            let struct_ty = self.types.struct_type(&name)?;
                            self.builder
                                .build_load(struct_ty, value.into_pointer_value(), "ret_struct")
                                .map_err(llvm_err)?
                        }
                        _ => value,
                    };
                    self.builder.build_return(Some(&value)).map_err(llvm_err)?;
                }
            },
        }
        Ok(())
    }

    /// `If`. Both arms branch to a shared merge block unless they already
    /// end in a terminator (e.g. a `Return`), in which case branching again
    /// would be invalid IR -- a guard the original applies to the `then`
    /// arm but, by inspection, omits for `else`; we apply it symmetrically.
    fn lower_if(
        &mut self,
        program: &Program,
        condition: vfs_ast::ExprId,
        then_block: &Block,
        else_block: &Option<Block>,
    ) -> Result<(), LoweringError> {
        let cond = self.lower_expr(program, condition)?.require_value()?.into_int_value();
        let function = self
            .builder
            .get_insert_block()
            .and_then(|bb| bb.get_parent())
            .expect("if statement is lowered inside a function body");

        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = else_block
            .is_some()
            .then(|| self.context.append_basic_block(function, "else"));
        let merge_bb = self.context.append_basic_block(function, "ifcont");

        self.builder
            .build_conditional_branch(cond, then_bb, else_bb.unwrap_or(merge_bb))
            .map_err(llvm_err)?;

        self.builder.position_at_end(then_bb);
        self.scopes.push_scope();
        self.lower_block(program, then_block)?;
        self.scopes.pop_scope();
        if self.current_block_is_open() {
            self.builder.build_unconditional_branch(merge_bb).map_err(llvm_err)?;
        }

        if let (Some(else_bb), Some(else_block)) = (else_bb, else_block) {
            self.builder.position_at_end(else_bb);
            self.scopes.push_scope();
            self.lower_block(program, else_block)?;
            self.scopes.pop_scope();
            if self.current_block_is_open() {
                self.builder.build_unconditional_branch(merge_bb).map_err(llvm_err)?;
            }
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    /// `For`. The loop counter is declared as an ordinary `VarDecl` in the
    /// *enclosing* scope (so it outlives the loop, matching the original's
    /// C-style `for` semantics) before a new scope is pushed for the body.
    /// The condition is evaluated twice per full iteration -- once to enter,
    /// once to decide whether to repeat -- an intentionally retained quirk
    /// (SPEC_FULL.md's redesign-flag disposition for this loop shape).
    fn lower_for(
        &mut self,
        program: &Program,
        variable: &str,
        initial: vfs_ast::ExprId,
        condition: vfs_ast::ExprId,
        increment: vfs_ast::ExprId,
        block: &Block,
    ) -> Result<(), LoweringError> {
        self.lower_var_decl(program, variable, &None, &Some(initial))?;

        let function = self
            .builder
            .get_insert_block()
            .and_then(|bb| bb.get_parent())
            .expect("for statement is lowered inside a function body");
        let loop_bb = self.context.append_basic_block(function, "forloop");
        let after_bb = self.context.append_basic_block(function, "forcont");

        let cond = self.lower_expr(program, condition)?.require_value()?.into_int_value();
        self.builder
            .build_conditional_branch(cond, loop_bb, after_bb)
            .map_err(llvm_err)?;

        self.builder.position_at_end(loop_bb);
        self.scopes.push_scope();
        self.lower_block(program, block)?;
        self.scopes.pop_scope();

        let slot = self.lookup_slot(variable)?;
        let current = self
            .builder
            .build_load(slot.value_type, slot.ptr, "counter_load")
            .map_err(llvm_err)?
            .into_int_value();
        let inc = self.lower_expr(program, increment)?.require_value()?.into_int_value();
        let next = self.builder.build_int_add(current, inc, "counter").map_err(llvm_err)?;
        self.builder.build_store(slot.ptr, next).map_err(llvm_err)?;

        let cond_again = self.lower_expr(program, condition)?.require_value()?.into_int_value();
        self.builder
            .build_conditional_branch(cond_again, loop_bb, after_bb)
            .map_err(llvm_err)?;

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    /// `Print`. The format specifier is chosen from the printed value's
    /// LLVM type; floats are widened to `double` first since `printf`'s
    /// variadic arguments always promote floating-point to `double`.
    fn lower_print(&mut self, program: &Program, expr: vfs_ast::ExprId) -> Result<(), LoweringError> {
        let value = self.lower_expr(program, expr)?.require_value()?;
        let printf = self.printf_alias();

        let spec = crate::runtime::format_specifier(value);
        let format_ptr = self.global_string(&format!("{spec}\n"), ".str")?;

        let value = if value.is_float_value() {
            self.types
                .cast(&self.builder, value, crate::types::NumKind::Double, self.context)?
        } else {
            value
        };

        self.builder
            .build_call(printf, &[format_ptr.into(), value.into()], "printf_call")
            .map_err(llvm_err)?;
        Ok(())
    }

    fn current_block_is_open(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|bb| bb.get_terminator())
            .is_none()
    }

    pub(crate) fn lookup_slot(&self, name: &str) -> Result<Slot<'ctx>, LoweringError> {
        self.scopes
            .get(name)
            .cloned()
            .ok_or_else(|| LoweringError::UndefinedSymbol { name: name.to_string() })
    }
}
