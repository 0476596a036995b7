//! Expression lowering: one method per `Expr` variant, grounded in the
//! matching `Generator::visit(...)` overload in
//! `examples/original_source/vfs/ast/Generator.cpp`.

use inkwell::values::BasicValueEnum;

use vfs_ast::{BinOp, CmpOp, Expr, ExprId, Program};

use crate::error::{llvm_err, LoweringError};
use crate::scope::Aggregate;
use crate::types::{NumKind, TypeSys};

use super::{virtual_name, Lowering, LoweredValue};

impl<'ctx> Lowering<'ctx> {
    pub(crate) fn lower_expr(&mut self, program: &Program, id: ExprId) -> Result<LoweredValue<'ctx>, LoweringError> {
        match program.arena.expr(id) {
            Expr::Integer(v) => Ok(self.lower_integer(*v)),
            Expr::Float(v) => Ok(self.lower_float(*v)),
            Expr::Bool(v) => Ok(self.lower_bool(*v)),
            Expr::Str(s) => self.lower_str(s),
            Expr::Identifier(name) => self.lower_identifier(name),
            Expr::BinaryOp { left, op, right } => self.lower_binary_op(program, *left, *op, *right),
            Expr::Array(elements) => self.lower_array(program, elements),
            Expr::ArrayIndex { variable, index } => self.lower_array_index(program, variable, *index),
            Expr::StructMember { variable, member } => self.lower_struct_member(variable, member),
            Expr::FunctionCall {
                name,
                version,
                arguments,
            } => self.lower_function_call(program, name, version, arguments),
            Expr::VersionInv { version, arguments } => self.lower_version_inv(program, version, arguments),
        }
    }

    fn lower_integer(&self, value: i32) -> LoweredValue<'ctx> {
        LoweredValue::scalar(self.context.i32_type().const_int(value as u64, true).into())
    }

    fn lower_float(&self, value: f32) -> LoweredValue<'ctx> {
        LoweredValue::scalar(self.context.f32_type().const_float(value as f64).into())
    }

    fn lower_bool(&self, value: bool) -> LoweredValue<'ctx> {
        LoweredValue::scalar(self.context.bool_type().const_int(value as u64, false).into())
    }

    fn lower_str(&self, value: &str) -> Result<LoweredValue<'ctx>, LoweringError> {
        let ptr = self.global_string(value, ".str")?;
        Ok(LoweredValue::scalar(ptr.into()))
    }

    /// `Identifier`: a single `load` of the bound slot. For a scalar local
    /// this yields the scalar value; for an array/struct local (whose slot
    /// stores a pointer to the out-of-line storage, see `crate::scope`)
    /// this yields that storage pointer, not a double-dereference.
    fn lower_identifier(&mut self, name: &str) -> Result<LoweredValue<'ctx>, LoweringError> {
        let slot = self.lookup_slot(name)?;
        let value = self
            .builder
            .build_load(slot.value_type, slot.ptr, name)
            .map_err(llvm_err)?;
        Ok(LoweredValue::Value {
            value,
            aggregate: slot.aggregate,
        })
    }

    /// `BinaryOp`: coerce both operands to a common numeric kind, then
    /// either emit the arithmetic opcode or the comparison predicate.
    /// A coercion target of `Bool` has no arithmetic opcode (an arithmetic
    /// `BinaryOp` on two bools is a `TypeError`); a comparison between two
    /// bools zero-extends them to `i32` first rather than routing through
    /// the (inapplicable) floating-point comparison path that `is_fp`
    /// would otherwise select for any non-`Int` kind. A comparison between
    /// one `Bool` operand and one `Int` operand is handled before the
    /// coercion table is even consulted (SPEC_FULL.md §4.4 supplement #2):
    /// `coerce_tab` has no `(Bool, Int)` entry by design, so routing this
    /// case through `coerce_kind` first would reject ordinary code like
    /// `if (flag == 1)` with `NoConversion` before ever reaching the
    /// zero-extend path below.
    fn lower_binary_op(
        &mut self,
        program: &Program,
        left: ExprId,
        op: BinOp,
        right: ExprId,
    ) -> Result<LoweredValue<'ctx>, LoweringError> {
        let left_value = self.lower_expr(program, left)?.require_value()?;
        let right_value = self.lower_expr(program, right)?.require_value()?;

        let left_kind = NumKind::of_value(left_value, self.context).ok_or_else(|| {
            LoweringError::TypeError("left operand of binary operator is not numeric".to_string())
        })?;
        let right_kind = NumKind::of_value(right_value, self.context).ok_or_else(|| {
            LoweringError::TypeError("right operand of binary operator is not numeric".to_string())
        })?;

        if let BinOp::Cmp(cmp_op) = op {
            let mixed_bool_int = (left_kind == NumKind::Bool && right_kind == NumKind::Int)
                || (left_kind == NumKind::Int && right_kind == NumKind::Bool);
            if mixed_bool_int {
                return self.lower_bool_int_compare(cmp_op, left_value, left_kind, right_value);
            }
        }

        let coerced = self.types.coerce_kind(left_kind, right_kind).ok_or_else(|| {
            LoweringError::NoConversion {
                left: left_kind.to_string(),
                right: right_kind.to_string(),
            }
        })?;

        let lhs = self.types.cast(&self.builder, left_value, coerced, self.context)?;
        let rhs = self.types.cast(&self.builder, right_value, coerced, self.context)?;

        let value: BasicValueEnum = match op {
            BinOp::Arith(arith_op) => self
                .types
                .emit_arith(&self.builder, coerced, arith_op, lhs, rhs)?,
            BinOp::Cmp(cmp_op) => {
                if coerced == NumKind::Bool {
                    let i32_ty = self.context.i32_type();
                    let l = self
                        .builder
                        .build_int_z_extend(lhs.into_int_value(), i32_ty, "zext")
                        .map_err(llvm_err)?;
                    let r = self
                        .builder
                        .build_int_z_extend(rhs.into_int_value(), i32_ty, "zext")
                        .map_err(llvm_err)?;
                    self.builder
                        .build_int_compare(TypeSys::int_predicate(cmp_op), l, r, "icmp")
                        .map_err(llvm_err)?
                        .into()
                } else if self.types.is_fp(coerced) {
                    self.builder
                        .build_float_compare(
                            TypeSys::float_predicate(cmp_op),
                            lhs.into_float_value(),
                            rhs.into_float_value(),
                            "fcmp",
                        )
                        .map_err(llvm_err)?
                        .into()
                } else {
                    self.builder
                        .build_int_compare(
                            TypeSys::int_predicate(cmp_op),
                            lhs.into_int_value(),
                            rhs.into_int_value(),
                            "icmp",
                        )
                        .map_err(llvm_err)?
                        .into()
                }
            }
        };
        Ok(LoweredValue::scalar(value))
    }

    /// One operand is `Bool`, the other `Int`: zero-extend the `Bool`
    /// operand to the `Int` operand's width, then `icmp` with the signed
    /// predicate table. Bypasses `coerce_kind`/`cast` entirely, per
    /// SPEC_FULL.md §4.4 supplement #2.
    fn lower_bool_int_compare(
        &self,
        cmp_op: CmpOp,
        left_value: BasicValueEnum<'ctx>,
        left_kind: NumKind,
        right_value: BasicValueEnum<'ctx>,
    ) -> Result<LoweredValue<'ctx>, LoweringError> {
        let (bool_value, int_value, bool_is_left) = if left_kind == NumKind::Bool {
            (left_value, right_value, true)
        } else {
            (right_value, left_value, false)
        };
        let int_ty = int_value.into_int_value().get_type();
        let extended = self
            .builder
            .build_int_z_extend(bool_value.into_int_value(), int_ty, "zext")
            .map_err(llvm_err)?;
        let (l, r) = if bool_is_left {
            (extended, int_value.into_int_value())
        } else {
            (int_value.into_int_value(), extended)
        };
        let value = self
            .builder
            .build_int_compare(TypeSys::int_predicate(cmp_op), l, r, "icmp")
            .map_err(llvm_err)?;
        Ok(LoweredValue::scalar(value.into()))
    }

    /// `Array` literal: the first element's type is authoritative. Each
    /// later element that doesn't already match is cast to it; one that
    /// admits no cast is a `NoConversion` error (retained quirk, see
    /// SPEC_FULL.md §4.4).
    fn lower_array(&mut self, program: &Program, elements: &[ExprId]) -> Result<LoweredValue<'ctx>, LoweringError> {
        let first_value = self.lower_expr(program, elements[0])?.require_value()?;
        let element_type = first_value.get_type();
        let size = self.context.i32_type().const_int(elements.len() as u64, false);
        let array_ptr = self
            .builder
            .build_array_alloca(element_type, size, "arrlit")
            .map_err(llvm_err)?;

        for (i, &elem_id) in elements.iter().enumerate() {
            let value = if i == 0 {
                first_value
            } else {
                let v = self.lower_expr(program, elem_id)?.require_value()?;
                self.types.cast_to_llvm_type(&self.builder, v, element_type, self.context)?
            };
            let index = self.context.i32_type().const_int(i as u64, false);
            let elem_ptr = unsafe {
                self.builder
                    .build_in_bounds_gep(element_type, array_ptr, &[index], "elem")
                    .map_err(llvm_err)?
            };
            self.builder.build_store(elem_ptr, value).map_err(llvm_err)?;
        }

        Ok(LoweredValue::Value {
            value: array_ptr.into(),
            aggregate: Some(Aggregate::Array { element_type }),
        })
    }

    fn lower_array_index(
        &mut self,
        program: &Program,
        variable: &str,
        index: ExprId,
    ) -> Result<LoweredValue<'ctx>, LoweringError> {
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
        let index_value = self.lower_expr(program, index)?.require_value()?.into_int_value();
        let elem_ptr = unsafe {
            self.builder
                .build_in_bounds_gep(element_type, array_ptr, &[index_value], "elem")
                .map_err(llvm_err)?
        };
        let value = self
            .builder
            .build_load(element_type, elem_ptr, "elem_load")
            .map_err(llvm_err)?;
        Ok(LoweredValue::scalar(value))
    }

    fn lower_struct_member(&mut self, variable: &str, member: &str) -> Result<LoweredValue<'ctx>, LoweringError> {
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
        let field_ptr = self
            .builder
            .build_struct_gep(struct_ty, struct_ptr, member_index as u32, "field")
            .map_err(llvm_err)?;
        let field_type = struct_ty
            .get_field_type_at_index(member_index as u32)
            .ok_or_else(|| LoweringError::UnknownMember {
                struct_name: struct_name.clone(),
                member: member.to_string(),
            })?;
        let value = self
            .builder
            .build_load(field_type, field_ptr, "field_load")
            .map_err(llvm_err)?;
        Ok(LoweredValue::scalar(value))
    }

    /// `FunctionCall`: resolves `name`/`version` to a declared function (or
    /// the `printf` alias registered for `Print.format`). A `float`
    /// argument passed to a variadic function is widened to `double` --
    /// variadic promotion, same rule `Print` applies.
    fn lower_function_call(
        &mut self,
        program: &Program,
        name: &str,
        version: &str,
        arguments: &[ExprId],
    ) -> Result<LoweredValue<'ctx>, LoweringError> {
        let name_for_lookup = virtual_name(name, version);
        let function = self
            .module
            .get_function(&name_for_lookup)
            .or_else(|| self.func_alias.get(&name_for_lookup).copied())
            .ok_or_else(|| LoweringError::FunctionNotDefined {
                name: name.to_string(),
            })?;

        let is_var_arg = function.get_type().is_var_arg();
        let mut args = Vec::with_capacity(arguments.len());
        for &arg_id in arguments {
            let mut value = self.lower_expr(program, arg_id)?.require_value()?;
            if is_var_arg && NumKind::of_value(value, self.context) == Some(NumKind::Float) {
                value = self.types.cast(&self.builder, value, NumKind::Double, self.context)?;
            }
            args.push(value.into());
        }

        let call = self.builder.build_call(function, &args, "call").map_err(llvm_err)?;
        match call.try_as_basic_value().left() {
            Some(value) => Ok(LoweredValue::scalar(value)),
            None => Ok(LoweredValue::Void),
        }
    }

    /// `VersionInv`: invokes another version of the function currently
    /// being lowered, by virtual name -- no variadic promotion here, same
    /// as the original (only `FunctionCall` applies it).
    fn lower_version_inv(
        &mut self,
        program: &Program,
        version: &str,
        arguments: &[ExprId],
    ) -> Result<LoweredValue<'ctx>, LoweringError> {
        let name = self.current_function_name.clone();
        let virtual_name = virtual_name(&name, version);
        let function = self
            .module
            .get_function(&virtual_name)
            .ok_or(LoweringError::FunctionNotDefined { name })?;

        let mut args = Vec::with_capacity(arguments.len());
        for &arg_id in arguments {
            let value = self.lower_expr(program, arg_id)?.require_value()?;
            args.push(value.into());
        }

        let call = self.builder.build_call(function, &args, "call").map_err(llvm_err)?;
        match call.try_as_basic_value().left() {
            Some(value) => Ok(LoweredValue::scalar(value)),
            None => Ok(LoweredValue::Void),
        }
    }
}
