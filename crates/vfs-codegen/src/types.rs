//! `TypeSys`: coercion, casts, arithmetic opcodes, comparison predicates,
//! the surface-type-to-LLVM-type mapping, and the struct layout registry.
//!
//! Grounded in `examples/original_source/vfs/type/TypeSys.cpp`, which
//! keeps three free-standing `std::map`-of-`std::map` tables (`coerceTab`,
//! `castTab`, `mathOpTab`) built once in the constructor and queried by
//! `(Type, Type)` / `(Type, op)` keys. We keep the same shape -- a handful
//! of `HashMap`/`HashSet` tables populated in [`TypeSys::new`] -- per
//! SPEC_FULL.md §4.2: the distilled ruleset is small enough (one coercion
//! pair, six cast pairs, 5 ops × 3 numeric kinds) that a rule-engine
//! abstraction over it would be unrequested complexity.
//!
//! The one structural difference from the original: LLVM pointers are
//! opaque in the LLVM version this workspace targets, so a surface
//! `Type`'s own mapping can't recover an array's element type or a
//! struct's field layout from a pointer alone the way the original's typed
//! pointers could. Those stay available by construction (see
//! [`crate::scope::Aggregate`] and [`TypeSys::struct_type`]/
//! [`TypeSys::member_index`]) rather than by inspecting a pointer.

use std::collections::{HashMap, HashSet};

use inkwell::context::Context;
use inkwell::types::{BasicType, BasicTypeEnum, StructType};
use inkwell::values::{BasicValue, BasicValueEnum};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use vfs_ast::{ArithOp, CmpOp, CoreError, Type};

use crate::error::LoweringError;

/// The numeric "kind" the coercion/cast/op tables key on. Distinct from
/// the surface [`Type`], which also carries array/struct payloads that
/// never participate in numeric coercion. `Double` has no surface `Type`
/// counterpart -- it only appears as a cast *target*, reached through
/// variadic promotion at a `Print`/`FunctionCall` call site (SPEC_FULL.md
/// §4.4) or an explicit `float -> double` widening in a cast chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumKind {
    Int,
    Float,
    Double,
    Bool,
}

impl std::fmt::Display for NumKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NumKind::Int => "int",
            NumKind::Float => "float",
            NumKind::Double => "double",
            NumKind::Bool => "bool",
        };
        f.write_str(s)
    }
}

impl NumKind {
    /// Recover the numeric kind of an already-lowered value from its LLVM
    /// type. Used at `BinaryOp`/cast sites where only the IR value is in
    /// hand, not the surface `Type` that produced it.
    pub fn of_value<'ctx>(value: BasicValueEnum<'ctx>, context: &'ctx Context) -> Option<NumKind> {
        match value {
            BasicValueEnum::IntValue(v) => match v.get_type().get_bit_width() {
                1 => Some(NumKind::Bool),
                32 => Some(NumKind::Int),
                _ => None,
            },
            BasicValueEnum::FloatValue(v) => {
                if v.get_type() == context.f32_type() {
                    Some(NumKind::Float)
                } else if v.get_type() == context.f64_type() {
                    Some(NumKind::Double)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub(crate) fn of_surface_type(ty: &Type) -> Option<NumKind> {
        match ty {
            Type::Int => Some(NumKind::Int),
            Type::Float => Some(NumKind::Float),
            Type::Bool => Some(NumKind::Bool),
            _ => None,
        }
    }
}

/// The LLVM cast opcode selected for a `(from, to)` pair. Names mirror the
/// original's `llvm::Instruction::CastOps` values it looks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastOp {
    SIToFP,
    FPExt,
    FPToSI,
}

/// The surface-type system: coercion, casts, arithmetic op selection,
/// comparison predicate selection, and the struct registry.
pub struct TypeSys<'ctx> {
    coerce_tab: HashMap<(NumKind, NumKind), NumKind>,
    cast_tab: HashMap<(NumKind, NumKind), CastOp>,
    /// Which `(kind, op)` pairs have a defined arithmetic opcode. `Bool` is
    /// deliberately absent -- see SPEC_FULL.md §4.4 supplement #1.
    math_op_tab: HashSet<(NumKind, ArithOp)>,
    structs: HashMap<String, (StructType<'ctx>, Vec<String>)>,
}

impl<'ctx> TypeSys<'ctx> {
    pub fn new() -> Self {
        let mut coerce_tab = HashMap::new();
        coerce_tab.insert((NumKind::Int, NumKind::Float), NumKind::Float);

        let mut cast_tab = HashMap::new();
        cast_tab.insert((NumKind::Int, NumKind::Float), CastOp::SIToFP);
        cast_tab.insert((NumKind::Int, NumKind::Double), CastOp::SIToFP);
        cast_tab.insert((NumKind::Bool, NumKind::Double), CastOp::SIToFP);
        cast_tab.insert((NumKind::Float, NumKind::Double), CastOp::FPExt);
        cast_tab.insert((NumKind::Float, NumKind::Int), CastOp::FPToSI);
        cast_tab.insert((NumKind::Double, NumKind::Int), CastOp::FPToSI);

        let mut math_op_tab = HashSet::new();
        for kind in [NumKind::Int, NumKind::Float, NumKind::Double] {
            for op in [
                ArithOp::Add,
                ArithOp::Sub,
                ArithOp::Mul,
                ArithOp::Div,
                ArithOp::Rem,
            ] {
                math_op_tab.insert((kind, op));
            }
        }

        TypeSys {
            coerce_tab,
            cast_tab,
            math_op_tab,
            structs: HashMap::new(),
        }
    }

    // -- Surface type -> LLVM type ----------------------------------------

    /// Map a surface [`Type`] to its LLVM representation. Array and struct
    /// types wrap their payload in a pointer-to (opaque, since this
    /// workspace targets an LLVM version with no typed pointers); `Void`
    /// has no `BasicTypeEnum` and is rejected -- callers needing a function
    /// return type must check for `Void` themselves first.
    pub fn ir_type(&self, ty: &Type, context: &'ctx Context) -> Result<BasicTypeEnum<'ctx>, LoweringError> {
        match ty {
            Type::Int => Ok(context.i32_type().into()),
            Type::Float => Ok(context.f32_type().into()),
            Type::Bool => Ok(context.bool_type().into()),
            Type::String => Ok(context.ptr_type(AddressSpace::default()).into()),
            Type::Void => Err(LoweringError::TypeError(
                "void has no value representation".to_string(),
            )),
            Type::Array { element, .. } => {
                if element.is_array() {
                    return Err(LoweringError::TypeError(
                        "array element type must not itself be an array".to_string(),
                    ));
                }
                Ok(context.ptr_type(AddressSpace::default()).into())
            }
            Type::Struct { name } => {
                self.struct_type(name)?;
                Ok(context.ptr_type(AddressSpace::default()).into())
            }
        }
    }

    /// Zero for `int`, `0.0` for `float`. Undefined (and unused) for
    /// composite types -- the lowering never calls this on them.
    pub fn default_value(&self, ty: &Type, context: &'ctx Context) -> Option<BasicValueEnum<'ctx>> {
        match ty {
            Type::Int => Some(context.i32_type().const_int(0, true).into()),
            Type::Float => Some(context.f32_type().const_float(0.0).into()),
            _ => None,
        }
    }

    // -- Coercion ----------------------------------------------------------

    /// `coerce(l, r)`: identity if equal, else the symmetric table lookup.
    pub fn coerce(&self, l: &Type, r: &Type) -> Result<Type, LoweringError> {
        if l == r {
            return Ok(l.clone());
        }
        let lk = NumKind::of_surface_type(l);
        let rk = NumKind::of_surface_type(r);
        let result = match (lk, rk) {
            (Some(lk), Some(rk)) => self.coerce_kind(lk, rk),
            _ => None,
        };
        match result {
            Some(NumKind::Int) => Ok(Type::Int),
            Some(NumKind::Float) => Ok(Type::Float),
            _ => Err(LoweringError::NoConversion {
                left: format!("{l:?}"),
                right: format!("{r:?}"),
            }),
        }
    }

    pub fn coerce_kind(&self, l: NumKind, r: NumKind) -> Option<NumKind> {
        if l == r {
            return Some(l);
        }
        self.coerce_tab
            .get(&(l, r))
            .or_else(|| self.coerce_tab.get(&(r, l)))
            .copied()
    }

    // -- Casts ---------------------------------------------------------------

    /// `cast(value, target)`: identity if `value` is already that kind,
    /// else emit the opcode the cast table selects.
    pub fn cast(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        value: BasicValueEnum<'ctx>,
        target: NumKind,
        context: &'ctx Context,
    ) -> Result<BasicValueEnum<'ctx>, LoweringError> {
        let source = NumKind::of_value(value, context).ok_or_else(|| {
            LoweringError::TypeError("cast source is not a numeric value".to_string())
        })?;
        if source == target {
            return Ok(value);
        }

        let op = self
            .cast_tab
            .get(&(source, target))
            .copied()
            .ok_or_else(|| LoweringError::UnknownCast {
                from: source.to_string(),
                to: target.to_string(),
            })?;

        let target_ir = self.ir_type_of_kind(target, context);
        let result = match op {
            CastOp::SIToFP => builder
                .build_signed_int_to_float(value.into_int_value(), target_ir.into_float_type(), "cast")
                .map_err(crate::error::llvm_err)?
                .into(),
            CastOp::FPExt => builder
                .build_float_ext(value.into_float_value(), target_ir.into_float_type(), "cast")
                .map_err(crate::error::llvm_err)?
                .into(),
            CastOp::FPToSI => builder
                .build_float_to_signed_int(value.into_float_value(), target_ir.into_int_type(), "cast")
                .map_err(crate::error::llvm_err)?
                .into(),
        };
        Ok(result)
    }

    /// Cast `value` to the LLVM representation of surface type `ty`, if
    /// `ty` is numeric. Non-numeric targets (`Bool` aside, which is an
    /// identity cast when already bool) return `value` unchanged --
    /// `String`/`Array`/`Struct` slots are never cast, only stored as-is.
    pub fn cast_to(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        value: BasicValueEnum<'ctx>,
        ty: &Type,
        context: &'ctx Context,
    ) -> Result<BasicValueEnum<'ctx>, LoweringError> {
        match NumKind::of_surface_type(ty) {
            Some(target) => self.cast(builder, value, target, context),
            None => Ok(value),
        }
    }

    /// Cast `value` to match an already-lowered LLVM type, used where only
    /// an `inkwell` `BasicTypeEnum` (not a surface `Type`) is in hand --
    /// e.g. coercing subsequent array-literal elements to the first
    /// element's type (SPEC_FULL.md §4.4 supplement #2).
    pub fn cast_to_llvm_type(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        value: BasicValueEnum<'ctx>,
        target: BasicTypeEnum<'ctx>,
        context: &'ctx Context,
    ) -> Result<BasicValueEnum<'ctx>, LoweringError> {
        if value.get_type() == target {
            return Ok(value);
        }
        let target_kind = match target {
            BasicTypeEnum::IntType(t) if t.get_bit_width() == 1 => NumKind::Bool,
            BasicTypeEnum::IntType(_) => NumKind::Int,
            BasicTypeEnum::FloatType(t) if t == context.f32_type() => NumKind::Float,
            BasicTypeEnum::FloatType(t) if t == context.f64_type() => NumKind::Double,
            _ => {
                return Err(LoweringError::NoConversion {
                    left: format!("{:?}", value.get_type()),
                    right: format!("{target:?}"),
                })
            }
        };
        self.cast(builder, value, target_kind, context)
    }

    fn ir_type_of_kind(&self, kind: NumKind, context: &'ctx Context) -> BasicTypeEnum<'ctx> {
        match kind {
            NumKind::Int => context.i32_type().into(),
            NumKind::Float => context.f32_type().into(),
            NumKind::Double => context.f64_type().into(),
            NumKind::Bool => context.bool_type().into(),
        }
    }

    // -- Arithmetic / comparison ----------------------------------------------

    /// True iff `(kind, op)` has a defined arithmetic opcode. Populated
    /// only for `Int`/`Float`/`Double` -- a `BinaryOp` coerced to `Bool`
    /// has no entry (SPEC_FULL.md §4.4 supplement #1).
    pub fn has_math_op(&self, kind: NumKind, op: ArithOp) -> bool {
        self.math_op_tab.contains(&(kind, op))
    }

    pub fn emit_arith(
        &self,
        builder: &inkwell::builder::Builder<'ctx>,
        kind: NumKind,
        op: ArithOp,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, LoweringError> {
        if !self.has_math_op(kind, op) {
            return Err(LoweringError::TypeError(format!(
                "arithmetic is undefined for {kind}"
            )));
        }

        let value = if self.is_fp(kind) {
            let l = lhs.into_float_value();
            let r = rhs.into_float_value();
            match op {
                ArithOp::Add => builder.build_float_add(l, r, "fadd"),
                ArithOp::Sub => builder.build_float_sub(l, r, "fsub"),
                ArithOp::Mul => builder.build_float_mul(l, r, "fmul"),
                ArithOp::Div => builder.build_float_div(l, r, "fdiv"),
                ArithOp::Rem => builder.build_float_rem(l, r, "frem"),
            }
            .map_err(crate::error::llvm_err)?
            .into()
        } else {
            let l = lhs.into_int_value();
            let r = rhs.into_int_value();
            match op {
                ArithOp::Add => builder.build_int_add(l, r, "iadd"),
                ArithOp::Sub => builder.build_int_sub(l, r, "isub"),
                ArithOp::Mul => builder.build_int_mul(l, r, "imul"),
                ArithOp::Div => builder.build_int_signed_div(l, r, "idiv"),
                ArithOp::Rem => builder.build_int_signed_rem(l, r, "irem"),
            }
            .map_err(crate::error::llvm_err)?
            .into()
        };
        Ok(value)
    }

    /// `is_fp(t)`: true iff `t` is not the integer kind. Mirrors the
    /// original's `isFP: type != intTy` literally.
    pub fn is_fp(&self, kind: NumKind) -> bool {
        !matches!(kind, NumKind::Int)
    }

    pub fn int_predicate(op: CmpOp) -> IntPredicate {
        match op {
            CmpOp::Eq => IntPredicate::EQ,
            CmpOp::Ne => IntPredicate::NE,
            CmpOp::Lt => IntPredicate::SLT,
            CmpOp::Gt => IntPredicate::SGT,
            CmpOp::Le => IntPredicate::SLE,
            CmpOp::Ge => IntPredicate::SGE,
        }
    }

    pub fn float_predicate(op: CmpOp) -> FloatPredicate {
        match op {
            CmpOp::Eq => FloatPredicate::OEQ,
            CmpOp::Ne => FloatPredicate::ONE,
            CmpOp::Lt => FloatPredicate::OLT,
            CmpOp::Gt => FloatPredicate::OGT,
            CmpOp::Le => FloatPredicate::OLE,
            CmpOp::Ge => FloatPredicate::OGE,
        }
    }

    // -- Struct registry ----------------------------------------------------

    /// Register a struct's opaque-then-bodied LLVM type and its ordered
    /// member names. Fails if the name is already registered.
    pub fn register_struct(
        &mut self,
        context: &'ctx Context,
        name: &str,
        member_types: &[BasicTypeEnum<'ctx>],
        member_names: Vec<String>,
    ) -> Result<StructType<'ctx>, CoreError> {
        if self.structs.contains_key(name) {
            return Err(CoreError::DuplicateStructName {
                name: name.to_string(),
            });
        }
        let st = context.opaque_struct_type(name);
        st.set_body(member_types, false);
        self.structs.insert(name.to_string(), (st, member_names));
        Ok(st)
    }

    pub fn struct_type(&self, name: &str) -> Result<StructType<'ctx>, CoreError> {
        self.structs
            .get(name)
            .map(|(t, _)| *t)
            .ok_or_else(|| CoreError::StructNotFound {
                name: name.to_string(),
            })
    }

    /// `member_index(struct_name, member_name) -> i`.
    pub fn member_index(&self, struct_name: &str, member_name: &str) -> Result<usize, LoweringError> {
        let (_, members) = self
            .structs
            .get(struct_name)
            .ok_or_else(|| CoreError::StructNotFound {
                name: struct_name.to_string(),
            })?;
        members
            .iter()
            .position(|m| m == member_name)
            .ok_or_else(|| LoweringError::UnknownMember {
                struct_name: struct_name.to_string(),
                member: member_name.to_string(),
            })
    }
}

impl Default for TypeSys<'_> {
    fn default() -> Self {
        Self::new()
    }
}
