//! The VFS surface type system.
//!
//! Five scalar/void kinds plus two structural kinds (array, struct). Unlike
//! lmlang's nominal [`TypeId`]-addressed types, VFS types are small enough to
//! be represented structurally -- a `Type` value is self-describing and never
//! needs a registry lookup to know its own shape. Struct *member* layout is
//! the one thing that does need a registry, held separately by `TypeSys` in
//! `vfs-codegen` (this crate has no LLVM dependency and does not compute IR
//! types itself).

use serde::{Deserialize, Serialize};

use crate::id::ExprId;

/// A VFS surface type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    /// `size` is the array-length expression from the declaration site
    /// (e.g. `Integer(4)`), kept as an `ExprId` rather than a resolved
    /// constant so that lowering -- which already knows how to evaluate a
    /// constant integer expression -- is the single place that interprets it.
    Array { element: Box<Type>, size: ExprId },
    /// Struct types are nominal: two `Struct` values are the same type iff
    /// their names match. Field layout lives in the struct declaration, not
    /// here.
    Struct { name: String },
}

impl Type {
    pub fn array(element: Type, size: ExprId) -> Type {
        Type::Array {
            element: Box::new(element),
            size,
        }
    }

    pub fn struct_named(name: impl Into<String>) -> Type {
        Type::Struct { name: name.into() }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct { .. })
    }

    /// True for the two types that admit arithmetic/coercion (`Int`,
    /// `Float`). Mirrors the original's `isFP`-adjacent numeric check, kept
    /// here since it is purely a property of the surface type and doesn't
    /// need an LLVM context.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_fp(&self) -> bool {
        matches!(self, Type::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_constructor_boxes_element() {
        let t = Type::array(Type::Int, ExprId(0));
        match t {
            Type::Array { element, size } => {
                assert_eq!(*element, Type::Int);
                assert_eq!(size, ExprId(0));
            }
            _ => panic!("expected Array"),
        }
    }

    #[test]
    fn struct_named_constructor() {
        let t = Type::struct_named("Point");
        assert!(t.is_struct());
        assert!(!t.is_array());
    }

    #[test]
    fn numeric_classification() {
        assert!(Type::Int.is_numeric());
        assert!(Type::Float.is_numeric());
        assert!(!Type::Bool.is_numeric());
        assert!(!Type::String.is_numeric());
        assert!(!Type::Void.is_numeric());
    }

    #[test]
    fn fp_classification_matches_original_isfp() {
        // original_source TypeSys::isFP is literally `type != intTy`; here
        // only Float is a floating-point surface type (no separate double).
        assert!(Type::Float.is_fp());
        assert!(!Type::Int.is_fp());
        assert!(!Type::Bool.is_fp());
    }

    #[test]
    fn serde_roundtrip_scalar() {
        for ty in [Type::Int, Type::Float, Type::Bool, Type::String, Type::Void] {
            let json = serde_json::to_string(&ty).unwrap();
            let back: Type = serde_json::from_str(&json).unwrap();
            assert_eq!(ty, back);
        }
    }

    #[test]
    fn serde_roundtrip_array_and_struct() {
        let arr = Type::array(Type::array(Type::Int, ExprId(1)), ExprId(2));
        let json = serde_json::to_string(&arr).unwrap();
        let back: Type = serde_json::from_str(&json).unwrap();
        assert_eq!(arr, back);

        let st = Type::struct_named("Vec3");
        let json = serde_json::to_string(&st).unwrap();
        let back: Type = serde_json::from_str(&json).unwrap();
        assert_eq!(st, back);
    }
}
