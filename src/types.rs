//! SPL's two-member type system: primitives and fixed-size arrays.

use std::rc::Rc;
use std::sync::OnceLock;

/// A resolved SPL type.
///
/// Types are structurally compared: two arrays with equal length and
/// equal element type are the same type even if declared separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A primitive type such as `int` or the comparison-only `bool`.
    Primitive {
        /// The type's display name (`"int"`, `"boolean"`).
        name: &'static str,
        /// Size of a value of this type, in bytes.
        byte_size: u32,
    },
    /// A fixed-length array of some element type.
    Array {
        /// The element type.
        element: Rc<Type>,
        /// Number of elements.
        length: u32,
        /// `length * element.byte_size()`.
        byte_size: u32,
    },
}

impl Type {
    /// Builds the `int` primitive type (4 bytes, an ECO32 word).
    pub fn int() -> Rc<Type> {
        static INT: OnceLock<Rc<Type>> = OnceLock::new();
        INT.get_or_init(|| {
            Rc::new(Type::Primitive {
                name: "int",
                byte_size: 4,
            })
        })
        .clone()
    }

    /// Builds the `boolean` type. Never appears in source declarations;
    /// it only arises as the result type of a comparison expression.
    pub fn boolean() -> Rc<Type> {
        static BOOL: OnceLock<Rc<Type>> = OnceLock::new();
        BOOL.get_or_init(|| {
            Rc::new(Type::Primitive {
                name: "boolean",
                byte_size: 4,
            })
        })
        .clone()
    }

    /// Builds a new array type of `length` elements of `element`.
    pub fn array(element: Rc<Type>, length: u32) -> Type {
        let byte_size = length * element.byte_size();
        Type::Array {
            element,
            length,
            byte_size,
        }
    }

    /// Size in bytes of a value of this type.
    pub fn byte_size(&self) -> u32 {
        match self {
            Type::Primitive { byte_size, .. } => *byte_size,
            Type::Array { byte_size, .. } => *byte_size,
        }
    }

    /// True if this is the `int` primitive.
    pub fn is_int(&self) -> bool {
        matches!(self, Type::Primitive { name, .. } if *name == "int")
    }

    /// True if this is the `boolean` primitive.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Type::Primitive { name, .. } if *name == "boolean")
    }

    /// True if this is an array type.
    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    /// The element type of an array, or `None` for primitives.
    pub fn element(&self) -> Option<&Rc<Type>> {
        match self {
            Type::Array { element, .. } => Some(element),
            Type::Primitive { .. } => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Primitive { name, .. } => write!(f, "{name}"),
            Type::Array {
                element, length, ..
            } => write!(f, "array [{length}] of {element}"),
        }
    }
}

/// A single formal parameter's resolved type/reference-ness/frame offset.
///
/// Offset assignment happens in the variable allocator (stage 5); until
/// then it is left at zero.
#[derive(Debug, Clone)]
pub struct ParamType {
    pub ty: Rc<Type>,
    pub is_ref: bool,
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_byte_size_is_length_times_element_size() {
        let arr = Type::array(Type::int(), 4);
        assert_eq!(arr.byte_size(), 16);
    }

    #[test]
    fn zero_length_array_has_zero_byte_size() {
        let arr = Type::array(Type::int(), 0);
        assert_eq!(arr.byte_size(), 0);
    }

    #[test]
    fn int_and_boolean_are_distinct() {
        assert_ne!(Type::int(), Type::boolean());
    }

    #[test]
    fn arrays_compare_structurally() {
        let a = Type::array(Type::int(), 3);
        let b = Type::array(Type::int(), 3);
        assert_eq!(a, b);
        let c = Type::array(Type::int(), 4);
        assert_ne!(a, c);
    }

    #[test]
    fn nested_array_element_resolves_to_base() {
        let inner = Rc::new(Type::array(Type::int(), 2));
        let outer = Type::array(inner.clone(), 3);
        assert_eq!(outer.element(), Some(&inner));
        assert_eq!(inner.element(), Some(&Type::int()));
    }
}
