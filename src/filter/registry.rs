//! Operator registry: trait objects for unary/binary filter operators,
//! keyed by lowered keyword (spec.md §9's design note).

use crate::container::Value;

pub trait UnaryOperator: Send + Sync {
    fn op(&self) -> &'static str;
    fn matches(&self, value: &Value) -> bool;
    fn supported_scim_types(&self) -> &'static [&'static str];
}

pub trait BinaryOperator: Send + Sync {
    fn op(&self) -> &'static str;
    fn supported_scim_types(&self) -> &'static [&'static str];
}

struct Present;

impl UnaryOperator for Present {
    fn op(&self) -> &'static str {
        "pr"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_present()
    }

    fn supported_scim_types(&self) -> &'static [&'static str] {
        &["string", "boolean", "integer", "decimal", "dateTime", "binary", "reference", "complex"]
    }
}

macro_rules! binary_op {
    ($name:ident, $kw:literal, $types:expr) => {
        struct $name;
        impl BinaryOperator for $name {
            fn op(&self) -> &'static str {
                $kw
            }
            fn supported_scim_types(&self) -> &'static [&'static str] {
                $types
            }
        }
    };
}

const EQ_NE_TYPES: &[&str] =
    &["string", "decimal", "integer", "boolean", "dateTime", "binary", "reference", "complex"];
const CO_SW_EW_TYPES: &[&str] = &["string", "reference", "complex"];
const ORDER_TYPES: &[&str] = &["string", "dateTime", "integer", "decimal", "complex"];

binary_op!(Equal, "eq", EQ_NE_TYPES);
binary_op!(NotEqual, "ne", EQ_NE_TYPES);
binary_op!(Contains, "co", CO_SW_EW_TYPES);
binary_op!(StartsWith, "sw", CO_SW_EW_TYPES);
binary_op!(EndsWith, "ew", CO_SW_EW_TYPES);
binary_op!(GreaterThan, "gt", ORDER_TYPES);
binary_op!(GreaterThanOrEqual, "ge", ORDER_TYPES);
binary_op!(LesserThan, "lt", ORDER_TYPES);
binary_op!(LesserThanOrEqual, "le", ORDER_TYPES);

/// Pre-registers `pr` and the nine binary operators onto `catalog`.
pub fn register_builtins(catalog: &mut crate::schema::catalog::Catalog) {
    catalog.register_unary_operator("pr", Box::new(Present)).expect("builtin operator registration");
    catalog.register_binary_operator("eq", Box::new(Equal)).expect("builtin operator registration");
    catalog.register_binary_operator("ne", Box::new(NotEqual)).expect("builtin operator registration");
    catalog.register_binary_operator("co", Box::new(Contains)).expect("builtin operator registration");
    catalog.register_binary_operator("sw", Box::new(StartsWith)).expect("builtin operator registration");
    catalog.register_binary_operator("ew", Box::new(EndsWith)).expect("builtin operator registration");
    catalog.register_binary_operator("gt", Box::new(GreaterThan)).expect("builtin operator registration");
    catalog.register_binary_operator("ge", Box::new(GreaterThanOrEqual)).expect("builtin operator registration");
    catalog.register_binary_operator("lt", Box::new(LesserThan)).expect("builtin operator registration");
    catalog.register_binary_operator("le", Box::new(LesserThanOrEqual)).expect("builtin operator registration");
}
