//! Operators for vigil expressions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    // Comparison operators
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,

    // Arithmetic operators
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Logical operators, short-circuiting
    /// `and` / `&&`
    And,
    /// `or` / `||`
    Or,

    // String operators
    Contains,
    StartsWith,
    EndsWith,
    /// `matches`, regex search on the left operand
    Regex,

    // Membership operators
    /// In (element in array, substring in string, key in object)
    In,
    NotIn,
}

impl Operator {
    /// Returns true if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Ne | Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le
        )
    }

    /// Returns true if this is an arithmetic operator
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Mod
        )
    }

    /// Returns true if this is a logical operator
    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }

    /// Source form used in error messages and when rendering expressions
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::Regex => "matches",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_is_comparison() {
        assert!(Operator::Eq.is_comparison());
        assert!(Operator::Ge.is_comparison());
        assert!(!Operator::Add.is_comparison());
        assert!(!Operator::In.is_comparison());
    }

    #[test]
    fn test_operator_is_arithmetic() {
        assert!(Operator::Mod.is_arithmetic());
        assert!(!Operator::Eq.is_arithmetic());
    }

    #[test]
    fn test_operator_is_logical() {
        assert!(Operator::And.is_logical());
        assert!(Operator::Or.is_logical());
        assert!(!Operator::NotIn.is_logical());
    }

    #[test]
    fn test_operator_symbol() {
        assert_eq!(Operator::Ge.to_string(), ">=");
        assert_eq!(Operator::NotIn.to_string(), "not in");
        assert_eq!(Operator::Regex.to_string(), "matches");
    }
}
