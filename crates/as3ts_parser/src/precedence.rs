//! Operator precedence for binary operators.

use as3ts_ast::NodeKind;

/// Binary precedence levels, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    LogicalOr = 0,
    LogicalAnd = 1,
    BitwiseOr = 2,
    BitwiseXor = 3,
    BitwiseAnd = 4,
    Equality = 5,
    Relational = 6,
    Shift = 7,
    Additive = 8,
    Multiplicative = 9,
}

impl OperatorPrecedence {
    pub const LOWEST: OperatorPrecedence = OperatorPrecedence::LogicalOr;

    /// The next tighter level, or `None` past multiplicative (unary follows).
    pub fn next(self) -> Option<OperatorPrecedence> {
        use OperatorPrecedence::*;
        Some(match self {
            LogicalOr => LogicalAnd,
            LogicalAnd => BitwiseOr,
            BitwiseOr => BitwiseXor,
            BitwiseXor => BitwiseAnd,
            BitwiseAnd => Equality,
            Equality => Relational,
            Relational => Shift,
            Shift => Additive,
            Additive => Multiplicative,
            Multiplicative => return None,
        })
    }

    /// Node kind for a flat operand/operator list at this level.
    pub fn node_kind(self) -> NodeKind {
        use OperatorPrecedence::*;
        match self {
            LogicalOr => NodeKind::Or,
            LogicalAnd => NodeKind::And,
            BitwiseOr => NodeKind::BOr,
            BitwiseXor => NodeKind::BXor,
            BitwiseAnd => NodeKind::BAnd,
            Equality => NodeKind::Equality,
            Relational => NodeKind::Relation,
            Shift => NodeKind::Shift,
            Additive => NodeKind::Add,
            Multiplicative => NodeKind::Multiplication,
        }
    }
}

/// Get the binary operator precedence for a token text.
///
/// `allow_in` is false in a `for` header, where `in` separates the loop
/// variable from the container.
pub fn get_binary_operator_precedence(text: &str, allow_in: bool) -> Option<OperatorPrecedence> {
    Some(match text {
        "||" => OperatorPrecedence::LogicalOr,
        "&&" => OperatorPrecedence::LogicalAnd,
        "|" => OperatorPrecedence::BitwiseOr,
        "^" => OperatorPrecedence::BitwiseXor,
        "&" => OperatorPrecedence::BitwiseAnd,
        "==" | "!=" | "===" | "!==" => OperatorPrecedence::Equality,
        "<" | ">" | "<=" | ">=" | "instanceof" | "is" | "as" => OperatorPrecedence::Relational,
        "in" if allow_in => OperatorPrecedence::Relational,
        "<<" | ">>" | ">>>" => OperatorPrecedence::Shift,
        "+" | "-" => OperatorPrecedence::Additive,
        "*" | "/" | "%" => OperatorPrecedence::Multiplicative,
        _ => return None,
    })
}

/// Whether `text` is an assignment operator.
pub fn is_assignment_operator(text: &str) -> bool {
    matches!(
        text,
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "<<=" | ">>=" | ">>>=" | "&=" | "|=" | "^="
            | "&&=" | "||="
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        let add = get_binary_operator_precedence("+", true).unwrap();
        let mul = get_binary_operator_precedence("*", true).unwrap();
        assert!(mul > add);
        assert_eq!(get_binary_operator_precedence("in", false), None);
        assert_eq!(
            get_binary_operator_precedence("as", true),
            Some(OperatorPrecedence::Relational)
        );
    }

    #[test]
    fn test_level_chain_ends_at_multiplicative() {
        let mut level = OperatorPrecedence::LOWEST;
        let mut count = 1;
        while let Some(next) = level.next() {
            level = next;
            count += 1;
        }
        assert_eq!(count, 10);
        assert_eq!(level.node_kind(), NodeKind::Multiplication);
    }
}
