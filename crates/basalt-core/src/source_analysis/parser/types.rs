// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Type parsing for Basalt.
//!
//! Types are parsed greedily: a dotted name core, then pointer and
//! array suffixes. Array ranks record their dimension expressions, so
//! the same routine serves type positions (`int[]`), array creations
//! (`new int[n]`), and the speculative check that tells a declaration
//! prefix from an element access (`a[0]`).

use crate::syntax_tree::{
    ArrayRankSpecifier, ArrayType, EmptyExpression, Expression, PointerType, PredefinedType,
    QualifiedType, SeparatedList, SimpleType, Type,
};

use super::{Parser, TokenKind};

impl Parser<'_> {
    /// Parses a full type: core, pointer, and array suffixes.
    pub(super) fn parse_type(&mut self) -> Type {
        let core = self.parse_non_array_type();
        if self.at(TokenKind::OpenBracket) {
            self.parse_array_type(core)
        } else {
            core
        }
    }

    /// Parses a type without array suffixes: a predefined-type keyword
    /// or a dotted name, then any pointer suffixes.
    pub(super) fn parse_non_array_type(&mut self) -> Type {
        let mut result = self.parse_type_core();
        while self.at(TokenKind::Asterisk) {
            result = Type::Pointer(PointerType {
                element: Box::new(result),
                asterisk: self.take_token(),
            });
        }
        result
    }

    /// Parses the type core, reporting `"Type expected"` when the
    /// current token cannot start a type.
    fn parse_type_core(&mut self) -> Type {
        if self.current_kind().is_predefined_type() {
            return Type::Predefined(PredefinedType {
                keyword: self.take_token(),
            });
        }
        if self.at(TokenKind::Identifier) {
            return self.parse_qualified_name();
        }

        self.report_at_current("Type expected");
        self.in_recovery = true;
        Type::Simple(SimpleType {
            identifier: self.synthesize(TokenKind::Identifier),
        })
    }

    /// Parses a dotted name: `A`, `A.B`, `A.B.C`. Also used for
    /// namespace names, using directives, and attribute names.
    pub(super) fn parse_qualified_name(&mut self) -> Type {
        let mut result = Type::Simple(SimpleType {
            identifier: self.expect_identifier(),
        });
        while self.at(TokenKind::Dot) && self.lookahead_kind() == TokenKind::Identifier {
            let dot = self.take_token();
            let name = SimpleType {
                identifier: self.take_token(),
            };
            result = Type::Qualified(QualifiedType {
                qualifier: Box::new(result),
                dot,
                name,
            });
        }
        result
    }

    /// Parses one or more array rank specifiers onto an element type.
    ///
    /// Each rank is a separated list of dimension expressions. `[]`
    /// holds no slots, `[,]` holds one [`Expression::Empty`] per slot.
    /// The resulting type is valid in type position only when no rank
    /// carries a real dimension expression.
    pub(super) fn parse_array_type(&mut self, element: Type) -> Type {
        let mut rank_specifiers = Vec::new();
        let mut is_valid_type = true;

        while self.at(TokenKind::OpenBracket) {
            let open_bracket = self.take_token();
            let mut sizes = SeparatedList::new();

            if !self.at(TokenKind::CloseBracket) {
                loop {
                    let size = if self.at(TokenKind::Comma) || self.at(TokenKind::CloseBracket) {
                        Expression::Empty(EmptyExpression {
                            position: self.current_span().start(),
                        })
                    } else {
                        is_valid_type = false;
                        self.parse_expression()
                    };
                    sizes.elements.push(size);

                    if self.at(TokenKind::Comma) {
                        sizes.separators.push(self.take_token());
                    } else {
                        break;
                    }
                }
            }

            let close_bracket = self.expect(TokenKind::CloseBracket);
            rank_specifiers.push(ArrayRankSpecifier {
                open_bracket,
                sizes,
                close_bracket,
            });
        }

        Type::Array(ArrayType {
            element: Box::new(element),
            rank_specifiers,
            is_valid_type,
        })
    }
}
