// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing for Basalt.
//!
//! Precedence climbing over a binding-power table, lowest to highest:
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | (top) | `=` and compound assignment | Right |
//! | (top) | `? :` | Right |
//! | 1  | `\|\|` | Left |
//! | 2  | `&&` | Left |
//! | 3  | `\|` | Left |
//! | 4  | `&` | Left |
//! | 5  | `^` | Left |
//! | 6  | `==` `!=` | Left |
//! | 7  | `<` `<=` `>` `>=` `is` `as` | Left |
//! | 8  | `<<` `>>` | Left |
//! | 9  | `+` `-` | Left |
//! | 10 | `*` `/` `%` | Left |
//!
//! `is`/`as` take a type on the right-hand side. Casts are disambiguated
//! from parenthesized expressions by speculation: consume a type after
//! `(`, and accept only when `)` follows and the next token can start a
//! unary operand.

use crate::syntax_tree::{
    ArrayCreationExpression, ArrayInitializerExpression, AsExpression, AssignmentExpression,
    BaseExpression, BinaryExpression, CastExpression, CheckedExpression, ConditionalExpression,
    ElementAccessExpression, ErrorExpression, Expression, IdentifierExpression,
    InvocationExpression, IsExpression, LiteralExpression, MemberAccessExpression,
    ObjectCreationExpression, ParenthesizedExpression, PointerMemberAccessExpression,
    PostfixUnaryExpression, PredefinedTypeExpression, PrefixUnaryExpression, SeparatedList,
    SizeOfExpression, StackAllocExpression, ThisExpression, TypeOfExpression,
};

use super::{Parser, TokenKind};

/// Binding power for binary operators; higher binds tighter. `None`
/// ends binary parsing, which doubles as a recovery point.
fn binary_precedence(kind: TokenKind) -> Option<u8> {
    let precedence = match kind {
        TokenKind::BarBar => 1,
        TokenKind::AmpersandAmpersand => 2,
        TokenKind::Bar => 3,
        TokenKind::Ampersand => 4,
        TokenKind::Caret => 5,
        TokenKind::EqualsEquals | TokenKind::BangEquals => 6,
        TokenKind::Less
        | TokenKind::LessEquals
        | TokenKind::Greater
        | TokenKind::GreaterEquals
        | TokenKind::Is
        | TokenKind::As => 7,
        TokenKind::LessLess | TokenKind::GreaterGreater => 8,
        TokenKind::Plus | TokenKind::Minus => 9,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => 10,
        _ => return None,
    };
    Some(precedence)
}

/// Returns whether `kind` may begin the operand of a cast: a unary or
/// primary starter. `is`/`as` are excluded so `(x) is T` stays a
/// parenthesized expression.
fn is_cast_follow(kind: TokenKind) -> bool {
    match kind {
        TokenKind::Tilde
        | TokenKind::Bang
        | TokenKind::Identifier
        | TokenKind::NumericLiteral
        | TokenKind::StringLiteral
        | TokenKind::CharacterLiteral
        | TokenKind::OpenParen => true,
        TokenKind::Is | TokenKind::As => false,
        kind => kind.is_keyword(),
    }
}

impl Parser<'_> {
    /// Parses any expression.
    ///
    /// Grows the stack on demand; the nesting guard bounds recursion, so
    /// pathological nesting reports a diagnostic instead of overflowing.
    pub(super) fn parse_expression(&mut self) -> Expression {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            if !self.enter_nesting() {
                return Expression::Error(ErrorExpression {
                    position: self.current_span().start(),
                });
            }
            let expression = self.parse_assignment_expression();
            self.leave_nesting();
            expression
        })
    }

    /// Parses an assignment (right-associative) or anything below it.
    fn parse_assignment_expression(&mut self) -> Expression {
        let target = self.parse_conditional_expression();
        if self.current_kind().is_assignment_operator() {
            let operator = self.take_token();
            // Guard the right recursion against `a = b = c = ...` chains
            let value = if self.enter_nesting() {
                let value = self.parse_assignment_expression();
                self.leave_nesting();
                value
            } else {
                Expression::Error(ErrorExpression {
                    position: self.current_span().start(),
                })
            };
            return Expression::Assignment(AssignmentExpression {
                target: Box::new(target),
                operator,
                value: Box::new(value),
            });
        }
        target
    }

    /// Parses `condition ? whenTrue : whenFalse` (right-associative) or
    /// anything below it.
    fn parse_conditional_expression(&mut self) -> Expression {
        let condition = self.parse_binary_expression(0);
        if self.at(TokenKind::Question) {
            let question = self.take_token();
            let when_true = self.parse_expression();
            let colon = self.expect(TokenKind::Colon);
            let when_false = self.parse_expression();
            return Expression::Conditional(ConditionalExpression {
                condition: Box::new(condition),
                question,
                when_true: Box::new(when_true),
                colon,
                when_false: Box::new(when_false),
            });
        }
        condition
    }

    /// Precedence-climbing loop over binary operators. `is`/`as` bind
    /// at relational level and take a type operand.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Expression {
        let mut left = self.parse_unary_expression();
        loop {
            let kind = self.current_kind();
            let Some(precedence) = binary_precedence(kind) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }

            if kind == TokenKind::Is {
                let keyword = self.take_token();
                let target_type = self.parse_type();
                left = Expression::Is(IsExpression {
                    operand: Box::new(left),
                    keyword,
                    target_type,
                });
                continue;
            }
            if kind == TokenKind::As {
                let keyword = self.take_token();
                let target_type = self.parse_type();
                left = Expression::As(AsExpression {
                    operand: Box::new(left),
                    keyword,
                    target_type,
                });
                continue;
            }

            let operator = self.take_token();
            let right = self.parse_binary_expression(precedence + 1);
            left = Expression::Binary(BinaryExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            });
        }
        left
    }

    /// Parses prefix operators and casts.
    fn parse_unary_expression(&mut self) -> Expression {
        match self.current_kind() {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Asterisk
            | TokenKind::Ampersand
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => {
                let operator = self.take_token();
                // Guard the recursion against `!!!!...` chains
                let operand = if self.enter_nesting() {
                    let operand = self.parse_unary_expression();
                    self.leave_nesting();
                    operand
                } else {
                    Expression::Error(ErrorExpression {
                        position: self.current_span().start(),
                    })
                };
                Expression::PrefixUnary(PrefixUnaryExpression {
                    operator,
                    operand: Box::new(operand),
                })
            }
            TokenKind::OpenParen => match self.try_parse_cast_expression() {
                Some(cast) => cast,
                None => self.parse_postfix_expression(),
            },
            _ => self.parse_postfix_expression(),
        }
    }

    /// Speculatively parses `(Type)` and commits to a cast only when
    /// the close parenthesis is present, the type shape is valid in
    /// type position, and the next token can start the operand.
    fn try_parse_cast_expression(&mut self) -> Option<Expression> {
        let speculation = self.begin_speculation();

        let open_paren = self.take_token();
        let target_type = self.parse_type();

        if self.in_recovery || !target_type.is_valid_type() || !self.at(TokenKind::CloseParen) {
            self.abort_speculation(speculation);
            return None;
        }
        let close_paren = self.take_token();

        if !is_cast_follow(self.current_kind()) {
            self.abort_speculation(speculation);
            return None;
        }
        self.commit_speculation(speculation);

        // Guard the recursion against `(T)(T)(T)...` chains
        let operand = if self.enter_nesting() {
            let operand = self.parse_unary_expression();
            self.leave_nesting();
            operand
        } else {
            Expression::Error(ErrorExpression {
                position: self.current_span().start(),
            })
        };
        Some(Expression::Cast(CastExpression {
            open_paren,
            target_type,
            close_paren,
            operand: Box::new(operand),
        }))
    }

    /// Parses a primary expression and its postfix suffixes.
    fn parse_postfix_expression(&mut self) -> Expression {
        let mut expression = self.parse_primary_expression();
        loop {
            match self.current_kind() {
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    expression = Expression::PostfixUnary(PostfixUnaryExpression {
                        operand: Box::new(expression),
                        operator: self.take_token(),
                    });
                }
                TokenKind::Dot => {
                    let dot = self.take_token();
                    let name = self.expect_identifier();
                    expression = Expression::MemberAccess(MemberAccessExpression {
                        operand: Box::new(expression),
                        dot,
                        name,
                    });
                }
                TokenKind::Arrow => {
                    let arrow = self.take_token();
                    let name = self.expect_identifier();
                    expression = Expression::PointerMemberAccess(PointerMemberAccessExpression {
                        operand: Box::new(expression),
                        arrow,
                        name,
                    });
                }
                TokenKind::OpenParen => {
                    let open_paren = self.take_token();
                    let arguments = self.parse_argument_list(TokenKind::CloseParen);
                    let close_paren = self.expect(TokenKind::CloseParen);
                    expression = Expression::Invocation(InvocationExpression {
                        callee: Box::new(expression),
                        open_paren,
                        arguments,
                        close_paren,
                    });
                }
                TokenKind::OpenBracket => {
                    let open_bracket = self.take_token();
                    let arguments = self.parse_argument_list(TokenKind::CloseBracket);
                    if arguments.is_empty() {
                        self.report_at_current("Expected expression");
                    }
                    let close_bracket = self.expect(TokenKind::CloseBracket);
                    expression = Expression::ElementAccess(ElementAccessExpression {
                        operand: Box::new(expression),
                        open_bracket,
                        arguments,
                        close_bracket,
                    });
                }
                _ => break,
            }
        }
        expression
    }

    /// Parses a comma-separated argument list, stopping before
    /// `terminator`. Empty when the terminator is already current.
    pub(super) fn parse_argument_list(
        &mut self,
        terminator: TokenKind,
    ) -> SeparatedList<Expression> {
        let mut arguments = SeparatedList::new();
        if self.at(terminator) || self.at(TokenKind::EndOfFile) {
            return arguments;
        }
        loop {
            arguments.elements.push(self.parse_expression());
            if self.at(TokenKind::Comma) {
                arguments.separators.push(self.take_token());
            } else {
                break;
            }
            if self.at(terminator) || self.at(TokenKind::EndOfFile) {
                break;
            }
        }
        arguments
    }

    /// Parses a primary expression.
    fn parse_primary_expression(&mut self) -> Expression {
        match self.current_kind() {
            TokenKind::NumericLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharacterLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => Expression::Literal(LiteralExpression {
                token: self.take_token(),
            }),
            TokenKind::Identifier => Expression::Identifier(IdentifierExpression {
                identifier: self.take_token(),
            }),
            TokenKind::This => Expression::This(ThisExpression {
                keyword: self.take_token(),
            }),
            TokenKind::Base => Expression::Base(BaseExpression {
                keyword: self.take_token(),
            }),
            kind if kind.is_predefined_type() => {
                Expression::PredefinedType(PredefinedTypeExpression {
                    keyword: self.take_token(),
                })
            }
            TokenKind::OpenParen => {
                let open_paren = self.take_token();
                let expression = self.parse_expression();
                let close_paren = self.expect(TokenKind::CloseParen);
                Expression::Parenthesized(ParenthesizedExpression {
                    open_paren,
                    expression: Box::new(expression),
                    close_paren,
                })
            }
            TokenKind::New => self.parse_creation_expression(),
            TokenKind::Stackalloc => {
                let keyword = self.take_token();
                let element_type = self.parse_non_array_type();
                let open_bracket = self.expect(TokenKind::OpenBracket);
                let size = self.parse_expression();
                let close_bracket = self.expect(TokenKind::CloseBracket);
                Expression::StackAlloc(StackAllocExpression {
                    keyword,
                    element_type,
                    open_bracket,
                    size: Box::new(size),
                    close_bracket,
                })
            }
            TokenKind::Sizeof => {
                let keyword = self.take_token();
                let open_paren = self.expect(TokenKind::OpenParen);
                let measured_type = self.parse_type();
                let close_paren = self.expect(TokenKind::CloseParen);
                Expression::SizeOf(SizeOfExpression {
                    keyword,
                    open_paren,
                    measured_type,
                    close_paren,
                })
            }
            TokenKind::Typeof => {
                let keyword = self.take_token();
                let open_paren = self.expect(TokenKind::OpenParen);
                let inspected_type = self.parse_type();
                let close_paren = self.expect(TokenKind::CloseParen);
                Expression::TypeOf(TypeOfExpression {
                    keyword,
                    open_paren,
                    inspected_type,
                    close_paren,
                })
            }
            TokenKind::Checked => Expression::Checked(self.parse_checked_expression()),
            TokenKind::Unchecked => Expression::Unchecked(self.parse_checked_expression()),
            _ => {
                self.report_at_current("Expected expression");
                Expression::Error(ErrorExpression {
                    position: self.current_span().start(),
                })
            }
        }
    }

    fn parse_checked_expression(&mut self) -> CheckedExpression {
        let keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let expression = self.parse_expression();
        let close_paren = self.expect(TokenKind::CloseParen);
        CheckedExpression {
            keyword,
            open_paren,
            expression: Box::new(expression),
            close_paren,
        }
    }

    /// Parses `new T(...)` or `new T[...] { ... }`, chosen by the token
    /// after the (non-array) type.
    fn parse_creation_expression(&mut self) -> Expression {
        let new_keyword = self.take_token();
        let base_type = self.parse_non_array_type();

        if self.at(TokenKind::OpenBracket) {
            let created_type = self.parse_array_type(base_type);
            let initializer = if self.at(TokenKind::OpenBrace) {
                Some(Box::new(self.parse_array_initializer()))
            } else {
                None
            };
            return Expression::ArrayCreation(ArrayCreationExpression {
                new_keyword,
                created_type,
                initializer,
            });
        }

        let open_paren = self.expect(TokenKind::OpenParen);
        let arguments = self.parse_argument_list(TokenKind::CloseParen);
        let close_paren = self.expect(TokenKind::CloseParen);
        Expression::ObjectCreation(ObjectCreationExpression {
            new_keyword,
            created_type: base_type,
            open_paren,
            arguments,
            close_paren,
        })
    }

    /// Parses `{ element, ... }`, with nesting and a permitted trailing
    /// comma.
    pub(super) fn parse_array_initializer(&mut self) -> Expression {
        if !self.enter_nesting() {
            return Expression::Error(ErrorExpression {
                position: self.current_span().start(),
            });
        }

        let open_brace = self.take_token();
        let mut elements = SeparatedList::new();

        if !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
            loop {
                let element = if self.at(TokenKind::OpenBrace) {
                    self.parse_array_initializer()
                } else {
                    self.parse_expression()
                };
                elements.elements.push(element);

                if self.at(TokenKind::Comma) {
                    elements.separators.push(self.take_token());
                    if self.at(TokenKind::CloseBrace) {
                        break;
                    }
                } else {
                    break;
                }
            }
        }

        let close_brace = self.expect(TokenKind::CloseBrace);
        self.leave_nesting();
        Expression::ArrayInitializer(ArrayInitializerExpression {
            open_brace,
            elements,
            close_brace,
        })
    }
}
