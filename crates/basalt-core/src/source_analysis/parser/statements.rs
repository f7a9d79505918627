// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing for Basalt.
//!
//! One top-level dispatch on the current token. The interesting case is
//! the declaration-vs-expression ambiguity: a statement beginning with
//! an identifier or predefined type is speculatively parsed as a
//! variable declaration and rolled back (cursor and provisional
//! diagnostics together) when the type-identifier shape does not hold.

use crate::syntax_tree::{
    BlockStatement, BreakStatement, CaseLabel, CatchClause, CatchSpecifier, CheckedStatement,
    ContinueStatement, DeclarationStatement, DefaultLabel, DoStatement, EmptyExpression,
    EmptyStatement, EqualsValueClause, Expression, ExpressionStatement, FinallyClause,
    FixedStatement, ForStatement, ForeachStatement, GotoStatement, GotoTarget, IfStatement,
    ElseClause, LabeledStatement, LockStatement, ReturnStatement, SeparatedList, Statement,
    SwitchLabel, SwitchSection, SwitchStatement, ThrowStatement, TryStatement, UnsafeStatement,
    UsingStatement, VariableDeclaration, VariableDeclarationOrExpression,
    VariableDeclarationOrExpressionList, VariableDeclarator, WhileStatement,
};

use super::{Parser, ParserContext, TokenKind};

impl Parser<'_> {
    /// Parses `{ statements }` in a fresh statement context.
    pub(super) fn parse_block(&mut self) -> BlockStatement {
        self.with_context(ParserContext::Statement, |p| {
            let open_brace = p.expect(TokenKind::OpenBrace);
            let mut statements = Vec::new();
            while !p.at(TokenKind::CloseBrace) && !p.at(TokenKind::EndOfFile) {
                if p.at(TokenKind::PreprocessorDirective) {
                    p.skip_current_token();
                    continue;
                }
                let before = p.tokens.create_restore_point();
                statements.push(p.parse_statement());
                if p.in_recovery {
                    p.synchronize(&[]);
                }
                if p.tokens.create_restore_point() == before {
                    p.skip_current_token();
                }
            }
            let close_brace = p.expect(TokenKind::CloseBrace);
            BlockStatement {
                open_brace,
                statements,
                close_brace,
            }
        })
    }

    /// Parses a single statement.
    ///
    /// Grows the stack on demand so deeply nested input cannot overflow
    /// it; the nesting guard bounds recursion either way.
    pub(super) fn parse_statement(&mut self) -> Statement {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            if !self.enter_nesting() {
                return Statement::Empty(EmptyStatement {
                    semicolon: self.synthesize(TokenKind::Semicolon),
                });
            }
            let statement = self.parse_statement_inner();
            self.leave_nesting();
            statement
        })
    }

    fn parse_statement_inner(&mut self) -> Statement {
        match self.current_kind() {
            TokenKind::OpenBrace => Statement::Block(self.parse_block()),
            TokenKind::Semicolon => Statement::Empty(EmptyStatement {
                semicolon: self.take_token(),
            }),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Foreach => self.parse_foreach_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Break => Statement::Break(BreakStatement {
                keyword: self.take_token(),
                semicolon: self.expect(TokenKind::Semicolon),
            }),
            TokenKind::Continue => Statement::Continue(ContinueStatement {
                keyword: self.take_token(),
                semicolon: self.expect(TokenKind::Semicolon),
            }),
            TokenKind::Goto => self.parse_goto_statement(),
            TokenKind::Return => {
                let keyword = self.take_token();
                let expression = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression())
                };
                let semicolon = self.expect(TokenKind::Semicolon);
                Statement::Return(ReturnStatement {
                    keyword,
                    expression,
                    semicolon,
                })
            }
            TokenKind::Throw => {
                let keyword = self.take_token();
                let expression = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression())
                };
                let semicolon = self.expect(TokenKind::Semicolon);
                Statement::Throw(ThrowStatement {
                    keyword,
                    expression,
                    semicolon,
                })
            }
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Checked if self.lookahead_kind() == TokenKind::OpenBrace => {
                Statement::Checked(CheckedStatement {
                    keyword: self.take_token(),
                    block: self.parse_block(),
                })
            }
            TokenKind::Unchecked if self.lookahead_kind() == TokenKind::OpenBrace => {
                Statement::Unchecked(CheckedStatement {
                    keyword: self.take_token(),
                    block: self.parse_block(),
                })
            }
            TokenKind::Lock => self.parse_lock_statement(),
            TokenKind::Using => self.parse_using_statement(),
            TokenKind::Fixed => self.parse_fixed_statement(),
            TokenKind::Unsafe => Statement::Unsafe(UnsafeStatement {
                unsafe_keyword: self.take_token(),
                block: self.parse_block(),
            }),
            TokenKind::Const => self.parse_const_declaration_statement(),
            TokenKind::Identifier if self.lookahead_kind() == TokenKind::Colon => {
                Statement::Labeled(LabeledStatement {
                    identifier: self.take_token(),
                    colon: self.take_token(),
                    statement: Box::new(self.parse_statement()),
                })
            }
            _ => self.parse_declaration_or_expression_statement(),
        }
    }

    // ========================================================================
    // Declarations vs. expressions
    // ========================================================================

    /// Parses a local declaration when the type-identifier shape holds,
    /// otherwise an expression statement.
    fn parse_declaration_or_expression_statement(&mut self) -> Statement {
        if self.starts_type() {
            if let Some(declaration) = self.try_parse_variable_declaration() {
                let semicolon = self.expect(TokenKind::Semicolon);
                return Statement::Declaration(DeclarationStatement {
                    const_keyword: None,
                    declaration,
                    semicolon,
                });
            }
        }
        let expression = self.parse_expression();
        let semicolon = self.expect(TokenKind::Semicolon);
        Statement::Expression(ExpressionStatement {
            expression,
            semicolon,
        })
    }

    /// Returns whether the current token could start a type reference.
    fn starts_type(&self) -> bool {
        self.at(TokenKind::Identifier) || self.current_kind().is_predefined_type()
    }

    /// Speculatively parses `Type identifier`; commits to a declaration
    /// only when a valid type shape is directly followed by a name.
    /// Rejection rolls back the cursor and provisional diagnostics.
    pub(super) fn try_parse_variable_declaration(&mut self) -> Option<VariableDeclaration> {
        if !self.starts_type() {
            return None;
        }

        let speculation = self.begin_speculation();
        let declared_type = self.parse_type();

        let viable =
            !self.in_recovery && declared_type.is_valid_type() && self.at(TokenKind::Identifier);
        if !viable {
            self.abort_speculation(speculation);
            return None;
        }
        self.commit_speculation(speculation);

        let declarators = self.parse_variable_declarators();
        Some(VariableDeclaration {
            declared_type,
            declarators,
        })
    }

    /// Parses `name (= initializer)? (, name (= initializer)?)*`.
    pub(super) fn parse_variable_declarators(&mut self) -> SeparatedList<VariableDeclarator> {
        let mut declarators = SeparatedList::new();
        loop {
            let identifier = self.expect_identifier();
            let initializer = if self.at(TokenKind::Equals) {
                let equals = self.take_token();
                let value = self.parse_variable_initializer();
                Some(EqualsValueClause { equals, value })
            } else {
                None
            };
            declarators.elements.push(VariableDeclarator {
                identifier,
                initializer,
            });
            if self.at(TokenKind::Comma) {
                declarators.separators.push(self.take_token());
            } else {
                break;
            }
        }
        declarators
    }

    /// Parses a declarator initializer: an array initializer or an
    /// expression.
    pub(super) fn parse_variable_initializer(&mut self) -> Expression {
        if self.at(TokenKind::OpenBrace) {
            self.parse_array_initializer()
        } else {
            self.parse_expression()
        }
    }

    /// Parses `const Type declarators ;` in statement position.
    fn parse_const_declaration_statement(&mut self) -> Statement {
        let const_keyword = self.take_token();
        let declared_type = self.parse_type();
        let declarators = self.parse_variable_declarators();
        let semicolon = self.expect(TokenKind::Semicolon);
        Statement::Declaration(DeclarationStatement {
            const_keyword: Some(const_keyword),
            declaration: VariableDeclaration {
                declared_type,
                declarators,
            },
            semicolon,
        })
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    fn parse_if_statement(&mut self) -> Statement {
        let if_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let condition = self.parse_expression();
        let close_paren = self.expect(TokenKind::CloseParen);
        let then_statement = Box::new(self.parse_statement());
        let else_clause = if self.at(TokenKind::Else) {
            Some(ElseClause {
                else_keyword: self.take_token(),
                statement: Box::new(self.parse_statement()),
            })
        } else {
            None
        };
        Statement::If(IfStatement {
            if_keyword,
            open_paren,
            condition,
            close_paren,
            then_statement,
            else_clause,
        })
    }

    fn parse_while_statement(&mut self) -> Statement {
        let while_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let condition = self.parse_expression();
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = Box::new(self.parse_statement());
        Statement::While(WhileStatement {
            while_keyword,
            open_paren,
            condition,
            close_paren,
            body,
        })
    }

    fn parse_do_statement(&mut self) -> Statement {
        let do_keyword = self.take_token();
        let body = Box::new(self.parse_statement());
        let while_keyword = self.expect(TokenKind::While);
        let open_paren = self.expect(TokenKind::OpenParen);
        let condition = self.parse_expression();
        let close_paren = self.expect(TokenKind::CloseParen);
        let semicolon = self.expect(TokenKind::Semicolon);
        Statement::Do(DoStatement {
            do_keyword,
            body,
            while_keyword,
            open_paren,
            condition,
            close_paren,
            semicolon,
        })
    }

    fn parse_for_statement(&mut self) -> Statement {
        let for_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);

        let initializer = if self.at(TokenKind::Semicolon) {
            VariableDeclarationOrExpressionList::Expressions(SeparatedList::new())
        } else if let Some(declaration) = self.try_parse_variable_declaration() {
            VariableDeclarationOrExpressionList::Declaration(declaration)
        } else {
            VariableDeclarationOrExpressionList::Expressions(
                self.parse_expression_list(TokenKind::Semicolon),
            )
        };
        let first_semicolon = self.expect(TokenKind::Semicolon);

        let condition = if self.at(TokenKind::Semicolon) {
            Expression::Empty(EmptyExpression {
                position: self.current_span().start(),
            })
        } else {
            self.parse_expression()
        };
        let second_semicolon = self.expect(TokenKind::Semicolon);

        let incrementors = if self.at(TokenKind::CloseParen) {
            SeparatedList::new()
        } else {
            self.parse_expression_list(TokenKind::CloseParen)
        };
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = Box::new(self.parse_statement());

        Statement::For(ForStatement {
            for_keyword,
            open_paren,
            initializer,
            first_semicolon,
            condition,
            second_semicolon,
            incrementors,
            close_paren,
            body,
        })
    }

    /// Parses a comma-separated expression list, stopping before
    /// `terminator`.
    fn parse_expression_list(&mut self, terminator: TokenKind) -> SeparatedList<Expression> {
        let mut expressions = SeparatedList::new();
        loop {
            expressions.elements.push(self.parse_expression());
            if self.at(TokenKind::Comma) {
                expressions.separators.push(self.take_token());
            } else {
                break;
            }
            if self.at(terminator) || self.at(TokenKind::EndOfFile) {
                break;
            }
        }
        expressions
    }

    fn parse_foreach_statement(&mut self) -> Statement {
        let foreach_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let element_type = self.parse_type();
        let identifier = self.expect_identifier();
        let in_keyword = self.expect(TokenKind::In);
        let expression = self.parse_expression();
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = Box::new(self.parse_statement());
        Statement::Foreach(ForeachStatement {
            foreach_keyword,
            open_paren,
            element_type,
            identifier,
            in_keyword,
            expression,
            close_paren,
            body,
        })
    }

    fn parse_switch_statement(&mut self) -> Statement {
        let switch_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let expression = self.parse_expression();
        let close_paren = self.expect(TokenKind::CloseParen);
        let open_brace = self.expect(TokenKind::OpenBrace);

        let mut sections = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::Case | TokenKind::Default => {
                    sections.push(self.parse_switch_section());
                }
                TokenKind::CloseBrace | TokenKind::EndOfFile => break,
                TokenKind::PreprocessorDirective => self.skip_current_token(),
                _ => {
                    self.report_at_current("case expected");
                    self.skip_current_token();
                    self.synchronize(&[
                        TokenKind::Case,
                        TokenKind::Default,
                        TokenKind::CloseBrace,
                    ]);
                }
            }
        }

        let close_brace = self.expect(TokenKind::CloseBrace);
        Statement::Switch(SwitchStatement {
            switch_keyword,
            open_paren,
            expression,
            close_paren,
            open_brace,
            sections,
            close_brace,
        })
    }

    /// Parses one run of `case`/`default` labels and the statements
    /// under them.
    fn parse_switch_section(&mut self) -> SwitchSection {
        let mut labels = Vec::new();
        while matches!(self.current_kind(), TokenKind::Case | TokenKind::Default) {
            if self.at(TokenKind::Case) {
                let case_keyword = self.take_token();
                let expression = self.parse_expression();
                let colon = self.expect(TokenKind::Colon);
                labels.push(SwitchLabel::Case(CaseLabel {
                    case_keyword,
                    expression,
                    colon,
                }));
            } else {
                let default_keyword = self.take_token();
                let colon = self.expect(TokenKind::Colon);
                labels.push(SwitchLabel::Default(DefaultLabel {
                    default_keyword,
                    colon,
                }));
            }
        }

        let mut statements = Vec::new();
        while !matches!(
            self.current_kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::CloseBrace | TokenKind::EndOfFile
        ) {
            if self.at(TokenKind::PreprocessorDirective) {
                self.skip_current_token();
                continue;
            }
            let before = self.tokens.create_restore_point();
            statements.push(self.parse_statement());
            if self.in_recovery {
                self.synchronize(&[TokenKind::Case, TokenKind::Default]);
            }
            if self.tokens.create_restore_point() == before {
                self.skip_current_token();
            }
        }

        SwitchSection { labels, statements }
    }

    fn parse_goto_statement(&mut self) -> Statement {
        let goto_keyword = self.take_token();
        let target = match self.current_kind() {
            TokenKind::Case => {
                let case_keyword = self.take_token();
                let expression = self.parse_expression();
                GotoTarget::Case {
                    case_keyword,
                    expression,
                }
            }
            TokenKind::Default => GotoTarget::Default(self.take_token()),
            _ => GotoTarget::Label(self.expect_identifier()),
        };
        let semicolon = self.expect(TokenKind::Semicolon);
        Statement::Goto(GotoStatement {
            goto_keyword,
            target,
            semicolon,
        })
    }

    fn parse_try_statement(&mut self) -> Statement {
        let try_keyword = self.take_token();
        let block = self.parse_block();

        let mut catch_clauses = Vec::new();
        while self.at(TokenKind::Catch) {
            let catch_keyword = self.take_token();
            let specifier = if self.at(TokenKind::OpenParen) {
                let open_paren = self.take_token();
                let exception_type = self.parse_type();
                let identifier = self.expect_optional(TokenKind::Identifier);
                let close_paren = self.expect(TokenKind::CloseParen);
                Some(CatchSpecifier {
                    open_paren,
                    exception_type,
                    identifier,
                    close_paren,
                })
            } else {
                None
            };
            let block = self.parse_block();
            catch_clauses.push(CatchClause {
                catch_keyword,
                specifier,
                block,
            });
        }

        let finally_clause = if self.at(TokenKind::Finally) {
            Some(FinallyClause {
                finally_keyword: self.take_token(),
                block: self.parse_block(),
            })
        } else {
            None
        };

        Statement::Try(TryStatement {
            try_keyword,
            block,
            catch_clauses,
            finally_clause,
        })
    }

    fn parse_lock_statement(&mut self) -> Statement {
        let lock_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let expression = self.parse_expression();
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = Box::new(self.parse_statement());
        Statement::Lock(LockStatement {
            lock_keyword,
            open_paren,
            expression,
            close_paren,
            body,
        })
    }

    fn parse_using_statement(&mut self) -> Statement {
        let using_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let resource = if let Some(declaration) = self.try_parse_variable_declaration() {
            VariableDeclarationOrExpression::Declaration(declaration)
        } else {
            VariableDeclarationOrExpression::Expression(self.parse_expression())
        };
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = Box::new(self.parse_statement());
        Statement::Using(UsingStatement {
            using_keyword,
            open_paren,
            resource,
            close_paren,
            body,
        })
    }

    fn parse_fixed_statement(&mut self) -> Statement {
        let fixed_keyword = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let declared_type = self.parse_type();
        let declarators = self.parse_variable_declarators();
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = Box::new(self.parse_statement());
        Statement::Fixed(FixedStatement {
            fixed_keyword,
            open_paren,
            declaration: VariableDeclaration {
                declared_type,
                declarators,
            },
            close_paren,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_ok, parse_statement_ok};
    use crate::syntax_tree::{
        Expression, Statement, SwitchLabel, SyntaxNode, VariableDeclarationOrExpression,
        VariableDeclarationOrExpressionList,
    };
    use crate::source_analysis::TokenKind;

    #[test]
    fn if_else_statement() {
        let statement = parse_statement_ok("if (a) b(); else c();");
        let Statement::If(if_statement) = statement else {
            panic!("Expected an if statement");
        };
        assert!(matches!(
            *if_statement.then_statement,
            Statement::Expression(_)
        ));
        let else_clause = if_statement.else_clause.unwrap();
        assert!(matches!(*else_clause.statement, Statement::Expression(_)));
    }

    #[test]
    fn local_declaration_vs_expression() {
        assert!(matches!(
            parse_statement_ok("int x = 1;"),
            Statement::Declaration(_)
        ));
        assert!(matches!(
            parse_statement_ok("x = 1;"),
            Statement::Expression(_)
        ));
        assert!(matches!(
            parse_statement_ok("a.b.c();"),
            Statement::Expression(_)
        ));
        assert!(matches!(
            parse_statement_ok("a[0] = 1;"),
            Statement::Expression(_)
        ));
        // Pointer declarations win the `a * b` ambiguity
        assert!(matches!(
            parse_statement_ok("a* p;"),
            Statement::Declaration(_)
        ));
    }

    #[test]
    fn qualified_type_local_declaration() {
        let statement = parse_statement_ok("System.IO.Stream s = null;");
        assert!(matches!(statement, Statement::Declaration(_)));
    }

    #[test]
    fn const_local_declaration() {
        let Statement::Declaration(declaration) = parse_statement_ok("const int limit = 10;")
        else {
            panic!("Expected a declaration");
        };
        assert!(declaration.const_keyword.is_some());
    }

    #[test]
    fn array_local_with_initializer() {
        let Statement::Declaration(declaration) =
            parse_statement_ok("int[] values = { 1, 2, 3 };")
        else {
            panic!("Expected a declaration");
        };
        let initializer = declaration.declaration.declarators.elements[0]
            .initializer
            .as_ref()
            .unwrap();
        assert!(matches!(
            initializer.value,
            Expression::ArrayInitializer(_)
        ));
    }

    #[test]
    fn while_and_do_statements() {
        assert!(matches!(
            parse_statement_ok("while (x) { }"),
            Statement::While(_)
        ));
        let Statement::Do(do_statement) = parse_statement_ok("do { } while (x);") else {
            panic!("Expected a do statement");
        };
        assert_eq!(do_statement.semicolon.kind(), TokenKind::Semicolon);
    }

    #[test]
    fn for_statement_with_declaration_initializer() {
        let Statement::For(for_statement) =
            parse_statement_ok("for (int i = 0; i < 10; i++) { }")
        else {
            panic!("Expected a for statement");
        };
        assert!(matches!(
            for_statement.initializer,
            VariableDeclarationOrExpressionList::Declaration(_)
        ));
        assert!(!for_statement.condition.is_empty());
        assert_eq!(for_statement.incrementors.len(), 1);
    }

    #[test]
    fn for_statement_with_expression_list() {
        let Statement::For(for_statement) =
            parse_statement_ok("for (i = 0, j = n; ; i++, j--) ;")
        else {
            panic!("Expected a for statement");
        };
        let VariableDeclarationOrExpressionList::Expressions(initializers) =
            &for_statement.initializer
        else {
            panic!("Expected an expression list");
        };
        assert_eq!(initializers.len(), 2);
        assert!(for_statement.condition.is_empty());
        assert_eq!(for_statement.incrementors.len(), 2);
    }

    #[test]
    fn empty_for_statement() {
        let Statement::For(for_statement) = parse_statement_ok("for (;;) { }") else {
            panic!("Expected a for statement");
        };
        let VariableDeclarationOrExpressionList::Expressions(initializers) =
            &for_statement.initializer
        else {
            panic!("Expected an expression list");
        };
        assert!(initializers.is_empty());
        assert!(for_statement.condition.is_empty());
        assert!(for_statement.incrementors.is_empty());
    }

    #[test]
    fn foreach_statement() {
        let Statement::Foreach(foreach) = parse_statement_ok("foreach (string s in items) { }")
        else {
            panic!("Expected a foreach statement");
        };
        assert_eq!(foreach.identifier.text(), "s");
        assert_eq!(foreach.in_keyword.kind(), TokenKind::In);
    }

    #[test]
    fn switch_statement_sections() {
        let Statement::Switch(switch) = parse_statement_ok(
            "switch (x) { case 1: case 2: a(); break; default: b(); break; }",
        ) else {
            panic!("Expected a switch statement");
        };
        assert_eq!(switch.sections.len(), 2);
        assert_eq!(switch.sections[0].labels.len(), 2);
        assert_eq!(switch.sections[0].statements.len(), 2);
        assert!(matches!(
            switch.sections[1].labels[0],
            SwitchLabel::Default(_)
        ));
    }

    #[test]
    fn goto_statements() {
        assert!(matches!(
            parse_statement_ok("goto done;"),
            Statement::Goto(_)
        ));
        let Statement::Goto(goto_case) = parse_statement_ok("goto case 1;") else {
            panic!("Expected a goto statement");
        };
        assert!(matches!(
            goto_case.target,
            crate::syntax_tree::GotoTarget::Case { .. }
        ));
        let Statement::Goto(goto_default) = parse_statement_ok("goto default;") else {
            panic!("Expected a goto statement");
        };
        assert!(matches!(
            goto_default.target,
            crate::syntax_tree::GotoTarget::Default(_)
        ));
    }

    #[test]
    fn labeled_statement() {
        let Statement::Labeled(labeled) = parse_statement_ok("retry: x = 0;") else {
            panic!("Expected a labeled statement");
        };
        assert_eq!(labeled.identifier.text(), "retry");
        assert!(matches!(*labeled.statement, Statement::Expression(_)));
    }

    #[test]
    fn try_catch_finally() {
        let Statement::Try(try_statement) = parse_statement_ok(
            "try { } catch (IOException e) { } catch { } finally { }",
        ) else {
            panic!("Expected a try statement");
        };
        assert_eq!(try_statement.catch_clauses.len(), 2);
        let first = &try_statement.catch_clauses[0];
        let specifier = first.specifier.as_ref().unwrap();
        assert_eq!(specifier.identifier.as_ref().unwrap().text(), "e");
        assert!(try_statement.catch_clauses[1].specifier.is_none());
        assert!(try_statement.finally_clause.is_some());
    }

    #[test]
    fn checked_and_unchecked_statements() {
        assert!(matches!(
            parse_statement_ok("checked { x++; }"),
            Statement::Checked(_)
        ));
        assert!(matches!(
            parse_statement_ok("unchecked { x++; }"),
            Statement::Unchecked(_)
        ));
    }

    #[test]
    fn lock_using_fixed_unsafe() {
        assert!(matches!(
            parse_statement_ok("lock (gate) { }"),
            Statement::Lock(_)
        ));
        let Statement::Using(using) = parse_statement_ok("using (Stream s = Open()) { }") else {
            panic!("Expected a using statement");
        };
        assert!(matches!(
            using.resource,
            VariableDeclarationOrExpression::Declaration(_)
        ));
        assert!(matches!(
            parse_statement_ok("fixed (byte* p = buffer) { }"),
            Statement::Fixed(_)
        ));
        assert!(matches!(
            parse_statement_ok("unsafe { }"),
            Statement::Unsafe(_)
        ));
    }

    #[test]
    fn empty_statement() {
        assert!(matches!(parse_statement_ok(";"), Statement::Empty(_)));
    }

    #[test]
    fn missing_semicolon_is_synthesized() {
        let source = "class C { void M() { x = 1 } }";
        let (unit, messages) = parse_err(source);
        assert!(messages.contains(&"; expected".to_string()));
        assert_eq!(unit.full_text(), source);
    }

    #[test]
    fn missing_expression_reports_once() {
        let (_unit, messages) = parse_err("class C { void M() { x = ; } }");
        assert!(messages.contains(&"Expected expression".to_string()));
    }

    #[test]
    fn garbage_in_switch_body() {
        let source = "class C { void M() { switch (x) { nonsense case 1: break; } } }";
        let (unit, messages) = parse_err(source);
        assert!(messages.contains(&"case expected".to_string()));
        assert_eq!(unit.full_text(), source);
    }

    #[test]
    fn statement_round_trip_with_comments() {
        parse_ok("class C { void M() { // setup\n int x = 1; /* use */ x++; } }");
    }

    #[test]
    fn skipped_trivia_survives_speculation_rollback() {
        // The `$` is skipped into the trivia buffer before `x = 1;` is
        // speculatively tried (and rejected) as a declaration; the
        // rollback must put the buffered trivia back.
        let (_unit, messages) = parse_err("class C { void M() { $ x = 1; } }");
        assert!(!messages.is_empty());
    }
}
