// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Basalt source code.
//!
//! The parser builds a lossless syntax tree from a token stream. It is
//! designed for tooling use, with comprehensive error recovery and
//! diagnostics.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - the parser MUST always produce a
//!   tree covering every input byte
//! - **Multiple errors** - report all errors, don't stop at the first
//! - **Precise positions** - every diagnostic points at an exact offset
//! - **Context stack** - a stack of grammatical scopes drives modifier
//!   validation and decides where error recovery resumes
//!
//! # Recovery Machinery
//!
//! Three mechanisms cooperate:
//!
//! 1. **Synthesized tokens.** A failed [`Parser::expect`] inserts a
//!    zero-width token of the expected kind at the previous token's end,
//!    reports `"{token} expected"`, and sets the recovery flag. Tree
//!    shape is preserved.
//! 2. **Skipped-token trivia.** [`Parser::synchronize`] advances past
//!    tokens no enclosing context can use, wrapping each one in
//!    [`TriviaKind::SkippedToken`](crate::source_analysis::TriviaKind);
//!    the accumulated buffer is flushed onto the leading trivia of the
//!    next token the parser actually consumes.
//! 3. **Speculation.** Ambiguous prefixes (cast vs. parenthesized
//!    expression, declaration vs. expression statement) are tried under
//!    a paired token-stream restore point and diagnostic suppression;
//!    rejection rolls both back, in that order.
//!
//! # Usage
//!
//! ```
//! use basalt_core::source_analysis::{Diagnostics, Lexer, Parser, SourceText};
//!
//! let source = SourceText::from("class C { }");
//! let mut diagnostics = Diagnostics::new();
//! let tokens = Lexer::new(&source, &mut diagnostics).tokenize();
//! let unit = Parser::new(tokens, &mut diagnostics).parse();
//!
//! assert!(diagnostics.is_empty());
//! assert_eq!(unit.declarations.len(), 1);
//! ```

use ecow::eco_format;

use crate::syntax_tree::{
    CompilationUnit, Declaration, DeclarationKind, IncompleteMember, NamespaceDeclaration,
    UsingAlias, UsingDirective,
};

use super::{Diagnostics, RestorePoint, Span, Suppression, Token, TokenKind, TokenStream, Trivia};

// Submodules with additional impl blocks for Parser
mod declarations;
mod expressions;
mod statements;
mod types;

#[cfg(test)]
mod property_tests;

/// Recursion budget for nested expressions and statements. Combined
/// with `stacker::maybe_grow`, this keeps pathological inputs from
/// overflowing the stack.
const MAX_NESTING_DEPTH: u32 = 64;

/// A grammatical scope on the parser's context stack.
///
/// The topmost context decides which modifiers are legal and - through
/// [`ParserContext::is_valid_start`] over the whole stack - where
/// [`Parser::synchronize`] stops skipping tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserContext {
    /// A compilation unit or namespace body.
    Namespace,
    /// A class, struct, or interface body.
    Type,
    /// A delegate declaration.
    Delegate,
    /// A parameter list.
    ParameterList,
    /// An attribute section.
    AttributeList,
    /// An enum member list.
    EnumMember,
    /// A property body.
    Property,
    /// An indexer body.
    Indexer,
    /// An event body.
    Event,
    /// A constant field declaration.
    Constant,
    /// A statement list.
    Statement,
}

impl ParserContext {
    /// Returns whether `kind` can legitimately begin or continue this
    /// context. Used by recovery to find a token worth resuming at.
    #[must_use]
    pub fn is_valid_start(self, kind: TokenKind) -> bool {
        use TokenKind::{
            Bang, Base, Break, Checked, Class, CloseBrace, CloseBracket, CloseParen, Comma, Const,
            Continue, Delegate, Do, Enum, Equals, Event, Explicit, Fixed, For, Foreach, Goto,
            Identifier, If, Implicit, Interface, Lock, MinusMinus, Namespace, New, OpenBrace,
            OpenBracket, OpenParen, PlusPlus, Return, Semicolon, Struct, Switch, This, Throw,
            Tilde, Try, Unchecked, Unsafe, Using, While,
        };

        match self {
            Self::Namespace => {
                kind.is_modifier()
                    || matches!(
                        kind,
                        Namespace
                            | Class
                            | Struct
                            | Interface
                            | Enum
                            | Delegate
                            | Using
                            | OpenBracket
                            | CloseBrace
                    )
            }
            Self::Type => {
                kind.is_modifier()
                    || kind.is_predefined_type()
                    || matches!(
                        kind,
                        Identifier
                            | Const
                            | Event
                            | Class
                            | Struct
                            | Interface
                            | Enum
                            | Delegate
                            | Implicit
                            | Explicit
                            | Tilde
                            | Fixed
                            | OpenBracket
                            | CloseBrace
                    )
            }
            Self::Delegate => matches!(kind, OpenParen | Semicolon),
            Self::ParameterList => {
                kind.is_predefined_type()
                    || kind.is_parameter_modifier()
                    || matches!(
                        kind,
                        Comma | CloseParen | CloseBracket | Identifier | OpenBracket
                    )
            }
            Self::AttributeList => matches!(kind, Comma | CloseBracket | Identifier),
            Self::EnumMember => {
                matches!(kind, Comma | CloseBrace | Identifier | OpenBracket | Equals)
            }
            Self::Property => {
                matches!(
                    kind,
                    Identifier | OpenBrace | CloseBrace | OpenBracket | Semicolon
                )
            }
            Self::Indexer => {
                matches!(
                    kind,
                    Identifier
                        | This
                        | OpenBrace
                        | CloseBrace
                        | OpenBracket
                        | CloseBracket
                        | Semicolon
                )
            }
            Self::Event => {
                matches!(
                    kind,
                    Identifier | OpenBrace | CloseBrace | Comma | Semicolon | Equals
                )
            }
            Self::Constant => matches!(kind, Comma | Semicolon | Equals | Identifier),
            Self::Statement => {
                kind.is_predefined_type()
                    || kind.is_literal()
                    || matches!(
                        kind,
                        OpenBrace
                            | CloseBrace
                            | Semicolon
                            | If
                            | While
                            | Do
                            | For
                            | Foreach
                            | Switch
                            | Break
                            | Continue
                            | Return
                            | Goto
                            | Throw
                            | Try
                            | Checked
                            | Unchecked
                            | Lock
                            | Using
                            | Fixed
                            | Unsafe
                            | Const
                            | Identifier
                            | This
                            | Base
                            | New
                            | OpenParen
                            | Bang
                            | Tilde
                            | PlusPlus
                            | MinusMinus
                    )
            }
        }
    }
}

/// A paired snapshot of everything a speculative parse can disturb:
/// token cursor, diagnostic log, recovery flag, and the skipped-token
/// buffer. Abort restores all four; commit drops the snapshot.
///
/// The buffer is saved by value: a token consumed during the
/// speculation takes the buffered trivia with it, and rolling the
/// cursor back discards that token.
struct Speculation {
    restore_point: RestorePoint,
    suppression: Suppression,
    in_recovery: bool,
    skipped: Vec<Trivia>,
}

/// The context-sensitive recursive-descent parser.
pub struct Parser<'d> {
    /// The token stream being parsed.
    tokens: TokenStream,
    /// The diagnostic log.
    diagnostics: &'d mut Diagnostics,
    /// The context stack; empty means no current context.
    contexts: Vec<ParserContext>,
    /// Set when an `expect` fails; cleared by consuming a token or by
    /// `synchronize`.
    in_recovery: bool,
    /// Skipped-token trivia awaiting attachment to the next consumed or
    /// synthesized token.
    skipped: Vec<Trivia>,
    /// Current recursion depth for the nesting guard.
    nesting_depth: u32,
}

impl<'d> Parser<'d> {
    /// Creates a parser over the given token stream.
    #[must_use]
    pub fn new(tokens: TokenStream, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            tokens,
            diagnostics,
            contexts: Vec::new(),
            in_recovery: false,
            skipped: Vec::new(),
            nesting_depth: 0,
        }
    }

    /// Parses a complete compilation unit.
    ///
    /// Always returns a tree; syntax errors are reported to the
    /// diagnostic log and recovered from.
    #[must_use]
    pub fn parse(mut self) -> CompilationUnit {
        self.with_context(ParserContext::Namespace, Self::parse_compilation_unit)
    }

    // ========================================================================
    // Context stack
    // ========================================================================

    /// Pushes `context`, runs `f`, and pops on every exit path.
    pub(super) fn with_context<R>(
        &mut self,
        context: ParserContext,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.contexts.push(context);
        let result = f(self);
        self.contexts.pop();
        result
    }

    /// Returns the topmost context, if any.
    #[must_use]
    pub fn current_context(&self) -> Option<ParserContext> {
        self.contexts.last().copied()
    }

    /// Returns whether any enclosing context accepts `kind`, walking the
    /// stack from the innermost scope outwards.
    pub(super) fn is_token_valid_in_enclosing_context(&self, kind: TokenKind) -> bool {
        self.contexts
            .iter()
            .rev()
            .any(|context| context.is_valid_start(kind))
    }

    // ========================================================================
    // Token acquisition
    // ========================================================================

    /// Returns the kind of the token at the cursor.
    pub(super) fn current_kind(&self) -> TokenKind {
        self.tokens.current().kind()
    }

    /// Returns the kind of the token one past the cursor.
    pub(super) fn lookahead_kind(&self) -> TokenKind {
        self.tokens.lookahead().kind()
    }

    /// Returns whether the cursor is at a token of the given kind.
    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Returns the span of the token at the cursor.
    pub(super) fn current_span(&self) -> Span {
        self.tokens.current().span()
    }

    /// Returns the end position of the most recently consumed token, or
    /// zero at the start of input.
    fn previous_end(&self) -> u32 {
        self.tokens.previous().map_or(0, Token::end_position)
    }

    /// Consumes the current token: the accumulated skipped-token trivia
    /// is flushed onto its leading trivia and recovery is cleared.
    pub(super) fn take_token(&mut self) -> Token {
        let mut token = self.tokens.current().clone();
        self.tokens.advance();
        token.prepend_leading_trivia(std::mem::take(&mut self.skipped));
        self.in_recovery = false;
        token
    }

    /// Expects a fixed-text token kind, deriving the diagnostic text
    /// from the kind itself.
    pub(super) fn expect(&mut self, kind: TokenKind) -> Token {
        if self.at(kind) {
            return self.take_token();
        }
        let text = kind.fixed_text().unwrap_or("token");
        self.fail_expect(kind, text)
    }

    /// Expects a token kind, reporting `"{text} expected"` on failure.
    pub(super) fn expect_named(&mut self, kind: TokenKind, text: &str) -> Token {
        if self.at(kind) {
            return self.take_token();
        }
        self.fail_expect(kind, text)
    }

    /// Reports the failure and synthesizes a token of the expected kind
    /// at the previous token's end.
    fn fail_expect(&mut self, kind: TokenKind, text: &str) -> Token {
        let position = self.previous_end();
        self.diagnostics
            .report_error(Span::empty(position), eco_format!("{text} expected"));
        self.in_recovery = true;
        self.synthesize(kind)
    }

    /// Expects an identifier, reporting `"Identifier expected"` at the
    /// current token's end on failure.
    pub(super) fn expect_identifier(&mut self) -> Token {
        if self.at(TokenKind::Identifier) {
            return self.take_token();
        }
        let position = self.tokens.current().end_position();
        self.diagnostics
            .report_error(Span::empty(position), "Identifier expected");
        self.in_recovery = true;
        self.synthesize(TokenKind::Identifier)
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn expect_optional(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.take_token())
        } else {
            None
        }
    }

    /// Expects the token when `condition` holds, otherwise treats it as
    /// optional.
    pub(super) fn expect_if(
        &mut self,
        kind: TokenKind,
        condition: bool,
        text: &str,
    ) -> Option<Token> {
        if condition {
            Some(self.expect_named(kind, text))
        } else {
            self.expect_optional(kind)
        }
    }

    /// Produces a zero-width token of the given kind at the previous
    /// token's end, without consuming input. Buffered skipped-token
    /// trivia moves onto the synthesized token.
    pub(super) fn synthesize(&mut self, kind: TokenKind) -> Token {
        let mut token = Token::synthesized(kind, self.previous_end());
        token.prepend_leading_trivia(std::mem::take(&mut self.skipped));
        token
    }

    // ========================================================================
    // Error handling & recovery
    // ========================================================================

    /// Reports an error at the current token.
    pub(super) fn report_at_current(&mut self, message: impl Into<ecow::EcoString>) {
        let span = self.current_span();
        self.diagnostics.report_error(span, message);
    }

    /// Moves the current token into the skipped-token buffer.
    pub(super) fn skip_current_token(&mut self) {
        let token = self.tokens.current().clone();
        self.tokens.advance();
        self.skipped.push(Trivia::skipped(token));
    }

    /// Moves an already-consumed token into the skipped-token buffer,
    /// unless it is synthesized (and therefore contributes no text).
    pub(super) fn skip_consumed_token(&mut self, token: Token) {
        if !token.is_synthesized() {
            self.skipped.push(Trivia::skipped(token));
        }
    }

    /// Skips tokens until one is valid in an enclosing context, in
    /// `extra`, or end-of-file. Skipped tokens become trivia on the next
    /// consumed token. Clears the recovery flag.
    pub(super) fn synchronize(&mut self, extra: &[TokenKind]) {
        loop {
            let kind = self.current_kind();
            if kind == TokenKind::EndOfFile
                || extra.contains(&kind)
                || self.is_token_valid_in_enclosing_context(kind)
            {
                break;
            }
            self.skip_current_token();
        }
        self.in_recovery = false;
    }

    // ========================================================================
    // Speculative parsing
    // ========================================================================

    /// Snapshots the token cursor, diagnostic log, recovery flag, and
    /// skipped-token buffer for a speculative parse.
    fn begin_speculation(&mut self) -> Speculation {
        Speculation {
            restore_point: self.tokens.create_restore_point(),
            suppression: self.diagnostics.suppress(),
            in_recovery: self.in_recovery,
            skipped: self.skipped.clone(),
        }
    }

    /// Rejects a speculative parse: the token cursor rolls back first,
    /// then the provisional diagnostics are discarded.
    fn abort_speculation(&mut self, speculation: Speculation) {
        self.tokens.restore(speculation.restore_point);
        self.diagnostics.restore(speculation.suppression);
        self.in_recovery = speculation.in_recovery;
        self.skipped = speculation.skipped;
    }

    /// Commits a speculative parse, keeping its diagnostics and cursor.
    fn commit_speculation(&mut self, speculation: Speculation) {
        let _ = speculation;
    }

    // ========================================================================
    // Nesting guard
    // ========================================================================

    /// Enters one nesting level; reports and refuses past the budget.
    pub(super) fn enter_nesting(&mut self) -> bool {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            self.report_at_current("Expression too deeply nested");
            return false;
        }
        self.nesting_depth += 1;
        true
    }

    /// Leaves one nesting level.
    pub(super) fn leave_nesting(&mut self) {
        self.nesting_depth -= 1;
    }

    // ========================================================================
    // Compilation unit
    // ========================================================================

    /// Parses the whole input: usings, global attribute sections,
    /// namespace-or-type declarations, end-of-file.
    fn parse_compilation_unit(&mut self) -> CompilationUnit {
        let mut usings = Vec::new();
        while self.at(TokenKind::Using) {
            usings.push(self.parse_using_directive());
        }

        let mut attribute_sections = Vec::new();
        while self.at_global_attribute_section() {
            attribute_sections.push(self.parse_attribute_section());
        }

        let mut declarations = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::EndOfFile => break,
                // Directives are recognized, never interpreted; they ride
                // along as skipped-token trivia.
                TokenKind::PreprocessorDirective => self.skip_current_token(),
                TokenKind::Using => {
                    self.report_at_current(
                        "The compilation unit or namespace contains an invalid declaration or directive",
                    );
                    self.skip_using_directive();
                }
                _ if self.at_namespace_member_start() => {
                    declarations.push(self.parse_namespace_member());
                    if self.in_recovery {
                        self.synchronize(&[]);
                    }
                }
                _ => {
                    self.report_at_current(
                        "Type or namespace definition, or end-of-file expected",
                    );
                    self.skip_current_token();
                    self.synchronize(&[]);
                }
            }
        }

        let end_of_file = self.expect(TokenKind::EndOfFile);
        CompilationUnit {
            usings,
            attribute_sections,
            declarations,
            end_of_file,
        }
    }

    /// Returns whether the cursor could begin a namespace member.
    fn at_namespace_member_start(&self) -> bool {
        self.current_kind().is_modifier()
            || matches!(
                self.current_kind(),
                TokenKind::Namespace
                    | TokenKind::Class
                    | TokenKind::Struct
                    | TokenKind::Interface
                    | TokenKind::Enum
                    | TokenKind::Delegate
                    | TokenKind::OpenBracket
            )
    }

    /// Returns whether the cursor starts an attribute section with an
    /// explicit target (`[assembly: ...]`), which belongs to the
    /// compilation unit rather than to the following declaration.
    fn at_global_attribute_section(&self) -> bool {
        self.at(TokenKind::OpenBracket)
            && matches!(
                self.lookahead_kind(),
                TokenKind::Identifier | TokenKind::Event | TokenKind::Return
            )
            && self.tokens.peek(2).kind() == TokenKind::Colon
    }

    /// Sweeps a misplaced `using` directive into skipped-token trivia,
    /// through its semicolon. A directive after the first declaration
    /// cannot go in the usings list without reordering source text.
    fn skip_using_directive(&mut self) {
        self.skip_current_token();
        while !matches!(
            self.current_kind(),
            TokenKind::Semicolon | TokenKind::CloseBrace | TokenKind::EndOfFile
        ) {
            self.skip_current_token();
        }
        if self.at(TokenKind::Semicolon) {
            self.skip_current_token();
        }
    }

    /// Parses `using Name;` or `using Alias = Name;`.
    fn parse_using_directive(&mut self) -> UsingDirective {
        let using_keyword = self.take_token();
        let alias = if self.at(TokenKind::Identifier) && self.lookahead_kind() == TokenKind::Equals
        {
            let identifier = self.take_token();
            let equals = self.take_token();
            Some(UsingAlias { identifier, equals })
        } else {
            None
        };
        let name = self.parse_qualified_name();
        let semicolon = self.expect(TokenKind::Semicolon);
        UsingDirective {
            using_keyword,
            alias,
            name,
            semicolon,
        }
    }

    /// Parses one namespace-level member: a namespace, type, enum, or
    /// delegate declaration.
    ///
    /// Nested namespaces recurse through here; the stack grows on demand
    /// so deeply nested input cannot overflow it.
    fn parse_namespace_member(&mut self) -> Declaration {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || self.parse_namespace_member_inner())
    }

    fn parse_namespace_member_inner(&mut self) -> Declaration {
        if self.at(TokenKind::Namespace) {
            return Declaration::Namespace(self.parse_namespace_declaration());
        }

        let attribute_sections = self.parse_attribute_sections();
        let modifiers = self.parse_modifiers();

        match self.current_kind() {
            TokenKind::Class | TokenKind::Struct | TokenKind::Interface => self
                .parse_type_declaration(
                    attribute_sections,
                    modifiers,
                    DeclarationKind::Namespace,
                ),
            TokenKind::Enum => {
                self.parse_enum_declaration(attribute_sections, modifiers, DeclarationKind::Namespace)
            }
            TokenKind::Delegate => self.parse_delegate_declaration(
                attribute_sections,
                modifiers,
                DeclarationKind::Namespace,
            ),
            _ => {
                self.report_at_current("Expected declaration");
                Declaration::Incomplete(IncompleteMember {
                    attribute_sections,
                    modifiers,
                    type_prefix: None,
                })
            }
        }
    }

    /// Parses `namespace Qualified.Name { usings declarations } ;?`.
    ///
    /// Namespaces take no modifiers.
    fn parse_namespace_declaration(&mut self) -> NamespaceDeclaration {
        let namespace_keyword = self.take_token();
        let name = self.parse_qualified_name();
        let open_brace = self.expect(TokenKind::OpenBrace);

        let (usings, declarations, close_brace) =
            self.with_context(ParserContext::Namespace, |p| {
                let mut usings = Vec::new();
                let mut declarations: Vec<Declaration> = Vec::new();

                loop {
                    match p.current_kind() {
                        TokenKind::CloseBrace | TokenKind::EndOfFile => break,
                        TokenKind::PreprocessorDirective => p.skip_current_token(),
                        TokenKind::Using => {
                            if declarations.is_empty() {
                                usings.push(p.parse_using_directive());
                            } else {
                                p.report_at_current(
                                    "The compilation unit or namespace contains an invalid declaration or directive",
                                );
                                p.skip_using_directive();
                            }
                        }
                        _ if p.at_namespace_member_start() => {
                            declarations.push(p.parse_namespace_member());
                            if p.in_recovery {
                                p.synchronize(&[]);
                            }
                        }
                        _ => {
                            p.report_at_current(
                                "Type or namespace definition, or end-of-file expected",
                            );
                            p.skip_current_token();
                            p.synchronize(&[]);
                        }
                    }
                }

                let close_brace = p.expect(TokenKind::CloseBrace);
                (usings, declarations, close_brace)
            });

        let semicolon = self.expect_optional(TokenKind::Semicolon);
        NamespaceDeclaration {
            namespace_keyword,
            name,
            open_brace,
            usings,
            declarations,
            close_brace,
            semicolon,
        }
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    /// Greedily collects modifier tokens.
    pub(super) fn parse_modifiers(&mut self) -> Vec<Token> {
        let mut modifiers = Vec::new();
        while self.current_kind().is_modifier() {
            modifiers.push(self.take_token());
        }
        modifiers
    }

    /// Rejects duplicate modifiers, then validates each unique modifier
    /// against the declaration kind and its container.
    pub(super) fn validate_modifiers(
        &mut self,
        modifiers: &[Token],
        kind: DeclarationKind,
        container: DeclarationKind,
    ) {
        let mut seen: Vec<TokenKind> = Vec::new();
        for modifier in modifiers {
            if seen.contains(&modifier.kind()) {
                self.diagnostics.report_error(
                    modifier.span(),
                    eco_format!("Duplicate '{}' modifier", modifier.text()),
                );
                continue;
            }
            seen.push(modifier.kind());
            if !kind.is_modifier_valid(container, modifier.kind()) {
                self.diagnostics.report_error(
                    modifier.span(),
                    eco_format!("The modifier '{}' is not valid for this item", modifier.text()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{Lexer, Severity, SourceText};
    use crate::syntax_tree::{
        BlockOrSemicolon, Expression, Statement, SyntaxNode, Type, VariableDeclarationOrExpression,
    };

    /// Parses a source string into a tree and its diagnostics.
    pub(super) fn parse_source(source: &str) -> (CompilationUnit, Diagnostics) {
        let text = SourceText::from(source);
        let mut diagnostics = Diagnostics::new();
        let tokens = Lexer::new(&text, &mut diagnostics).tokenize();
        let unit = Parser::new(tokens, &mut diagnostics).parse();
        (unit, diagnostics)
    }

    /// Parses a source string, asserting it is error-free.
    pub(super) fn parse_ok(source: &str) -> CompilationUnit {
        let (unit, diagnostics) = parse_source(source);
        assert!(
            diagnostics.is_empty(),
            "Expected no errors for {source:?}, got: {diagnostics:?}"
        );
        assert_eq!(unit.full_text(), source, "round trip failed");
        unit
    }

    /// Parses a source string, returning its diagnostic messages.
    pub(super) fn parse_err(source: &str) -> (CompilationUnit, Vec<String>) {
        let (unit, diagnostics) = parse_source(source);
        assert!(
            !diagnostics.is_empty(),
            "Expected errors for {source:?}, got none"
        );
        assert_eq!(unit.full_text(), source, "round trip failed");
        let messages = diagnostics
            .iter()
            .map(|diagnostic| diagnostic.message.to_string())
            .collect();
        (unit, messages)
    }

    /// Unwraps the single type declaration of a compilation unit.
    pub(super) fn single_type(unit: &CompilationUnit) -> &crate::syntax_tree::TypeDeclaration {
        assert_eq!(unit.declarations.len(), 1);
        match &unit.declarations[0] {
            Declaration::Type(declaration) => declaration,
            other => panic!("Expected a type declaration, got {other:?}"),
        }
    }

    /// Parses `class C { <member> }` and returns the single member.
    pub(super) fn parse_member_ok(member: &str) -> Declaration {
        let source = format!("class C {{ {member} }}");
        let unit = parse_ok(&source);
        let declaration = single_type(&unit);
        assert_eq!(declaration.members.len(), 1, "in {source:?}");
        declaration.members[0].clone()
    }

    /// Parses `class C { void M() { <statement> } }` and returns the
    /// single statement.
    pub(super) fn parse_statement_ok(statement: &str) -> Statement {
        let source = format!("class C {{ void M() {{ {statement} }} }}");
        let unit = parse_ok(&source);
        let declaration = single_type(&unit);
        let Declaration::Method(method) = &declaration.members[0] else {
            panic!("Expected a method");
        };
        let BlockOrSemicolon::Block(block) = &method.body else {
            panic!("Expected a block body");
        };
        assert_eq!(block.statements.len(), 1, "in {source:?}");
        block.statements[0].clone()
    }

    /// Parses `class C { void M() { F(<expression>); } }` and returns
    /// the single argument expression.
    pub(super) fn parse_expression_ok(expression: &str) -> Expression {
        let statement = parse_statement_ok(&format!("F({expression});"));
        let Statement::Expression(statement) = statement else {
            panic!("Expected an expression statement");
        };
        let Expression::Invocation(invocation) = statement.expression else {
            panic!("Expected an invocation");
        };
        assert_eq!(invocation.arguments.len(), 1);
        invocation.arguments.elements.into_iter().next().unwrap()
    }

    // ========================================================================
    // Entry-level scenarios
    // ========================================================================

    #[test]
    fn empty_source_is_empty_unit() {
        let unit = parse_ok("");
        assert!(unit.usings.is_empty());
        assert!(unit.declarations.is_empty());
        assert_eq!(unit.end_of_file.kind(), TokenKind::EndOfFile);
    }

    #[test]
    fn whitespace_and_comments_only() {
        let unit = parse_ok("  // nothing here\n/* at all */\n");
        assert!(unit.declarations.is_empty());
        assert!(!unit.end_of_file.leading_trivia().is_empty());
    }

    #[test]
    fn hello_program() {
        let unit = parse_ok("public class Program { public static void Main() { } }");
        let class = single_type(&unit);
        assert_eq!(class.kind(), DeclarationKind::Class);
        assert_eq!(class.identifier.text(), "Program");
        assert_eq!(class.modifiers.len(), 1);
        assert_eq!(class.modifiers[0].kind(), TokenKind::Public);

        let Declaration::Method(method) = &class.members[0] else {
            panic!("Expected a method");
        };
        assert_eq!(method.identifier.text(), "Main");
        let modifier_kinds: Vec<TokenKind> =
            method.modifiers.iter().map(Token::kind).collect();
        assert_eq!(modifier_kinds, vec![TokenKind::Public, TokenKind::Static]);
        assert!(matches!(&method.return_type, Type::Predefined(t) if t.keyword.kind() == TokenKind::Void));
        assert!(method.parameters.is_empty());
        let BlockOrSemicolon::Block(block) = &method.body else {
            panic!("Expected a block");
        };
        assert!(block.statements.is_empty());
    }

    #[test]
    fn qualified_namespace_with_class() {
        let unit = parse_ok("namespace A.B { class C {} }");
        let Declaration::Namespace(namespace) = &unit.declarations[0] else {
            panic!("Expected a namespace");
        };
        assert_eq!(namespace.name.full_text().trim(), "A.B");
        assert_eq!(namespace.declarations.len(), 1);
        let Declaration::Type(class) = &namespace.declarations[0] else {
            panic!("Expected a class");
        };
        assert_eq!(class.identifier.text(), "C");
    }

    #[test]
    fn using_directives_and_aliases() {
        let unit = parse_ok("using System;\nusing IO = System.IO;\nclass C {}");
        assert_eq!(unit.usings.len(), 2);
        assert!(unit.usings[0].alias.is_none());
        let alias = unit.usings[1].alias.as_ref().unwrap();
        assert_eq!(alias.identifier.text(), "IO");
    }

    #[test]
    fn using_after_declaration_is_invalid_directive() {
        let (_unit, messages) = parse_err("class C {}\nusing System;");
        assert!(messages.contains(
            &"The compilation unit or namespace contains an invalid declaration or directive"
                .to_string()
        ));
    }

    #[test]
    fn global_attribute_section() {
        let unit = parse_ok("[assembly: Version(1)]\nclass C {}");
        assert_eq!(unit.attribute_sections.len(), 1);
        let target = unit.attribute_sections[0].target.as_ref().unwrap();
        assert_eq!(target.identifier.text(), "assembly");
        assert_eq!(unit.declarations.len(), 1);
    }

    #[test]
    fn invalid_attribute_target() {
        let (_unit, messages) = parse_err("[banana: Version(1)]\nclass C {}");
        assert!(messages.contains(&"'banana' is not a valid attribute target".to_string()));
    }

    #[test]
    fn missing_class_identifier() {
        let (unit, messages) = parse_err("class { }");
        assert!(messages.contains(&"Identifier expected".to_string()));
        let class = single_type(&unit);
        assert!(class.identifier.is_synthesized());
        assert!(class.members.is_empty());
    }

    #[test]
    fn unterminated_class_produces_incomplete_member() {
        let (unit, messages) = parse_err("class C { int");
        let class = single_type(&unit);
        assert_eq!(class.members.len(), 1);
        let Declaration::Incomplete(member) = &class.members[0] else {
            panic!("Expected an incomplete member, got {:?}", class.members[0]);
        };
        assert!(matches!(member.type_prefix, Some(Type::Predefined(_))));
        assert!(
            messages.contains(&"} expected".to_string())
                || messages.contains(&"Identifier expected".to_string())
        );
        assert!(class.close_brace.is_synthesized());
    }

    #[test]
    fn unterminated_comment_yields_empty_unit() {
        let (unit, messages) = parse_err("/* unterminated");
        assert!(unit.declarations.is_empty());
        assert_eq!(messages, vec!["End-of-file found, '*/' expected".to_string()]);
        assert_eq!(unit.end_of_file.leading_trivia().len(), 1);
    }

    #[test]
    fn top_level_garbage_is_skipped_into_trivia() {
        let (unit, messages) = parse_err("42 class C {}");
        assert!(messages
            .contains(&"Type or namespace definition, or end-of-file expected".to_string()));
        let class = single_type(&unit);
        // The skipped literal lands in the class keyword's leading trivia
        assert!(class
            .modifiers
            .first()
            .map_or(&class.keyword, |m| m)
            .leading_trivia()
            .iter()
            .any(Trivia::is_skipped_token));
    }

    #[test]
    fn preprocessor_directives_ride_along_as_trivia() {
        let source = "#region head\nclass C {\n#if DEBUG\nint x;\n#endif\n}\n";
        let (unit, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "got: {diagnostics:?}");
        assert_eq!(unit.full_text(), source);
        let class = single_type(&unit);
        assert_eq!(class.members.len(), 1);
    }

    #[test]
    fn keywords_only_source_survives() {
        let (unit, _messages) = parse_err("public static readonly");
        assert_eq!(unit.declarations.len(), 1);
        assert!(matches!(unit.declarations[0], Declaration::Incomplete(_)));
    }

    // ========================================================================
    // Modifier validation
    // ========================================================================

    #[test]
    fn duplicate_modifier() {
        let (_unit, messages) = parse_err("public public class C {}");
        assert!(messages.contains(&"Duplicate 'public' modifier".to_string()));
    }

    #[test]
    fn invalid_modifier_for_item() {
        let (_unit, messages) = parse_err("class C { virtual int x; }");
        assert!(messages.contains(&"The modifier 'virtual' is not valid for this item".to_string()));
    }

    #[test]
    fn const_field_rejects_storage_modifiers() {
        let (_unit, messages) = parse_err("class C { static const int X = 1; }");
        assert!(messages.contains(&"The modifier 'static' is not valid for this item".to_string()));
    }

    #[test]
    fn readonly_field_is_valid() {
        parse_ok("class C { static readonly int X = 1; }");
    }

    #[test]
    fn new_modifier_invalid_at_namespace_scope() {
        let (_unit, messages) = parse_err("new class C {}");
        assert!(messages.contains(&"The modifier 'new' is not valid for this item".to_string()));
    }

    #[test]
    fn new_modifier_valid_on_nested_type() {
        parse_ok("class C { new class D {} }");
    }

    #[test]
    fn interface_member_modifiers() {
        let (_unit, messages) = parse_err("interface I { virtual void M(); }");
        assert!(messages.contains(&"The modifier 'virtual' is not valid for this item".to_string()));
        parse_ok("interface I { new void M(); }");
    }

    #[test]
    fn modifier_validation_is_idempotent() {
        let (_unit, first) = parse_err("public public virtual int x;  class C {}");
        let (_unit, second) = parse_err("public public virtual int x;  class C {}");
        assert_eq!(first, second);
    }

    // ========================================================================
    // Recovery details
    // ========================================================================

    #[test]
    fn synthesized_tokens_are_zero_width_at_previous_end() {
        let (unit, _messages) = parse_err("class C { void M( }");
        let class = single_type(&unit);
        let Declaration::Method(method) = &class.members[0] else {
            panic!("Expected a method, got {:?}", class.members[0]);
        };
        assert!(method.close_paren.is_synthesized());
        assert_eq!(method.close_paren.width(), 0);
        // Position equals the previous token's end
        assert_eq!(method.close_paren.position(), method.open_paren.end_position());
    }

    #[test]
    fn clean_parse_has_no_synthesized_tokens_or_skipped_trivia() {
        let unit = parse_ok(
            "using System;\nnamespace N {\n  class C {\n    int x = 1;\n    void M(int a) { x = a; }\n  }\n}\n",
        );
        let mut clean = true;
        unit.for_each_token(&mut |token| {
            if token.is_synthesized() {
                clean = false;
            }
            for trivia in token.leading_trivia().iter().chain(token.trailing_trivia()) {
                if trivia.is_skipped_token() {
                    clean = false;
                }
            }
        });
        assert!(clean);
    }

    #[test]
    fn exactly_one_end_of_file_token() {
        for source in ["", "class C {}", "class C { int", "42 43 44"] {
            let (unit, _) = parse_source(source);
            let mut eof_count = 0;
            unit.for_each_token(&mut |token| {
                if token.kind() == TokenKind::EndOfFile {
                    eof_count += 1;
                }
            });
            assert_eq!(eof_count, 1, "for {source:?}");
        }
    }

    #[test]
    fn diagnostics_positions_within_source() {
        for source in ["class C { int", "class { }", "namespace ! {}", "'"] {
            let (_, diagnostics) = parse_source(source);
            for diagnostic in &diagnostics {
                assert!(
                    diagnostic.span.end() <= u32::try_from(source.len()).unwrap() + 1,
                    "diagnostic {diagnostic:?} out of bounds for {source:?}"
                );
                assert_eq!(diagnostic.severity, Severity::Error);
            }
        }
    }

    #[test]
    fn namespace_round_trip_with_errors() {
        let source = "namespace N { class C { int x  } using Bad; }";
        let (unit, diagnostics) = parse_source(source);
        assert!(!diagnostics.is_empty());
        assert_eq!(unit.full_text(), source);
    }

    #[test]
    fn using_statement_in_method_is_not_a_directive() {
        let statement = parse_statement_ok("using (Acquire()) { }");
        let Statement::Using(using) = statement else {
            panic!("Expected a using statement");
        };
        assert!(matches!(
            using.resource,
            VariableDeclarationOrExpression::Expression(_)
        ));
    }
}
