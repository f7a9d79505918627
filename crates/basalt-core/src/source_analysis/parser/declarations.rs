// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration parsing for Basalt.
//!
//! This module handles type bodies and their members. Member dispatch
//! looks at the first non-modifier token; the type-prefixed path
//! (`Type Name ...`) then decides among field, method, property,
//! indexer, and operator by one further token of lookahead.

use ecow::eco_format;

use crate::syntax_tree::{
    AccessorDeclaration, Attribute, AttributeArgumentList, AttributeSection, AttributeTarget,
    BaseList, BlockOrSemicolon, ConstructorDeclaration, ConstructorInitializer,
    ConversionOperatorDeclaration, Declaration, DeclarationKind, DelegateDeclaration,
    DestructorDeclaration, EnumBase, EnumDeclaration, EnumMemberDeclaration, EqualsValueClause,
    EventDeclaration, EventFieldDeclaration, ExplicitInterface, ExplicitInterfaceSegment,
    FieldDeclaration, IncompleteMember, IndexerDeclaration, MethodDeclaration,
    OperatorDeclaration, Parameter, PropertyDeclaration, SeparatedList, Type, TypeDeclaration,
    VariableDeclaration,
};

use super::{Parser, ParserContext, Span, Token, TokenKind};

/// The attribute targets a section prefix may name.
const ATTRIBUTE_TARGETS: &[&str] = &[
    "assembly", "field", "event", "method", "module", "param", "property", "return", "type",
];

/// Operator tokens that may follow the `operator` keyword.
fn is_overloadable_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Ampersand
            | TokenKind::Bar
            | TokenKind::Caret
            | TokenKind::LessLess
            | TokenKind::GreaterGreater
            | TokenKind::EqualsEquals
            | TokenKind::BangEquals
            | TokenKind::Greater
            | TokenKind::Less
            | TokenKind::GreaterEquals
            | TokenKind::LessEquals
    )
}

impl Parser<'_> {
    // ========================================================================
    // Attributes
    // ========================================================================

    /// Parses zero or more attribute sections.
    pub(super) fn parse_attribute_sections(&mut self) -> Vec<AttributeSection> {
        let mut sections = Vec::new();
        while self.at(TokenKind::OpenBracket) {
            sections.push(self.parse_attribute_section());
        }
        sections
    }

    /// Parses `[target: Attribute(arguments), ...]`.
    pub(super) fn parse_attribute_section(&mut self) -> AttributeSection {
        self.with_context(ParserContext::AttributeList, |p| {
            let open_bracket = p.take_token();

            let target = if matches!(
                p.current_kind(),
                TokenKind::Identifier | TokenKind::Event | TokenKind::Return
            ) && p.lookahead_kind() == TokenKind::Colon
            {
                let identifier = p.take_token();
                if !ATTRIBUTE_TARGETS.contains(&identifier.text()) {
                    p.diagnostics.report_error(
                        identifier.span(),
                        eco_format!("'{}' is not a valid attribute target", identifier.text()),
                    );
                }
                let colon = p.take_token();
                Some(AttributeTarget { identifier, colon })
            } else {
                None
            };

            let mut attributes = SeparatedList::new();
            loop {
                attributes.elements.push(p.parse_attribute());
                if p.at(TokenKind::Comma) {
                    attributes.separators.push(p.take_token());
                    if p.at(TokenKind::CloseBracket) {
                        break;
                    }
                } else {
                    break;
                }
            }

            let close_bracket = p.expect(TokenKind::CloseBracket);
            AttributeSection {
                open_bracket,
                target,
                attributes,
                close_bracket,
            }
        })
    }

    /// Parses one attribute: a qualified name and optional arguments.
    fn parse_attribute(&mut self) -> Attribute {
        let name = self.parse_qualified_name();
        let arguments = if self.at(TokenKind::OpenParen) {
            let open_paren = self.take_token();
            let arguments = self.parse_argument_list(TokenKind::CloseParen);
            let close_paren = self.expect(TokenKind::CloseParen);
            Some(AttributeArgumentList {
                open_paren,
                arguments,
                close_paren,
            })
        } else {
            None
        };
        Attribute { name, arguments }
    }

    // ========================================================================
    // Type declarations
    // ========================================================================

    /// Parses a `class`/`struct`/`interface` declaration and its body.
    pub(super) fn parse_type_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        let keyword = self.take_token();
        let kind = match keyword.kind() {
            TokenKind::Struct => DeclarationKind::Struct,
            TokenKind::Interface => DeclarationKind::Interface,
            _ => DeclarationKind::Class,
        };
        self.validate_modifiers(&modifiers, kind, container);

        let identifier = self.expect_identifier();

        let base_list = if self.at(TokenKind::Colon) {
            let colon = self.take_token();
            let mut types = SeparatedList::new();
            loop {
                types.elements.push(self.parse_type());
                if self.at(TokenKind::Comma) {
                    types.separators.push(self.take_token());
                } else {
                    break;
                }
            }
            Some(BaseList { colon, types })
        } else {
            None
        };

        let open_brace = self.expect(TokenKind::OpenBrace);
        let members = self.with_context(ParserContext::Type, |p| {
            let mut members = Vec::new();
            while !p.at(TokenKind::CloseBrace) && !p.at(TokenKind::EndOfFile) {
                if p.at(TokenKind::PreprocessorDirective) {
                    p.skip_current_token();
                    continue;
                }
                let before = p.tokens.create_restore_point();
                members.push(p.parse_member(kind));
                if p.in_recovery {
                    p.synchronize(&[]);
                }
                if p.tokens.create_restore_point() == before {
                    p.skip_current_token();
                }
            }
            members
        });
        let close_brace = self.expect(TokenKind::CloseBrace);
        let semicolon = self.expect_optional(TokenKind::Semicolon);

        Declaration::Type(TypeDeclaration {
            attribute_sections,
            modifiers,
            keyword,
            identifier,
            base_list,
            open_brace,
            members,
            close_brace,
            semicolon,
        })
    }

    /// Parses `enum Name : Base? { members } ;?`.
    pub(super) fn parse_enum_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        let enum_keyword = self.take_token();
        self.validate_modifiers(&modifiers, DeclarationKind::Enum, container);
        let identifier = self.expect_identifier();

        let base = if self.at(TokenKind::Colon) {
            let colon = self.take_token();
            let underlying_type = self.parse_type();
            Some(EnumBase {
                colon,
                underlying_type,
            })
        } else {
            None
        };

        let open_brace = self.expect(TokenKind::OpenBrace);
        let members = self.with_context(ParserContext::EnumMember, |p| {
            let mut members = SeparatedList::new();
            while !p.at(TokenKind::CloseBrace) && !p.at(TokenKind::EndOfFile) {
                if p.at(TokenKind::PreprocessorDirective) {
                    p.skip_current_token();
                    continue;
                }
                let attribute_sections = p.parse_attribute_sections();
                let identifier = p.expect_identifier();
                let initializer = if p.at(TokenKind::Equals) {
                    let equals = p.take_token();
                    let value = p.parse_expression();
                    Some(EqualsValueClause { equals, value })
                } else {
                    None
                };
                members.elements.push(EnumMemberDeclaration {
                    attribute_sections,
                    identifier,
                    initializer,
                });

                // A trailing separator before `}` is permitted
                if p.at(TokenKind::Comma) {
                    members.separators.push(p.take_token());
                } else {
                    break;
                }
            }
            members
        });
        let close_brace = self.expect(TokenKind::CloseBrace);
        let semicolon = self.expect_optional(TokenKind::Semicolon);

        Declaration::Enum(EnumDeclaration {
            attribute_sections,
            modifiers,
            enum_keyword,
            identifier,
            base,
            open_brace,
            members,
            close_brace,
            semicolon,
        })
    }

    /// Parses `delegate ReturnType Name(parameters);`.
    pub(super) fn parse_delegate_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        let delegate_keyword = self.take_token();
        self.validate_modifiers(&modifiers, DeclarationKind::Delegate, container);

        self.with_context(ParserContext::Delegate, |p| {
            let return_type = p.parse_type();
            let identifier = p.expect_identifier();
            let open_paren = p.expect(TokenKind::OpenParen);
            let parameters = p.parse_parameter_list(TokenKind::CloseParen);
            let close_paren = p.expect(TokenKind::CloseParen);
            let semicolon = p.expect(TokenKind::Semicolon);

            Declaration::Delegate(DelegateDeclaration {
                attribute_sections,
                modifiers,
                delegate_keyword,
                return_type,
                identifier,
                open_paren,
                parameters,
                close_paren,
                semicolon,
            })
        })
    }

    // ========================================================================
    // Member dispatch
    // ========================================================================

    /// Parses one member of a type body. `container` is the kind of the
    /// enclosing type, used for modifier validation.
    ///
    /// Nested type declarations recurse through here; the stack grows on
    /// demand so deeply nested input cannot overflow it.
    fn parse_member(&mut self, container: DeclarationKind) -> Declaration {
        stacker::maybe_grow(32 * 1024, 256 * 1024, || self.parse_member_inner(container))
    }

    fn parse_member_inner(&mut self, container: DeclarationKind) -> Declaration {
        let attribute_sections = self.parse_attribute_sections();
        let modifiers = self.parse_modifiers();

        match self.current_kind() {
            TokenKind::Class | TokenKind::Struct | TokenKind::Interface => {
                self.parse_type_declaration(attribute_sections, modifiers, container)
            }
            TokenKind::Enum => self.parse_enum_declaration(attribute_sections, modifiers, container),
            TokenKind::Delegate => {
                self.parse_delegate_declaration(attribute_sections, modifiers, container)
            }
            TokenKind::Implicit | TokenKind::Explicit => {
                self.parse_conversion_operator(attribute_sections, modifiers, container)
            }
            TokenKind::Const => self.parse_constant_field(attribute_sections, modifiers, container),
            TokenKind::Event => {
                self.parse_event_declaration(attribute_sections, modifiers, container)
            }
            TokenKind::Tilde => self.parse_destructor(attribute_sections, modifiers, container),
            TokenKind::Identifier if self.lookahead_kind() == TokenKind::OpenParen => {
                self.parse_constructor(attribute_sections, modifiers, container)
            }
            kind if kind == TokenKind::Identifier || kind.is_predefined_type() => {
                self.parse_type_prefixed_member(attribute_sections, modifiers, container)
            }
            _ => {
                self.report_at_current("Invalid member declaration");
                self.in_recovery = true;
                Declaration::Incomplete(IncompleteMember {
                    attribute_sections,
                    modifiers,
                    type_prefix: None,
                })
            }
        }
    }

    /// Parses a member that begins with a type: field, method,
    /// property, indexer, or operator, decided by lookahead.
    fn parse_type_prefixed_member(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        let prefix_type = self.parse_type();

        if self.at(TokenKind::Operator) {
            return self.parse_operator_declaration(
                attribute_sections,
                modifiers,
                prefix_type,
                container,
            );
        }

        let explicit_interface = self.parse_explicit_interface();

        if self.at(TokenKind::This) {
            return self.parse_indexer_declaration(
                attribute_sections,
                modifiers,
                prefix_type,
                explicit_interface,
                container,
            );
        }

        if self.at(TokenKind::Identifier) {
            match self.lookahead_kind() {
                TokenKind::OpenParen => {
                    let identifier = self.take_token();
                    return self.parse_method_declaration(
                        attribute_sections,
                        modifiers,
                        prefix_type,
                        explicit_interface,
                        identifier,
                        container,
                    );
                }
                TokenKind::OpenBrace => {
                    let identifier = self.take_token();
                    return self.parse_property_declaration(
                        attribute_sections,
                        modifiers,
                        prefix_type,
                        explicit_interface,
                        identifier,
                        container,
                    );
                }
                TokenKind::Semicolon | TokenKind::Equals | TokenKind::Comma
                    if explicit_interface.is_none() =>
                {
                    return self.parse_field_declaration(
                        attribute_sections,
                        modifiers,
                        prefix_type,
                        container,
                    );
                }
                _ => {}
            }
        }

        if !self.at(TokenKind::Identifier) && explicit_interface.is_none() {
            // No member name at all (e.g. the type ran into `}` or EOF)
            let _ = self.expect_identifier();
            return Declaration::Incomplete(IncompleteMember {
                attribute_sections,
                modifiers,
                type_prefix: Some(prefix_type),
            });
        }

        // A name shape that fits no member form. Spill the consumed
        // name tokens into skipped trivia so the tree stays lossless.
        self.report_at_current("Invalid member declaration");
        if let Some(explicit_interface) = explicit_interface {
            for segment in explicit_interface.segments {
                self.skip_consumed_token(segment.name);
                self.skip_consumed_token(segment.dot);
            }
        }
        if self.at(TokenKind::Identifier) {
            self.skip_current_token();
        }
        self.synchronize(&[]);
        Declaration::Incomplete(IncompleteMember {
            attribute_sections,
            modifiers,
            type_prefix: Some(prefix_type),
        })
    }

    /// Parses the dotted prefix of an explicitly implemented member
    /// name: `IFoo.` in `void IFoo.M()`.
    fn parse_explicit_interface(&mut self) -> Option<ExplicitInterface> {
        let mut segments = Vec::new();
        while self.at(TokenKind::Identifier) && self.lookahead_kind() == TokenKind::Dot {
            let name = self.take_token();
            let dot = self.take_token();
            segments.push(ExplicitInterfaceSegment { name, dot });
        }
        (!segments.is_empty()).then_some(ExplicitInterface { segments })
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Parses the declarators and semicolon of a field declaration.
    fn parse_field_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        declared_type: Type,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::Field, container);
        let declarators = self.parse_variable_declarators();
        let semicolon = self.expect(TokenKind::Semicolon);
        Declaration::Field(FieldDeclaration {
            attribute_sections,
            modifiers,
            const_keyword: None,
            declaration: VariableDeclaration {
                declared_type,
                declarators,
            },
            semicolon,
        })
    }

    /// Parses a `const` field. Storage modifiers are rejected.
    fn parse_constant_field(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        self.with_context(ParserContext::Constant, |p| {
            let const_keyword = p.take_token();
            p.validate_modifiers(&modifiers, DeclarationKind::Field, container);
            let mut reported: Vec<TokenKind> = Vec::new();
            for modifier in &modifiers {
                if matches!(
                    modifier.kind(),
                    TokenKind::Static | TokenKind::Readonly | TokenKind::Volatile
                ) && !reported.contains(&modifier.kind())
                {
                    reported.push(modifier.kind());
                    p.diagnostics.report_error(
                        modifier.span(),
                        eco_format!(
                            "The modifier '{}' is not valid for this item",
                            modifier.text()
                        ),
                    );
                }
            }

            let declared_type = p.parse_type();
            let declarators = p.parse_variable_declarators();
            let semicolon = p.expect(TokenKind::Semicolon);
            Declaration::Field(FieldDeclaration {
                attribute_sections,
                modifiers,
                const_keyword: Some(const_keyword),
                declaration: VariableDeclaration {
                    declared_type,
                    declarators,
                },
                semicolon,
            })
        })
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Parses an `event` member, branching on whether the name leads to
    /// a declarator list (field-like) or braces (property-like).
    fn parse_event_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        let event_keyword = self.take_token();
        let event_type = self.parse_type();
        let explicit_interface = self.parse_explicit_interface();

        let property_like = explicit_interface.is_some()
            || self.at(TokenKind::OpenBrace)
            || (self.at(TokenKind::Identifier) && self.lookahead_kind() == TokenKind::OpenBrace);

        if property_like {
            self.validate_modifiers(&modifiers, DeclarationKind::Event, container);
            let identifier = self.expect_identifier();
            let (open_brace, accessors, close_brace) =
                self.with_context(ParserContext::Event, |p| p.parse_accessor_list(true));
            Declaration::Event(EventDeclaration {
                attribute_sections,
                modifiers,
                event_keyword,
                event_type,
                explicit_interface,
                identifier,
                open_brace,
                accessors,
                close_brace,
            })
        } else {
            self.validate_modifiers(&modifiers, DeclarationKind::EventField, container);
            let declarators = self.parse_variable_declarators();
            let semicolon = self.expect(TokenKind::Semicolon);
            Declaration::EventField(EventFieldDeclaration {
                attribute_sections,
                modifiers,
                event_keyword,
                declaration: VariableDeclaration {
                    declared_type: event_type,
                    declarators,
                },
                semicolon,
            })
        }
    }

    // ========================================================================
    // Properties, indexers, accessors
    // ========================================================================

    /// Parses a property body.
    fn parse_property_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        property_type: Type,
        explicit_interface: Option<ExplicitInterface>,
        identifier: Token,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::Property, container);
        let (open_brace, accessors, close_brace) =
            self.with_context(ParserContext::Property, |p| p.parse_accessor_list(false));
        Declaration::Property(PropertyDeclaration {
            attribute_sections,
            modifiers,
            property_type,
            explicit_interface,
            identifier,
            open_brace,
            accessors,
            close_brace,
        })
    }

    /// Parses an indexer: `Type this[parameters] { accessors }`.
    fn parse_indexer_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        indexer_type: Type,
        explicit_interface: Option<ExplicitInterface>,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::Indexer, container);
        self.with_context(ParserContext::Indexer, |p| {
            let this_keyword = p.take_token();
            let open_bracket = p.expect(TokenKind::OpenBracket);
            let parameters = p.parse_parameter_list(TokenKind::CloseBracket);
            let close_bracket = p.expect(TokenKind::CloseBracket);
            let (open_brace, accessors, close_brace) = p.parse_accessor_list(false);
            Declaration::Indexer(IndexerDeclaration {
                attribute_sections,
                modifiers,
                indexer_type,
                explicit_interface,
                this_keyword,
                open_bracket,
                parameters,
                close_bracket,
                open_brace,
                accessors,
                close_brace,
            })
        })
    }

    /// Parses a braced accessor list.
    fn parse_accessor_list(
        &mut self,
        event: bool,
    ) -> (Token, Vec<AccessorDeclaration>, Token) {
        let open_brace = self.expect(TokenKind::OpenBrace);
        let mut accessors = Vec::new();
        while !self.at(TokenKind::CloseBrace) && !self.at(TokenKind::EndOfFile) {
            if self.at(TokenKind::PreprocessorDirective) {
                self.skip_current_token();
                continue;
            }
            let before = self.tokens.create_restore_point();
            accessors.push(self.parse_accessor(event));
            if self.in_recovery {
                self.synchronize(&[]);
            }
            if self.tokens.create_restore_point() == before {
                self.skip_current_token();
            }
        }
        let close_brace = self.expect(TokenKind::CloseBrace);
        (open_brace, accessors, close_brace)
    }

    /// Parses one accessor. The keyword arrives as an identifier and is
    /// reclassified to `get`/`set` (or `add`/`remove` for events); any
    /// other word is reported and left as an identifier.
    fn parse_accessor(&mut self, event: bool) -> AccessorDeclaration {
        let attribute_sections = self.parse_attribute_sections();
        let modifiers = self.parse_modifiers();

        let wrong_keyword_message = if event {
            "A add or remove accessor expected"
        } else {
            "A get or set accessor expected"
        };

        let keyword = if self.at(TokenKind::Identifier) {
            let mut keyword = self.take_token();
            let reclassified = match (event, keyword.text()) {
                (false, "get") => Some(TokenKind::GetKeyword),
                (false, "set") => Some(TokenKind::SetKeyword),
                (true, "add") => Some(TokenKind::AddKeyword),
                (true, "remove") => Some(TokenKind::RemoveKeyword),
                _ => None,
            };
            if let Some(kind) = reclassified {
                keyword.reclassify(kind);
            } else {
                self.diagnostics
                    .report_error(keyword.span(), wrong_keyword_message);
            }
            keyword
        } else {
            self.report_at_current(wrong_keyword_message);
            self.synthesize(TokenKind::Identifier)
        };

        // A recognized accessor without a block requires `;`; an invalid
        // one stays incomplete without piling on a second diagnostic.
        let body = if self.at(TokenKind::OpenBrace) {
            BlockOrSemicolon::Block(self.parse_block())
        } else {
            let keyword_recognized = keyword.kind() != TokenKind::Identifier;
            let semicolon = self
                .expect_if(TokenKind::Semicolon, keyword_recognized, ";")
                .unwrap_or_else(|| self.synthesize(TokenKind::Semicolon));
            BlockOrSemicolon::Semicolon(semicolon)
        };
        AccessorDeclaration {
            attribute_sections,
            modifiers,
            keyword,
            body,
        }
    }

    // ========================================================================
    // Methods, constructors, destructors, operators
    // ========================================================================

    /// Parses a block body or a terminating semicolon.
    fn parse_block_or_semicolon(&mut self) -> BlockOrSemicolon {
        if self.at(TokenKind::OpenBrace) {
            BlockOrSemicolon::Block(self.parse_block())
        } else {
            BlockOrSemicolon::Semicolon(self.expect(TokenKind::Semicolon))
        }
    }

    /// Parses a method from its already-consumed name onwards.
    fn parse_method_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        return_type: Type,
        explicit_interface: Option<ExplicitInterface>,
        identifier: Token,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::Method, container);
        let open_paren = self.expect(TokenKind::OpenParen);
        let parameters = self.parse_parameter_list(TokenKind::CloseParen);
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = self.parse_block_or_semicolon();
        Declaration::Method(MethodDeclaration {
            attribute_sections,
            modifiers,
            return_type,
            explicit_interface,
            identifier,
            open_paren,
            parameters,
            close_paren,
            body,
        })
    }

    /// Parses a constructor, including the optional `: base(...)` /
    /// `: this(...)` initializer.
    fn parse_constructor(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::Constructor, container);
        let identifier = self.take_token();
        let open_paren = self.expect(TokenKind::OpenParen);
        let parameters = self.parse_parameter_list(TokenKind::CloseParen);
        let close_paren = self.expect(TokenKind::CloseParen);

        let initializer = if self.at(TokenKind::Colon) {
            let colon = self.take_token();
            let keyword = if self.at(TokenKind::Base) || self.at(TokenKind::This) {
                self.take_token()
            } else {
                self.report_at_current("Expected 'base' or 'this'");
                self.in_recovery = true;
                self.synthesize(TokenKind::Base)
            };
            let open_paren = self.expect(TokenKind::OpenParen);
            let arguments = self.parse_argument_list(TokenKind::CloseParen);
            let close_paren = self.expect(TokenKind::CloseParen);
            Some(ConstructorInitializer {
                colon,
                keyword,
                open_paren,
                arguments,
                close_paren,
            })
        } else {
            None
        };

        let body = self.parse_block_or_semicolon();
        Declaration::Constructor(ConstructorDeclaration {
            attribute_sections,
            modifiers,
            identifier,
            open_paren,
            parameters,
            close_paren,
            initializer,
            body,
        })
    }

    /// Parses `~Name() body`.
    fn parse_destructor(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::Destructor, container);
        let tilde = self.take_token();
        let identifier = self.expect_identifier();
        let open_paren = self.expect(TokenKind::OpenParen);
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = self.parse_block_or_semicolon();
        Declaration::Destructor(DestructorDeclaration {
            attribute_sections,
            modifiers,
            tilde,
            identifier,
            open_paren,
            close_paren,
            body,
        })
    }

    /// Parses `Type operator op(parameters) body`.
    fn parse_operator_declaration(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        return_type: Type,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::Operator, container);
        let operator_keyword = self.take_token();

        let operator_token = if is_overloadable_operator(self.current_kind()) {
            self.take_token()
        } else {
            let position = self.previous_end();
            self.diagnostics
                .report_error(Span::empty(position), "Overloadable operator expected");
            self.in_recovery = true;
            self.synthesize(TokenKind::Plus)
        };

        let open_paren = self.expect(TokenKind::OpenParen);
        let parameters = self.parse_parameter_list(TokenKind::CloseParen);
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = self.parse_block_or_semicolon();
        Declaration::Operator(OperatorDeclaration {
            attribute_sections,
            modifiers,
            return_type,
            operator_keyword,
            operator_token,
            open_paren,
            parameters,
            close_paren,
            body,
        })
    }

    /// Parses `implicit operator Type(parameters) body` and the
    /// `explicit` form.
    fn parse_conversion_operator(
        &mut self,
        attribute_sections: Vec<AttributeSection>,
        modifiers: Vec<Token>,
        container: DeclarationKind,
    ) -> Declaration {
        self.validate_modifiers(&modifiers, DeclarationKind::ConversionOperator, container);
        let implicit_or_explicit = self.take_token();
        let operator_keyword = self.expect(TokenKind::Operator);
        let target_type = self.parse_type();
        let open_paren = self.expect(TokenKind::OpenParen);
        let parameters = self.parse_parameter_list(TokenKind::CloseParen);
        let close_paren = self.expect(TokenKind::CloseParen);
        let body = self.parse_block_or_semicolon();
        Declaration::ConversionOperator(ConversionOperatorDeclaration {
            attribute_sections,
            modifiers,
            implicit_or_explicit,
            operator_keyword,
            target_type,
            open_paren,
            parameters,
            close_paren,
            body,
        })
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Parses a parameter list up to (not including) `terminator`.
    pub(super) fn parse_parameter_list(
        &mut self,
        terminator: TokenKind,
    ) -> SeparatedList<Parameter> {
        self.with_context(ParserContext::ParameterList, |p| {
            let mut parameters = SeparatedList::new();
            if p.at(terminator) || p.at(TokenKind::EndOfFile) {
                return parameters;
            }
            loop {
                parameters.elements.push(p.parse_parameter());
                if p.at(TokenKind::Comma) {
                    parameters.separators.push(p.take_token());
                } else {
                    break;
                }
            }
            parameters
        })
    }

    /// Parses one parameter: attributes, `ref`/`out`/`params`, type,
    /// name.
    fn parse_parameter(&mut self) -> Parameter {
        let attribute_sections = self.parse_attribute_sections();
        let mut modifiers = Vec::new();
        while self.current_kind().is_parameter_modifier() {
            modifiers.push(self.take_token());
        }
        let parameter_type = self.parse_type();
        let identifier = self.expect_identifier();
        Parameter {
            attribute_sections,
            modifiers,
            parameter_type,
            identifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_member_ok, parse_ok, single_type};
    use crate::syntax_tree::{
        BlockOrSemicolon, Declaration, DeclarationKind, Expression, SyntaxNode, Type,
    };
    use crate::source_analysis::TokenKind;

    #[test]
    fn field_with_multiple_declarators() {
        let Declaration::Field(field) = parse_member_ok("int x = 1, y;") else {
            panic!("Expected a field");
        };
        let declarators = &field.declaration.declarators;
        assert_eq!(declarators.len(), 2);
        assert_eq!(declarators.separators.len(), 1);
        assert_eq!(declarators.elements[0].identifier.text(), "x");
        assert!(declarators.elements[0].initializer.is_some());
        assert_eq!(declarators.elements[1].identifier.text(), "y");
        assert!(declarators.elements[1].initializer.is_none());
    }

    #[test]
    fn const_field() {
        let Declaration::Field(field) = parse_member_ok("public const int Max = 10;") else {
            panic!("Expected a field");
        };
        assert!(field.const_keyword.is_some());
    }

    #[test]
    fn method_with_parameters() {
        let Declaration::Method(method) = parse_member_ok("int Add(int a, ref int b, params int[] rest) { return a; }")
        else {
            panic!("Expected a method");
        };
        assert_eq!(method.parameters.len(), 3);
        assert_eq!(method.parameters.elements[1].modifiers[0].kind(), TokenKind::Ref);
        assert_eq!(
            method.parameters.elements[2].modifiers[0].kind(),
            TokenKind::Params
        );
        assert!(matches!(
            method.parameters.elements[2].parameter_type,
            Type::Array(_)
        ));
    }

    #[test]
    fn abstract_method_with_semicolon_body() {
        let Declaration::Method(method) = parse_member_ok("public abstract void M();") else {
            panic!("Expected a method");
        };
        assert!(matches!(method.body, BlockOrSemicolon::Semicolon(_)));
    }

    #[test]
    fn property_accessors_are_reclassified() {
        let Declaration::Property(property) = parse_member_ok("int Count { get { return 0; } set; }")
        else {
            panic!("Expected a property");
        };
        assert_eq!(property.accessors.len(), 2);
        assert_eq!(property.accessors[0].keyword.kind(), TokenKind::GetKeyword);
        assert_eq!(property.accessors[0].keyword.text(), "get");
        assert_eq!(property.accessors[1].keyword.kind(), TokenKind::SetKeyword);
        assert!(matches!(
            property.accessors[1].body,
            BlockOrSemicolon::Semicolon(_)
        ));
    }

    #[test]
    fn wrong_property_accessor_keyword() {
        let (_unit, messages) = parse_err("class C { int P { fetch; } }");
        assert!(messages.contains(&"A get or set accessor expected".to_string()));
    }

    #[test]
    fn wrong_event_accessor_keyword() {
        let (_unit, messages) = parse_err("class C { event D E { get; } }");
        assert!(messages.contains(&"A add or remove accessor expected".to_string()));
    }

    #[test]
    fn field_like_event() {
        let Declaration::EventField(event) = parse_member_ok("public event Handler Changed, Closed;")
        else {
            panic!("Expected a field-like event");
        };
        assert_eq!(event.declaration.declarators.len(), 2);
    }

    #[test]
    fn property_like_event() {
        let Declaration::Event(event) =
            parse_member_ok("public event Handler Changed { add { } remove { } }")
        else {
            panic!("Expected a property-like event");
        };
        assert_eq!(event.accessors.len(), 2);
        assert_eq!(event.accessors[0].keyword.kind(), TokenKind::AddKeyword);
        assert_eq!(event.accessors[1].keyword.kind(), TokenKind::RemoveKeyword);
    }

    #[test]
    fn indexer_declaration() {
        let Declaration::Indexer(indexer) =
            parse_member_ok("public int this[int index] { get { return index; } }")
        else {
            panic!("Expected an indexer");
        };
        assert_eq!(indexer.parameters.len(), 1);
        assert_eq!(indexer.accessors.len(), 1);
    }

    #[test]
    fn constructor_with_base_initializer() {
        let Declaration::Constructor(constructor) = parse_member_ok("C(int x) : base(x) { }")
        else {
            panic!("Expected a constructor");
        };
        let initializer = constructor.initializer.as_ref().unwrap();
        assert_eq!(initializer.keyword.kind(), TokenKind::Base);
        assert_eq!(initializer.arguments.len(), 1);
    }

    #[test]
    fn constructor_with_this_initializer() {
        let Declaration::Constructor(constructor) = parse_member_ok("C() : this(0) { }") else {
            panic!("Expected a constructor");
        };
        assert_eq!(
            constructor.initializer.as_ref().unwrap().keyword.kind(),
            TokenKind::This
        );
    }

    #[test]
    fn constructor_initializer_requires_base_or_this() {
        let (_unit, messages) = parse_err("class C { C() : other() { } }");
        assert!(messages.contains(&"Expected 'base' or 'this'".to_string()));
    }

    #[test]
    fn destructor_declaration() {
        let Declaration::Destructor(destructor) = parse_member_ok("~C() { }") else {
            panic!("Expected a destructor");
        };
        assert_eq!(destructor.identifier.text(), "C");
    }

    #[test]
    fn operator_declaration() {
        let Declaration::Operator(operator) =
            parse_member_ok("public static C operator +(C a, C b) { return a; }")
        else {
            panic!("Expected an operator");
        };
        assert_eq!(operator.operator_token.kind(), TokenKind::Plus);
        assert_eq!(operator.parameters.len(), 2);
    }

    #[test]
    fn conversion_operator_declaration() {
        let Declaration::ConversionOperator(conversion) =
            parse_member_ok("public static implicit operator int(C value) { return 0; }")
        else {
            panic!("Expected a conversion operator");
        };
        assert_eq!(
            conversion.implicit_or_explicit.kind(),
            TokenKind::Implicit
        );
        assert!(matches!(conversion.target_type, Type::Predefined(_)));
    }

    #[test]
    fn explicit_interface_method() {
        let Declaration::Method(method) = parse_member_ok("void IDisposable.Dispose() { }")
        else {
            panic!("Expected a method");
        };
        let explicit = method.explicit_interface.as_ref().unwrap();
        assert_eq!(explicit.segments.len(), 1);
        assert_eq!(explicit.segments[0].name.text(), "IDisposable");
        assert_eq!(method.identifier.text(), "Dispose");
    }

    #[test]
    fn explicit_interface_indexer() {
        let Declaration::Indexer(indexer) =
            parse_member_ok("int IList.this[int index] { get; }")
        else {
            panic!("Expected an indexer");
        };
        assert!(indexer.explicit_interface.is_some());
    }

    #[test]
    fn nested_type_declarations() {
        let Declaration::Type(nested) = parse_member_ok("private struct Inner { int x; }") else {
            panic!("Expected a nested type");
        };
        assert_eq!(nested.kind(), DeclarationKind::Struct);
    }

    #[test]
    fn enum_with_base_and_trailing_comma() {
        let unit = parse_ok("enum Color : byte { Red, Green = 2, Blue, }");
        let Declaration::Enum(declaration) = &unit.declarations[0] else {
            panic!("Expected an enum");
        };
        assert!(declaration.base.is_some());
        assert_eq!(declaration.members.len(), 3);
        // Trailing separator is preserved
        assert_eq!(declaration.members.separators.len(), 3);
        assert!(declaration.members.is_well_separated());
        let green = &declaration.members.elements[1];
        assert!(matches!(
            green.initializer.as_ref().unwrap().value,
            Expression::Literal(_)
        ));
    }

    #[test]
    fn delegate_declaration() {
        let unit = parse_ok("public delegate int Comparer(object a, object b);");
        let Declaration::Delegate(declaration) = &unit.declarations[0] else {
            panic!("Expected a delegate");
        };
        assert_eq!(declaration.identifier.text(), "Comparer");
        assert_eq!(declaration.parameters.len(), 2);
    }

    #[test]
    fn attributes_on_members_and_parameters() {
        let Declaration::Method(method) =
            parse_member_ok("[Obsolete(\"old\")] void M([In] int x) { }")
        else {
            panic!("Expected a method");
        };
        assert_eq!(method.attribute_sections.len(), 1);
        let section = &method.attribute_sections[0];
        assert!(section.target.is_none());
        assert_eq!(section.attributes.len(), 1);
        assert!(section.attributes.elements[0].arguments.is_some());
        assert_eq!(method.parameters.elements[0].attribute_sections.len(), 1);
    }

    #[test]
    fn type_with_trailing_semicolon() {
        let unit = parse_ok("class C { };");
        let class = single_type(&unit);
        assert!(class.semicolon.is_some());
    }

    #[test]
    fn invalid_member_is_reported() {
        let (_unit, messages) = parse_err("class C { 42 }");
        assert!(messages.contains(&"Invalid member declaration".to_string()));
    }

    #[test]
    fn member_garbage_round_trips_via_skipped_trivia() {
        let source = "class C { int x $$ ; int y; }";
        let (unit, _messages) = parse_err(source);
        assert_eq!(unit.full_text(), source);
        let class = single_type(&unit);
        // The second field still parses
        assert!(class
            .members
            .iter()
            .any(|m| matches!(m, Declaration::Field(f) if f.declaration.declarators.elements[0].identifier.text() == "y")));
    }
}
