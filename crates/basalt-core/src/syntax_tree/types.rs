// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Type syntax.
//!
//! Basalt type references are built from predefined-type keywords and
//! dotted names, optionally wrapped in pointer and array shapes. Array
//! types double as the prefix of element-access expressions during
//! speculative parsing, so [`ArrayType`] records whether its ranks are
//! dimension-free and therefore legal in type position.

use crate::source_analysis::Token;

use super::{Expression, SeparatedList, SyntaxNode};

/// A type reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A predefined-type keyword: `int`, `string`, `void`.
    Predefined(PredefinedType),
    /// A single-identifier type name: `Point`.
    Simple(SimpleType),
    /// A dotted type name: `System.Collections.ArrayList`.
    Qualified(QualifiedType),
    /// A pointer type: `byte*`.
    Pointer(PointerType),
    /// An array type: `int[]`, `string[,][]`.
    Array(ArrayType),
}

impl Type {
    /// Returns `true` if this type shape is legal in type position.
    ///
    /// Only an array whose rank specifiers carry dimension expressions
    /// (`a[0]`, the prefix of an element access) is not.
    #[must_use]
    pub fn is_valid_type(&self) -> bool {
        match self {
            Self::Array(array) => array.is_valid_type,
            Self::Pointer(pointer) => pointer.element.is_valid_type(),
            _ => true,
        }
    }
}

impl SyntaxNode for Type {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        match self {
            Self::Predefined(node) => node.for_each_token(f),
            Self::Simple(node) => node.for_each_token(f),
            Self::Qualified(node) => node.for_each_token(f),
            Self::Pointer(node) => node.for_each_token(f),
            Self::Array(node) => node.for_each_token(f),
        }
    }
}

/// A predefined-type keyword used as a type.
#[derive(Debug, Clone, PartialEq)]
pub struct PredefinedType {
    /// The type keyword token.
    pub keyword: Token,
}

impl SyntaxNode for PredefinedType {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        self.keyword.for_each_token(f);
    }
}

/// A single-identifier type name.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    /// The identifier token.
    pub identifier: Token,
}

impl SyntaxNode for SimpleType {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        self.identifier.for_each_token(f);
    }
}

/// A dotted type name; left-associated, so `A.B.C` is `(A.B).C`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedType {
    /// The qualifier to the left of the dot.
    pub qualifier: Box<Type>,
    /// The `.` token.
    pub dot: Token,
    /// The rightmost name segment.
    pub name: SimpleType,
}

impl SyntaxNode for QualifiedType {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        self.qualifier.for_each_token(f);
        self.dot.for_each_token(f);
        self.name.for_each_token(f);
    }
}

/// A pointer type.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerType {
    /// The pointed-to type.
    pub element: Box<Type>,
    /// The `*` token.
    pub asterisk: Token,
}

impl SyntaxNode for PointerType {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        self.element.for_each_token(f);
        self.asterisk.for_each_token(f);
    }
}

/// An array type: an element type followed by one or more rank
/// specifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// The element type.
    pub element: Box<Type>,
    /// The rank specifiers, outermost first.
    pub rank_specifiers: Vec<ArrayRankSpecifier>,
    /// `true` when every rank is dimension-free (`[]`, `[,]`); `false`
    /// for the element-access shape (`[0]`) seen during speculation.
    pub is_valid_type: bool,
}

impl SyntaxNode for ArrayType {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        self.element.for_each_token(f);
        self.rank_specifiers.for_each_token(f);
    }
}

/// One `[...]` rank of an array type, holding zero or more dimension
/// expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRankSpecifier {
    /// The `[` token.
    pub open_bracket: Token,
    /// The dimension expressions; empty for `[]`.
    pub sizes: SeparatedList<Expression>,
    /// The `]` token.
    pub close_bracket: Token,
}

impl SyntaxNode for ArrayRankSpecifier {
    fn for_each_token<'a>(&'a self, f: &mut dyn FnMut(&'a Token)) {
        self.open_bracket.for_each_token(f);
        self.sizes.for_each_token(f);
        self.close_bracket.for_each_token(f);
    }
}
