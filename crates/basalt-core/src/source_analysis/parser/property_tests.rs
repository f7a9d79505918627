// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the Basalt parser.
//!
//! These tests use `proptest` to verify parser invariants over generated
//! inputs:
//!
//! 1. **Parser never panics** - arbitrary input always yields a tree
//! 2. **Round trip** - the tree's full text reproduces the input, with
//!    or without syntax errors
//! 3. **Exactly one EOF** - every tree terminates in a single
//!    end-of-file token
//! 4. **Clean sources stay clean** - valid fragments parse with no
//!    diagnostics, no synthesized tokens, and no skipped-token trivia
//! 5. **Truncated input still parses** - cutting a valid program at any
//!    point produces a tree, not a crash

use proptest::prelude::*;

use crate::source_analysis::{Diagnostics, Lexer, Parser, SourceText, TokenKind, Trivia};
use crate::syntax_tree::{CompilationUnit, SyntaxNode};

// ============================================================================
// Near-valid Basalt generators
// ============================================================================

/// Valid Basalt programs for composing inputs. Truncation and joining
/// exercise the recovery paths.
const PROGRAMS: &[&str] = &[
    "class C { }",
    "public class Program { public static void Main() { } }",
    "namespace A.B { class C { int x = 1, y; } }",
    "using System;\nclass C : Base, IFace { }",
    "struct Point { public int X; public int Y; }",
    "interface IShape { int Area { get; } void Draw(); }",
    "enum Color { Red, Green = 2, Blue, }",
    "public delegate int Comparer(object a, object b);",
    "class C { int this[int i] { get { return i; } set { } } }",
    "class C { public event Handler Changed { add { } remove { } } }",
    "class C { public static C operator +(C a, C b) { return a; } }",
    "class C { public static implicit operator int(C c) { return 0; } }",
    "class C { C() : base() { } ~C() { } }",
    "class C { void M() { if (a) b(); else c(); } }",
    "class C { void M() { for (int i = 0; i < 10; i++) { x += i; } } }",
    "class C { void M() { switch (x) { case 1: break; default: break; } } }",
    "class C { void M() { try { } catch (E e) { } finally { } } }",
    "class C { void M() { int[] v = new int[] { 1, 2, 3 }; } }",
    "class C { void M() { object o = (object)this; } }",
    "class C { unsafe void M() { byte* p = stackalloc byte[16]; } }",
];

fn program() -> impl Strategy<Value = String> {
    prop::sample::select(PROGRAMS).prop_map(ToString::to_string)
}

/// Cuts a program at an arbitrary char boundary.
fn truncated_program() -> impl Strategy<Value = String> {
    (program(), 0.0..1.0f64).prop_map(|(source, fraction)| {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::cast_sign_loss,
            reason = "test-only index arithmetic on short strings"
        )]
        let cut = (source.len() as f64 * fraction) as usize;
        let mut cut = cut.min(source.len());
        while !source.is_char_boundary(cut) {
            cut -= 1;
        }
        source[..cut].to_string()
    })
}

fn parse(input: &str) -> (CompilationUnit, Diagnostics) {
    let source = SourceText::from(input);
    let mut diagnostics = Diagnostics::new();
    let tokens = Lexer::new(&source, &mut diagnostics).tokenize();
    let unit = Parser::new(tokens, &mut diagnostics).parse();
    (unit, diagnostics)
}

fn count_eof(unit: &CompilationUnit) -> usize {
    let mut count = 0;
    unit.for_each_token(&mut |token| {
        if token.kind() == TokenKind::EndOfFile {
            count += 1;
        }
    });
    count
}

/// Default is 256 cases; override via `PROPTEST_CASES` env var for
/// nightly runs.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(256),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: the parser never panics on arbitrary input.
    #[test]
    fn parser_never_panics(input in "\\PC{0,300}") {
        let _ = parse(&input);
    }

    /// Property 2: the tree reproduces arbitrary input byte for byte.
    #[test]
    fn parser_round_trips(input in "\\PC{0,300}") {
        let (unit, _diagnostics) = parse(&input);
        prop_assert_eq!(unit.full_text(), input);
    }

    /// Property 2b: and valid-program compositions likewise.
    #[test]
    fn parser_round_trips_programs(parts in prop::collection::vec(program(), 0..4)) {
        let input = parts.join("\n");
        let (unit, _diagnostics) = parse(&input);
        prop_assert_eq!(unit.full_text(), input);
    }

    /// Property 3: exactly one end-of-file token terminates the tree.
    #[test]
    fn exactly_one_eof_token(input in "\\PC{0,300}") {
        let (unit, _diagnostics) = parse(&input);
        prop_assert_eq!(count_eof(&unit), 1);
        prop_assert_eq!(unit.end_of_file.kind(), TokenKind::EndOfFile);
    }

    /// Property 4: error-free parses contain no synthesized tokens and
    /// no skipped-token trivia.
    #[test]
    fn clean_parse_has_no_recovery_artifacts(input in program()) {
        let (unit, diagnostics) = parse(&input);
        prop_assert!(diagnostics.is_empty(), "diagnostics for {:?}: {:?}", input, diagnostics);

        let mut artifacts = Vec::new();
        unit.for_each_token(&mut |token| {
            if token.is_synthesized() {
                artifacts.push(format!("synthesized {:?}", token.kind()));
            }
            for trivia in token.leading_trivia().iter().chain(token.trailing_trivia()) {
                if trivia.is_skipped_token() {
                    artifacts.push("skipped-token trivia".to_string());
                }
            }
        });
        prop_assert!(artifacts.is_empty(), "artifacts in {:?}: {:?}", input, artifacts);
    }

    /// Property 5: truncated programs parse to a tree that still
    /// round-trips and ends in one EOF.
    #[test]
    fn truncated_programs_recover(input in truncated_program()) {
        let (unit, _diagnostics) = parse(&input);
        prop_assert_eq!(count_eof(&unit), 1);
        prop_assert_eq!(unit.full_text(), input);
    }

    /// Property 6: diagnostics always point inside the source.
    #[test]
    fn parser_diagnostics_in_bounds(input in "\\PC{0,300}") {
        let (_unit, diagnostics) = parse(&input);
        let len = u32::try_from(input.len()).unwrap();
        for diagnostic in &diagnostics {
            prop_assert!(diagnostic.position() <= len);
        }
    }

    /// Property 7: parsing is deterministic.
    #[test]
    fn parser_is_deterministic(input in "\\PC{0,300}") {
        let (first, first_diagnostics) = parse(&input);
        let (second, second_diagnostics) = parse(&input);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first_diagnostics, second_diagnostics);
    }
}

#[test]
fn skipped_trivia_appears_under_recovery() {
    let (unit, diagnostics) = parse("class C { $ int x; }");
    assert!(!diagnostics.is_empty());
    let mut found = false;
    unit.for_each_token(&mut |token| {
        if token.leading_trivia().iter().any(Trivia::is_skipped_token) {
            found = true;
        }
    });
    assert!(found);
    assert_eq!(unit.full_text(), "class C { $ int x; }");
}
