// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for parser crash safety testing.
//!
//! This target feeds arbitrary byte sequences to the front-end and
//! asserts that it never panics and that the produced tree reproduces
//! the input byte for byte. The parser must handle all input
//! gracefully, producing a tree plus diagnostics.
//!
//! Invalid UTF-8 bytes are converted via lossy conversion (U+FFFD
//! replacement) so the lexer and parser still get exercised with
//! unusual character sequences.
//!
//! # Success Criteria
//!
//! - No panic on any input
//! - A `SyntaxTree` is always produced
//! - `root.full_text()` equals the input

#![no_main]

use basalt_core::syntax_tree::{SyntaxNode, SyntaxTree};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert to UTF-8 using lossy conversion so invalid bytes become
    // U+FFFD replacement characters rather than being skipped entirely.
    let source = String::from_utf8_lossy(data);

    // Success = no panic, and the tree is lossless. We don't care
    // whether there are diagnostics.
    let tree = SyntaxTree::parse(&source);
    assert_eq!(tree.root().full_text(), source);
});
