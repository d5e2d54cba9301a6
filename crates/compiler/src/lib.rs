//! Template AST transform pipeline.
//!
//! Takes a parsed template tree and rewrites it in place into a tree
//! annotated with codegen nodes. Runtime helpers, hoists, cache slots,
//! imports and identifier usage are collected along the way and published
//! on the root node once the run finishes.

use std::ops::Range;

#[cfg(feature = "serde")]
use serde::Serialize;

pub mod ast;
pub mod error;
pub mod flags;
pub mod ir;
pub mod transformer;
pub mod transforms;
pub mod util;

pub use ast::{Ast, Node, NodeId};
pub use transformer::{transform, TransformContext, TransformOption, Transformer};

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Position {
    /// the 0-indexed offset in the source str modulo newline
    pub offset: usize,
    /// the line number in the source code
    pub line: usize,
    /// the column number in the source code
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl From<SourceLocation> for Range<usize> {
    fn from(location: SourceLocation) -> Self {
        location.start.offset..location.end.offset
    }
}

/// namespace for HTML/SVG/MathML tag
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
    UserDefined(&'static str),
}

#[cfg(test)]
#[macro_export]
macro_rules! cast {
    ($target: expr, $pat: path) => {{
        if let $pat(a) = $target {
            a
        } else {
            panic!("mismatch variant when cast to {}", stringify!($pat));
        }
    }};
}
