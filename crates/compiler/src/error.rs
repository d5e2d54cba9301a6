use super::{ast::NodeId, SourceLocation};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CompilationErrorKind {
    // transform errors
    VIfNoExpression,
    VIfSameKey,
    VElseNoAdjacentIf,
    VForNoExpression,
    VForMalformedExpression,
    VForTemplateKeyPlacement,
    VBindNoExpression,
    VOnNoExpression,
    UnexpectedDirExpression,

    // generic errors
    PrefixIdNotSupported,
    CacheHandlerNotSupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationError {
    pub kind: CompilationErrorKind,
    pub additional_message: Option<String>,
    pub location: SourceLocation,
}

impl CompilationError {
    pub fn new(kind: CompilationErrorKind) -> Self {
        Self {
            kind,
            additional_message: None,
            location: Default::default(),
        }
    }
    pub fn with_location(mut self, loc: SourceLocation) -> Self {
        self.location = loc;
        self
    }
    pub fn with_additional_message(mut self, msg: String) -> Self {
        self.additional_message = Some(msg);
        self
    }

    fn msg(&self) -> &'static str {
        msg(&self.kind)
    }
}

#[cold]
#[inline(never)]
fn msg(kind: &CompilationErrorKind) -> &'static str {
    use CompilationErrorKind::*;
    match *kind {
        VIfNoExpression => "v-if/v-else-if is missing expression.",
        VIfSameKey => "v-if/else branches must use unique keys.",
        VElseNoAdjacentIf => "v-else/v-else-if has no adjacent v-if or v-else-if.",
        VForNoExpression => "v-for is missing expression.",
        VForMalformedExpression => "v-for has invalid expression.",
        VForTemplateKeyPlacement => "<template v-for> key should be placed on the <template> tag.",
        VBindNoExpression => "v-bind is missing expression.",
        VOnNoExpression => "v-on is missing expression.",
        UnexpectedDirExpression => "This directive does not accept any expression.",

        // generic errors
        PrefixIdNotSupported =>
            r#""prefixIdentifiers" option is not supported in this build of compiler."#,
        CacheHandlerNotSupported =>
            r#""cacheHandlers" option is only supported when the "prefixIdentifiers" option is enabled."#,
    }
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(additional) = &self.additional_message {
            write!(f, "{}{}", self.msg(), additional)
        } else {
            write!(f, "{}", self.msg())
        }
    }
}

/// This trait handles diagnostics reported during transformation.
/// Diagnostics never stop traversal; whether one aborts the
/// compilation is up to the handler.
/// Rc/RefCell is a good way to implement ErrorHandler if
/// collecting errors in compilation pass is desired.
pub trait ErrorHandler {
    // cannot use mut ref due to borrow semantics
    // use RefCell as implementation
    fn on_error(&self, _: CompilationError) {}
    fn on_warn(&self, _: CompilationError) {}
}

/// Default handler, reports diagnostics to the tracing subscriber.
#[derive(Clone, Default)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn on_error(&self, e: CompilationError) {
        tracing::error!(kind = ?e.kind, location = ?e.location, "{}", e);
    }
    fn on_warn(&self, e: CompilationError) {
        tracing::warn!(kind = ?e.kind, location = ?e.location, "{}", e);
    }
}

#[derive(Clone, Default)]
pub struct VecErrorHandler {
    errors: Rc<RefCell<Vec<CompilationError>>>,
    warnings: Rc<RefCell<Vec<CompilationError>>>,
}

impl VecErrorHandler {
    pub fn errors(&self) -> Vec<CompilationError> {
        self.errors.borrow().clone()
    }
    pub fn warnings(&self) -> Vec<CompilationError> {
        self.warnings.borrow().clone()
    }
    pub fn error_kinds(&self) -> Vec<CompilationErrorKind> {
        self.errors.borrow().iter().map(|e| e.kind).collect()
    }
}

impl ErrorHandler for VecErrorHandler {
    fn on_error(&self, e: CompilationError) {
        self.errors.borrow_mut().push(e);
    }
    fn on_warn(&self, e: CompilationError) {
        self.warnings.borrow_mut().push(e);
    }
}

/// Internal invariant breaks caused by a misbehaving transform.
/// Unlike diagnostics these always abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("Cannot replace root node.")]
    ReplaceRoot,
    #[error("Node being replaced is already removed.")]
    ReplaceRemovedNode,
    #[error("Cannot remove root node.")]
    RemoveRoot,
    #[error("Node being removed is already removed.")]
    RemoveRemovedNode,
    #[error("Node {0:?} being removed is not a child of current parent.")]
    NodeNotInParent(NodeId),
    #[error("Node {0:?} cannot hold children.")]
    NotAParent(NodeId),
    #[error("Identifier `{0}` is removed more often than added.")]
    IdentifierUnderflow(String),
}

pub type TransformResult<T> = Result<T, TransformError>;
