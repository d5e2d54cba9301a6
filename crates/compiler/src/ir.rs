//! Code generation vocabulary attached to the template tree by transforms.
//! Nodes here are consumed by the code generation stage, which is not part
//! of this crate.

use crate::{
    ast::NodeId,
    flags::{PatchFlag, RuntimeHelper, StaticLevel},
    SourceLocation,
};

#[cfg(feature = "serde")]
use serde::Serialize;

pub type Prop = (JsExpr, JsExpr);

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum JsExpr {
    /// Source. output to generated code as is.
    Src(String),
    /// representing a number, either id or key
    Num(usize),
    /// String Literal. output after quoted, used by attr/static arg.
    StrLit(String),
    /// non-string js expression, will be processed like prefixing
    Simple(SimpleExpr),
    /// alternative to join string as JsExpr
    Compound(Vec<JsExpr>),
    Props(Vec<Prop>),
    /// for calling runtime helper, e.g. resolveComponent()
    Call(RuntimeHelper, Vec<JsExpr>),
    /// for builtin component called as symbol
    Symbol(RuntimeHelper),
    /// array of JsExpr
    Array(Vec<JsExpr>),
    /// test ? consequent : alternate
    Conditional(Box<ConditionalExpr>),
    /// (params) => returns
    Func(Box<FuncExpr>),
    VNodeCall(Box<VNodeCall>),
    /// _cache[index] || (_cache[index] = value)
    Cache(Box<CacheExpr>),
    /// template child rendered as is
    Node(NodeId),
    /// template children rendered as is
    Nodes(Vec<NodeId>),
}

impl Default for JsExpr {
    fn default() -> Self {
        Self::Src(String::new())
    }
}

impl From<&str> for JsExpr {
    fn from(s: &str) -> Self {
        JsExpr::simple(s)
    }
}

impl From<String> for JsExpr {
    fn from(s: String) -> Self {
        JsExpr::Simple(SimpleExpr::new(s, false))
    }
}

impl From<SimpleExpr> for JsExpr {
    fn from(s: SimpleExpr) -> Self {
        JsExpr::Simple(s)
    }
}

impl From<VNodeCall> for JsExpr {
    fn from(v: VNodeCall) -> Self {
        JsExpr::VNodeCall(Box::new(v))
    }
}

impl JsExpr {
    /// a convenient util for creating JsExpr::Simple
    pub fn simple<S: Into<String>>(s: S) -> Self {
        JsExpr::Simple(SimpleExpr::new(s, false))
    }
    pub fn str_lit<S: Into<String>>(s: S) -> Self {
        JsExpr::StrLit(s.into())
    }
    pub fn as_vnode_call(&self) -> Option<&VNodeCall> {
        match self {
            JsExpr::VNodeCall(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_vnode_call_mut(&mut self) -> Option<&mut VNodeCall> {
        match self {
            JsExpr::VNodeCall(v) => Some(v),
            _ => None,
        }
    }
    pub fn static_level(&self) -> StaticLevel {
        use JsExpr::*;
        use StaticLevel as S;
        match self {
            Num(_) | StrLit(_) => S::CanStringify,
            Simple(s) => s.const_type,
            Symbol(_) | Src(_) => S::CanHoist,
            Compound(v) | Array(v) | Call(_, v) => v
                .iter()
                .map(Self::static_level)
                .min()
                .unwrap_or(S::CanStringify),
            Props(ps) => {
                let prop_level = |prop: &Prop| {
                    let key_level = Self::static_level(&prop.0);
                    let val_level = Self::static_level(&prop.1);
                    key_level.min(val_level)
                };
                ps.iter().map(prop_level).min().unwrap_or(S::CanStringify)
            }
            Conditional(..) | Func(..) | VNodeCall(..) | Cache(..) | Node(_) | Nodes(_) => {
                S::NotStatic
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SimpleExpr {
    pub content: String,
    pub is_static: bool,
    pub const_type: StaticLevel,
    /// identifiers declared by the expression, e.g. `(item, index)` in v-for.
    /// Filled by the expression processor when prefixing identifiers.
    pub identifiers: Option<Vec<String>>,
    /// 1-based position in the hoist registry if this references a hoisted value
    pub hoisted: Option<usize>,
    pub loc: SourceLocation,
}

impl SimpleExpr {
    pub fn new<S: Into<String>>(content: S, is_static: bool) -> Self {
        Self {
            content: content.into(),
            is_static,
            const_type: if is_static {
                StaticLevel::CanStringify
            } else {
                StaticLevel::NotStatic
            },
            ..Default::default()
        }
    }
    pub fn with_loc(mut self, loc: SourceLocation) -> Self {
        self.loc = loc;
        self
    }
    pub fn with_const_type(mut self, level: StaticLevel) -> Self {
        self.const_type = level;
        self
    }
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct VNodeCall {
    pub tag: JsExpr,
    pub props: Option<JsExpr>,
    pub children: Option<JsExpr>,
    pub patch_flag: PatchFlag,
    pub dynamic_props: Option<JsExpr>,
    pub directives: Option<JsExpr>,
    pub is_block: bool,
    pub disable_tracking: bool,
    pub is_component: bool,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConditionalExpr {
    pub test: JsExpr,
    pub consequent: JsExpr,
    pub alternate: JsExpr,
    pub newline: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FuncExpr {
    pub params: Vec<JsExpr>,
    pub returns: JsExpr,
    pub newline: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CacheExpr {
    pub index: usize,
    pub value: JsExpr,
    pub is_vnode: bool,
}

/// import statement emitted at the top level of generated code
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ImportItem {
    pub exp: JsExpr,
    pub path: String,
}
