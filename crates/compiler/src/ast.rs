//! Template tree consumed and rewritten by the transform pipeline.
//!
//! Nodes are stored in an arena owned by [`Ast`] and referenced by [`NodeId`].
//! A container owns its children exclusively through an ordered id list, so
//! replacing or removing a child only touches the parent's list. Detached
//! nodes stay in the arena but are no longer reachable from the root.

use crate::{
    error::TransformError,
    flags::RuntimeHelper,
    ir::{ImportItem, JsExpr, SimpleExpr},
    Namespace, SourceLocation,
};
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Node {
    Root(RootNode),
    Element(Element),
    Text(TextNode),
    Interpolation(InterpolationNode),
    Comment(CommentNode),
    /// v-if, else-if, else group
    If(IfNode),
    IfBranch(IfBranchNode),
    /// v-for
    For(ForNode),
}

impl Node {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Node::Root(n) => &n.loc,
            Node::Element(n) => &n.loc,
            Node::Text(n) => &n.loc,
            Node::Interpolation(n) => &n.loc,
            Node::Comment(n) => &n.loc,
            Node::If(n) => &n.loc,
            Node::IfBranch(n) => &n.loc,
            Node::For(n) => &n.loc,
        }
    }
    /// short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Root(_) => "root",
            Node::Element(_) => "element",
            Node::Text(_) => "text",
            Node::Interpolation(_) => "interpolation",
            Node::Comment(_) => "comment",
            Node::If(_) => "if",
            Node::IfBranch(_) => "if-branch",
            Node::For(_) => "for",
        }
    }
    /// Returns the child list of container nodes. v-if groups hold
    /// branches rather than children and return None like leaves.
    pub fn children(&self) -> Option<&Vec<NodeId>> {
        match self {
            Node::Root(n) => Some(&n.children),
            Node::Element(n) => Some(&n.children),
            Node::IfBranch(n) => Some(&n.children),
            Node::For(n) => Some(&n.children),
            Node::If(_) | Node::Text(_) | Node::Interpolation(_) | Node::Comment(_) => None,
        }
    }
    pub fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Node::Root(n) => Some(&mut n.children),
            Node::Element(n) => Some(&mut n.children),
            Node::IfBranch(n) => Some(&mut n.children),
            Node::For(n) => Some(&mut n.children),
            Node::If(_) | Node::Text(_) | Node::Interpolation(_) | Node::Comment(_) => None,
        }
    }
    pub fn codegen(&self) -> Option<&JsExpr> {
        match self {
            Node::Root(n) => n.codegen.as_ref(),
            Node::Element(n) => n.codegen.as_ref(),
            Node::If(n) => n.codegen.as_ref(),
            Node::For(n) => n.codegen.as_ref(),
            Node::Text(_) | Node::Interpolation(_) | Node::Comment(_) | Node::IfBranch(_) => None,
        }
    }
    pub fn codegen_mut(&mut self) -> Option<&mut Option<JsExpr>> {
        match self {
            Node::Root(n) => Some(&mut n.codegen),
            Node::Element(n) => Some(&mut n.codegen),
            Node::If(n) => Some(&mut n.codegen),
            Node::For(n) => Some(&mut n.codegen),
            Node::Text(_) | Node::Interpolation(_) | Node::Comment(_) | Node::IfBranch(_) => None,
        }
    }
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
    pub fn is_comment(&self) -> bool {
        matches!(self, Node::Comment(_))
    }
}

/// Metadata published by the transform pipeline lives on the root.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RootNode {
    pub children: Vec<NodeId>,
    pub helpers: Vec<RuntimeHelper>,
    pub components: Vec<String>,
    pub directives: Vec<String>,
    pub imports: Vec<ImportItem>,
    pub hoists: Vec<JsExpr>,
    pub temps: usize,
    pub cached: usize,
    /// legacy filters used in template, only collected in compat mode
    pub filters: Vec<String>,
    pub codegen: Option<JsExpr>,
    pub transformed: bool,
    pub loc: SourceLocation,
}

impl RootNode {
    /// resolve a hoisted reference back to the hoisted expression
    pub fn hoisted(&self, expr: &JsExpr) -> Option<&JsExpr> {
        match expr {
            JsExpr::Simple(SimpleExpr {
                hoisted: Some(n), ..
            }) => self.hoists.get(n.checked_sub(1)?),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ElementType {
    #[default]
    Plain,
    Component,
    Template,
    SlotOutlet,
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Element {
    pub tag: String,
    pub tag_type: ElementType,
    pub namespace: Namespace,
    pub props: Vec<ElemProp>,
    pub children: Vec<NodeId>,
    pub is_self_closing: bool,
    pub codegen: Option<JsExpr>,
    pub loc: SourceLocation,
}

impl Element {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }
    pub fn with_tag_type(mut self, tag_type: ElementType) -> Self {
        self.tag_type = tag_type;
        self
    }
    pub fn with_attr<N: Into<String>>(mut self, name: N, value: Option<&str>) -> Self {
        self.props.push(ElemProp::Attr(Attribute {
            name: name.into(),
            value: value.map(String::from),
            loc: SourceLocation::default(),
        }));
        self
    }
    pub fn with_dir(mut self, dir: Directive) -> Self {
        self.props.push(ElemProp::Dir(dir));
        self
    }
    pub fn with_loc(mut self, loc: SourceLocation) -> Self {
        self.loc = loc;
        self
    }
    #[inline]
    pub fn is_component(&self) -> bool {
        self.tag_type == ElementType::Component
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ElemProp {
    Attr(Attribute),
    Dir(Directive),
}

impl ElemProp {
    pub fn get_location(&self) -> &SourceLocation {
        match self {
            ElemProp::Attr(a) => &a.loc,
            ElemProp::Dir(d) => &d.loc,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum DirectiveArg {
    /// :static="val"
    Static(String),
    /// :[dynamic]="val"
    Dynamic(String),
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Directive {
    pub name: String,
    pub argument: Option<DirectiveArg>,
    pub modifiers: Vec<String>,
    pub expression: Option<SimpleExpr>,
    pub loc: SourceLocation,
}

impl Directive {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn with_expr<S: Into<String>>(mut self, exp: S) -> Self {
        self.expression = Some(SimpleExpr::new(exp, false));
        self
    }
    pub fn with_arg(mut self, arg: DirectiveArg) -> Self {
        self.argument = Some(arg);
        self
    }
    pub fn with_modifier<S: Into<String>>(mut self, modifier: S) -> Self {
        self.modifiers.push(modifier.into());
        self
    }
    /// expression is either absent or only whitespace
    pub fn has_empty_expr(&self) -> bool {
        self.expression.as_ref().map_or(true, SimpleExpr::is_empty)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TextNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl TextNode {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            loc: SourceLocation::default(),
        }
    }
    pub fn is_all_whitespace(&self) -> bool {
        self.content.chars().all(|c| c.is_ascii_whitespace())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct InterpolationNode {
    pub content: SimpleExpr,
    pub loc: SourceLocation,
}

impl InterpolationNode {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: SimpleExpr::new(content, false),
            loc: SourceLocation::default(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CommentNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl CommentNode {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            loc: SourceLocation::default(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IfNode {
    pub branches: Vec<NodeId>,
    pub codegen: Option<JsExpr>,
    pub loc: SourceLocation,
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IfBranchNode {
    /// None for v-else
    pub condition: Option<SimpleExpr>,
    pub children: Vec<NodeId>,
    pub user_key: Option<ElemProp>,
    pub is_template_if: bool,
    pub loc: SourceLocation,
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ForNode {
    pub source: SimpleExpr,
    pub value_alias: Option<SimpleExpr>,
    pub key_alias: Option<SimpleExpr>,
    pub object_index_alias: Option<SimpleExpr>,
    pub children: Vec<NodeId>,
    pub codegen: Option<JsExpr>,
    pub loc: SourceLocation,
}

macro_rules! impl_into_node {
    ($($ty: ident => $variant: ident),*) => {
        $(
            impl From<$ty> for Node {
                fn from(n: $ty) -> Self {
                    Node::$variant(n)
                }
            }
        )*
    };
}

impl_into_node!(
    RootNode => Root,
    Element => Element,
    TextNode => Text,
    InterpolationNode => Interpolation,
    CommentNode => Comment,
    IfNode => If,
    IfBranchNode => IfBranch,
    ForNode => For
);

/// Arena of template nodes. The root is always a [`RootNode`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new(RootNode::default())
    }
}

impl Ast {
    pub fn new(root: RootNode) -> Self {
        Self {
            nodes: vec![Node::Root(root)],
            root: NodeId(0),
        }
    }
    pub fn root(&self) -> NodeId {
        self.root
    }
    pub fn root_node(&self) -> &RootNode {
        match &self[self.root] {
            Node::Root(r) => r,
            _ => unreachable!("ast root must be a root node"),
        }
    }
    pub fn root_node_mut(&mut self) -> &mut RootNode {
        let root = self.root;
        match &mut self[root] {
            Node::Root(r) => r,
            _ => unreachable!("ast root must be a root node"),
        }
    }
    /// Allocates a detached node. It is reachable only after being
    /// attached to a parent, e.g. by replace_node or as a branch child.
    pub fn alloc<N: Into<Node>>(&mut self, node: N) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node.into());
        id
    }
    /// Allocates a node and appends it to the parent's children.
    pub fn append<N: Into<Node>>(
        &mut self,
        parent: NodeId,
        node: N,
    ) -> Result<NodeId, TransformError> {
        if self[parent].children().is_none() {
            return Err(TransformError::NotAParent(parent));
        }
        let id = self.alloc(node);
        if let Some(children) = self[parent].children_mut() {
            children.push(id);
        }
        Ok(id)
    }
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }
    /// children of a container, empty for leaves and v-if groups
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self[id].children().map_or(&[], |c| c.as_slice())
    }
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.get(id)?.as_element()
    }
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.get_mut(id)?.as_element_mut()
    }
    /// number of allocated nodes, including detached ones
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Ast {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}
