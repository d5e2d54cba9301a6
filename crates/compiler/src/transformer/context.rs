use super::{NodeTransform, TransformOption};
use crate::{
    ast::{Ast, Node, NodeId},
    error::{CompilationError, TransformError, TransformResult},
    flags::{RuntimeHelper, StaticLevel},
    ir::{CacheExpr, ImportItem, JsExpr, SimpleExpr},
    util::{camelize, capitalize},
    SourceLocation,
};
use indexmap::{map::Entry, IndexMap, IndexSet};
use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHasher};
use std::{hash::BuildHasherDefault, mem, rc::Rc};

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Nesting depth of scope introducing directives around the current node.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Scopes {
    pub v_for: usize,
}

/// Things that declare template scope identifiers.
pub trait ScopeIdentifiers {
    fn for_each_identifier(&self, f: &mut dyn FnMut(&str));
}

impl ScopeIdentifiers for str {
    fn for_each_identifier(&self, f: &mut dyn FnMut(&str)) {
        f(self)
    }
}

impl ScopeIdentifiers for SimpleExpr {
    fn for_each_identifier(&self, f: &mut dyn FnMut(&str)) {
        match &self.identifiers {
            Some(ids) => ids.iter().for_each(|id| f(id.as_str())),
            None => f(self.content.as_str()),
        }
    }
}

lazy_static! {
    static ref FILE_NAME_RE: Regex = Regex::new(r"([^/\\]+)\.\w+$").unwrap();
}

fn get_self_name(filename: &str) -> Option<String> {
    let path = filename.split('?').next().unwrap_or_default();
    let name = FILE_NAME_RE.captures(path)?.get(1)?.as_str();
    Some(capitalize(&camelize(name)))
}

pub struct TransformContext {
    ast: Ast,
    pub option: TransformOption,
    node_transforms: Rc<[Rc<dyn NodeTransform>]>,
    helpers: FxIndexMap<RuntimeHelper, usize>,
    components: FxIndexSet<String>,
    directives: FxIndexSet<String>,
    filters: FxIndexSet<String>,
    imports: Vec<ImportItem>,
    hoists: Vec<JsExpr>,
    temps: usize,
    cached: usize,
    identifiers: FxHashMap<String, usize>,
    pub scopes: Scopes,
    /// static level computed by the hoisting collaborator
    pub constant_cache: FxHashMap<NodeId, StaticLevel>,
    pub in_v_once: bool,
    /// component name inferred from filename, used for self reference
    pub self_name: Option<String>,
    pub current_node: Option<NodeId>,
    pub parent: Option<NodeId>,
    pub grand_parent: Option<NodeId>,
    pub child_index: usize,
    on_node_removed: Box<dyn FnMut()>,
}

impl TransformContext {
    pub fn new(ast: Ast, mut option: TransformOption) -> Self {
        let node_transforms = mem::take(&mut option.node_transforms).into();
        let self_name = get_self_name(&option.filename);
        let root = ast.root();
        Self {
            ast,
            option,
            node_transforms,
            helpers: FxIndexMap::default(),
            components: FxIndexSet::default(),
            directives: FxIndexSet::default(),
            filters: FxIndexSet::default(),
            imports: vec![],
            hoists: vec![],
            temps: 0,
            cached: 0,
            identifiers: FxHashMap::default(),
            scopes: Scopes::default(),
            constant_cache: FxHashMap::default(),
            in_v_once: false,
            self_name,
            current_node: Some(root),
            parent: None,
            grand_parent: None,
            child_index: 0,
            on_node_removed: Box::new(|| {}),
        }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }
    pub fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }
    pub fn into_ast(self) -> Ast {
        self.ast
    }
    pub fn root(&self) -> NodeId {
        self.ast.root()
    }
    pub(super) fn node_transforms(&self) -> Rc<[Rc<dyn NodeTransform>]> {
        self.node_transforms.clone()
    }
    pub(super) fn set_on_node_removed(&mut self, f: Box<dyn FnMut()>) {
        self.on_node_removed = f;
    }

    pub fn helper(&mut self, helper: RuntimeHelper) -> RuntimeHelper {
        *self.helpers.entry(helper).or_insert(0) += 1;
        helper
    }
    pub fn remove_helper(&mut self, helper: RuntimeHelper) {
        if let Entry::Occupied(mut entry) = self.helpers.entry(helper) {
            if *entry.get() > 1 {
                *entry.get_mut() -= 1;
            } else {
                entry.shift_remove();
            }
        }
    }
    pub fn helper_count(&self, helper: RuntimeHelper) -> usize {
        self.helpers.get(&helper).copied().unwrap_or(0)
    }
    pub fn helper_string(&mut self, helper: RuntimeHelper) -> String {
        format!("_{}", self.helper(helper).helper_str())
    }
    pub fn helpers(&self) -> impl Iterator<Item = RuntimeHelper> + '_ {
        self.helpers.keys().copied()
    }

    /// Replaces the node under the cursor and makes the new node current.
    pub fn replace_node<N: Into<Node>>(&mut self, node: N) -> TransformResult<NodeId> {
        let parent = self.parent.ok_or(TransformError::ReplaceRoot)?;
        if self.current_node.is_none() {
            return Err(TransformError::ReplaceRemovedNode);
        }
        if self.ast.children(parent).len() <= self.child_index {
            return Err(TransformError::ReplaceRemovedNode);
        }
        let id = self.ast.alloc(node);
        let index = self.child_index;
        let children = self.ast[parent]
            .children_mut()
            .ok_or(TransformError::NotAParent(parent))?;
        children[index] = id;
        tracing::trace!(node = ?id, index, "replaced node");
        self.current_node = Some(id);
        Ok(id)
    }

    /// Removes `target` or the current node from the parent and keeps the
    /// cursor of the running walk in sync.
    pub fn remove_node(&mut self, target: Option<NodeId>) -> TransformResult<()> {
        let parent = self.parent.ok_or(TransformError::RemoveRoot)?;
        let list = self.ast.children(parent);
        let removal_index = match target {
            Some(id) => list
                .iter()
                .position(|&c| c == id)
                .ok_or(TransformError::NodeNotInParent(id))?,
            None if self.current_node.is_some() => self.child_index,
            None => return Err(TransformError::RemoveRemovedNode),
        };
        if removal_index >= list.len() {
            return Err(TransformError::RemoveRemovedNode);
        }
        if target.is_none() || target == self.current_node {
            self.current_node = None;
            (self.on_node_removed)();
        } else if self.child_index > removal_index {
            self.child_index -= 1;
            (self.on_node_removed)();
        }
        let children = self.ast[parent]
            .children_mut()
            .ok_or(TransformError::NotAParent(parent))?;
        let removed = children.remove(removal_index);
        tracing::trace!(node = ?removed, index = removal_index, "removed node");
        Ok(())
    }

    /// Registers a hoisted expression and returns a reference to it.
    pub fn hoist<E: Into<JsExpr>>(&mut self, exp: E) -> JsExpr {
        let exp = exp.into();
        let loc = expr_location(&exp);
        self.hoists.push(exp);
        let n = self.hoists.len();
        let identifier = SimpleExpr::new(format!("_hoisted_{}", n), false)
            .with_loc(loc)
            .with_const_type(StaticLevel::CanHoist);
        JsExpr::Simple(SimpleExpr {
            hoisted: Some(n),
            ..identifier
        })
    }
    /// resolves a reference returned by hoist
    pub fn hoisted(&self, exp: &JsExpr) -> Option<&JsExpr> {
        match exp {
            JsExpr::Simple(SimpleExpr {
                hoisted: Some(n), ..
            }) => self.hoists.get(n.checked_sub(1)?),
            _ => None,
        }
    }
    pub fn hoists(&self) -> &[JsExpr] {
        &self.hoists
    }

    pub fn cache(&mut self, exp: JsExpr, is_vnode: bool) -> JsExpr {
        let index = self.cached;
        self.cached += 1;
        JsExpr::Cache(Box::new(CacheExpr {
            index,
            value: exp,
            is_vnode,
        }))
    }

    pub fn add_identifiers<I>(&mut self, exp: &I)
    where
        I: ScopeIdentifiers + ?Sized,
    {
        // identifier tracking only matters for prefixing, not in browser
        if cfg!(feature = "browser") {
            return;
        }
        let identifiers = &mut self.identifiers;
        exp.for_each_identifier(&mut |id| {
            *identifiers.entry(id.to_string()).or_insert(0) += 1;
        });
    }
    pub fn remove_identifiers<I>(&mut self, exp: &I) -> TransformResult<()>
    where
        I: ScopeIdentifiers + ?Sized,
    {
        if cfg!(feature = "browser") {
            return Ok(());
        }
        let identifiers = &mut self.identifiers;
        let mut underflow = None;
        exp.for_each_identifier(&mut |id| match identifiers.get(id).copied() {
            Some(count) if count > 1 => {
                identifiers.insert(id.to_string(), count - 1);
            }
            Some(_) => {
                identifiers.remove(id);
            }
            None => {
                underflow.get_or_insert_with(|| id.to_string());
            }
        });
        match underflow {
            Some(id) => Err(TransformError::IdentifierUnderflow(id)),
            None => Ok(()),
        }
    }
    pub fn identifier_count(&self, id: &str) -> usize {
        self.identifiers.get(id).copied().unwrap_or(0)
    }

    pub fn on_error(&self, error: CompilationError) {
        self.option.error_handler.on_error(error)
    }
    pub fn on_warn(&self, error: CompilationError) {
        self.option.error_handler.on_warn(error)
    }

    pub fn add_import(&mut self, item: ImportItem) {
        self.imports.push(item);
    }
    /// allocates a temporary variable, returns its index
    pub fn new_temp(&mut self) -> usize {
        let temp = self.temps;
        self.temps += 1;
        temp
    }
    pub fn add_component<S: Into<String>>(&mut self, name: S) {
        self.components.insert(name.into());
    }
    pub fn add_directive<S: Into<String>>(&mut self, name: S) {
        self.directives.insert(name.into());
    }
    pub fn add_filter<S: Into<String>>(&mut self, name: S) {
        self.filters.insert(name.into());
    }

    /// Moves every collection onto the root node.
    pub(super) fn publish(&mut self) {
        let helpers = self.helpers.keys().copied().collect();
        let components = mem::take(&mut self.components).into_iter().collect();
        let directives = mem::take(&mut self.directives).into_iter().collect();
        let filters: Vec<_> = if self.option.compat_config.filters {
            mem::take(&mut self.filters).into_iter().collect()
        } else {
            vec![]
        };
        let imports = mem::take(&mut self.imports);
        let hoists = mem::take(&mut self.hoists);
        let (temps, cached) = (self.temps, self.cached);
        let root = self.ast.root_node_mut();
        root.helpers = helpers;
        root.components = components;
        root.directives = directives;
        root.filters = filters;
        root.imports = imports;
        root.hoists = hoists;
        root.temps = temps;
        root.cached = cached;
        root.transformed = true;
    }
}

fn expr_location(exp: &JsExpr) -> SourceLocation {
    match exp {
        JsExpr::Simple(s) => s.loc.clone(),
        JsExpr::VNodeCall(v) => v.loc.clone(),
        _ => SourceLocation::default(),
    }
}
