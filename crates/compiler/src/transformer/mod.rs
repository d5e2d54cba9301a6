/*!
Transform the template tree in place.

Transformation runs a list of node transforms over every node in a
pre-order walk. Each node transform may return exit callbacks that run
in post-order, after the node's children are transformed, in reverse
registration order.

* context: per run state, helper/hoist/cache registries and the cursor
* traverse: the mutation tolerant walk
* structural: adapter for v-if/v-for like directives
* root_codegen: finalizes the codegen of the root
 */

mod context;
mod root_codegen;
mod structural;
mod traverse;

pub use context::{ScopeIdentifiers, Scopes, TransformContext};
pub use root_codegen::{
    convert_to_block, create_root_codegen, create_vnode_call, is_single_element_root,
};
pub use structural::create_structural_directive_transform;
pub use traverse::{traverse_children, traverse_node};

use crate::{
    ast::{Ast, Directive, NodeId},
    error::{
        CompilationError, CompilationErrorKind as ErrorKind, ErrorHandler, TracingErrorHandler,
        TransformResult,
    },
    flags::RuntimeHelper,
    ir::Prop,
    transforms,
    util::no,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::{ops::Deref, rc::Rc};

/// Callback run when the walk leaves a node.
pub type ExitFn = Box<dyn FnOnce(&mut TransformContext) -> TransformResult<()>>;
/// Zero or more exit callbacks returned by a node transform.
pub type Exits = SmallVec<[ExitFn; 1]>;

pub fn on_exit<F>(f: F) -> Exits
where
    F: FnOnce(&mut TransformContext) -> TransformResult<()> + 'static,
{
    let mut exits = Exits::new();
    exits.push(Box::new(f));
    exits
}

pub trait NodeTransform {
    fn transform(&self, node: NodeId, ctx: &mut TransformContext) -> TransformResult<Exits>;
}

impl<F> NodeTransform for F
where
    F: Fn(NodeId, &mut TransformContext) -> TransformResult<Exits>,
{
    fn transform(&self, node: NodeId, ctx: &mut TransformContext) -> TransformResult<Exits> {
        self(node, ctx)
    }
}

#[derive(Default)]
pub struct DirectiveTransformResult {
    pub props: Vec<Prop>,
    /// the directive also needs runtime handling, e.g. custom directives
    pub need_runtime: bool,
}

// use fn pointer so the option stays Clone.
pub type DirectiveTransformFn =
    fn(&Directive, NodeId, &mut TransformContext) -> DirectiveTransformResult;

/// Static hoisting policy is provided by the caller and runs once
/// traversal finishes.
pub type HoistStaticFn = fn(NodeId, &mut TransformContext) -> TransformResult<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTypes {
    /// returned from data()
    Data,
    /// declared as a prop
    Props,
    /// a let binding (may or may not be a ref)
    SetupLet,
    ///a const binding that can never be a ref.
    ///these bindings don't need `unref()` calls when processed in inlined
    ///template expressions.
    SetupConst,
    /// a const binding that may be a ref.
    SetupMaybeRef,
    /// bindings that are guaranteed to be refs
    SetupRef,
    /// declared by other options, e.g. computed, inject
    Options,
}

impl BindingTypes {
    pub fn is_setup(&self) -> bool {
        use BindingTypes::*;
        matches!(self, SetupLet | SetupConst | SetupMaybeRef | SetupRef)
    }
}

/// stores binding variables exposed by data/prop/setup script.
/// also stores if the binding is from setup script.
#[derive(Debug, Default, Clone)]
pub struct BindingMetadata(FxHashMap<String, BindingTypes>, bool);
impl BindingMetadata {
    pub fn new(map: FxHashMap<String, BindingTypes>, is_setup: bool) -> Self {
        Self(map, is_setup)
    }
    pub fn is_setup(&self) -> bool {
        self.1
    }
}
impl Deref for BindingMetadata {
    type Target = FxHashMap<String, BindingTypes>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Vue 2 compatibility switches.
#[derive(Debug, Default, Clone)]
pub struct CompatConfig {
    /// publish filters used in template on the root
    pub filters: bool,
}

#[derive(Clone)]
pub struct TransformOption {
    /// Prefix template expressions with `_ctx.`. Aliases introduced by
    /// v-for and slots are tracked as identifiers when enabled.
    pub prefix_identifiers: bool,
    pub hoist_static: bool,
    pub static_hoister: Option<HoistStaticFn>,
    pub cache_handlers: bool,
    pub node_transforms: Vec<Rc<dyn NodeTransform>>,
    pub directive_transforms: FxHashMap<&'static str, DirectiveTransformFn>,
    /// For platform developers. Registers platform specific components written in JS.
    /// e.g. transition, transition-group. Components that require code in Vue runtime.
    pub is_builtin_component: fn(&str) -> Option<RuntimeHelper>,
    /// custom elements are rendered as plain elements
    pub is_custom_element: fn(&str) -> bool,
    pub scope_id: Option<String>,
    /// Indicates this SFC template has used :slotted in its styles
    /// Defaults to `true` for backwards compatibility - SFC tooling should set it
    /// to `false` if no `:slotted` usage is detected in `<style>`
    pub slotted: bool,
    /// generate code for server side rendering
    pub ssr: bool,
    /// generate code that runs inside server rendered output, e.g. ssr fallback branches
    pub in_ssr: bool,
    /// Optional binding metadata analyzed from script - used to optimize
    /// binding access when `prefixIdentifiers` is enabled.
    pub binding_metadata: Rc<BindingMetadata>,
    /// Compile the function for inlining inside setup().
    /// This allows the function to directly access setup() local bindings.
    pub inline: bool,
    pub is_dev: bool,
    /// current SFC filename for self-referencing
    pub filename: String,
    pub error_handler: Rc<dyn ErrorHandler>,
    pub compat_config: CompatConfig,
}

impl Default for TransformOption {
    fn default() -> Self {
        Self {
            prefix_identifiers: false,
            hoist_static: false,
            static_hoister: None,
            cache_handlers: false,
            node_transforms: vec![],
            directive_transforms: FxHashMap::default(),
            is_builtin_component: |_| None,
            is_custom_element: no,
            scope_id: None,
            slotted: true,
            ssr: false,
            in_ssr: false,
            binding_metadata: Rc::new(BindingMetadata::default()),
            inline: false,
            is_dev: true,
            filename: String::new(),
            error_handler: Rc::new(TracingErrorHandler),
            compat_config: CompatConfig::default(),
        }
    }
}

pub trait Transformer {
    type IR;
    /// transform will change the tree inplace
    fn transform(&mut self, root: &mut Self::IR) -> TransformResult<()>;
}

/// Runs the built-in transforms followed by user supplied ones.
pub struct BaseTransformer {
    option: TransformOption,
}

impl BaseTransformer {
    pub fn new(mut option: TransformOption) -> Self {
        let (node_transforms, directive_transforms) = transforms::get_base_transform_preset();
        let user_transforms = std::mem::take(&mut option.node_transforms);
        option.node_transforms = node_transforms.into_iter().chain(user_transforms).collect();
        for (name, dir) in directive_transforms {
            option.directive_transforms.entry(name).or_insert(dir);
        }
        Self { option }
    }
}

impl Transformer for BaseTransformer {
    type IR = Ast;
    fn transform(&mut self, root: &mut Ast) -> TransformResult<()> {
        transform(root, self.option.clone())
    }
}

fn check_option(option: &TransformOption) {
    let eh = &option.error_handler;
    if cfg!(feature = "browser") && option.prefix_identifiers {
        eh.on_error(CompilationError::new(ErrorKind::PrefixIdNotSupported));
    } else if option.cache_handlers && !option.prefix_identifiers {
        eh.on_error(CompilationError::new(ErrorKind::CacheHandlerNotSupported));
    }
}

/// Transforms the tree in place and publishes the collected metadata on
/// the root. The tree is handed back even if a contract violation aborts
/// the run.
#[tracing::instrument(level = "debug", skip_all)]
pub fn transform(ast: &mut Ast, option: TransformOption) -> TransformResult<()> {
    check_option(&option);
    let mut ctx = TransformContext::new(std::mem::take(ast), option);
    let result = run_transform(&mut ctx);
    *ast = ctx.into_ast();
    result
}

fn run_transform(ctx: &mut TransformContext) -> TransformResult<()> {
    let root = ctx.root();
    traverse_node(root, ctx)?;
    tracing::debug!("traversal complete");
    if ctx.option.hoist_static {
        match ctx.option.static_hoister {
            Some(hoister) => {
                hoister(root, ctx)?;
                tracing::debug!(hoists = ctx.hoists().len(), "static hoisting complete");
            }
            None => tracing::warn!("hoist_static is set but no static hoister is provided"),
        }
    }
    if !ctx.option.ssr {
        create_root_codegen(root, ctx)?;
    }
    ctx.publish();
    tracing::debug!("transform complete");
    Ok(())
}
