//! Built-in node and directive transforms.
//!
//! Structural directives are rewritten first so the element codegen
//! transform sees the final shape of the tree.

mod build_props;
mod transform_element;
mod v_bind;
mod v_for;
mod v_if;
mod v_once;

pub use build_props::{build_props, BuildProps, RuntimeDir};
pub use transform_element::{resolve_component_type, transform_element};
pub use v_bind::transform_bind;
pub use v_for::{parse_for_expr, transform_for, ForParseResult};
pub use v_if::transform_if;
pub use v_once::transform_once;

use crate::transformer::{DirectiveTransformFn, NodeTransform};
use rustc_hash::FxHashMap;
use std::rc::Rc;

pub type NodeTransforms = Vec<Rc<dyn NodeTransform>>;
pub type DirectiveTransforms = FxHashMap<&'static str, DirectiveTransformFn>;

fn shared<T: NodeTransform + 'static>(t: T) -> Rc<dyn NodeTransform> {
    Rc::new(t)
}

/// Node transforms in the order they run, plus directive transforms
/// keyed by directive name.
pub fn get_base_transform_preset() -> (NodeTransforms, DirectiveTransforms) {
    let node_transforms = vec![
        shared(transform_once),
        shared(transform_if()),
        shared(transform_for()),
        shared(transform_element),
    ];
    let mut directive_transforms: DirectiveTransforms = FxHashMap::default();
    directive_transforms.insert("bind", transform_bind);
    (node_transforms, directive_transforms)
}
