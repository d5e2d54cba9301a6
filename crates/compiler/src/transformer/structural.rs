use super::{Exits, NodeTransform, TransformContext};
use crate::{
    ast::{Directive, ElemProp, NodeId},
    error::TransformResult,
    util::{is_template_slot, PropPattern},
};

/// Builds a node transform for directives that change the tree
/// structure, e.g. v-if and v-for. Matching directives are taken off the
/// element before the handler runs, so a node the handler wraps or
/// re-traverses never triggers the same directive again.
pub fn create_structural_directive_transform<P, F>(pattern: P, handler: F) -> impl NodeTransform
where
    P: PropPattern + 'static,
    F: Fn(NodeId, Directive, &mut TransformContext) -> TransformResult<Exits> + 'static,
{
    move |node: NodeId, ctx: &mut TransformContext| -> TransformResult<Exits> {
        let mut exits = Exits::new();
        match ctx.ast().element(node) {
            // structural directives on <template v-slot> are handled by slot transforms
            Some(e) if !is_template_slot(e) => {}
            _ => return Ok(exits),
        }
        let mut i = 0;
        loop {
            let props = match ctx.ast_mut().element_mut(node) {
                Some(e) => &mut e.props,
                None => break,
            };
            if i >= props.len() {
                break;
            }
            let is_match = matches!(&props[i], ElemProp::Dir(dir) if pattern.matches(&dir.name));
            if !is_match {
                i += 1;
                continue;
            }
            if let ElemProp::Dir(dir) = props.remove(i) {
                exits.extend(handler(node, dir, ctx)?);
            }
        }
        Ok(exits)
    }
}
