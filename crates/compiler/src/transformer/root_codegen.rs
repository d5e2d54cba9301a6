use super::TransformContext;
use crate::{
    ast::{Ast, ElementType, NodeId},
    error::TransformResult,
    flags::{PatchFlag, RuntimeHelper},
    ir::{JsExpr, VNodeCall},
    util::{get_vnode_block_helper, get_vnode_helper},
};

pub fn is_single_element_root(ast: &Ast, root: NodeId, child: NodeId) -> bool {
    ast.children(root).len() == 1
        && matches!(ast.element(child), Some(e) if e.tag_type != ElementType::SlotOutlet)
}

/// Turns a vnode call into a block and swaps the helpers it relies on.
pub fn convert_to_block(node: &mut VNodeCall, ctx: &mut TransformContext) {
    if node.is_block {
        return;
    }
    let in_ssr = ctx.option.in_ssr;
    node.is_block = true;
    ctx.remove_helper(get_vnode_helper(in_ssr, node.is_component));
    ctx.helper(RuntimeHelper::OpenBlock);
    ctx.helper(get_vnode_block_helper(in_ssr, node.is_component));
}

/// Registers the helpers a vnode call needs at runtime.
pub fn create_vnode_call(ctx: &mut TransformContext, call: VNodeCall) -> JsExpr {
    let in_ssr = ctx.option.in_ssr;
    if call.is_block {
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(get_vnode_block_helper(in_ssr, call.is_component));
    } else {
        ctx.helper(get_vnode_helper(in_ssr, call.is_component));
    }
    if call.directives.is_some() {
        ctx.helper(RuntimeHelper::WithDirectives);
    }
    JsExpr::VNodeCall(Box::new(call))
}

pub fn create_root_codegen(root: NodeId, ctx: &mut TransformContext) -> TransformResult<()> {
    let children = ctx.ast().children(root).to_vec();
    let codegen = match children.len() {
        0 => return Ok(()),
        1 => {
            let child = children[0];
            let reusable = is_single_element_root(ctx.ast(), root, child)
                && ctx.ast()[child].codegen().is_some();
            if reusable {
                single_element_codegen(child, ctx)
            } else {
                // single non-element root, e.g. <slot/>, v-if or v-for
                JsExpr::Node(child)
            }
        }
        _ => {
            let non_comments = children
                .iter()
                .filter(|&&c| !ctx.ast()[c].is_comment())
                .count();
            let mut patch_flag = PatchFlag::STABLE_FRAGMENT;
            if ctx.option.is_dev && non_comments == 1 {
                patch_flag |= PatchFlag::DEV_ROOT_FRAGMENT;
            }
            let tag = JsExpr::Symbol(ctx.helper(RuntimeHelper::Fragment));
            let call = VNodeCall {
                tag,
                children: Some(JsExpr::Nodes(children)),
                patch_flag,
                is_block: true,
                loc: ctx.ast().root_node().loc.clone(),
                ..Default::default()
            };
            create_vnode_call(ctx, call)
        }
    };
    ctx.ast_mut().root_node_mut().codegen = Some(codegen);
    Ok(())
}

/// Root element is rendered as a block. The element's own codegen is
/// converted too so both stay in sync.
fn single_element_codegen(child: NodeId, ctx: &mut TransformContext) -> JsExpr {
    let slot = ctx.ast_mut()[child].codegen_mut().and_then(Option::take);
    let mut codegen = match slot {
        Some(codegen) => codegen,
        None => return JsExpr::Node(child),
    };
    if let Some(call) = codegen.as_vnode_call_mut() {
        convert_to_block(call, ctx);
    }
    if let Some(slot) = ctx.ast_mut()[child].codegen_mut() {
        *slot = Some(codegen.clone());
    }
    codegen
}
