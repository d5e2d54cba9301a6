use super::{Exits, TransformContext};
use crate::{
    ast::{Node, NodeId},
    error::TransformResult,
    flags::RuntimeHelper,
};
use std::{cell::Cell, rc::Rc};

enum Descend {
    Branches,
    Children,
    Helper(RuntimeHelper),
    Nothing,
}

fn descend_kind(node: &Node, ssr: bool) -> Descend {
    match node {
        Node::If(_) => Descend::Branches,
        Node::For(_) | Node::Element(_) | Node::IfBranch(_) | Node::Root(_) => Descend::Children,
        Node::Interpolation(_) if !ssr => Descend::Helper(RuntimeHelper::ToDisplayString),
        Node::Comment(_) if !ssr => Descend::Helper(RuntimeHelper::CreateComment),
        Node::Interpolation(_) | Node::Comment(_) | Node::Text(_) => Descend::Nothing,
    }
}

fn branch_at(ctx: &TransformContext, node: NodeId, i: usize) -> Option<NodeId> {
    match &ctx.ast()[node] {
        Node::If(n) => n.branches.get(i).copied(),
        _ => None,
    }
}

/// Visits a node with every node transform, descends into its children
/// and then runs the collected exit callbacks in reverse order.
pub fn traverse_node(node: NodeId, ctx: &mut TransformContext) -> TransformResult<()> {
    ctx.current_node = Some(node);
    let transforms = ctx.node_transforms();
    let mut exits = Exits::new();
    let mut node = node;
    for transform in transforms.iter() {
        exits.extend(transform.transform(node, ctx)?);
        match ctx.current_node {
            // node was removed
            None => return Ok(()),
            // node may have been replaced
            Some(current) => node = current,
        }
    }

    match descend_kind(&ctx.ast()[node], ctx.option.ssr) {
        Descend::Branches => {
            let mut i = 0;
            while let Some(branch) = branch_at(ctx, node, i) {
                traverse_node(branch, ctx)?;
                i += 1;
            }
        }
        Descend::Children => traverse_children(node, ctx)?,
        Descend::Helper(helper) => {
            ctx.helper(helper);
        }
        Descend::Nothing => {}
    }

    ctx.current_node = Some(node);
    for exit in exits.into_iter().rev() {
        exit(ctx)?;
    }
    Ok(())
}

/// Walks children by index. Transforms may remove the visited child or
/// an earlier sibling; the removal notification moves the index back so
/// no child is skipped or visited twice.
pub fn traverse_children(parent: NodeId, ctx: &mut TransformContext) -> TransformResult<()> {
    let grand_parent = ctx.parent;
    let removed = Rc::new(Cell::new(0usize));
    let mut i = 0;
    while let Some(child) = ctx.ast().children(parent).get(i).copied() {
        ctx.grand_parent = grand_parent;
        ctx.parent = Some(parent);
        ctx.child_index = i;
        let counter = removed.clone();
        ctx.set_on_node_removed(Box::new(move || counter.set(counter.get() + 1)));
        traverse_node(child, ctx)?;
        i = (i + 1).saturating_sub(removed.replace(0));
    }
    Ok(())
}
