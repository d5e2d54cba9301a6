use crate::{
    ast::{Directive, ElemProp, ElementType, IfBranchNode, IfNode, Node, NodeId},
    error::{CompilationError, CompilationErrorKind as ErrorKind, TransformError, TransformResult},
    flags::{PatchFlag, RuntimeHelper},
    ir::{ConditionalExpr, JsExpr, Prop, SimpleExpr, VNodeCall},
    transformer::{
        convert_to_block, create_structural_directive_transform, create_vnode_call, on_exit,
        traverse_node, Exits, NodeTransform, TransformContext,
    },
    util::{find_dir_empty, find_prop, inject_prop},
};

pub fn transform_if() -> impl NodeTransform {
    create_structural_directive_transform(["if", "else-if", "else"], process_if)
}

fn process_if(
    node: NodeId,
    mut dir: Directive,
    ctx: &mut TransformContext,
) -> TransformResult<Exits> {
    check_condition(&mut dir, ctx);
    if dir.name == "if" {
        process_v_if(node, dir, ctx)
    } else {
        process_v_else(node, dir, ctx)?;
        Ok(Exits::new())
    }
}

fn check_condition(dir: &mut Directive, ctx: &TransformContext) {
    if dir.name == "else" {
        if let Some(expr) = dir.expression.take() {
            let error =
                CompilationError::new(ErrorKind::UnexpectedDirExpression).with_location(expr.loc);
            ctx.on_error(error);
        }
    } else if dir.has_empty_expr() {
        let error =
            CompilationError::new(ErrorKind::VIfNoExpression).with_location(dir.loc.clone());
        ctx.on_error(error);
        dir.expression = Some(SimpleExpr::new("true", false).with_loc(dir.loc.clone()));
    }
}

fn process_v_if(
    node: NodeId,
    dir: Directive,
    ctx: &mut TransformContext,
) -> TransformResult<Exits> {
    let branch = create_if_branch(node, dir, ctx);
    let loc = ctx.ast()[node].loc().clone();
    let branch = ctx.ast_mut().alloc(branch);
    let if_node = ctx.replace_node(IfNode {
        branches: vec![branch],
        codegen: None,
        loc,
    })?;
    let key = sibling_key(ctx, if_node);
    Ok(on_exit(move |ctx| {
        let codegen = create_codegen_for_branch(branch, key, ctx);
        if let Some(slot) = ctx.ast_mut()[if_node].codegen_mut() {
            *slot = Some(codegen);
        }
        Ok(())
    }))
}

/// Attaches v-else(-if) to the preceding v-if. Comments and blank text
/// between the branches are dropped along the way.
fn process_v_else(node: NodeId, dir: Directive, ctx: &mut TransformContext) -> TransformResult<()> {
    let parent = ctx.parent.ok_or(TransformError::RemoveRoot)?;
    let mut comments = vec![];
    let mut i = ctx.child_index;
    let if_node = loop {
        if i == 0 {
            break None;
        }
        i -= 1;
        let sibling = ctx.ast().children(parent)[i];
        match &ctx.ast()[sibling] {
            Node::Comment(_) => {
                ctx.remove_node(Some(sibling))?;
                comments.insert(0, sibling);
            }
            Node::Text(t) if t.is_all_whitespace() => ctx.remove_node(Some(sibling))?,
            Node::If(_) => break Some(sibling),
            _ => break None,
        }
    };
    let if_node = match if_node {
        Some(n) => n,
        None => {
            let loc = ctx.ast()[node].loc().clone();
            let error = CompilationError::new(ErrorKind::VElseNoAdjacentIf).with_location(loc);
            ctx.on_error(error);
            return Ok(());
        }
    };
    let existing = if_branches(ctx, if_node);
    let after_else = existing
        .last()
        .map_or(false, |&b| matches!(&ctx.ast()[b], Node::IfBranch(b) if b.condition.is_none()));
    if dir.name == "else-if" && after_else {
        let loc = ctx.ast()[node].loc().clone();
        let error = CompilationError::new(ErrorKind::VElseNoAdjacentIf).with_location(loc);
        ctx.on_error(error);
    }
    ctx.remove_node(None)?;
    let mut branch = create_if_branch(node, dir, ctx);
    let in_transition = ctx
        .ast()
        .element(parent)
        .map_or(false, |e| e.tag == "transition" || e.tag == "Transition");
    if ctx.option.is_dev && !comments.is_empty() && !in_transition {
        comments.append(&mut branch.children);
        branch.children = comments;
    }
    check_same_key(&branch, &existing, ctx);
    let branch = ctx.ast_mut().alloc(branch);
    if let Node::If(n) = &mut ctx.ast_mut()[if_node] {
        n.branches.push(branch);
    }
    let key = sibling_key(ctx, if_node) + existing.len();
    traverse_node(branch, ctx)?;
    let codegen = create_codegen_for_branch(branch, key, ctx);
    if let Some(Some(parent_codegen)) = ctx.ast_mut()[if_node].codegen_mut() {
        if let Some(condition) = parent_condition(parent_codegen) {
            condition.alternate = codegen;
        }
    }
    // the element now lives in the branch and is already transformed
    ctx.current_node = None;
    Ok(())
}

fn if_branches(ctx: &TransformContext, if_node: NodeId) -> Vec<NodeId> {
    match &ctx.ast()[if_node] {
        Node::If(n) => n.branches.clone(),
        _ => vec![],
    }
}

fn create_if_branch(node: NodeId, dir: Directive, ctx: &TransformContext) -> IfBranchNode {
    let n = &ctx.ast()[node];
    let loc = n.loc().clone();
    let (is_template_if, children, user_key) = match n.as_element() {
        Some(e) => {
            let is_template = e.tag_type == ElementType::Template;
            // <template v-if v-for> keeps the template for v-for
            let children = if is_template && find_dir_empty(e, "for").is_none() {
                e.children.clone()
            } else {
                vec![node]
            };
            let key = find_prop(e, "key").map(|k| k.get_ref().clone());
            (is_template, children, key)
        }
        None => (false, vec![node], None),
    };
    IfBranchNode {
        condition: dir.expression,
        children,
        user_key,
        is_template_if,
        loc,
    }
}

fn check_same_key(branch: &IfBranchNode, existing: &[NodeId], ctx: &TransformContext) {
    if !ctx.option.is_dev {
        return;
    }
    let key = match &branch.user_key {
        Some(k) => k,
        None => return,
    };
    let duplicated = existing.iter().any(|&b| match &ctx.ast()[b] {
        Node::IfBranch(b) => b.user_key.as_ref().map_or(false, |k| is_same_key(k, key)),
        _ => false,
    });
    if duplicated {
        let error =
            CompilationError::new(ErrorKind::VIfSameKey).with_location(key.get_location().clone());
        ctx.on_error(error);
    }
}

fn is_same_key(a: &ElemProp, b: &ElemProp) -> bool {
    match (a, b) {
        (ElemProp::Attr(a), ElemProp::Attr(b)) => a.value == b.value,
        (ElemProp::Dir(a), ElemProp::Dir(b)) => match (&a.expression, &b.expression) {
            (Some(a), Some(b)) => a.is_static == b.is_static && a.content == b.content,
            _ => false,
        },
        _ => false,
    }
}

/// Chained branches render at the same depth, so keys continue from the
/// branches of preceding v-if groups among the siblings.
fn sibling_key(ctx: &TransformContext, if_node: NodeId) -> usize {
    let siblings = match ctx.parent {
        Some(p) => ctx.ast().children(p),
        None => return 0,
    };
    siblings
        .iter()
        .take_while(|&&s| s != if_node)
        .map(|&s| match &ctx.ast()[s] {
            Node::If(n) => n.branches.len(),
            _ => 0,
        })
        .sum()
}

/// the last conditional in an else-if chain
fn parent_condition(codegen: &mut JsExpr) -> Option<&mut ConditionalExpr> {
    match codegen {
        JsExpr::Conditional(c) => {
            if matches!(c.alternate, JsExpr::Conditional(_)) {
                parent_condition(&mut c.alternate)
            } else {
                Some(&mut **c)
            }
        }
        JsExpr::Cache(c) => parent_condition(&mut c.value),
        _ => None,
    }
}

fn create_codegen_for_branch(branch: NodeId, key: usize, ctx: &mut TransformContext) -> JsExpr {
    let condition = match &ctx.ast()[branch] {
        Node::IfBranch(b) => b.condition.clone(),
        _ => None,
    };
    let consequent = create_children_codegen(branch, key, ctx);
    let condition = match condition {
        Some(c) => c,
        None => return consequent,
    };
    let placeholder = if ctx.option.is_dev { r#""v-if""# } else { r#""""# };
    let helper = ctx.helper(RuntimeHelper::CreateComment);
    let alternate = JsExpr::Call(
        helper,
        vec![JsExpr::Src(placeholder.into()), JsExpr::Src("true".into())],
    );
    JsExpr::Conditional(Box::new(ConditionalExpr {
        test: JsExpr::Simple(condition),
        consequent,
        alternate,
        newline: true,
    }))
}

fn create_children_codegen(branch: NodeId, key: usize, ctx: &mut TransformContext) -> JsExpr {
    let key_prop: Prop = (JsExpr::str_lit("key"), JsExpr::Num(key));
    let (children, is_template_if, loc) = match &ctx.ast()[branch] {
        Node::IfBranch(b) => (b.children.clone(), b.is_template_if, b.loc.clone()),
        _ => return JsExpr::Node(branch),
    };
    if let &[child] = children.as_slice() {
        match &ctx.ast()[child] {
            Node::Element(_) => return keyed_child_codegen(child, key_prop, true, ctx),
            // a v-for fragment is keyed directly
            Node::For(_) => return keyed_child_codegen(child, key_prop, false, ctx),
            _ => {}
        }
    }
    let mut patch_flag = PatchFlag::STABLE_FRAGMENT;
    let non_comments = children.iter().filter(|&&c| !ctx.ast()[c].is_comment()).count();
    if ctx.option.is_dev && !is_template_if && non_comments == 1 {
        patch_flag |= PatchFlag::DEV_ROOT_FRAGMENT;
    }
    let tag = JsExpr::Symbol(ctx.helper(RuntimeHelper::Fragment));
    let call = VNodeCall {
        tag,
        props: Some(JsExpr::Props(vec![key_prop])),
        children: Some(JsExpr::Nodes(children)),
        patch_flag,
        is_block: true,
        loc,
        ..Default::default()
    };
    create_vnode_call(ctx, call)
}

/// Keys the child's own codegen and returns a copy for the branch.
fn keyed_child_codegen(
    child: NodeId,
    key_prop: Prop,
    as_block: bool,
    ctx: &mut TransformContext,
) -> JsExpr {
    let mut codegen = match ctx.ast_mut()[child].codegen_mut().and_then(Option::take) {
        Some(c) => c,
        None => return JsExpr::Node(child),
    };
    if let Some(call) = codegen.as_vnode_call_mut() {
        if as_block {
            convert_to_block(call, ctx);
        }
        inject_prop(&mut call.props, key_prop, ctx);
    }
    if let Some(slot) = ctx.ast_mut()[child].codegen_mut() {
        *slot = Some(codegen.clone());
    }
    codegen
}
