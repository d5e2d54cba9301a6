use super::build_props::{build_directive_args, build_props, BuildProps};
use crate::{
    ast::{Attribute, Directive, ElemProp, Element, ElementType, Node, NodeId},
    error::TransformResult,
    flags::{PatchFlag, RuntimeHelper, StaticLevel},
    ir::{JsExpr as Js, VNodeCall},
    transformer::{create_vnode_call, on_exit, BindingTypes, Exits, TransformContext},
    util::{
        camelize, capitalize, find_dir, get_core_component, is_component_tag, prop_finder,
        to_valid_asset_id,
    },
};

/// Generates the vnode call of plain elements and components once their
/// children are transformed.
pub fn transform_element(node: NodeId, ctx: &mut TransformContext) -> TransformResult<Exits> {
    let is_target = ctx.ast().element(node).map_or(false, |e| {
        matches!(e.tag_type, ElementType::Plain | ElementType::Component)
    });
    if !is_target {
        return Ok(Exits::new());
    }
    Ok(on_exit(|ctx| {
        // the node may have been replaced by a structural directive
        let current = match ctx.current_node {
            Some(n) => n,
            None => return Ok(()),
        };
        let e = match ctx.ast().element(current) {
            Some(e) => e.clone(),
            None => return Ok(()),
        };
        let codegen = convert_element(current, e, ctx);
        if let Some(elem) = ctx.ast_mut().element_mut(current) {
            elem.codegen = Some(codegen);
        }
        Ok(())
    }))
}

fn convert_element(node: NodeId, e: Element, ctx: &mut TransformContext) -> Js {
    let is_component = e.is_component() && !(ctx.option.is_custom_element)(&e.tag);
    let tag = if is_component {
        resolve_component_type(&e, ctx)
    } else {
        Js::str_lit(e.tag.as_str())
    };
    let is_dynamic_component = matches!(tag, Js::Call(RuntimeHelper::ResolveDynamicComponent, _));
    let mut is_block = should_use_block(&e, &tag, is_component);
    let (children, more_flags) = build_children(&e, &tag, ctx);
    if more_flags.contains(PatchFlag::DYNAMIC_SLOTS) {
        is_block = true;
    }
    let BuildProps {
        props,
        directives,
        mut patch_flag,
        dynamic_props,
        should_use_block,
    } = build_props(node, ctx, e.props.clone(), is_component, is_dynamic_component);
    patch_flag |= more_flags;
    let directives = if directives.is_empty() {
        None
    } else {
        let args = directives
            .iter()
            .map(|dir| build_directive_args(dir, ctx))
            .collect();
        Some(Js::Array(args))
    };
    let call = VNodeCall {
        tag,
        props,
        children,
        patch_flag,
        dynamic_props: stringify_dynamic_prop_names(&dynamic_props),
        directives,
        is_block: is_block || should_use_block,
        disable_tracking: false,
        is_component,
        loc: e.loc,
    };
    create_vnode_call(ctx, call)
}

/// Returns a expression for the first argument of createVNode. It can be
/// 1. Js::Call for dynamic component.
/// 2. Js::Symbol for builtin component.
/// 3. setup binding or asset id for user component.
pub fn resolve_component_type(e: &Element, ctx: &mut TransformContext) -> Js {
    let is_explicit_dynamic = is_component_tag(&e.tag);
    // 1. dynamic component
    let tag = match resolve_dynamic_component(e, is_explicit_dynamic) {
        Ok(exp) => return Js::Call(ctx.helper(RuntimeHelper::ResolveDynamicComponent), vec![exp]),
        Err(tag) => tag,
    };
    // 1.5 v-is (deprecated)
    if !is_explicit_dynamic {
        if let Some(dir) = find_dir(e, "is") {
            let exp = dir.get_ref().expression.clone().unwrap_or_default();
            let resolve = ctx.helper(RuntimeHelper::ResolveDynamicComponent);
            return Js::Call(resolve, vec![Js::Simple(exp)]);
        }
    }
    // 2. built-in components (Teleport, Transition, KeepAlive, Suspense...)
    let builtin = (ctx.option.is_builtin_component)(tag).or_else(|| get_core_component(tag));
    if let Some(builtin) = builtin {
        // built-ins are simply fallthroughs in SSR
        if !ctx.option.ssr {
            ctx.helper(builtin);
        }
        return Js::Symbol(builtin);
    }
    // 3. user component from setup bindings
    if let Some(from_setup) = resolve_setup_component(tag, ctx) {
        return from_setup;
    }
    // 4. self referencing component (inferred from filename)
    let is_self = ctx
        .self_name
        .as_deref()
        .map_or(false, |name| capitalize(&camelize(tag)) == name);
    ctx.helper(RuntimeHelper::ResolveComponent);
    if is_self {
        // codegen passes `maybeSelfReference` to resolveComponent for __self
        ctx.add_component(format!("{}__self", tag));
    } else {
        // 5. user component (resolve)
        ctx.add_component(tag);
    }
    Js::Src(to_valid_asset_id(tag, "component"))
}

/// Returns Ok if resolved as dynamic component, Err with the tag name otherwise
fn resolve_dynamic_component(e: &Element, is_explicit_dynamic: bool) -> Result<Js, &str> {
    let found = match prop_finder(e, "is").find() {
        Some(found) => found,
        None => return Err(&e.tag),
    };
    match &e.props[found.pos()] {
        ElemProp::Attr(Attribute { value: Some(v), .. }) if is_explicit_dynamic => {
            Ok(Js::str_lit(v.as_str()))
        }
        ElemProp::Dir(Directive {
            expression: Some(exp),
            ..
        }) if is_explicit_dynamic => Ok(Js::Simple(exp.clone())),
        // <button is="vue:xxx"> resolves xxx as a component
        ElemProp::Attr(Attribute { value: Some(v), .. }) if v.starts_with("vue:") => Err(&v[4..]),
        _ => Err(&e.tag),
    }
}

fn resolve_setup_component(tag: &str, ctx: &mut TransformContext) -> Option<Js> {
    if let Some(from_setup) = resolve_setup_reference(tag, ctx) {
        return Some(from_setup);
    }
    // handle <obj.Tag/>, excluding .tag or obj.
    let dot_index = tag.find('.').filter(|&i| i != 0 && i < tag.len() - 1)?;
    let (ns, access) = tag.split_at(dot_index);
    let ns = resolve_setup_reference(ns, ctx)?;
    Some(Js::Compound(vec![ns, Js::Src(access.into())]))
}

/// Returns the binding created in script setup, modulo camel/pascal case.
pub(super) fn resolve_setup_reference(name: &str, ctx: &mut TransformContext) -> Option<Js> {
    let bindings = ctx.option.binding_metadata.clone();
    if bindings.is_empty() || !bindings.is_setup() {
        return None;
    }
    let camel = camelize(name);
    let pascal = capitalize(&camel);
    let candidates = [name.to_string(), camel, pascal];
    let variety = |ty: BindingTypes| {
        candidates
            .iter()
            .find(|n| bindings.get(n.as_str()) == Some(&ty))
            .cloned()
    };
    let from_setup = |n: String| {
        Js::Compound(vec![Js::Src("$setup[".into()), Js::StrLit(n), Js::Src("]".into())])
    };
    if let Some(from_const) = variety(BindingTypes::SetupConst) {
        return Some(if ctx.option.inline {
            Js::simple(from_const)
        } else {
            from_setup(from_const)
        });
    }
    let maybe_ref = variety(BindingTypes::SetupLet)
        .or_else(|| variety(BindingTypes::SetupRef))
        .or_else(|| variety(BindingTypes::SetupMaybeRef))?;
    Some(if ctx.option.inline {
        Js::Call(ctx.helper(RuntimeHelper::Unref), vec![Js::simple(maybe_ref)])
    } else {
        from_setup(maybe_ref)
    })
}

fn should_use_block(e: &Element, tag: &Js, is_component: bool) -> bool {
    use RuntimeHelper as H;
    match tag {
        // dynamic component may resolve to plain element
        Js::Call(H::ResolveDynamicComponent, _) => return true,
        // Force teleport/suspense into a block so its children are not
        // collected by a parent block.
        Js::Symbol(H::Teleport) | Js::Symbol(H::Suspense) => return true,
        _ if is_component => return false,
        _ => {}
    }
    // <svg> and <foreignObject> must be forced into blocks so that block
    // updates inside get proper isSVG flag at runtime. (vue-next/#639, #643)
    matches!(e.tag.as_str(), "svg" | "foreignObject" | "math") ||
    // vue-next/#938: elements with dynamic keys should be forced into blocks
    prop_finder(e, "key").dynamic_only().find().is_some()
}

fn build_children(e: &Element, tag: &Js, ctx: &TransformContext) -> (Option<Js>, PatchFlag) {
    let mut more_flags = PatchFlag::empty();
    if e.children.is_empty() {
        return (None, more_flags);
    }
    if is_builtin_symbol(tag, RuntimeHelper::KeepAlive) {
        // force keep-alive to always be updated
        more_flags |= PatchFlag::DYNAMIC_SLOTS;
    }
    if let &[child] = e.children.as_slice() {
        if !is_builtin_symbol(tag, RuntimeHelper::Teleport) {
            match &ctx.ast()[child] {
                Node::Interpolation(i) => {
                    let level = ctx
                        .constant_cache
                        .get(&child)
                        .copied()
                        .unwrap_or(i.content.const_type);
                    if level == StaticLevel::NotStatic {
                        more_flags |= PatchFlag::TEXT;
                    }
                    return (Some(Js::Node(child)), more_flags);
                }
                Node::Text(_) => return (Some(Js::Node(child)), more_flags),
                _ => {}
            }
        }
    }
    (Some(Js::Nodes(e.children.clone())), more_flags)
}

fn is_builtin_symbol(tag: &Js, helper: RuntimeHelper) -> bool {
    matches!(tag, Js::Symbol(r) if *r == helper)
}

fn stringify_dynamic_prop_names(names: &[String]) -> Option<Js> {
    if names.is_empty() {
        return None;
    }
    let quoted: Vec<_> = names.iter().map(|n| format!("\"{}\"", n)).collect();
    Some(Js::Src(format!("[{}]", quoted.join(", "))))
}
