use crate::{
    ast::{Attribute, Directive, DirectiveArg, ElemProp, NodeId},
    error::{CompilationError, CompilationErrorKind as ErrorKind},
    flags::{PatchFlag, RuntimeHelper, StaticLevel},
    ir::{JsExpr as Js, Prop, SimpleExpr},
    transformer::TransformContext,
    util::{
        is_bind_key, is_component_tag, is_mergeable_prop, is_on, is_reserved_prop, prop_key_name,
    },
};
use rustc_hash::FxHashMap;
use std::mem;

/// A directive that survives to runtime, with the runtime helper
/// implementing it when it is built in.
pub type RuntimeDir = (Directive, Option<RuntimeHelper>);

pub struct BuildProps {
    pub props: Option<Js>,
    pub directives: Vec<RuntimeDir>,
    pub patch_flag: PatchFlag,
    pub dynamic_props: Vec<String>,
    pub should_use_block: bool,
}

#[derive(Default)]
struct PropFlags {
    is_component: bool,
    is_dynamic_component: bool,
    has_ref: bool,
    has_class_binding: bool,
    has_style_binding: bool,
    has_hydration_event_binding: bool,
    has_dynamic_keys: bool,
    has_vnode_hook: bool,
}

#[derive(Default)]
/// collecting props object for vnode call. e.g:
/// <:prop="val" v-bind="obj"/> becomes mergeProps({prop: val}, obj)
struct PropArgs {
    /// pending properties, e.g. (prop, val)
    pending_props: Vec<Prop>,
    /// merged prop argument, e.g. obj
    merge_args: Vec<Js>,
}

#[derive(Default)]
struct CollectProps {
    prop_args: PropArgs,
    runtime_dirs: Vec<RuntimeDir>,
    dynamic_props: Vec<String>,
    prop_flags: PropFlags,
    should_use_block: bool,
}

pub fn build_props(
    node: NodeId,
    ctx: &mut TransformContext,
    elm_props: Vec<ElemProp>,
    is_component: bool,
    is_dynamic_component: bool,
) -> BuildProps {
    let (tag, has_children) = match ctx.ast().element(node) {
        Some(e) => (e.tag.clone(), !e.children.is_empty()),
        None => (String::new(), false),
    };
    let mut cp = CollectProps::default();
    cp.prop_flags.is_component = is_component;
    cp.prop_flags.is_dynamic_component = is_dynamic_component;
    for prop in elm_props {
        match prop {
            ElemProp::Attr(attr) => collect_attr(ctx, &tag, attr, &mut cp),
            ElemProp::Dir(dir) => collect_dir(node, ctx, &tag, has_children, dir, &mut cp),
        }
    }
    let props = compute_prop_expr(cp.prop_args, ctx);
    let patch_flag = build_patch_flag(
        &cp.prop_flags,
        &cp.runtime_dirs,
        &cp.dynamic_props,
        cp.should_use_block,
    );
    BuildProps {
        props,
        directives: cp.runtime_dirs,
        patch_flag,
        dynamic_props: cp.dynamic_props,
        should_use_block: cp.should_use_block,
    }
}

fn collect_attr(ctx: &TransformContext, tag: &str, attr: Attribute, cp: &mut CollectProps) {
    let Attribute { name, value, .. } = attr;
    let val = value.unwrap_or_default();
    // skip dynamic component is
    if name == "is" && (is_component_tag(tag) || val.starts_with("vue:")) {
        return;
    }
    if name == "ref" {
        cp.prop_flags.has_ref = true;
        push_ref_for_marker(ctx, cp);
    }
    cp.prop_args.pending_props.push((Js::StrLit(name), Js::StrLit(val)));
}

/// refs inside v-for are collected into arrays at runtime
fn push_ref_for_marker(ctx: &TransformContext, cp: &mut CollectProps) {
    if ctx.scopes.v_for > 0 {
        cp.prop_args
            .pending_props
            .push((Js::str_lit("ref_for"), Js::Src("true".into())));
    }
}

#[inline]
fn is_pre_convert_dir(s: &str) -> bool {
    match s.len() {
        2 => s == "if" || s == "is",
        4 => ["else", "slot", "memo", "once"].contains(&s),
        _ => s == "for" || s == "else-if",
    }
}

fn is_builtin_directive(s: &str) -> bool {
    [
        "bind", "cloak", "else-if", "else", "for", "html", "if", "model", "on", "once", "pre",
        "show", "slot", "text", "memo",
    ]
    .contains(&s)
}

fn collect_dir(
    node: NodeId,
    ctx: &mut TransformContext,
    tag: &str,
    has_children: bool,
    dir: Directive,
    cp: &mut CollectProps,
) {
    let name = dir.name.as_str();
    if is_pre_convert_dir(name) {
        return;
    }
    let is_v_bind = name == "bind";
    let is_v_on = name == "on";
    if is_v_bind && is_bind_key(&dir.argument, "is") && is_component_tag(tag) {
        return; // skip <component :is="c"/>
    }
    if is_v_on && ctx.option.ssr {
        return;
    }
    if is_v_bind && is_bind_key(&dir.argument, "ref") {
        push_ref_for_marker(ctx, cp);
    }
    // v-bind="obj" and v-on="obj" without argument are merged as objects
    if dir.argument.is_none() && (is_v_bind || is_v_on) {
        cp.prop_flags.has_dynamic_keys = true;
        match dir.expression.filter(|e| !e.is_empty()) {
            Some(exp) => {
                flush_pending_props(&mut cp.prop_args);
                let arg = if is_v_bind {
                    Js::Simple(exp)
                } else {
                    Js::Call(ctx.helper(RuntimeHelper::ToHandlers), vec![Js::Simple(exp)])
                };
                cp.prop_args.merge_args.push(arg);
            }
            None => {
                let kind = if is_v_bind {
                    ErrorKind::VBindNoExpression
                } else {
                    ErrorKind::VOnNoExpression
                };
                ctx.on_error(CompilationError::new(kind).with_location(dir.loc));
            }
        }
        return;
    }
    let transform = ctx.option.directive_transforms.get(name).copied();
    match transform {
        Some(transform) => {
            let ret = transform(&dir, node, ctx);
            if !ctx.option.ssr {
                ret.props.iter().for_each(|p| analyze_patch_flag(p, cp));
            }
            cp.prop_args.pending_props.extend(ret.props);
            if ret.need_runtime {
                cp.runtime_dirs.push((dir, None));
            }
        }
        None if !is_builtin_directive(name) => {
            // custom directive
            cp.runtime_dirs.push((dir, None));
            if has_children {
                cp.should_use_block = true;
            }
        }
        None => {}
    }
}

fn flush_pending_props(prop_args: &mut PropArgs) {
    // flush existing props to an object
    if prop_args.pending_props.is_empty() {
        return;
    }
    let arg = mem::take(&mut prop_args.pending_props);
    prop_args.merge_args.push(Js::Props(dedupe_properties(arg)));
}

fn dedupe_properties(props: Vec<Prop>) -> Vec<Prop> {
    let mut known_props = FxHashMap::default();
    let mut ret: Vec<Prop> = vec![];
    for (key, val) in props {
        let name = match prop_key_name(&key) {
            Some(name) => name.to_string(),
            None => {
                ret.push((key, val));
                continue;
            }
        };
        if let Some(&i) = known_props.get(&name) {
            if is_mergeable_prop(&name) {
                merge_as_array(&mut ret[i], val);
            }
        } else {
            known_props.insert(name, ret.len());
            ret.push((key, val));
        }
    }
    ret
}

fn merge_as_array(existing: &mut Prop, incoming: Js) {
    let val = &mut existing.1;
    if let Js::Array(arr) = val {
        arr.push(incoming);
    } else {
        let v = mem::take(val);
        *val = Js::Array(vec![v, incoming]);
    }
}

fn compute_prop_expr(mut prop_args: PropArgs, ctx: &mut TransformContext) -> Option<Js> {
    flush_pending_props(&mut prop_args);
    let PropArgs {
        pending_props,
        mut merge_args,
    } = prop_args;
    debug_assert!(pending_props.is_empty());
    if merge_args.len() <= 1 {
        merge_args.pop()
    } else {
        Some(Js::Call(ctx.helper(RuntimeHelper::MergeProps), merge_args))
    }
}

fn is_static_value(val: &Js) -> bool {
    match val {
        Js::Cache(_) => true,
        Js::Simple(_) | Js::Compound(_) | Js::StrLit(_) => {
            val.static_level() > StaticLevel::NotStatic
        }
        _ => false,
    }
}

fn analyze_patch_flag(p: &Prop, cp: &mut CollectProps) {
    let flags = &mut cp.prop_flags;
    let (key, val) = p;
    let name = match prop_key_name(key) {
        Some(name) => name,
        None => return flags.has_dynamic_keys = true,
    };
    let is_event_handler = is_on(name);
    if is_event_handler
        && (!flags.is_component || flags.is_dynamic_component)
        // omit click because hydration gives click fast path
        && !name.eq_ignore_ascii_case("onclick")
        // omit v-model
        && name != "onUpdate:modelValue"
        // vnode hooks
        && !is_reserved_prop(name)
    {
        flags.has_hydration_event_binding = true;
    }
    if is_event_handler && is_reserved_prop(name) {
        flags.has_vnode_hook = true;
    }
    if is_static_value(val) {
        return;
    }
    let dynamic_props = &mut cp.dynamic_props;
    let mut add_dynamic = |n: &str| {
        if !dynamic_props.iter().any(|d| d == n) {
            dynamic_props.push(n.to_string());
        }
    };
    match name {
        "ref" => flags.has_ref = true,
        "class" => flags.has_class_binding = true,
        "style" => flags.has_style_binding = true,
        "key" => (),
        n => add_dynamic(n),
    }
    if flags.is_component && (name == "class" || name == "style") {
        add_dynamic(name);
    }
}

fn build_patch_flag(
    f: &PropFlags,
    runtime_dirs: &[RuntimeDir],
    dynamic_names: &[String],
    should_use_block: bool,
) -> PatchFlag {
    let mut patch_flag = PatchFlag::empty();
    if f.has_dynamic_keys {
        patch_flag |= PatchFlag::FULL_PROPS;
    } else {
        // actually element can also be slot
        let is_plain = !f.is_component;
        if f.has_class_binding && is_plain {
            patch_flag |= PatchFlag::CLASS;
        }
        if f.has_style_binding && is_plain {
            patch_flag |= PatchFlag::STYLE;
        }
        if !dynamic_names.is_empty() {
            patch_flag |= PatchFlag::PROPS;
        }
    }
    if f.has_hydration_event_binding {
        patch_flag |= PatchFlag::NEED_HYDRATION;
    }
    let no_prop_patch =
        patch_flag.is_empty() || patch_flag == PatchFlag::NEED_HYDRATION;
    let has_side_effect = f.has_ref || f.has_vnode_hook || !runtime_dirs.is_empty();
    if !should_use_block && no_prop_patch && has_side_effect {
        patch_flag |= PatchFlag::NEED_PATCH;
    }
    patch_flag
}

/// `[arg, exp, arg, modifiers]` passed to withDirectives
pub fn build_directive_args(dir: &RuntimeDir, ctx: &mut TransformContext) -> Js {
    let (dir, runtime) = dir;
    let mut dir_args = vec![];
    match runtime {
        Some(helper) => dir_args.push(Js::Src(ctx.helper_string(*helper))),
        None => {
            let setup_name = format!("v-{}", dir.name);
            match super::transform_element::resolve_setup_reference(&setup_name, ctx) {
                Some(from_setup) => dir_args.push(from_setup),
                None => {
                    ctx.helper(RuntimeHelper::ResolveDirective);
                    ctx.add_directive(dir.name.as_str());
                    let id = crate::util::to_valid_asset_id(&dir.name, "directive");
                    dir_args.push(Js::Src(id));
                }
            }
        }
    }
    let void = || Js::Src("void 0".into());
    let has_exp = dir.expression.is_some();
    if let Some(exp) = &dir.expression {
        dir_args.push(Js::Simple(exp.clone()));
    }
    if let Some(arg) = &dir.argument {
        if !has_exp {
            dir_args.push(void());
        }
        dir_args.push(match arg {
            DirectiveArg::Static(s) => Js::str_lit(s.as_str()),
            DirectiveArg::Dynamic(s) => Js::simple(s.as_str()),
        });
    }
    if !dir.modifiers.is_empty() {
        if dir.argument.is_none() {
            if !has_exp {
                dir_args.push(void());
            }
            dir_args.push(void());
        }
        let mods = dir
            .modifiers
            .iter()
            .map(|m| (Js::Simple(SimpleExpr::new(m.as_str(), true)), Js::Src("true".into())))
            .collect();
        dir_args.push(Js::Props(mods));
    }
    Js::Array(dir_args)
}
