use crate::{
    ast::{Attribute, Directive, ElemProp, ElementType, ForNode, Node, NodeId},
    error::{CompilationError, CompilationErrorKind as ErrorKind, TransformResult},
    flags::{PatchFlag, RuntimeHelper, StaticLevel},
    ir::{FuncExpr, JsExpr, Prop, SimpleExpr, VNodeCall},
    transformer::{
        create_structural_directive_transform, create_vnode_call, on_exit, Exits, NodeTransform,
        TransformContext,
    },
    util::{find_prop, get_vnode_block_helper, get_vnode_helper, inject_prop},
};
use lazy_static::lazy_static;
use regex::Regex;
use smallvec::SmallVec;

pub fn transform_for() -> impl NodeTransform {
    create_structural_directive_transform("for", process_for)
}

/// `(value, key, index) in source`
#[derive(Debug, Clone, PartialEq)]
pub struct ForParseResult {
    pub source: SimpleExpr,
    pub value: Option<SimpleExpr>,
    pub key: Option<SimpleExpr>,
    pub index: Option<SimpleExpr>,
}

fn process_for(node: NodeId, dir: Directive, ctx: &mut TransformContext) -> TransformResult<Exits> {
    let expr = match dir.expression {
        Some(e) if !e.is_empty() => e,
        _ => {
            let error = CompilationError::new(ErrorKind::VForNoExpression).with_location(dir.loc);
            ctx.on_error(error);
            return Ok(Exits::new());
        }
    };
    let parsed = match parse_for_expr(&expr.content) {
        Some(parsed) => parsed,
        None => {
            let error =
                CompilationError::new(ErrorKind::VForMalformedExpression).with_location(expr.loc);
            ctx.on_error(error);
            return Ok(Exits::new());
        }
    };
    let ForParseResult {
        mut source,
        value,
        key,
        index,
    } = parsed;
    source.loc = expr.loc.clone();
    // literal sources like `10` never change
    if ctx.option.prefix_identifiers && source.content.parse::<f64>().is_ok() {
        source.const_type = StaticLevel::CanStringify;
    }
    check_template_v_for_key(node, ctx);
    let (is_template, children, key_prop) = match ctx.ast().element(node) {
        Some(e) => {
            let is_template = e.tag_type == ElementType::Template;
            let children = if is_template {
                e.children.clone()
            } else {
                vec![node]
            };
            let key_prop = find_prop(e, "key").map(|k| k.get_ref().clone());
            (is_template, children, key_prop)
        }
        None => (false, vec![node], None),
    };
    let for_node = ctx.replace_node(ForNode {
        source: source.clone(),
        value_alias: value.clone(),
        key_alias: key.clone(),
        object_index_alias: index.clone(),
        children,
        codegen: None,
        loc: dir.loc.clone(),
    })?;
    ctx.scopes.v_for += 1;
    let aliases: SmallVec<[SimpleExpr; 3]> = [value, key, index].into_iter().flatten().collect();
    if ctx.option.prefix_identifiers {
        for alias in &aliases {
            ctx.add_identifiers(alias);
        }
    }

    let is_stable = source.const_type > StaticLevel::NotStatic;
    let fragment_flag = if is_stable {
        PatchFlag::STABLE_FRAGMENT
    } else if key_prop.is_some() {
        PatchFlag::KEYED_FRAGMENT
    } else {
        PatchFlag::UNKEYED_FRAGMENT
    };
    let render = JsExpr::Call(ctx.helper(RuntimeHelper::RenderList), vec![JsExpr::Simple(source)]);
    let call = VNodeCall {
        tag: JsExpr::Symbol(ctx.helper(RuntimeHelper::Fragment)),
        children: Some(render),
        patch_flag: fragment_flag,
        is_block: true,
        disable_tracking: !is_stable,
        loc: dir.loc,
        ..Default::default()
    };
    let codegen = create_vnode_call(ctx, call);
    if let Some(slot) = ctx.ast_mut()[for_node].codegen_mut() {
        *slot = Some(codegen);
    }
    let key_prop = key_prop.map(|k| (JsExpr::str_lit("key"), key_value(k)));
    Ok(on_exit(move |ctx| {
        ctx.scopes.v_for -= 1;
        if ctx.option.prefix_identifiers {
            for alias in &aliases {
                ctx.remove_identifiers(alias)?;
            }
        }
        let child_block = create_child_block(for_node, key_prop, is_template, is_stable, ctx);
        let params = create_for_loop_params(&aliases_of(ctx, for_node));
        let func = JsExpr::Func(Box::new(FuncExpr {
            params,
            returns: child_block,
            newline: true,
        }));
        let codegen = ctx.ast_mut()[for_node].codegen_mut().and_then(Option::as_mut);
        if let Some(JsExpr::Call(_, args)) = codegen
            .and_then(JsExpr::as_vnode_call_mut)
            .and_then(|c| c.children.as_mut())
        {
            args.push(func);
        }
        Ok(())
    }))
}

fn key_value(prop: ElemProp) -> JsExpr {
    match prop {
        ElemProp::Attr(Attribute { value, .. }) => {
            JsExpr::Simple(SimpleExpr::new(value.unwrap_or_default(), true))
        }
        ElemProp::Dir(dir) => dir.expression.map(JsExpr::Simple).unwrap_or_default(),
    }
}

fn aliases_of(ctx: &TransformContext, for_node: NodeId) -> [Option<SimpleExpr>; 3] {
    match &ctx.ast()[for_node] {
        Node::For(f) => [
            f.value_alias.clone(),
            f.key_alias.clone(),
            f.object_index_alias.clone(),
        ],
        _ => [None, None, None],
    }
}

/// Builds the vnode rendered per item. A single element child is reused
/// and its block status flipped to match the fragment's stability.
fn create_child_block(
    for_node: NodeId,
    key_prop: Option<Prop>,
    is_template: bool,
    is_stable: bool,
    ctx: &mut TransformContext,
) -> JsExpr {
    let children = ctx.ast().children(for_node).to_vec();
    let single_element = match children.as_slice() {
        &[child] if ctx.ast().element(child).is_some() => Some(child),
        _ => None,
    };
    let child = match single_element {
        Some(child) => child,
        None => {
            let call = VNodeCall {
                tag: JsExpr::Symbol(ctx.helper(RuntimeHelper::Fragment)),
                props: key_prop.map(|k| JsExpr::Props(vec![k])),
                children: Some(JsExpr::Nodes(children)),
                patch_flag: PatchFlag::STABLE_FRAGMENT,
                is_block: true,
                ..Default::default()
            };
            return create_vnode_call(ctx, call);
        }
    };
    let mut codegen = match ctx.ast_mut()[child].codegen_mut().and_then(Option::take) {
        Some(c) => c,
        None => return JsExpr::Node(child),
    };
    if let Some(call) = codegen.as_vnode_call_mut() {
        if is_template {
            if let Some(key) = key_prop {
                inject_prop(&mut call.props, key, ctx);
            }
        }
        rebalance_block(call, !is_stable, ctx);
    }
    if let Some(slot) = ctx.ast_mut()[child].codegen_mut() {
        *slot = Some(codegen.clone());
    }
    codegen
}

fn rebalance_block(call: &mut VNodeCall, is_block: bool, ctx: &mut TransformContext) {
    let in_ssr = ctx.option.in_ssr;
    if call.is_block != is_block {
        if call.is_block {
            ctx.remove_helper(RuntimeHelper::OpenBlock);
            ctx.remove_helper(get_vnode_block_helper(in_ssr, call.is_component));
        } else {
            ctx.remove_helper(get_vnode_helper(in_ssr, call.is_component));
        }
    }
    call.is_block = is_block;
    if is_block {
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(get_vnode_block_helper(in_ssr, call.is_component));
    } else {
        ctx.helper(get_vnode_helper(in_ssr, call.is_component));
    }
}

/// Trailing missing params are dropped, inner ones become `_`, `__`...
fn create_for_loop_params(args: &[Option<SimpleExpr>]) -> Vec<JsExpr> {
    let len = args.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    args[..len]
        .iter()
        .enumerate()
        .map(|(i, arg)| match arg {
            Some(a) => JsExpr::Simple(a.clone()),
            None => JsExpr::simple("_".repeat(i + 1)),
        })
        .collect()
}

// <template v-for> key should be on the template itself
fn check_template_v_for_key(node: NodeId, ctx: &TransformContext) {
    let elem = match ctx.ast().element(node) {
        Some(e) if e.tag_type == ElementType::Template => e,
        _ => return,
    };
    let first_wrong = elem
        .children
        .iter()
        .filter_map(|&child| ctx.ast().element(child))
        .find_map(|child| find_prop(child, "key"));
    if let Some(wrong) = first_wrong {
        let key_loc = wrong.get_ref().get_location().clone();
        let error =
            CompilationError::new(ErrorKind::VForTemplateKeyPlacement).with_location(key_loc);
        ctx.on_error(error);
    }
}

const PARENS: &[char] = &['(', ')'];

pub fn parse_for_expr(expr: &str) -> Option<ForParseResult> {
    let (source, value, key, index) = split_for_expr(expr)?;
    Some(ForParseResult {
        source: SimpleExpr::new(source, false),
        value: alias_expr(value),
        key: key.and_then(alias_expr),
        index: index.and_then(alias_expr),
    })
}

type SplitFor<'a> = (&'a str, &'a str, Option<&'a str>, Option<&'a str>);

fn split_for_expr(expr: &str) -> Option<SplitFor<'_>> {
    // split source and binding
    let (lhs, rhs) = expr
        .split_once(" in ")
        .or_else(|| expr.split_once(" of "))
        .map(|(l, r)| (l.trim().trim_matches(PARENS), r.trim()))?;
    if rhs.is_empty() {
        return None;
    }
    let (val, key, idx) = split_v_for_iter(lhs);
    Some((rhs, val, key, idx))
}

const DESTRUCTING: &[char] = &['}', ']'];
fn split_v_for_iter(mut lhs: &str) -> (&str, Option<&str>, Option<&str>) {
    let mut split = SmallVec::<[&str; 3]>::new();
    while let Some((pre, post)) = lhs.rsplit_once(',') {
        if post.contains(DESTRUCTING) || split.len() == 2 {
            break;
        }
        lhs = pre;
        split.push(post.trim());
    }
    split.push(lhs.trim());
    split.reverse();
    match split.len() {
        2 => (split[0], Some(split[1]), None),
        3 => (split[0], Some(split[1]), Some(split[2])),
        _ => (split[0], None, None),
    }
}

lazy_static! {
    static ref PATTERN_TOKEN_RE: Regex = Regex::new(r"[=,{}\[\]]|([A-Za-z_$][\w$]*)(\s*:)?").unwrap();
}

fn alias_expr(alias: &str) -> Option<SimpleExpr> {
    if alias.is_empty() {
        return None;
    }
    let mut expr = SimpleExpr::new(alias, false);
    if alias.starts_with(['{', '[']) {
        expr.identifiers = Some(destructured_identifiers(alias));
    }
    Some(expr)
}

/// Names bound by a destructuring pattern. Object keys and default
/// values are skipped.
fn destructured_identifiers(pattern: &str) -> Vec<String> {
    let mut ids = vec![];
    let mut in_default = false;
    for caps in PATTERN_TOKEN_RE.captures_iter(pattern) {
        let ident = match caps.get(1) {
            Some(ident) => ident,
            None => {
                match &caps[0] {
                    "=" => in_default = true,
                    "," => in_default = false,
                    _ => {}
                }
                continue;
            }
        };
        if in_default || caps.get(2).is_some() {
            continue;
        }
        ids.push(ident.as_str().to_string());
    }
    ids
}

#[cfg(test)]
mod test {
    use super::super::test::*;
    use super::*;
    use crate::{
        ast::{Ast, DirectiveArg, Element, TextNode},
        cast,
        transformer::TransformOption,
    };

    fn check_equal(src: &str, expect: (&str, &str, Option<&str>, Option<&str>)) {
        let ret = split_for_expr(src).expect("should parse");
        assert_eq!(ret, expect);
    }

    #[test]
    fn test_parse_for_expr() {
        for &(src, expect) in &[
            ("a in [123]", ("[123]", "a", None, None)),
            ("   in [123]", ("[123]", "", None, None)),
            ("   a      in     [123]    ", ("[123]", "a", None, None)),
            ("a, b, c   in p ", ("p", "a", "b".into(), "c".into())),
            ("{a, b, c} in p ", ("p", "{a, b, c}", None, None)),
            ("{a, b}, c in p ", ("p", "{a, b}", "c".into(), None)),
            ("[a,] , b in p ", ("p", "[a,]", "b".into(), None)),
            ("a,b,c,d,e in p ", ("p", "a,b,c", "d".into(), "e".into())),
            ("(a,b) in p ", ("p", "a", "b".into(), None)),
            ("(a,b, c, d) of p ", ("p", "a,b", "c".into(), "d".into())),
            ("(,,) in p ", ("p", "", "".into(), "".into())),
        ] {
            check_equal(src, expect);
        }
    }

    #[test]
    fn test_parse_invalid_for() {
        for src in &["", "           in             ", "item in ", "items"] {
            assert!(parse_for_expr(src).is_none());
        }
    }

    #[test]
    fn test_empty_aliases() {
        let ret = parse_for_expr("(, i) in list").unwrap();
        assert!(ret.value.is_none());
        assert_eq!(ret.key.unwrap().content, "i");
        let params = create_for_loop_params(&[None, None, Some(SimpleExpr::new("idx", false))]);
        let names: Vec<_> = params
            .into_iter()
            .map(|p| cast!(p, JsExpr::Simple).content)
            .collect();
        assert_eq!(names, vec!["_", "__", "idx"]);
    }

    #[test]
    fn test_destructured_identifiers() {
        let ret = parse_for_expr("{ id, name: alias, tags = [] } in list").unwrap();
        let value = ret.value.unwrap();
        assert_eq!(
            value.identifiers,
            Some(vec!["id".to_string(), "alias".to_string(), "tags".to_string()])
        );
        let ret = parse_for_expr("[first, ...rest] in list").unwrap();
        let value = ret.value.unwrap();
        assert_eq!(value.identifiers, Some(vec!["first".into(), "rest".into()]));
    }

    fn for_elem(tag: &str, exp: &str) -> Element {
        Element::new(tag).with_dir(Directive::new("for").with_expr(exp))
    }

    fn for_of(ast: &Ast, node: NodeId) -> &ForNode {
        match &ast[node] {
            Node::For(f) => f,
            _ => panic!("expect for node"),
        }
    }

    #[test]
    fn test_v_for_replaces_element() {
        let mut ast = Ast::default();
        let root = ast.root();
        let li = ast.append(root, for_elem("li", "(item, i) in items")).unwrap();
        let eh = base_transform(&mut ast);
        assert!(eh.errors().is_empty());
        let for_node = first_child(&ast);
        let f = for_of(&ast, for_node);
        assert_eq!(f.source.content, "items");
        assert_eq!(f.value_alias.as_ref().unwrap().content, "item");
        assert_eq!(f.key_alias.as_ref().unwrap().content, "i");
        assert!(f.object_index_alias.is_none());
        assert_eq!(f.children, vec![li]);
    }

    #[test]
    fn test_v_for_codegen() {
        let mut ast = Ast::default();
        let root = ast.root();
        let li = ast.append(root, for_elem("li", "item in items")).unwrap();
        base_transform(&mut ast);
        let for_node = first_child(&ast);
        let call = ast[for_node].codegen().unwrap().as_vnode_call().unwrap();
        assert_eq!(call.tag, JsExpr::Symbol(RuntimeHelper::Fragment));
        assert_eq!(call.patch_flag, PatchFlag::UNKEYED_FRAGMENT);
        assert!(call.is_block);
        assert!(call.disable_tracking);
        let (helper, args) = match call.children.as_ref().unwrap() {
            JsExpr::Call(h, args) => (*h, args),
            _ => panic!("expect renderList call"),
        };
        assert_eq!(helper, RuntimeHelper::RenderList);
        assert_eq!(args.len(), 2);
        let func = cast!(&args[1], JsExpr::Func);
        assert_eq!(func.params, vec![JsExpr::simple("item")]);
        // unstable fragment turns the item into a block
        let item = func.returns.as_vnode_call().unwrap();
        assert!(item.is_block);
        assert_eq!(ast.element(li).unwrap().codegen.as_ref(), Some(&func.returns));
        let helpers = &ast.root_node().helpers;
        assert!(helpers.contains(&RuntimeHelper::CreateElementBlock));
        assert!(!helpers.contains(&RuntimeHelper::CreateElementVNode));
    }

    #[test]
    fn test_keyed_fragment() {
        let key = Directive::new("bind")
            .with_arg(DirectiveArg::Static("key".into()))
            .with_expr("item.id");
        let mut ast = Ast::default();
        let root = ast.root();
        ast.append(root, for_elem("li", "item in items").with_dir(key))
            .unwrap();
        base_transform(&mut ast);
        let call = ast[first_child(&ast)].codegen().unwrap().as_vnode_call().unwrap();
        assert_eq!(call.patch_flag, PatchFlag::KEYED_FRAGMENT);
    }

    #[test]
    fn test_stable_source() {
        let mut ast = Ast::default();
        let root = ast.root();
        let li = ast.append(root, for_elem("li", "i in 10")).unwrap();
        let option = TransformOption {
            prefix_identifiers: true,
            ..Default::default()
        };
        base_transform_with(&mut ast, option);
        let call = ast[first_child(&ast)].codegen().unwrap().as_vnode_call().unwrap();
        assert_eq!(call.patch_flag, PatchFlag::STABLE_FRAGMENT);
        assert!(!call.disable_tracking);
        let item = ast.element(li).unwrap().codegen.as_ref().unwrap();
        assert!(!item.as_vnode_call().unwrap().is_block);
        let helpers = &ast.root_node().helpers;
        assert!(helpers.contains(&RuntimeHelper::CreateElementVNode));
    }

    #[test]
    fn test_template_v_for() {
        let mut ast = Ast::default();
        let root = ast.root();
        let tpl = Element::new("template")
            .with_tag_type(ElementType::Template)
            .with_dir(Directive::new("for").with_expr("item in items"))
            .with_attr("key", Some("k"));
        let tpl = ast.append(root, tpl).unwrap();
        let a = ast.append(tpl, Element::new("span")).unwrap();
        let b = ast.append(tpl, TextNode::new("text")).unwrap();
        base_transform(&mut ast);
        let for_node = first_child(&ast);
        assert_eq!(for_of(&ast, for_node).children, vec![a, b]);
        let call = ast[for_node].codegen().unwrap().as_vnode_call().unwrap();
        let args = match call.children.as_ref().unwrap() {
            JsExpr::Call(_, args) => args,
            _ => panic!("expect renderList call"),
        };
        let func = cast!(&args[1], JsExpr::Func);
        let fragment = func.returns.as_vnode_call().unwrap();
        assert_eq!(fragment.tag, JsExpr::Symbol(RuntimeHelper::Fragment));
        let props = cast!(fragment.props.as_ref().unwrap(), JsExpr::Props);
        assert_eq!(props[0].0, JsExpr::str_lit("key"));
    }

    #[test]
    fn test_template_key_placement() {
        let mut ast = Ast::default();
        let root = ast.root();
        let tpl = Element::new("template")
            .with_tag_type(ElementType::Template)
            .with_dir(Directive::new("for").with_expr("item in items"));
        let tpl = ast.append(root, tpl).unwrap();
        ast.append(tpl, Element::new("span").with_attr("key", Some("k")))
            .unwrap();
        let eh = base_transform(&mut ast);
        assert_eq!(eh.error_kinds(), vec![ErrorKind::VForTemplateKeyPlacement]);
    }

    #[test]
    fn test_v_for_errors() {
        let mut ast = Ast::default();
        let root = ast.root();
        let empty = ast.append(root, for_elem("p", "  ")).unwrap();
        let bad = ast.append(root, for_elem("p", "items")).unwrap();
        let eh = base_transform(&mut ast);
        assert_eq!(
            eh.error_kinds(),
            vec![ErrorKind::VForNoExpression, ErrorKind::VForMalformedExpression]
        );
        // invalid v-for leaves the element in place
        assert_eq!(ast.children(root), &[empty, bad]);
    }

    #[test]
    fn test_scope_bookkeeping() {
        use std::{cell::RefCell, rc::Rc};
        let seen = Rc::new(RefCell::new(vec![]));
        let s = seen.clone();
        let probe = move |node: NodeId, ctx: &mut TransformContext| -> TransformResult<Exits> {
            if matches!(ctx.ast()[node], Node::Text(_)) {
                s.borrow_mut()
                    .push((ctx.scopes.v_for, ctx.identifier_count("item")));
            }
            Ok(Exits::new())
        };
        let mut ast = Ast::default();
        let root = ast.root();
        let li = ast.append(root, for_elem("li", "item in items")).unwrap();
        ast.append(li, TextNode::new("inside")).unwrap();
        ast.append(root, TextNode::new("outside")).unwrap();
        let option = TransformOption {
            prefix_identifiers: true,
            node_transforms: vec![crate::transformer::test::shared(probe)],
            ..Default::default()
        };
        base_transform_with(&mut ast, option);
        let expected = if cfg!(feature = "browser") {
            vec![(1, 0), (0, 0)]
        } else {
            vec![(1, 1), (0, 0)]
        };
        assert_eq!(*seen.borrow(), expected);
    }
}
