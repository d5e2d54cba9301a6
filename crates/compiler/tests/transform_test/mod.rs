use super::common::*;
use compiler::ast::{
    Ast, CommentNode, Directive, Element, ElementType, InterpolationNode, Node, TextNode,
};
use compiler::error::CompilationErrorKind as ErrorKind;
use compiler::flags::{PatchFlag, RuntimeHelper};
use compiler::ir::JsExpr;
use compiler::transformer::TransformOption;
use insta::assert_snapshot;
use vue_compiler_transform as compiler;

fn root_call(ast: &Ast) -> compiler::ir::VNodeCall {
    let codegen = ast.root_node().codegen.clone().unwrap();
    *crate::cast!(codegen, JsExpr::VNodeCall)
}

#[test]
fn test_single_root_element() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div").with_attr("id", Some("app")));
    ast.append(div, TextNode::new("hello")).unwrap();
    base_transform(&mut ast);
    let call = root_call(&ast);
    assert!(call.is_block);
    assert_eq!(call.tag, JsExpr::str_lit("div"));
    assert_eq!(ast.element(div).unwrap().codegen, ast.root_node().codegen);
    assert_snapshot!(helper_names(&ast), @"openBlock, createElementBlock");
    assert!(ast.root_node().transformed);
}

#[test]
fn test_v_for_list() {
    let mut ast = Ast::default();
    let root = ast.root();
    let ul = append(&mut ast, root, Element::new("ul"));
    let li = append(&mut ast, ul, Element::new("li").with_dir(dir("for", "item in items")));
    ast.append(li, InterpolationNode::new("item")).unwrap();
    let eh = base_transform(&mut ast);
    assert!(eh.errors().is_empty());
    let for_node = ast.children(ul)[0];
    assert!(matches!(ast[for_node], Node::For(_)));
    assert_eq!(ast.children(for_node), &[li]);
    let li_call = ast.element(li).unwrap().codegen.clone().unwrap();
    let li_call = crate::cast!(li_call, JsExpr::VNodeCall);
    assert!(li_call.is_block);
    assert_eq!(li_call.patch_flag, PatchFlag::TEXT);
    assert_snapshot!(
        helper_names(&ast),
        @"renderList, Fragment, openBlock, createElementBlock, toDisplayString"
    );
}

#[test]
fn test_v_if_else_chain() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div").with_dir(dir("if", "ok")));
    ast.append(div, TextNode::new("yes")).unwrap();
    ast.append(root, CommentNode::new("between")).unwrap();
    let p = append(&mut ast, root, Element::new("p").with_dir(Directive::new("else")));
    ast.append(p, TextNode::new("no")).unwrap();
    let eh = base_transform(&mut ast);
    assert!(eh.errors().is_empty());
    let children = ast.children(root);
    assert_eq!(children.len(), 1);
    let if_node = children[0];
    assert_eq!(ast.root_node().codegen, Some(JsExpr::Node(if_node)));
    let conditional = match ast[if_node].codegen() {
        Some(JsExpr::Conditional(c)) => c.clone(),
        _ => panic!("v-if should generate a conditional"),
    };
    assert_eq!(conditional.test, JsExpr::simple("ok"));
    let alternate = crate::cast!(conditional.alternate, JsExpr::VNodeCall);
    // the dev only comment is kept in the else branch
    assert_eq!(alternate.tag, JsExpr::Symbol(RuntimeHelper::Fragment));
    assert_snapshot!(
        helper_names(&ast),
        @"openBlock, createElementBlock, createCommentVNode, createElementVNode, Fragment"
    );
}

#[test]
fn test_root_fragment_flags() {
    let children = || {
        let mut ast = Ast::default();
        let root = ast.root();
        ast.append(root, CommentNode::new("a")).unwrap();
        append(&mut ast, root, Element::new("div"));
        ast.append(root, CommentNode::new("b")).unwrap();
        ast
    };
    let mut ast = children();
    base_transform(&mut ast);
    let call = root_call(&ast);
    assert_eq!(call.patch_flag, PatchFlag::STABLE_FRAGMENT | PatchFlag::DEV_ROOT_FRAGMENT);
    assert_snapshot!(
        helper_names(&ast),
        @"createCommentVNode, createElementVNode, Fragment, openBlock, createElementBlock"
    );

    let mut ast = children();
    let option = TransformOption {
        is_dev: false,
        ..Default::default()
    };
    base_transform_with(&mut ast, option);
    assert_eq!(root_call(&ast).patch_flag, PatchFlag::STABLE_FRAGMENT);
}

#[test]
fn test_assets_are_published() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div"));
    let comp = Element::new("my-button")
        .with_tag_type(ElementType::Component)
        .with_dir(Directive::new("tooltip").with_expr("tip"));
    append(&mut ast, div, comp);
    append(&mut ast, div, Element::new("Card").with_tag_type(ElementType::Component));
    base_transform(&mut ast);
    let root = ast.root_node();
    assert_eq!(root.components, vec!["my-button".to_string(), "Card".to_string()]);
    assert_eq!(root.directives, vec!["tooltip".to_string()]);
    assert!(root.helpers.contains(&RuntimeHelper::ResolveComponent));
    assert!(root.helpers.contains(&RuntimeHelper::ResolveDirective));
    assert!(root.helpers.contains(&RuntimeHelper::WithDirectives));
}

#[test]
fn test_diagnostics_keep_going() {
    let mut ast = Ast::default();
    let root = ast.root();
    append(&mut ast, root, Element::new("p").with_dir(Directive::new("else")));
    append(&mut ast, root, Element::new("li").with_dir(dir("for", "")));
    append(&mut ast, root, Element::new("div").with_dir(Directive::new("bind").with_arg(
        compiler::ast::DirectiveArg::Static("id".into()),
    )));
    let eh = base_transform(&mut ast);
    assert_eq!(
        eh.error_kinds(),
        vec![
            ErrorKind::VElseNoAdjacentIf,
            ErrorKind::VForNoExpression,
            ErrorKind::VBindNoExpression
        ]
    );
    let root = ast.root_node();
    assert!(root.transformed);
    assert!(root.codegen.is_some());
}

#[test]
fn test_v_once_caches() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div"));
    let a = append(&mut ast, div, Element::new("span").with_dir(Directive::new("once")));
    let b = append(&mut ast, div, Element::new("span").with_dir(Directive::new("once")));
    base_transform(&mut ast);
    let index_of = |node| match ast.element(node).unwrap().codegen.as_ref() {
        Some(JsExpr::Cache(c)) => c.index,
        _ => panic!("v-once should be cached"),
    };
    assert_eq!(index_of(a), 0);
    assert_eq!(index_of(b), 1);
    assert_eq!(ast.root_node().cached, 2);
}

#[test]
fn test_keyed_dynamic_props() {
    let mut ast = Ast::default();
    let root = ast.root();
    let ul = append(&mut ast, root, Element::new("ul"));
    let li = Element::new("li")
        .with_dir(dir("for", "(item, index) in items"))
        .with_dir(bind("key", "item.id"))
        .with_dir(bind("class", "item.cls"))
        .with_dir(bind("title", "item.title"));
    let li = append(&mut ast, ul, li);
    base_transform(&mut ast);
    let for_node = ast.children(ul)[0];
    let fragment = ast[for_node].codegen().and_then(JsExpr::as_vnode_call).unwrap();
    assert_eq!(fragment.patch_flag, PatchFlag::KEYED_FRAGMENT);
    assert!(fragment.disable_tracking);
    let li_call = ast.element(li).unwrap().codegen.clone().unwrap();
    let li_call = crate::cast!(li_call, JsExpr::VNodeCall);
    assert_eq!(li_call.patch_flag, PatchFlag::CLASS | PatchFlag::PROPS);
    assert_eq!(li_call.dynamic_props, Some(JsExpr::Src(r#"["title"]"#.into())));
}

#[test]
fn test_ssr_has_no_root_codegen() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div"));
    ast.append(div, InterpolationNode::new("msg")).unwrap();
    let option = TransformOption {
        ssr: true,
        ..Default::default()
    };
    base_transform_with(&mut ast, option);
    let root = ast.root_node();
    assert!(root.codegen.is_none());
    assert!(!root.helpers.contains(&RuntimeHelper::ToDisplayString));
    assert!(root.transformed);
}
