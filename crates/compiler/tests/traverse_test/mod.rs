use super::common::{append, dir, option_with};
use compiler::ast::{Ast, CommentNode, Element, Node, NodeId, TextNode};
use compiler::error::{TransformError, TransformResult};
use compiler::flags::RuntimeHelper;
use compiler::ir::JsExpr;
use compiler::transformer::{
    create_structural_directive_transform, on_exit, Exits, NodeTransform, TransformContext,
    TransformOption,
};
use compiler::transform;
use std::{cell::RefCell, rc::Rc};
use vue_compiler_transform as compiler;

type Log = Rc<RefCell<Vec<String>>>;

fn text_of(ctx: &TransformContext, node: NodeId) -> Option<String> {
    match &ctx.ast()[node] {
        Node::Text(t) => Some(t.content.clone()),
        _ => None,
    }
}

fn texts_under(ast: &Ast, parent: NodeId) -> Vec<String> {
    ast.children(parent)
        .iter()
        .filter_map(|&c| match &ast[c] {
            Node::Text(t) => Some(t.content.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_helper_count_is_balanced() {
    let mut ctx = TransformContext::new(Ast::default(), TransformOption::default());
    for _ in 0..3 {
        ctx.helper(RuntimeHelper::Fragment);
    }
    ctx.helper(RuntimeHelper::OpenBlock);
    ctx.remove_helper(RuntimeHelper::Fragment);
    ctx.remove_helper(RuntimeHelper::Fragment);
    assert_eq!(ctx.helper_count(RuntimeHelper::Fragment), 1);
    ctx.remove_helper(RuntimeHelper::Fragment);
    ctx.remove_helper(RuntimeHelper::Fragment);
    assert_eq!(ctx.helper_count(RuntimeHelper::Fragment), 0);
    let helpers: Vec<_> = ctx.helpers().collect();
    assert_eq!(helpers, vec![RuntimeHelper::OpenBlock]);
}

#[test]
fn test_remove_visited_child() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div"));
    ast.append(div, CommentNode::new("x")).unwrap();
    ast.append(div, TextNode::new("a")).unwrap();
    ast.append(div, CommentNode::new("y")).unwrap();
    ast.append(div, CommentNode::new("z")).unwrap();
    ast.append(div, TextNode::new("b")).unwrap();
    let visited: Log = Rc::default();
    let log = visited.clone();
    let strip: Rc<dyn NodeTransform> = Rc::new(
        move |node: NodeId, ctx: &mut TransformContext| -> TransformResult<Exits> {
            if ctx.ast()[node].is_comment() {
                ctx.remove_node(None)?;
            } else if let Some(text) = text_of(ctx, node) {
                log.borrow_mut().push(text);
            }
            Ok(Exits::new())
        },
    );
    transform(&mut ast, option_with(vec![strip])).unwrap();
    assert_eq!(*visited.borrow(), vec!["a", "b"]);
    assert_eq!(texts_under(&ast, div), vec!["a", "b"]);
    assert_eq!(ast.children(div).len(), 2);
    // removed comments never descend
    assert!(!ast.root_node().helpers.contains(&RuntimeHelper::CreateComment));
}

#[test]
fn test_remove_previous_sibling() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div"));
    for t in ["a", "b", "c", "d"] {
        ast.append(div, TextNode::new(t)).unwrap();
    }
    let visited: Log = Rc::default();
    let log = visited.clone();
    let prune: Rc<dyn NodeTransform> = Rc::new(
        move |node: NodeId, ctx: &mut TransformContext| -> TransformResult<Exits> {
            let text = match text_of(ctx, node) {
                Some(text) => text,
                None => return Ok(Exits::new()),
            };
            log.borrow_mut().push(text.clone());
            if text == "c" {
                let parent = ctx.parent.unwrap();
                let prev = ctx.ast().children(parent)[ctx.child_index - 1];
                ctx.remove_node(Some(prev))?;
            }
            Ok(Exits::new())
        },
    );
    transform(&mut ast, option_with(vec![prune])).unwrap();
    assert_eq!(*visited.borrow(), vec!["a", "b", "c", "d"]);
    assert_eq!(texts_under(&ast, div), vec!["a", "c", "d"]);
}

#[test]
fn test_remove_later_sibling() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div"));
    for t in ["a", "b", "c", "d"] {
        ast.append(div, TextNode::new(t)).unwrap();
    }
    let visited: Log = Rc::default();
    let log = visited.clone();
    let prune: Rc<dyn NodeTransform> = Rc::new(
        move |node: NodeId, ctx: &mut TransformContext| -> TransformResult<Exits> {
            let text = match text_of(ctx, node) {
                Some(text) => text,
                None => return Ok(Exits::new()),
            };
            log.borrow_mut().push(text.clone());
            if text == "a" {
                let parent = ctx.parent.unwrap();
                let next = ctx.ast().children(parent)[ctx.child_index + 2];
                ctx.remove_node(Some(next))?;
            }
            Ok(Exits::new())
        },
    );
    transform(&mut ast, option_with(vec![prune])).unwrap();
    assert_eq!(*visited.borrow(), vec!["a", "b", "d"]);
    assert_eq!(texts_under(&ast, div), vec!["a", "b", "d"]);
}

#[test]
fn test_structural_handler_does_not_recurse() {
    let mut ast = Ast::default();
    let root = ast.root();
    append(&mut ast, root, Element::new("div").with_dir(dir("wrap", "x")));
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    let wrap = create_structural_directive_transform(
        "wrap",
        move |node: NodeId, _, ctx: &mut TransformContext| -> TransformResult<Exits> {
            *counter.borrow_mut() += 1;
            // the wrapper carries the same directive again
            let wrapper = Element::new("section").with_dir(dir("wrap", "x"));
            let wrapper = ctx.replace_node(wrapper)?;
            if let Some(e) = ctx.ast_mut().element_mut(wrapper) {
                e.children.push(node);
            }
            Ok(Exits::new())
        },
    );
    let wrap: Rc<dyn NodeTransform> = Rc::new(wrap);
    transform(&mut ast, option_with(vec![wrap])).unwrap();
    assert_eq!(*calls.borrow(), 1);
    let section = ast.children(root)[0];
    assert_eq!(ast.element(section).unwrap().tag, "section");
    let inner = ast.children(section)[0];
    assert!(ast.element(inner).unwrap().props.is_empty());
}

#[test]
fn test_exits_run_in_reverse() {
    let order: Log = Rc::default();
    let labeled = |label: &'static str| -> Rc<dyn NodeTransform> {
        let log = order.clone();
        Rc::new(
            move |_: NodeId, _: &mut TransformContext| -> TransformResult<Exits> {
                let log = log.clone();
                Ok(on_exit(move |_| {
                    log.borrow_mut().push(label.to_string());
                    Ok(())
                }))
            },
        )
    };
    let transforms = vec![labeled("A"), labeled("B"), labeled("C")];
    let mut ast = Ast::default();
    transform(&mut ast, option_with(transforms)).unwrap();
    assert_eq!(*order.borrow(), vec!["C", "B", "A"]);
}

#[test]
fn test_hoists_are_named_in_order() {
    let mut ctx = TransformContext::new(Ast::default(), TransformOption::default());
    let exprs = [JsExpr::str_lit("a"), JsExpr::str_lit("b"), JsExpr::Num(3)];
    let refs: Vec<_> = exprs.iter().map(|e| ctx.hoist(e.clone())).collect();
    let names: Vec<_> = refs
        .iter()
        .map(|r| match r {
            JsExpr::Simple(s) => s.content.clone(),
            _ => panic!("hoist returns a simple expression"),
        })
        .collect();
    assert_eq!(names, vec!["_hoisted_1", "_hoisted_2", "_hoisted_3"]);
    for (r, e) in refs.iter().zip(exprs.iter()) {
        assert_eq!(ctx.hoisted(r), Some(e));
    }
}

fn hoist_texts(root: NodeId, ctx: &mut TransformContext) -> TransformResult<()> {
    for child in ctx.ast().children(root).to_vec() {
        if let Some(text) = text_of(ctx, child) {
            ctx.hoist(JsExpr::str_lit(text));
        }
    }
    Ok(())
}

#[test]
fn test_static_hoister_runs_after_traversal() {
    let mut ast = Ast::default();
    let root = ast.root();
    ast.append(root, TextNode::new("a")).unwrap();
    ast.append(root, TextNode::new("b")).unwrap();
    let option = TransformOption {
        hoist_static: true,
        static_hoister: Some(hoist_texts),
        ..Default::default()
    };
    transform(&mut ast, option).unwrap();
    let root = ast.root_node();
    assert_eq!(root.hoists, vec![JsExpr::str_lit("a"), JsExpr::str_lit("b")]);

    let mut ast = Ast::default();
    let root = ast.root();
    ast.append(root, TextNode::new("a")).unwrap();
    let option = TransformOption {
        static_hoister: Some(hoist_texts),
        ..Default::default()
    };
    transform(&mut ast, option).unwrap();
    assert!(ast.root_node().hoists.is_empty());
}

fn run_on_root<F>(f: F) -> (Ast, TransformResult<()>)
where
    F: Fn(&mut TransformContext) -> TransformResult<()> + 'static,
{
    let mut ast = Ast::default();
    let root = ast.root();
    ast.append(root, TextNode::new("kept")).unwrap();
    let t: Rc<dyn NodeTransform> = Rc::new(
        move |node: NodeId, ctx: &mut TransformContext| -> TransformResult<Exits> {
            if node == ctx.root() {
                f(ctx)?;
            }
            Ok(Exits::new())
        },
    );
    let result = transform(&mut ast, option_with(vec![t]));
    (ast, result)
}

#[test]
fn test_root_cannot_be_removed_or_replaced() {
    let (ast, result) = run_on_root(|ctx| ctx.remove_node(None));
    assert_eq!(result, Err(TransformError::RemoveRoot));
    // the tree is handed back untouched
    assert_eq!(texts_under(&ast, ast.root()), vec!["kept"]);
    assert!(!ast.root_node().transformed);

    let (_, result) = run_on_root(|ctx| ctx.replace_node(Element::new("div")).map(|_| ()));
    assert_eq!(result, Err(TransformError::ReplaceRoot));
}

#[test]
fn test_remove_foreign_node() {
    let mut ast = Ast::default();
    let root = ast.root();
    let div = append(&mut ast, root, Element::new("div"));
    let stray = ast.alloc(TextNode::new("stray"));
    ast.append(div, TextNode::new("a")).unwrap();
    let t: Rc<dyn NodeTransform> = Rc::new(
        move |node: NodeId, ctx: &mut TransformContext| -> TransformResult<Exits> {
            if text_of(ctx, node).is_some() && node != stray {
                ctx.remove_node(Some(stray))?;
            }
            Ok(Exits::new())
        },
    );
    let result = transform(&mut ast, option_with(vec![t]));
    assert_eq!(result, Err(TransformError::NodeNotInParent(stray)));
}
