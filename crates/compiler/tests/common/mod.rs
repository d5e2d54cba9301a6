use compiler::ast::{Ast, Directive, DirectiveArg, Element, NodeId};
use compiler::error::VecErrorHandler;
use compiler::transformer::{BaseTransformer, NodeTransform, TransformOption, Transformer};
use std::rc::Rc;
use vue_compiler_transform as compiler;

pub fn base_transform_with(ast: &mut Ast, option: TransformOption) -> VecErrorHandler {
    let eh = VecErrorHandler::default();
    let option = TransformOption {
        error_handler: Rc::new(eh.clone()),
        ..option
    };
    BaseTransformer::new(option).transform(ast).unwrap();
    eh
}

pub fn base_transform(ast: &mut Ast) -> VecErrorHandler {
    base_transform_with(ast, TransformOption::default())
}

/// runs only the given transforms, without the built-in preset
pub fn option_with(transforms: Vec<Rc<dyn NodeTransform>>) -> TransformOption {
    TransformOption {
        node_transforms: transforms,
        ..Default::default()
    }
}

/// published helpers joined for inline snapshots
pub fn helper_names(ast: &Ast) -> String {
    let names: Vec<_> = ast
        .root_node()
        .helpers
        .iter()
        .map(|h| h.helper_str())
        .collect();
    names.join(", ")
}

pub fn dir(name: &str, exp: &str) -> Directive {
    Directive::new(name).with_expr(exp)
}

pub fn bind(arg: &str, exp: &str) -> Directive {
    Directive::new("bind")
        .with_arg(DirectiveArg::Static(arg.into()))
        .with_expr(exp)
}

pub fn append(ast: &mut Ast, parent: NodeId, elem: Element) -> NodeId {
    ast.append(parent, elem).unwrap()
}
