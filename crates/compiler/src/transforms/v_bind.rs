use crate::{
    ast::{Directive, DirectiveArg, NodeId},
    error::{CompilationError, CompilationErrorKind as ErrorKind},
    flags::RuntimeHelper,
    ir::{JsExpr, SimpleExpr},
    transformer::{DirectiveTransformResult, TransformContext},
    util::camelize,
};

// v-bind with an argument. Object spread `v-bind="obj"` is merged by
// the element transform.
pub fn transform_bind(
    dir: &Directive,
    _: NodeId,
    ctx: &mut TransformContext,
) -> DirectiveTransformResult {
    let Directive {
        argument,
        modifiers,
        expression,
        loc,
        ..
    } = dir;
    let arg = match argument {
        Some(arg) => arg,
        None => return DirectiveTransformResult::default(),
    };
    let has_modifier = |m: &str| modifiers.iter().any(|n| n == m);
    let mut key = match arg {
        DirectiveArg::Static(s) => JsExpr::str_lit(s.as_str()),
        DirectiveArg::Dynamic(s) => JsExpr::Compound(vec![
            JsExpr::Src("(".into()),
            JsExpr::simple(s.as_str()),
            JsExpr::Src(r#") || """#.into()),
        ]),
    };
    if has_modifier("camel") {
        key = match key {
            JsExpr::StrLit(s) => JsExpr::StrLit(camelize(&s)),
            dynamic => JsExpr::Call(ctx.helper(RuntimeHelper::Camelize), vec![dynamic]),
        };
    }
    if !ctx.option.in_ssr {
        if has_modifier("prop") {
            key = with_prefix(key, ".");
        } else if has_modifier("attr") {
            key = with_prefix(key, "^");
        }
    }
    let value = match expression {
        Some(e) if !e.is_empty() => JsExpr::Simple(e.clone()),
        _ => {
            let error =
                CompilationError::new(ErrorKind::VBindNoExpression).with_location(loc.clone());
            ctx.on_error(error);
            // <p :test> renders {test: ""}
            JsExpr::Simple(SimpleExpr::new("", true))
        }
    };
    DirectiveTransformResult {
        props: vec![(key, value)],
        need_runtime: false,
    }
}

fn with_prefix(key: JsExpr, prefix: &str) -> JsExpr {
    match key {
        JsExpr::StrLit(s) => JsExpr::StrLit(format!("{}{}", prefix, s)),
        dynamic => JsExpr::Compound(vec![JsExpr::Src(format!("`{}` + ", prefix)), dynamic]),
    }
}
