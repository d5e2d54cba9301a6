// v-once renders the subtree once and caches the vnode afterwards.
use crate::{
    ast::NodeId,
    error::TransformResult,
    flags::RuntimeHelper,
    transformer::{on_exit, Exits, TransformContext},
    util::find_dir_empty,
};

pub fn transform_once(node: NodeId, ctx: &mut TransformContext) -> TransformResult<Exits> {
    // v-else branches are visited again after joining their v-if
    let has_once = ctx.ast().element(node).map_or(false, |e| {
        find_dir_empty(e, "once").is_some() && find_dir_empty(e, ["else", "else-if"]).is_none()
    });
    // nested v-once is covered by the outer cache
    if !has_once || ctx.in_v_once || ctx.option.ssr || ctx.option.in_ssr {
        return Ok(Exits::new());
    }
    ctx.in_v_once = true;
    ctx.helper(RuntimeHelper::SetBlockTracking);
    Ok(on_exit(|ctx| {
        ctx.in_v_once = false;
        let current = match ctx.current_node {
            Some(n) => n,
            None => return Ok(()),
        };
        let codegen = ctx.ast_mut()[current].codegen_mut().and_then(Option::take);
        if let Some(codegen) = codegen {
            let cached = ctx.cache(codegen, true);
            if let Some(slot) = ctx.ast_mut()[current].codegen_mut() {
                *slot = Some(cached);
            }
        }
        Ok(())
    }))
}
