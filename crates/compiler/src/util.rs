use crate::{
    ast::{Attribute, Directive, DirectiveArg, ElemProp, Element, ElementType},
    flags::RuntimeHelper,
    ir::{JsExpr, Prop},
    transformer::TransformContext,
};
use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;
use std::{
    borrow::{Borrow, BorrowMut},
    marker::PhantomData,
};

/// equivalent to /^on[^a-z]/
pub fn is_on(prop: &str) -> bool {
    let bytes = prop.as_bytes();
    bytes.len() > 2 && bytes.starts_with(b"on") && !bytes[2].is_ascii_lowercase()
}

pub fn is_mergeable_prop(prop: &str) -> bool {
    prop == "class" || prop == "style" || is_on(prop)
}

static CORE_COMPONENTS: phf::Map<&'static str, RuntimeHelper> = phf_map! {
    "Teleport" => RuntimeHelper::Teleport,
    "teleport" => RuntimeHelper::Teleport,
    "Suspense" => RuntimeHelper::Suspense,
    "suspense" => RuntimeHelper::Suspense,
    "KeepAlive" => RuntimeHelper::KeepAlive,
    "keep-alive" => RuntimeHelper::KeepAlive,
    "BaseTransition" => RuntimeHelper::BaseTransition,
    "base-transition" => RuntimeHelper::BaseTransition,
};

pub fn get_core_component(tag: &str) -> Option<RuntimeHelper> {
    CORE_COMPONENTS.get(tag).copied()
}

macro_rules! make_list {
    ( $($id: ident),* ) => {
        &[
            $(stringify!($id)),*
        ]
    }
}

// https://github.com/vuejs/rfcs/blob/master/active-rfcs/0008-render-function-api-change.md#special-reserved-props
const RESERVED: &[&str] = make_list!(
    key,
    ref,
    onVnodeMounted,
    onVnodeUpdated,
    onVnodeUnmounted,
    onVnodeBeforeMount,
    onVnodeBeforeUpdate,
    onVnodeBeforeUnmount
);

#[inline]
pub fn is_reserved_prop(tag: &str) -> bool {
    RESERVED.contains(&tag)
}

pub fn is_component_tag(tag: &str) -> bool {
    tag == "component" || tag == "Component"
}

pub const fn no(_: &str) -> bool {
    false
}

pub fn get_vnode_helper(ssr: bool, is_component: bool) -> RuntimeHelper {
    if ssr || is_component {
        RuntimeHelper::CreateVNode
    } else {
        RuntimeHelper::CreateElementVNode
    }
}

pub fn get_vnode_block_helper(ssr: bool, is_component: bool) -> RuntimeHelper {
    if ssr || is_component {
        RuntimeHelper::CreateBlock
    } else {
        RuntimeHelper::CreateElementBlock
    }
}

lazy_static! {
    static ref CAMELIZE_RE: Regex = Regex::new(r"-(\w)").unwrap();
    static ref NON_IDENT_RE: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
}

/// foo-bar -> fooBar
pub fn camelize(s: &str) -> String {
    CAMELIZE_RE
        .replace_all(s, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// my-comp -> _component_my_comp, dashes become underscores and
/// other non identifier chars become their char code
pub fn to_valid_asset_id(name: &str, asset: &str) -> String {
    let id = NON_IDENT_RE.replace_all(name, |caps: &regex::Captures| {
        let s = &caps[0];
        if s == "-" {
            "_".to_string()
        } else {
            s.chars().map(|c| (c as u32).to_string()).collect()
        }
    });
    format!("_{}_{}", asset, id)
}

pub trait PropPattern {
    fn matches(&self, name: &str) -> bool;
}
impl PropPattern for &str {
    fn matches(&self, name: &str) -> bool {
        name == *self
    }
}

impl<F> PropPattern for F
where
    F: Fn(&str) -> bool,
{
    fn matches(&self, name: &str) -> bool {
        self(name)
    }
}

impl<const N: usize> PropPattern for [&'static str; N] {
    fn matches(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

impl PropPattern for Regex {
    fn matches(&self, name: &str) -> bool {
        self.is_match(name)
    }
}

type NameExp<'a> = Option<(&'a str, Option<&'a str>)>;
pub trait PropMatcher {
    fn get_name_and_exp(prop: &ElemProp) -> NameExp<'_>;
    fn get_ref(prop: &ElemProp) -> &Self;
    fn take(prop: ElemProp) -> Self;
    fn is_match<P>(p: &ElemProp, pat: &P, allow_empty: bool) -> bool
    where
        P: PropPattern,
    {
        Self::get_name_and_exp(p).map_or(false, |(name, exp)| {
            pat.matches(name) && (allow_empty || !exp.map_or(true, |v| v.trim().is_empty()))
        })
    }
}

pub fn is_bind_key(arg: &Option<DirectiveArg>, name: &str) -> bool {
    get_bind_key(arg).map_or(false, |v| v == name)
}

fn get_bind_key(arg: &Option<DirectiveArg>) -> Option<&str> {
    if let DirectiveArg::Static(name) = arg.as_ref()? {
        Some(name.as_str())
    } else {
        None
    }
}

impl PropMatcher for ElemProp {
    fn get_name_and_exp(prop: &ElemProp) -> NameExp<'_> {
        match prop {
            ElemProp::Attr(Attribute { name, value, .. }) => {
                Some((name.as_str(), value.as_deref()))
            }
            ElemProp::Dir(dir) if dir.name == "bind" => {
                let name = get_bind_key(&dir.argument)?;
                let exp = dir.expression.as_ref().map(|v| v.content.as_str());
                Some((name, exp))
            }
            _ => None,
        }
    }
    fn get_ref(prop: &ElemProp) -> &Self {
        prop
    }
    fn take(prop: ElemProp) -> Self {
        prop
    }
}

impl PropMatcher for Directive {
    fn get_name_and_exp(prop: &ElemProp) -> NameExp<'_> {
        if let ElemProp::Dir(Directive {
            name, expression, ..
        }) = prop
        {
            let exp = expression.as_ref().map(|v| v.content.as_str());
            Some((name.as_str(), exp))
        } else {
            None
        }
    }
    fn get_ref(prop: &ElemProp) -> &Self {
        if let ElemProp::Dir(dir) = prop {
            return dir;
        }
        unreachable!("invalid call")
    }
    fn take(prop: ElemProp) -> Self {
        if let ElemProp::Dir(dir) = prop {
            return dir;
        }
        unreachable!("invalid call")
    }
}

pub struct PropFound<E, M>
where
    E: Borrow<Element>,
    M: PropMatcher,
{
    elem: E,
    pos: usize,
    m: PhantomData<M>,
}

impl<E, M> PropFound<E, M>
where
    E: Borrow<Element>,
    M: PropMatcher,
{
    fn new(elem: E, pos: usize) -> Option<Self> {
        Some(Self {
            elem,
            pos,
            m: PhantomData,
        })
    }
    pub fn get_ref(&self) -> &M {
        M::get_ref(&self.elem.borrow().props[self.pos])
    }
    pub fn pos(&self) -> usize {
        self.pos
    }
}
// take is only available when access is mutable
impl<E, M> PropFound<E, M>
where
    E: BorrowMut<Element>,
    M: PropMatcher,
{
    pub fn take(mut self) -> M {
        M::take(self.elem.borrow_mut().props.remove(self.pos))
    }
}

type DirFound<E> = PropFound<E, Directive>;

// sometimes mutable access to the element is not available so
// Borrow is used to refine PropFound so `take` is optional
pub fn dir_finder<E, P>(elem: E, pat: P) -> PropFinder<E, P, Directive>
where
    E: Borrow<Element>,
    P: PropPattern,
{
    PropFinder::new(elem, pat)
}

pub fn find_dir<E, P>(elem: E, pat: P) -> Option<DirFound<E>>
where
    E: Borrow<Element>,
    P: PropPattern,
{
    PropFinder::new(elem, pat).find()
}

pub fn find_dir_empty<E, P>(elem: E, pat: P) -> Option<DirFound<E>>
where
    E: Borrow<Element>,
    P: PropPattern,
{
    PropFinder::new(elem, pat).allow_empty().find()
}

pub struct PropFinder<E, P, M = ElemProp>
where
    E: Borrow<Element>,
    P: PropPattern,
    M: PropMatcher,
{
    elem: E,
    pat: P,
    allow_empty: bool,
    filter: fn(&ElemProp) -> bool,
    m: PhantomData<M>,
}

impl<E, P, M> PropFinder<E, P, M>
where
    E: Borrow<Element>,
    P: PropPattern,
    M: PropMatcher,
{
    fn new(elem: E, pat: P) -> Self {
        Self {
            elem,
            pat,
            allow_empty: false,
            filter: |_| true,
            m: PhantomData,
        }
    }
    fn is_match(&self, p: &ElemProp) -> bool {
        M::is_match(p, &self.pat, self.allow_empty)
    }
    pub fn dynamic_only(self) -> Self {
        Self {
            filter: |p| matches!(p, ElemProp::Dir(..)),
            ..self
        }
    }
    pub fn find(self) -> Option<PropFound<E, M>> {
        let pos = self
            .elem
            .borrow()
            .props
            .iter()
            .position(|p| self.is_match(p) && (self.filter)(p))?;
        PropFound::new(self.elem, pos)
    }
    pub fn allow_empty(self) -> Self {
        Self {
            allow_empty: true,
            ..self
        }
    }
}

pub fn find_prop<E, P>(elem: E, pat: P) -> Option<PropFound<E, ElemProp>>
where
    E: Borrow<Element>,
    P: PropPattern,
{
    PropFinder::new(elem, pat).find()
}

pub fn prop_finder<E, P>(elem: E, pat: P) -> PropFinder<E, P>
where
    E: Borrow<Element>,
    P: PropPattern,
{
    PropFinder::new(elem, pat)
}

/// `<template v-slot>` is left to slot handling untouched
pub fn is_template_slot(e: &Element) -> bool {
    e.tag_type == ElementType::Template && find_dir_empty(e, "slot").is_some()
}

/// name of a prop whose key is known at compile time
pub fn prop_key_name(key: &JsExpr) -> Option<&str> {
    match key {
        JsExpr::StrLit(s) => Some(s.as_str()),
        JsExpr::Simple(s) if s.is_static => Some(s.content.as_str()),
        _ => None,
    }
}

fn has_prop(props: &[Prop], name: &str) -> bool {
    props.iter().any(|(k, _)| prop_key_name(k) == Some(name))
}

/// Adds a prop in front of existing props unless a prop of the same
/// static name exists already. Non object props are merged at runtime.
pub fn inject_prop(props: &mut Option<JsExpr>, prop: Prop, ctx: &mut TransformContext) {
    let existing = match props.take() {
        None => {
            *props = Some(JsExpr::Props(vec![prop]));
            return;
        }
        Some(p) => p,
    };
    let name = prop_key_name(&prop.0).map(String::from);
    let injected = match existing {
        JsExpr::Props(mut ps) => {
            if name.as_deref().map_or(true, |n| !has_prop(&ps, n)) {
                ps.insert(0, prop);
            }
            JsExpr::Props(ps)
        }
        JsExpr::Call(RuntimeHelper::MergeProps, mut args) => {
            match args.first_mut() {
                Some(JsExpr::Props(ps)) => {
                    if name.as_deref().map_or(true, |n| !has_prop(ps, n)) {
                        ps.insert(0, prop);
                    }
                }
                _ => args.insert(0, JsExpr::Props(vec![prop])),
            }
            JsExpr::Call(RuntimeHelper::MergeProps, args)
        }
        other => {
            let helper = ctx.helper(RuntimeHelper::MergeProps);
            JsExpr::Call(helper, vec![JsExpr::Props(vec![prop]), other])
        }
    };
    *props = Some(injected);
}
