#![forbid(unsafe_code)]

//! Attribute bridge between a container and the modals it renders.
//!
//! A container hands each modal one flat attribute map: the modal's own props
//! plus five reserved entries describing its place in the stack. [`extract`]
//! splits the reserved entries back out into a typed [`ModalContext`].
//!
//! Each reserved entry is accepted in hyphenated (`modal-index`) and camel
//! (`modalIndex`) spelling; the hyphenated one wins when both are present.
//!
//! # Invariants
//!
//! 1. `extract` never mutates its input.
//! 2. Numeric entries coerce from numbers and numeric strings; anything else
//!    reads as `0`.
//! 3. Object entries of the wrong shape read as absent.

use ahash::AHashMap;
use serde_json::Value;

use crate::animation::AnimationMap;
use crate::events::ModalEmitter;
use crate::options::OptionsPatch;

pub const INDEX_KEYS: [&str; 2] = ["modal-index", "modalIndex"];
pub const COUNT_KEYS: [&str; 2] = ["modal-count", "modalCount"];
pub const EMITTER_KEYS: [&str; 2] = ["modal-emitter", "modalEmitter"];
pub const ANIMATIONS_KEYS: [&str; 2] = ["modal-animations", "modalAnimations"];
pub const OPTIONS_KEYS: [&str; 2] = ["modal-options", "modalOptions"];

const RESERVED: [[&str; 2]; 5] = [
    INDEX_KEYS,
    COUNT_KEYS,
    EMITTER_KEYS,
    ANIMATIONS_KEYS,
    OPTIONS_KEYS,
];

/// One attribute value.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Json(Value),
    Emitter(ModalEmitter),
    Animations(AnimationMap),
    Options(OptionsPatch),
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<ModalEmitter> for AttrValue {
    fn from(value: ModalEmitter) -> Self {
        Self::Emitter(value)
    }
}

impl From<AnimationMap> for AttrValue {
    fn from(value: AnimationMap) -> Self {
        Self::Animations(value)
    }
}

impl From<OptionsPatch> for AttrValue {
    fn from(value: OptionsPatch) -> Self {
        Self::Options(value)
    }
}

/// Flat attribute map passed from a container to a modal.
pub type Attrs = AHashMap<String, AttrValue>;

/// Typed view of the reserved attributes.
#[derive(Debug, Clone, Default)]
pub struct ModalContext {
    pub index: usize,
    pub count: usize,
    pub emitter: Option<ModalEmitter>,
    pub animations: Option<AnimationMap>,
    pub options: Option<OptionsPatch>,
}

/// Split `attrs` into the reserved context and the pass-through remainder.
#[must_use]
pub fn extract(attrs: &Attrs) -> (ModalContext, Attrs) {
    let context = ModalContext {
        index: lookup(attrs, INDEX_KEYS).map_or(0, coerce_count),
        count: lookup(attrs, COUNT_KEYS).map_or(0, coerce_count),
        emitter: lookup(attrs, EMITTER_KEYS).and_then(|value| match value {
            AttrValue::Emitter(emitter) => Some(emitter.clone()),
            _ => None,
        }),
        animations: lookup(attrs, ANIMATIONS_KEYS).and_then(|value| match value {
            AttrValue::Animations(map) => Some(map.clone()),
            AttrValue::Json(json @ Value::Object(_)) => serde_json::from_value(json.clone()).ok(),
            _ => None,
        }),
        options: lookup(attrs, OPTIONS_KEYS).and_then(|value| match value {
            AttrValue::Options(patch) => Some(patch.clone()),
            AttrValue::Json(json) => OptionsPatch::from_json_value(json).ok(),
            _ => None,
        }),
    };

    let rest = attrs
        .iter()
        .filter(|(name, _)| !is_reserved(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    (context, rest)
}

/// Build the attribute map for one modal: `props` plus the reserved entries
/// in hyphenated spelling.
#[must_use]
pub fn inject(context: &ModalContext, props: &Attrs) -> Attrs {
    let mut attrs: Attrs = props
        .iter()
        .filter(|(name, _)| !is_reserved(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    attrs.insert(INDEX_KEYS[0].to_string(), context.index.into());
    attrs.insert(COUNT_KEYS[0].to_string(), context.count.into());
    if let Some(emitter) = &context.emitter {
        attrs.insert(EMITTER_KEYS[0].to_string(), emitter.clone().into());
    }
    if let Some(animations) = &context.animations {
        attrs.insert(ANIMATIONS_KEYS[0].to_string(), animations.clone().into());
    }
    if let Some(options) = &context.options {
        attrs.insert(OPTIONS_KEYS[0].to_string(), options.clone().into());
    }
    attrs
}

/// Whether `name` is one of the reserved attribute names.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED.iter().flatten().any(|reserved| *reserved == name)
}

fn lookup<'a>(attrs: &'a Attrs, names: [&str; 2]) -> Option<&'a AttrValue> {
    names.iter().find_map(|name| attrs.get(*name))
}

fn coerce_count(value: &AttrValue) -> usize {
    match value {
        AttrValue::Number(n) => from_f64(*n),
        AttrValue::Text(s) => parse_numeric(s),
        AttrValue::Json(Value::Number(n)) => n.as_f64().map_or(0, from_f64),
        AttrValue::Json(Value::String(s)) => parse_numeric(s),
        _ => 0,
    }
}

fn parse_numeric(s: &str) -> usize {
    s.trim().parse::<f64>().map_or(0, from_f64)
}

fn from_f64(n: f64) -> usize {
    if n.is_finite() && n >= 0.0 {
        n as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationDef, TransitionName};
    use serde_json::json;

    fn attrs(entries: Vec<(&str, AttrValue)>) -> Attrs {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn empty_attrs() {
        let (ctx, rest) = extract(&Attrs::new());
        assert_eq!(ctx.index, 0);
        assert_eq!(ctx.count, 0);
        assert!(ctx.emitter.is_none());
        assert!(ctx.animations.is_none());
        assert!(ctx.options.is_none());
        assert!(rest.is_empty());
    }

    #[test]
    fn numeric_coercion() {
        let (ctx, _) = extract(&attrs(vec![
            ("modal-index", "2".into()),
            ("modalCount", json!(5).into()),
        ]));
        assert_eq!((ctx.index, ctx.count), (2, 5));

        let (ctx, _) = extract(&attrs(vec![
            ("modal-index", "two".into()),
            ("modal-count", AttrValue::Number(-3.0)),
        ]));
        assert_eq!((ctx.index, ctx.count), (0, 0));

        let (ctx, _) = extract(&attrs(vec![("modalIndex", AttrValue::Bool(true))]));
        assert_eq!(ctx.index, 0);
    }

    #[test]
    fn hyphenated_spelling_wins() {
        let (ctx, _) = extract(&attrs(vec![
            ("modal-index", 1usize.into()),
            ("modalIndex", 7usize.into()),
        ]));
        assert_eq!(ctx.index, 1);
    }

    #[test]
    fn wrong_typed_objects_are_absent() {
        let (ctx, _) = extract(&attrs(vec![
            ("modal-emitter", "nope".into()),
            ("modal-animations", json!([1, 2]).into()),
            ("modal-options", AttrValue::Number(1.0)),
        ]));
        assert!(ctx.emitter.is_none());
        assert!(ctx.animations.is_none());
        assert!(ctx.options.is_none());
    }

    #[test]
    fn json_objects_are_parsed() {
        let (ctx, _) = extract(&attrs(vec![
            ("modalAnimations", json!({ "hide": { "params": 0 } }).into()),
            ("modalOptions", json!({ "closable": false }).into()),
        ]));
        assert_eq!(
            ctx.animations.unwrap().get(&TransitionName::Hide),
            Some(&AnimationDef::new(json!(0), Value::Null))
        );
        assert_eq!(ctx.options.unwrap().closable, Some(false));
    }

    #[test]
    fn passthrough_excludes_reserved_and_input_untouched() {
        let input = attrs(vec![
            ("modal-index", 1usize.into()),
            ("modalCount", 2usize.into()),
            ("title", "Hello".into()),
            ("wide", true.into()),
        ]);
        let (_, rest) = extract(&input);
        assert_eq!(rest.len(), 2);
        assert!(rest.contains_key("title"));
        assert!(rest.contains_key("wide"));
        assert_eq!(input.len(), 4);
    }

    #[test]
    fn inject_then_extract() {
        let emitter = ModalEmitter::new();
        let ctx = ModalContext {
            index: 3,
            count: 4,
            emitter: Some(emitter.clone()),
            animations: None,
            options: Some(OptionsPatch::new().closable(false)),
        };
        let props = attrs(vec![("title", "x".into()), ("modalIndex", 9usize.into())]);
        let (back, rest) = extract(&inject(&ctx, &props));
        assert_eq!((back.index, back.count), (3, 4));
        assert!(back.emitter.is_some_and(|e| e.ptr_eq(&emitter)));
        assert!(back.animations.is_none());
        assert_eq!(back.options.and_then(|o| o.closable), Some(false));
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn reserved_names() {
        assert!(is_reserved("modal-emitter"));
        assert!(is_reserved("modalOptions"));
        assert!(!is_reserved("modal"));
    }
}
