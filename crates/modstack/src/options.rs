#![forbid(unsafe_code)]

//! Modal configuration: resolved options, partial overrides, and the shared
//! process-wide defaults.
//!
//! Options resolve in three layers: [`DefaultOptions`] (process-wide), a
//! per-container [`OptionsPatch`] held by the registry, and the per-modal
//! `closable` override given at creation time.
//!
//! # Invariants
//!
//! 1. Merging replaces animation entries wholesale; two definitions for the
//!    same transition are never combined field by field.
//! 2. Unknown fields in option documents are ignored.
//! 3. An empty `body_class` in a patch clears the marker class.

use modstack_reactive::{Observable, Subscription};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::animation::{AnimationDef, AnimationMap, TransitionName, builtin_animations};
use crate::error::ModalError;

/// Body class applied while a container holds at least one modal.
pub const DEFAULT_BODY_CLASS: &str = "modal-open";

/// Media query selecting the mobile transition variants.
pub const DEFAULT_MOBILE_QUERY: &str = "(max-width: 640px)";

/// Fully resolved modal options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModalOptions {
    /// Whether overlay clicks may close a modal.
    pub closable: bool,
    /// Class added to the document body while modals are open.
    pub body_class: Option<String>,
    /// Query that switches enter/refuse/leave to their mobile variants.
    pub mobile_query: String,
    pub animations: AnimationMap,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            closable: true,
            body_class: Some(DEFAULT_BODY_CLASS.to_string()),
            mobile_query: DEFAULT_MOBILE_QUERY.to_string(),
            animations: builtin_animations(),
        }
    }
}

impl ModalOptions {
    /// `self` with `patch` applied on top.
    #[must_use]
    pub fn merged(&self, patch: &OptionsPatch) -> Self {
        let mut out = self.clone();
        out.apply(patch);
        out
    }

    /// Apply `patch` in place.
    pub fn apply(&mut self, patch: &OptionsPatch) {
        if let Some(closable) = patch.closable {
            self.closable = closable;
        }
        if let Some(class) = &patch.body_class {
            self.body_class = if class.is_empty() {
                None
            } else {
                Some(class.clone())
            };
        }
        if let Some(query) = &patch.mobile_query {
            self.mobile_query.clone_from(query);
        }
        for (name, def) in &patch.animations {
            self.animations.insert(*name, def.clone());
        }
    }

    #[must_use]
    pub fn animation(&self, name: TransitionName) -> Option<&AnimationDef> {
        self.animations.get(&name)
    }

    /// A patch that reproduces these options when applied to anything.
    #[must_use]
    pub fn to_patch(&self) -> OptionsPatch {
        OptionsPatch {
            closable: Some(self.closable),
            body_class: Some(self.body_class.clone().unwrap_or_default()),
            mobile_query: Some(self.mobile_query.clone()),
            animations: self.animations.clone(),
        }
    }
}

/// A partial override. Absent fields leave the underlying value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_query: Option<String>,
    #[serde(skip_serializing_if = "AnimationMap::is_empty")]
    pub animations: AnimationMap,
}

impl OptionsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = Some(closable);
        self
    }

    /// Set the body marker class. An empty string disables it.
    #[must_use]
    pub fn body_class(mut self, class: impl Into<String>) -> Self {
        self.body_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn mobile_query(mut self, query: impl Into<String>) -> Self {
        self.mobile_query = Some(query.into());
        self
    }

    #[must_use]
    pub fn animation(mut self, name: TransitionName, def: AnimationDef) -> Self {
        self.animations.insert(name, def);
        self
    }

    /// Whether applying this patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closable.is_none()
            && self.body_class.is_none()
            && self.mobile_query.is_none()
            && self.animations.is_empty()
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(&mut self, other: &Self) {
        if other.closable.is_some() {
            self.closable = other.closable;
        }
        if other.body_class.is_some() {
            self.body_class.clone_from(&other.body_class);
        }
        if other.mobile_query.is_some() {
            self.mobile_query.clone_from(&other.mobile_query);
        }
        for (name, def) in &other.animations {
            self.animations.insert(*name, def.clone());
        }
    }

    /// Parse a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, ModalError> {
        serde_json::from_str(input).map_err(|err| ModalError::InvalidOptions(err.to_string()))
    }

    /// Parse an already decoded JSON value. Anything but an object is rejected.
    pub fn from_json_value(value: &Value) -> Result<Self, ModalError> {
        if !value.is_object() {
            return Err(ModalError::InvalidOptions(format!(
                "expected an object, found {}",
                json_kind(value)
            )));
        }
        Self::deserialize(value).map_err(|err| ModalError::InvalidOptions(err.to_string()))
    }

    /// Parse a TOML document.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(input: &str) -> Result<Self, ModalError> {
        toml::from_str(input).map_err(|err| ModalError::InvalidOptions(err.to_string()))
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Process-wide default options.
///
/// Clones share the same state. Containers subscribe so their merged config
/// follows later changes; modals already created keep the `closable` value
/// they resolved at creation.
#[derive(Debug, Clone)]
pub struct DefaultOptions {
    state: Observable<ModalOptions>,
}

impl Default for DefaultOptions {
    fn default() -> Self {
        Self::new(ModalOptions::default())
    }
}

impl DefaultOptions {
    #[must_use]
    pub fn new(initial: ModalOptions) -> Self {
        Self {
            state: Observable::new(initial),
        }
    }

    /// Deep-merge `patch` into the defaults.
    pub fn set(&self, patch: &OptionsPatch) {
        self.state.update(|options| options.apply(patch));
    }

    /// Snapshot of the current defaults.
    #[must_use]
    pub fn get(&self) -> ModalOptions {
        self.state.get()
    }

    /// Defaults with `patch` layered on top.
    #[must_use]
    pub fn resolve(&self, patch: &OptionsPatch) -> ModalOptions {
        self.state.with(|options| options.merged(patch))
    }

    /// Called after every effective change of the defaults.
    pub fn subscribe(&self, callback: impl Fn(&ModalOptions) + 'static) -> Subscription {
        self.state.subscribe(callback)
    }

    /// Number of effective changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let options = ModalOptions::default();
        assert!(options.closable);
        assert_eq!(options.body_class.as_deref(), Some(DEFAULT_BODY_CLASS));
        assert_eq!(options.mobile_query, DEFAULT_MOBILE_QUERY);
        assert_eq!(options.animations.len(), TransitionName::ALL.len());
    }

    #[test]
    fn merge_replaces_animation_entries_wholesale() {
        let base = ModalOptions::default();
        let custom = AnimationDef::new(json!([{ "opacity": 0 }]), Value::Null);
        let merged = base.merged(&OptionsPatch::new().animation(TransitionName::Enter, custom.clone()));

        assert_eq!(merged.animation(TransitionName::Enter), Some(&custom));
        assert_eq!(
            merged.animation(TransitionName::Leave),
            base.animation(TransitionName::Leave),
            "untouched entries survive"
        );
    }

    #[test]
    fn empty_body_class_clears() {
        let merged = ModalOptions::default().merged(&OptionsPatch::new().body_class(""));
        assert_eq!(merged.body_class, None);
    }

    #[test]
    fn patch_merge_later_wins() {
        let mut a = OptionsPatch::new().closable(true).mobile_query("(max-width: 400px)");
        a.merge(&OptionsPatch::new().closable(false));
        assert_eq!(a.closable, Some(false));
        assert_eq!(a.mobile_query.as_deref(), Some("(max-width: 400px)"));
    }

    #[test]
    fn to_patch_reproduces() {
        let options = ModalOptions::default().merged(&OptionsPatch::new().closable(false));
        let rebuilt = ModalOptions {
            closable: true,
            body_class: None,
            mobile_query: String::new(),
            animations: AnimationMap::new(),
        }
        .merged(&options.to_patch());
        assert_eq!(rebuilt, options);
    }

    #[test]
    fn json_ignores_unknown_fields() {
        let patch =
            OptionsPatch::from_json_str(r#"{"closable":false,"theme":"dark","bodyClass":"locked"}"#)
                .unwrap();
        assert_eq!(patch.closable, Some(false));
        assert_eq!(patch.body_class.as_deref(), Some("locked"));
    }

    #[test]
    fn json_animations() {
        let patch = OptionsPatch::from_json_value(&json!({
            "animations": { "leaveMobile": { "params": [1], "options": { "duration": 10 } } }
        }))
        .unwrap();
        assert_eq!(
            patch.animations.get(&TransitionName::LeaveMobile),
            Some(&AnimationDef::new(json!([1]), json!({ "duration": 10 })))
        );
    }

    #[test]
    fn json_rejects_non_objects() {
        let err = OptionsPatch::from_json_value(&json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            ModalError::InvalidOptions("expected an object, found an array".into())
        );
        assert!(OptionsPatch::from_json_str("{").is_err());
        assert!(OptionsPatch::from_json_str(r#"{"closable":"yes"}"#).is_err());
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn toml_patch() {
        let patch = OptionsPatch::from_toml_str(
            "closable = false\nmobileQuery = \"(max-width: 500px)\"\n\n[animations.hide]\nparams = { opacity = 0 }\n",
        )
        .unwrap();
        assert_eq!(patch.closable, Some(false));
        assert_eq!(patch.mobile_query.as_deref(), Some("(max-width: 500px)"));
        assert!(patch.animations.contains_key(&TransitionName::Hide));
    }

    #[test]
    fn default_options_shared_and_versioned() {
        let defaults = DefaultOptions::default();
        let view = defaults.clone();
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let s = std::rc::Rc::clone(&seen);
        let _sub = defaults.subscribe(move |_| s.set(s.get() + 1));

        defaults.set(&OptionsPatch::new().closable(false));
        assert!(!view.get().closable);
        assert_eq!(seen.get(), 1);

        defaults.set(&OptionsPatch::new().closable(false));
        assert_eq!(defaults.version(), 1, "no-op patch must not notify");

        let resolved = view.resolve(&OptionsPatch::new().closable(true));
        assert!(resolved.closable);
        assert!(!view.get().closable, "resolve must not mutate the defaults");
    }

    proptest::proptest! {
        #[test]
        fn applying_a_patch_twice_is_idempotent(
            closable in proptest::option::of(proptest::bool::ANY),
            class in proptest::option::of("[a-z-]{0,8}"),
            query in proptest::option::of("[a-z]{0,6}"),
        ) {
            let patch = OptionsPatch { closable, body_class: class, mobile_query: query, ..OptionsPatch::default() };
            let base = ModalOptions::default();
            let once = base.merged(&patch);
            proptest::prop_assert_eq!(once.merged(&patch), once.clone());
            if patch.is_empty() {
                proptest::prop_assert_eq!(once, base);
            }
        }
    }
}
