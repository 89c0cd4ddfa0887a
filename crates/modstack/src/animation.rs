#![forbid(unsafe_code)]

//! Transition names, animation definitions, and the built-in fallbacks.
//!
//! An [`AnimationDef`] is a pair of opaque JSON values handed straight to the
//! [`Animator`](crate::platform::Animator): `params` (keyframes) and `options`
//! (timing). The core never inspects them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Named transitions a modal can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionName {
    Enter,
    EnterMobile,
    Refuse,
    RefuseMobile,
    Leave,
    LeaveMobile,
    Activate,
    Secondary,
    Tertiary,
    Hide,
}

impl TransitionName {
    pub const ALL: [Self; 10] = [
        Self::Enter,
        Self::EnterMobile,
        Self::Refuse,
        Self::RefuseMobile,
        Self::Leave,
        Self::LeaveMobile,
        Self::Activate,
        Self::Secondary,
        Self::Tertiary,
        Self::Hide,
    ];

    /// Configuration key for this transition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::EnterMobile => "enterMobile",
            Self::Refuse => "refuse",
            Self::RefuseMobile => "refuseMobile",
            Self::Leave => "leave",
            Self::LeaveMobile => "leaveMobile",
            Self::Activate => "activate",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::Hide => "hide",
        }
    }

    /// The small-viewport variant, for transitions that have one.
    #[must_use]
    pub const fn mobile_variant(self) -> Option<Self> {
        match self {
            Self::Enter => Some(Self::EnterMobile),
            Self::Refuse => Some(Self::RefuseMobile),
            Self::Leave => Some(Self::LeaveMobile),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransitionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyframes plus timing for one transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationDef {
    pub params: Value,
    pub options: Value,
}

impl AnimationDef {
    #[must_use]
    pub fn new(params: Value, options: Value) -> Self {
        Self { params, options }
    }
}

/// Per-transition animation configuration.
pub type AnimationMap = BTreeMap<TransitionName, AnimationDef>;

/// Outcome of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionStatus {
    /// The animation ran to completion.
    Done,
    /// The animator rejected; the failure was logged.
    Error,
    /// Nothing was played (no element, or the modal sits in the hidden band).
    Ignored,
}

impl TransitionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Error => "error",
            Self::Ignored => "ignored",
        }
    }
}

/// Built-in definition used when the effective configuration has no entry.
#[must_use]
pub fn builtin_animation(name: TransitionName) -> AnimationDef {
    let fast = json!({ "duration": 200, "easing": "ease-out", "fill": "forwards" });
    let layer = json!({ "duration": 250, "easing": "ease-in-out", "fill": "forwards" });
    match name {
        TransitionName::Enter => AnimationDef::new(
            json!([
                { "opacity": 0, "transform": "translateY(-20px) scale(0.96)" },
                { "opacity": 1, "transform": "translateY(0) scale(1)" }
            ]),
            fast,
        ),
        TransitionName::EnterMobile => AnimationDef::new(
            json!([
                { "opacity": 0, "transform": "translateY(100%)" },
                { "opacity": 1, "transform": "translateY(0)" }
            ]),
            fast,
        ),
        TransitionName::Refuse => AnimationDef::new(
            json!([
                { "transform": "scale(1)" },
                { "transform": "scale(1.03)" },
                { "transform": "scale(1)" }
            ]),
            json!({ "duration": 150, "easing": "ease-in-out" }),
        ),
        TransitionName::RefuseMobile => AnimationDef::new(
            json!([
                { "transform": "translateY(0)" },
                { "transform": "translateY(-12px)" },
                { "transform": "translateY(0)" }
            ]),
            json!({ "duration": 150, "easing": "ease-in-out" }),
        ),
        TransitionName::Leave => AnimationDef::new(
            json!([
                { "opacity": 1, "transform": "scale(1)" },
                { "opacity": 0, "transform": "scale(0.96)" }
            ]),
            json!({ "duration": 150, "easing": "ease-in", "fill": "forwards" }),
        ),
        TransitionName::LeaveMobile => AnimationDef::new(
            json!([
                { "opacity": 1, "transform": "translateY(0)" },
                { "opacity": 0, "transform": "translateY(100%)" }
            ]),
            json!({ "duration": 150, "easing": "ease-in", "fill": "forwards" }),
        ),
        TransitionName::Activate => AnimationDef::new(
            json!({ "opacity": 1, "transform": "translateY(0) scale(1)" }),
            layer,
        ),
        TransitionName::Secondary => AnimationDef::new(
            json!({ "opacity": 1, "transform": "translateY(-24px) scale(0.94)" }),
            layer,
        ),
        TransitionName::Tertiary => AnimationDef::new(
            json!({ "opacity": 1, "transform": "translateY(-48px) scale(0.88)" }),
            layer,
        ),
        TransitionName::Hide => AnimationDef::new(
            json!({ "opacity": 0, "transform": "translateY(-48px) scale(0.88)" }),
            layer,
        ),
    }
}

/// All built-in definitions.
#[must_use]
pub fn builtin_animations() -> AnimationMap {
    TransitionName::ALL
        .into_iter()
        .map(|name| (name, builtin_animation(name)))
        .collect()
}
