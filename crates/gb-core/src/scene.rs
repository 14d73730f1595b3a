//! The fixed scene alphabet and the stored scene tag.
//!
//! Every guestbook entry belongs to one of ten scenes, `a` through `j`.
//! Records written before scenes existed carry no `scene` field; those are
//! modelled as [`SceneTag::Unscoped`] and resolve to [`Scene::DEFAULT`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One of the ten scene symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
}

impl Scene {
    /// All scenes in alphabet order.
    pub const ALL: [Self; 10] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
        Self::H,
        Self::I,
        Self::J,
    ];

    /// Scene that legacy records without a `scene` field belong to.
    pub const DEFAULT: Self = Self::A;

    /// Return the one-letter symbol used in paths, ids and the document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
            Self::E => "e",
            Self::F => "f",
            Self::G => "g",
            Self::H => "h",
            Self::I => "i",
            Self::J => "j",
        }
    }

    /// Look up a scene by its exact lowercase symbol.
    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scene| scene.as_str().starts_with(symbol))
    }

    /// Normalize a raw path segment into a scene.
    ///
    /// Surrounding whitespace is trimmed and the input is lower-cased; the
    /// result must be exactly one symbol from the alphabet.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidScene`] for anything else.
    pub fn normalize(raw: &str) -> Result<Self, CoreError> {
        let lowered = raw.trim().to_lowercase();
        let mut chars = lowered.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => {
                Self::from_symbol(symbol).ok_or_else(|| CoreError::InvalidScene(raw.to_string()))
            }
            _ => Err(CoreError::InvalidScene(raw.to_string())),
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scene {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

// ---------------------------------------------------------------------------
// SceneTag
// ---------------------------------------------------------------------------

/// Scene as recorded on a stored entry.
///
/// Serialized as the plain symbol, or as an absent field for `Unscoped`
/// (use `skip_serializing_if = "SceneTag::is_unscoped"` on the field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Scene>", into = "Option<Scene>")]
pub enum SceneTag {
    Scoped(Scene),
    /// Legacy record written before scenes were introduced.
    #[default]
    Unscoped,
}

impl SceneTag {
    /// The scene this record is listed under.
    #[must_use]
    pub const fn resolve(self) -> Scene {
        match self {
            Self::Scoped(scene) => scene,
            Self::Unscoped => Scene::DEFAULT,
        }
    }

    /// Whether the record belongs to `scene` for listing purposes.
    #[must_use]
    pub fn matches(self, scene: Scene) -> bool {
        self.resolve() == scene
    }

    #[must_use]
    pub const fn is_unscoped(&self) -> bool {
        matches!(self, Self::Unscoped)
    }
}

impl From<Option<Scene>> for SceneTag {
    fn from(value: Option<Scene>) -> Self {
        value.map_or(Self::Unscoped, Self::Scoped)
    }
}

impl From<SceneTag> for Option<Scene> {
    fn from(value: SceneTag) -> Self {
        match value {
            SceneTag::Scoped(scene) => Some(scene),
            SceneTag::Unscoped => None,
        }
    }
}

impl From<Scene> for SceneTag {
    fn from(value: Scene) -> Self {
        Self::Scoped(value)
    }
}
