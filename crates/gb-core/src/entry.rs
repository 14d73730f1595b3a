use serde::{Deserialize, Serialize};

use crate::scene::{Scene, SceneTag};

/// The three free-text fields a visitor submits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spots {
    pub spot1: String,
    pub spot2: String,
    pub spot3: String,
}

impl Spots {
    pub fn new(spot1: impl Into<String>, spot2: impl Into<String>, spot3: impl Into<String>) -> Self {
        Self {
            spot1: spot1.into(),
            spot2: spot2.into(),
            spot3: spot3.into(),
        }
    }
}

/// One guestbook record as stored in the remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// `entry-<scene>-<millis>`, or `entry-<millis>` on legacy records.
    pub id: String,
    #[serde(default, skip_serializing_if = "SceneTag::is_unscoped")]
    pub scene: SceneTag,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default)]
    pub spot1: String,
    #[serde(default)]
    pub spot2: String,
    #[serde(default)]
    pub spot3: String,
}

impl Entry {
    /// Build a scoped entry stamped at `created_at`.
    #[must_use]
    pub fn new(scene: Scene, spots: Spots, created_at: i64) -> Self {
        Self {
            id: entry_id(scene, created_at),
            scene: SceneTag::Scoped(scene),
            created_at,
            spot1: spots.spot1,
            spot2: spots.spot2,
            spot3: spots.spot3,
        }
    }

    /// Scene the entry is listed under.
    #[must_use]
    pub const fn scene(&self) -> Scene {
        self.scene.resolve()
    }
}

/// Format the id of a scoped entry.
#[must_use]
pub fn entry_id(scene: Scene, created_at: i64) -> String {
    format!("entry-{scene}-{created_at}")
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
