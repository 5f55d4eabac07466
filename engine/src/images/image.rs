use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content-addressable image node.
///
/// Images form a forest: at most one parent, no cycles. The graph owns the
/// nodes; tag bindings and containers only reference ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Content-addressable identity.
    pub id: String,
    /// Parent layer id. `None` for a root layer.
    #[serde(default)]
    pub parent: Option<String>,
    /// When the image was added to the graph.
    pub created: DateTime<Utc>,
    /// When the image was last used. `None` means never used; such images
    /// are never considered by the garbage collector.
    #[serde(default)]
    pub last_use_time: Option<DateTime<Utc>>,
    /// Total size in bytes.
    #[serde(default)]
    pub size_bytes: u64,
}
