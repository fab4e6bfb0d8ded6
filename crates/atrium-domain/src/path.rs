//! Slash-delimited department paths.
//!
//! A path is the canonical encoding of a node's tree position: the chain of
//! ancestor ids from the organization root down to, and including, the node's
//! own id. `"<org>/<a>/<b>"` names department `b` under `a` under root
//! organization `org`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Department path parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty department path")]
    Empty,
    #[error("invalid path segment: {0}")]
    InvalidSegment(String),
}

/// A department's position in the organization tree.
///
/// The path is authoritative: a node's ancestors are exactly the segments
/// before its own id. Comparison helpers are segment-aware, so
/// `"a/b"` does not contain `"a/bc"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeptPath(String);

impl DeptPath {
    /// Path of an organization root node (a single segment).
    pub fn root(org_id: Uuid) -> Self {
        Self(org_id.to_string())
    }

    /// Parse and validate a slash-delimited path. Every segment must be a
    /// UUID and at least one segment must be present.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        for segment in s.split('/') {
            if segment.parse::<Uuid>().is_err() {
                return Err(PathError::InvalidSegment(segment.to_owned()));
            }
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All segment ids, root first.
    pub fn segments(&self) -> Vec<Uuid> {
        self.0
            .split('/')
            .map(|s| s.parse().expect("validated at construction"))
            .collect()
    }

    /// The node's own id (last segment).
    pub fn leaf(&self) -> Uuid {
        *self.segments().last().expect("path is never empty")
    }

    /// The root-organization id (first segment).
    pub fn root_org(&self) -> Uuid {
        self.segments()[0]
    }

    /// Ancestor ids, root first, excluding the node itself. Empty for roots.
    pub fn ancestor_ids(&self) -> Vec<Uuid> {
        let mut ids = self.segments();
        ids.pop();
        ids
    }

    /// Path of a direct child node.
    pub fn child(&self, id: Uuid) -> Self {
        Self(format!("{}/{}", self.0, id))
    }

    pub fn is_root(&self) -> bool {
        !self.0.contains('/')
    }

    /// Parent path, or `None` for roots.
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('/').map(|(head, _)| Self(head.to_owned()))
    }

    /// Whether `other` lies inside the subtree rooted at `self` (including
    /// `self` itself). Segment-aware prefix check.
    pub fn contains(&self, other: &DeptPath) -> bool {
        other.0 == self.0
            || (other.0.starts_with(&self.0)
                && other.0.as_bytes().get(self.0.len()) == Some(&b'/'))
    }
}

impl fmt::Display for DeptPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeptPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
