//! Traces: the ordered, immutable step sequence of one algorithm run.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::step::Step;
use crate::structure::Domain;

/// Where playback is within a trace.
///
/// Ranges over `[-1, len - 1]`; `-1` is the state before the first step.
/// On the wire a position is a plain signed integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Position(Option<usize>);

impl Position {
    /// Before the first step.
    pub const BEFORE_START: Self = Self(None);

    /// The position right after step `index` has been applied.
    pub const fn at(index: usize) -> Self {
        Self(Some(index))
    }

    /// Index of the last applied step, if any.
    pub const fn index(self) -> Option<usize> {
        self.0
    }

    pub const fn is_before_start(self) -> bool {
        self.0.is_none()
    }

    /// Number of steps folded to reach this position.
    pub fn applied(self) -> usize {
        self.0.map_or(0, |i| i + 1)
    }

    /// The last position of a trace with `len` steps.
    pub fn last(len: usize) -> Self {
        len.checked_sub(1).map_or(Self::BEFORE_START, Self::at)
    }

    /// Clamp a signed target into `[-1, len - 1]`.
    pub fn clamped(target: i64, len: usize) -> Self {
        if target < 0 {
            return Self::BEFORE_START;
        }
        let target = usize::try_from(target).unwrap_or(usize::MAX);
        Self(Some(target)).min(Self::last(len))
    }

    /// One step further, unless already at the end of a `len`-step trace.
    pub fn next_within(self, len: usize) -> Option<Self> {
        let next = self.applied();
        (next < len).then_some(Self::at(next))
    }

    /// One step back, unless already before the start.
    pub fn prev(self) -> Option<Self> {
        self.0.map(|i| i.checked_sub(1).map_or(Self::BEFORE_START, Self::at))
    }
}

impl From<i64> for Position {
    fn from(value: i64) -> Self {
        usize::try_from(value).map_or(Self::BEFORE_START, Self::at)
    }
}

impl From<Position> for i64 {
    fn from(position: Position) -> Self {
        position
            .0
            .map_or(-1, |i| i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// Content fingerprint of a trace (blake3 over its serialized steps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(#[serde(with = "hex_bytes")] [u8; 32]);

impl TraceId {
    fn of(steps: &[Step]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for step in steps {
            // Plain data with string keys: serialization into a hasher cannot fail.
            let _ = serde_json::to_writer(&mut hasher, step);
            hasher.update(b"\n");
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let mut out = [0u8; 32];
        hex::decode_to_slice(text, &mut out).map_err(serde::de::Error::custom)?;
        Ok(out)
    }
}

/// How states behind the current position are reconstructed.
///
/// Chosen once per trace so the cost of seeking is predictable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekPolicy {
    /// Every step carries a snapshot: any position is O(1)
    Snapshots,
    /// Fold from the initial state: O(position)
    Replay,
}

/// An ordered, finite, immutable sequence of steps.
///
/// Cloning is cheap: clones share the same step storage.
#[derive(Debug, Clone)]
pub struct Trace {
    id: TraceId,
    steps: Arc<[Step]>,
    policy: SeekPolicy,
}

impl Trace {
    /// Freeze a producer's output into a trace.
    pub fn new(steps: Vec<Step>) -> Self {
        let id = TraceId::of(&steps);
        let policy = if !steps.is_empty() && steps.iter().all(|s| s.snapshot.is_some()) {
            SeekPolicy::Snapshots
        } else {
            SeekPolicy::Replay
        };
        Self {
            id,
            steps: steps.into(),
            policy,
        }
    }

    /// Parse a trace from a JSON array of steps.
    pub fn from_json(json: &str) -> Result<Self> {
        let steps: Vec<Step> = serde_json::from_str(json)?;
        Ok(Self::new(steps))
    }

    pub fn id(&self) -> TraceId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn policy(&self) -> SeekPolicy {
        self.policy
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The step applied to reach `position`.
    pub fn get(&self, position: Position) -> Option<&Step> {
        position.index().and_then(|i| self.steps.get(i))
    }

    /// Steps `[0..=position]`.
    pub fn prefix(&self, position: Position) -> &[Step] {
        &self.steps[..position.applied().min(self.steps.len())]
    }

    /// The last valid position.
    pub fn last_position(&self) -> Position {
        Position::last(self.steps.len())
    }

    /// Check that every snapshot belongs to `domain`.
    pub fn check_domain(&self, domain: Domain) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            if let Some(snapshot) = &step.snapshot {
                let found = snapshot.structure.domain();
                if found != domain {
                    return Err(Error::DomainMismatch {
                        index,
                        expected: domain,
                        found,
                    });
                }
            }
        }
        Ok(())
    }
}
