//! Spawn request intake.
//!
//! External producers (the network server, tests, scripted drivers) hand
//! spawn requests to a running world through a bounded queue. Requests are
//! validated and clamped on the producer side by a [`SpawnValidator`];
//! the world drains the queue once per tick boundary with
//! [`World::drain_spawn_queue`](crate::world::World::drain_spawn_queue).
//!
//! Enqueue never blocks: a full queue is reported as `false`. Drain never
//! blocks either and returns whatever is pending.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::Config;
use crate::kind::Kind;

/// Distance from the arena edge that off-screen coordinates are moved to.
pub const DEFAULT_MARGIN: f32 = 50.0;

/// Pending requests a queue holds before refusing more.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// A field value as it arrived, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A number.
    Number(f64),
    /// A string.
    Text(String),
    /// A boolean, read as 1 or 0 when a coordinate is expected.
    Flag(bool),
    /// Anything else, kept as its textual rendering.
    Other(String),
}

impl RawValue {
    fn as_coordinate(&self) -> Option<f32> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Flag(flag) => f64::from(u8::from(*flag)),
            Self::Other(_) => return None,
        };
        value.is_finite().then_some(value as f32)
    }

    fn rendered(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Flag(flag) => flag.to_string(),
            Self::Text(s) | Self::Other(s) => s.clone(),
        }
    }
}

/// Unvalidated spawn request. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSpawnRequest {
    /// Kind, expected as `"Rock"`, `"Paper"` or `"Scissors"`.
    pub kind: Option<RawValue>,
    /// Requested x.
    pub x: Option<RawValue>,
    /// Requested y.
    pub y: Option<RawValue>,
}

/// A validated spawn request, ready for the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Kind to spawn.
    pub kind: Kind,
    /// Spawn x, inside the arena.
    pub x: f32,
    /// Spawn y, inside the arena.
    pub y: f32,
    /// Requested x, when clamping changed the position.
    pub original_x: Option<f32>,
    /// Requested y, when clamping changed the position.
    pub original_y: Option<f32>,
    /// Whether either coordinate was clamped.
    pub adjusted: bool,
}

/// Why a raw request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The kind is not one of the three capitalized names.
    #[error("Invalid agent type. Must be 'Rock', 'Paper', or 'Scissors' (case-sensitive)")]
    InvalidType {
        /// What was sent instead.
        received: String,
    },

    /// A coordinate is not a finite number.
    #[error("Invalid coordinate format. x and y must be numbers")]
    InvalidCoordinates,
}

impl Rejection {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidType { .. } => "INVALID_TYPE",
            Self::InvalidCoordinates => "INVALID_COORDINATES",
        }
    }
}

/// Checks raw requests and clamps them into the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnValidator {
    /// Arena width.
    pub width: f32,
    /// Arena height.
    pub height: f32,
    /// Distance from the edge that off-screen coordinates move to.
    pub margin: f32,
}

impl SpawnValidator {
    /// Validator for an arena of the given size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            margin: DEFAULT_MARGIN,
        }
    }

    /// Validator for `config`'s arena.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.width, config.height)
    }

    /// Override the clamp margin.
    #[must_use]
    pub const fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Validate `raw`. Fields are checked in the order type, x, y.
    pub fn validate(&self, raw: &RawSpawnRequest) -> Result<SpawnRequest, Rejection> {
        let kind = raw.kind.as_ref().ok_or(Rejection::MissingField("type"))?;
        let x = raw.x.as_ref().ok_or(Rejection::MissingField("x"))?;
        let y = raw.y.as_ref().ok_or(Rejection::MissingField("y"))?;

        let kind = match kind {
            RawValue::Text(name) => parse_display_name(name),
            _ => None,
        }
        .ok_or_else(|| Rejection::InvalidType {
            received: kind.rendered(),
        })?;

        let x = x.as_coordinate().ok_or(Rejection::InvalidCoordinates)?;
        let y = y.as_coordinate().ok_or(Rejection::InvalidCoordinates)?;

        let (cx, adjusted_x) = self.clamp_axis(x, self.width);
        let (cy, adjusted_y) = self.clamp_axis(y, self.height);
        let adjusted = adjusted_x || adjusted_y;

        Ok(SpawnRequest {
            kind,
            x: cx,
            y: cy,
            original_x: adjusted.then_some(x),
            original_y: adjusted.then_some(y),
            adjusted,
        })
    }

    fn clamp_axis(&self, value: f32, extent: f32) -> (f32, bool) {
        if value < 0.0 {
            (self.margin, true)
        } else if value >= extent {
            (extent - self.margin, true)
        } else {
            (value, false)
        }
    }
}

fn parse_display_name(name: &str) -> Option<Kind> {
    Kind::ALL.into_iter().find(|kind| kind.display_name() == name)
}

/// Create a bounded spawn queue holding at most `capacity` requests.
///
/// A capacity of zero is raised to one.
#[must_use]
pub fn spawn_queue(capacity: usize) -> (SpawnSender, SpawnReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (SpawnSender { tx }, SpawnReceiver { rx })
}

/// Producer half of the spawn queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SpawnSender {
    tx: mpsc::Sender<SpawnRequest>,
}

impl SpawnSender {
    /// Enqueue without blocking. `false` if the queue is full or the
    /// world side has gone away.
    pub fn try_enqueue(&self, request: SpawnRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Spawn queue full, request refused");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Requests waiting to be drained.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Maximum pending requests.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Whether the next enqueue would be refused.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.tx.capacity() == 0
    }
}

/// Consumer half of the spawn queue, owned by the simulation driver.
#[derive(Debug)]
pub struct SpawnReceiver {
    rx: mpsc::Receiver<SpawnRequest>,
}

impl SpawnReceiver {
    /// Take every pending request, oldest first, without blocking.
    pub fn drain(&mut self) -> Vec<SpawnRequest> {
        let mut requests = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            requests.push(request);
        }
        requests
    }

    /// Discard every pending request, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        self.drain().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: &str, x: f64, y: f64) -> RawSpawnRequest {
        RawSpawnRequest {
            kind: Some(RawValue::Text(kind.to_string())),
            x: Some(RawValue::Number(x)),
            y: Some(RawValue::Number(y)),
        }
    }

    fn validator() -> SpawnValidator {
        SpawnValidator::new(1200.0, 800.0)
    }

    #[test]
    fn test_valid_request_passes_through() {
        let request = validator().validate(&raw("Paper", 300.0, 200.0)).unwrap();
        assert_eq!(request.kind, Kind::Paper);
        assert_eq!((request.x, request.y), (300.0, 200.0));
        assert!(!request.adjusted);
        assert_eq!(request.original_x, None);
    }

    #[test]
    fn test_missing_fields_in_order() {
        let v = validator();
        assert_eq!(
            v.validate(&RawSpawnRequest::default()),
            Err(Rejection::MissingField("type"))
        );

        let mut r = raw("Rock", 1.0, 1.0);
        r.y = None;
        assert_eq!(v.validate(&r), Err(Rejection::MissingField("y")));
        r.x = None;
        assert_eq!(v.validate(&r), Err(Rejection::MissingField("x")));
    }

    #[test]
    fn test_type_is_case_sensitive() {
        let err = validator().validate(&raw("rock", 1.0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            Rejection::InvalidType {
                received: "rock".to_string()
            }
        );
        assert_eq!(err.code(), "INVALID_TYPE");

        let mut numeric = raw("Rock", 1.0, 1.0);
        numeric.kind = Some(RawValue::Number(3.0));
        assert!(matches!(
            validator().validate(&numeric),
            Err(Rejection::InvalidType { received }) if received == "3"
        ));
    }

    #[test]
    fn test_coordinates_must_be_numeric() {
        let mut r = raw("Rock", 1.0, 1.0);
        r.x = Some(RawValue::Text("12.5".to_string()));
        assert_eq!(validator().validate(&r).unwrap().x, 12.5);

        r.x = Some(RawValue::Text("left".to_string()));
        assert_eq!(validator().validate(&r), Err(Rejection::InvalidCoordinates));

        r.x = Some(RawValue::Other("null".to_string()));
        assert_eq!(validator().validate(&r), Err(Rejection::InvalidCoordinates));

        r.x = Some(RawValue::Number(f64::NAN));
        assert_eq!(validator().validate(&r), Err(Rejection::InvalidCoordinates));

        r.x = Some(RawValue::Flag(true));
        r.y = Some(RawValue::Flag(false));
        let request = validator().validate(&r).unwrap();
        assert_eq!((request.x, request.y), (1.0, 0.0));

        r.kind = Some(RawValue::Flag(true));
        assert!(matches!(
            validator().validate(&r),
            Err(Rejection::InvalidType { received }) if received == "true"
        ));
    }

    #[test]
    fn test_offscreen_coordinates_are_clamped() {
        let request = validator().validate(&raw("Scissors", -10.0, 800.0)).unwrap();
        assert_eq!((request.x, request.y), (50.0, 750.0));
        assert!(request.adjusted);
        assert_eq!(request.original_x, Some(-10.0));
        assert_eq!(request.original_y, Some(800.0));

        // One axis off-screen still records both originals
        let request = validator().validate(&raw("Scissors", 1500.0, 400.0)).unwrap();
        assert_eq!((request.x, request.y), (1150.0, 400.0));
        assert_eq!(request.original_y, Some(400.0));
    }

    #[test]
    fn test_queue_bounded() {
        let (tx, mut rx) = spawn_queue(2);
        let request = validator().validate(&raw("Rock", 10.0, 10.0)).unwrap();

        assert!(tx.try_enqueue(request));
        assert!(!tx.is_full());
        assert!(tx.try_enqueue(request));
        assert!(tx.is_full());
        assert_eq!(tx.pending(), 2);
        assert!(!tx.try_enqueue(request));

        assert_eq!(rx.drain().len(), 2);
        assert_eq!(tx.pending(), 0);
        assert!(rx.drain().is_empty());
        assert!(tx.try_enqueue(request));
    }

    #[test]
    fn test_drain_preserves_order() {
        let (tx, mut rx) = spawn_queue(DEFAULT_QUEUE_CAPACITY);
        let v = validator();
        for kind in ["Rock", "Paper", "Scissors"] {
            assert!(tx.try_enqueue(v.validate(&raw(kind, 5.0, 5.0)).unwrap()));
        }
        let kinds: Vec<_> = rx.drain().into_iter().map(|r| r.kind).collect();
        assert_eq!(kinds, Kind::ALL.to_vec());
    }

    #[test]
    fn test_closed_queue_refuses() {
        let (tx, rx) = spawn_queue(4);
        drop(rx);
        let request = validator().validate(&raw("Rock", 10.0, 10.0)).unwrap();
        assert!(!tx.try_enqueue(request));
    }
}
