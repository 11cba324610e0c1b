//! Line protocol spoken by the spawn server.
//!
//! Every request is one JSON object on one line; every reply is one JSON
//! object on one line.
//!
//! ```text
//! -> {"type":"Rock","x":100,"y":250}
//! <- {"success":true,"message":"Spawn request queued successfully","request":{"type":"Rock","x":100.0,"y":250.0,"adjusted":false},"queue_size":1}
//! -> {"type":"Lizard","x":1,"y":1}
//! <- {"success":false,"error":"Invalid agent type. ...","code":"INVALID_TYPE","received":"Lizard"}
//! -> {"cmd":"status"}
//! <- {"running":true,"tick":812,"population":37,...}
//! -> {"cmd":"health"}
//! <- {"status":"healthy","service":"RPS World API"}
//! ```
//!
//! A request carrying `cmd` is a query; anything else is a spawn request.
//! Spawns are only queued here. They reach the world at the next tick.

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;

use rps_core::ingest::{RawSpawnRequest, RawValue, Rejection, SpawnRequest, SpawnSender, SpawnValidator};

use crate::sim::WorldSnapshot;

/// Service name reported by `health`.
pub const SERVICE_NAME: &str = "RPS World API";

/// A reply line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Spawn request accepted onto the queue.
    Queued(Queued),
    /// Request refused.
    Failure(Failure),
    /// World and queue status.
    Status(Status),
    /// Liveness.
    Health(Health),
}

/// Body of an accepted spawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Queued {
    /// Always true.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// The request as it will be applied.
    pub request: QueuedRequest,
    /// Requests waiting, this one included.
    pub queue_size: usize,
}

/// Where an accepted spawn will land.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedRequest {
    /// Capitalized kind name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Spawn x after clamping.
    pub x: f32,
    /// Spawn y after clamping.
    pub y: f32,
    /// Whether clamping moved the request.
    pub adjusted: bool,
    /// Requested x, only when adjusted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_x: Option<f32>,
    /// Requested y, only when adjusted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_y: Option<f32>,
}

/// Body of a refusal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Always false.
    pub success: bool,
    /// Human-readable reason.
    pub error: String,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Offending kind value, for `INVALID_TYPE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    /// Queue length, for `QUEUE_FULL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<usize>,
}

impl Failure {
    fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
            received: None,
            queue_size: None,
        }
    }
}

impl From<Rejection> for Failure {
    fn from(rejection: Rejection) -> Self {
        let mut failure = Self::new(rejection.code(), rejection.to_string());
        if let Rejection::InvalidType { received } = rejection {
            failure.received = Some(received);
        }
        failure
    }
}

/// Body of a `status` reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    /// Always true while the server answers.
    pub running: bool,
    /// Latest published world state.
    #[serde(flatten)]
    pub world: WorldSnapshot,
    /// Requests waiting for the next tick.
    pub queue_size: usize,
    /// Queue capacity.
    pub queue_capacity: usize,
    /// Arena width.
    pub screen_width: f32,
    /// Arena height.
    pub screen_height: f32,
}

/// Body of a `health` reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    /// Always `"healthy"`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
}

/// Convert a decoded JSON field to the validator's raw form.
pub fn raw_value(value: &Value) -> RawValue {
    match value {
        Value::Number(n) => n.as_f64().map_or_else(|| RawValue::Other(n.to_string()), RawValue::Number),
        Value::String(s) => RawValue::Text(s.clone()),
        Value::Bool(flag) => RawValue::Flag(*flag),
        other => RawValue::Other(other.to_string()),
    }
}

/// Pull the spawn fields out of a request object. Present fields are kept
/// even when `null`.
pub fn raw_request(object: &Map<String, Value>) -> RawSpawnRequest {
    RawSpawnRequest {
        kind: object.get("type").map(raw_value),
        x: object.get("x").map(raw_value),
        y: object.get("y").map(raw_value),
    }
}

/// Answers request lines. One clone per connection.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    validator: SpawnValidator,
    queue: SpawnSender,
    snapshot: watch::Receiver<WorldSnapshot>,
}

impl RequestHandler {
    /// Handler feeding `queue` and reporting from `snapshot`.
    pub fn new(validator: SpawnValidator, queue: SpawnSender, snapshot: watch::Receiver<WorldSnapshot>) -> Self {
        Self {
            validator,
            queue,
            snapshot,
        }
    }

    /// Answer one request line.
    pub fn respond(&self, line: &str) -> Reply {
        let object = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(object)) => object,
            _ => {
                return Reply::Failure(Failure::new(
                    "INVALID_JSON",
                    "Invalid JSON. Send one JSON object per line",
                ));
            }
        };

        match object.get("cmd") {
            None => self.spawn(&raw_request(&object)),
            Some(Value::String(cmd)) if cmd == "status" => Reply::Status(self.status()),
            Some(Value::String(cmd)) if cmd == "health" => Reply::Health(Health {
                status: "healthy",
                service: SERVICE_NAME,
            }),
            Some(other) => Reply::Failure(Failure::new("NOT_FOUND", format!("Unknown command: {other}"))),
        }
    }

    /// Validate and enqueue a spawn.
    pub fn spawn(&self, raw: &RawSpawnRequest) -> Reply {
        let request = match self.validator.validate(raw) {
            Ok(request) => request,
            Err(rejection) => {
                tracing::debug!(code = rejection.code(), "Spawn request rejected");
                return Reply::Failure(rejection.into());
            }
        };

        if !self.queue.try_enqueue(request) {
            let mut failure = Failure::new("QUEUE_FULL", "Spawn queue is full. Try again later.");
            failure.queue_size = Some(self.queue.pending());
            return Reply::Failure(failure);
        }

        Reply::Queued(queued(request, self.queue.pending()))
    }

    /// Current status.
    pub fn status(&self) -> Status {
        Status {
            running: true,
            world: self.snapshot.borrow().clone(),
            queue_size: self.queue.pending(),
            queue_capacity: self.queue.capacity(),
            screen_width: self.validator.width,
            screen_height: self.validator.height,
        }
    }
}

fn queued(request: SpawnRequest, queue_size: usize) -> Queued {
    let message = if request.adjusted {
        "Spawn request queued (coordinates adjusted to be on-screen)"
    } else {
        "Spawn request queued successfully"
    };
    Queued {
        success: true,
        message: message.to_string(),
        request: QueuedRequest {
            kind: request.kind.display_name().to_string(),
            x: request.x,
            y: request.y,
            adjusted: request.adjusted,
            original_x: request.original_x,
            original_y: request.original_y,
        },
        queue_size,
    }
}
