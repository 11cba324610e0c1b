//! Interactive session driven by protocol commands.
//!
//! Mirrors the keyboard controls of a windowed front end: spawning, mixes,
//! pause, debug, steering and boundary switches, clear and reset.

use std::io::{BufRead, Write};

use rps_core::config::Config;
use rps_core::error::{Result, SimError};
use rps_core::events::EventLog;
use rps_core::kind::Kind;
use rps_core::math::Vec2;
use rps_core::world::World;

use crate::protocol::{Command, Response, StatusReport, PROTOCOL_VERSION};
use crate::runner::score_entries;

/// Upper bound on a single `tick` command.
pub const MAX_TICKS_PER_COMMAND: u32 = 100_000;

/// A live world answering protocol commands.
pub struct Session {
    world: World<EventLog>,
    dt: f32,
}

impl Session {
    /// Create an empty session.
    pub fn new(config: Config, dt: f32) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidConfig(format!("timestep must be positive, got {dt}")));
        }
        Ok(Self {
            world: World::with_sink(config, EventLog::new())?,
            dt,
        })
    }

    /// The world being driven.
    pub const fn world(&self) -> &World<EventLog> {
        &self.world
    }

    /// The `ready` greeting.
    pub fn ready(&self) -> Response {
        Response::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick: self.world.tick(),
            seed: self.world.seed(),
        }
    }

    /// Current state.
    pub fn status(&self) -> Response {
        let config = self.world.config();
        Response::Status(StatusReport {
            tick: self.world.tick(),
            counts: self.world.counts(),
            total: self.world.total_count(),
            paused: self.world.is_paused(),
            debug: self.world.is_debug(),
            steering: config.steering,
            boundary: config.boundary,
            game_over: self.world.is_game_over(),
            winner: self.world.winner_kind(),
            scoreboard: score_entries(self.world.scoreboard()),
        })
    }

    /// Apply one command.
    pub fn handle(&mut self, command: Command) -> Response {
        let name = command.name();
        match command {
            Command::Spawn { kind, x, y } => match self.world.spawn_tagged(&kind, Vec2::new(x, y), None) {
                Ok(id) => Response::Spawned {
                    ids: id.into_iter().collect(),
                },
                Err(e) => error(name, &e),
            },
            Command::Random { kind, count } => match kind.parse::<Kind>() {
                Ok(kind) => {
                    let count = count.unwrap_or(self.world.config().spawn_batch_size);
                    Response::Spawned {
                        ids: self.world.spawn_random(kind, count as usize),
                    }
                }
                Err(e) => error(name, &e),
            },
            Command::Batch { count } => Response::Spawned {
                ids: self.world.spawn_batch(count),
            },
            Command::Mix { min, max } => {
                if min > max {
                    return error(name, format!("empty range {min}..={max}"));
                }
                Response::Spawned {
                    ids: self.world.spawn_uneven_batch(min..=max),
                }
            }
            Command::Tick { count } => {
                for _ in 0..count.min(MAX_TICKS_PER_COMMAND) {
                    self.world.update(self.dt);
                }
                self.status()
            }
            Command::Pause => {
                self.world.toggle_pause();
                ack(name)
            }
            Command::Debug => {
                self.world.toggle_debug();
                ack(name)
            }
            Command::Steering { enabled } => {
                self.world.set_steering(enabled);
                ack(name)
            }
            Command::Boundary { mode } => {
                self.world.set_boundary_mode(mode);
                ack(name)
            }
            Command::Clear => {
                self.world.clear();
                ack(name)
            }
            Command::Reset { seed } => Response::Reset {
                seed: self.world.reset(seed),
            },
            Command::Status => self.status(),
            Command::Hash => Response::Hash {
                tick: self.world.tick(),
                hash: self.world.state_hash(),
            },
            Command::Quit => ack(name),
        }
    }

    /// Serve commands from `input` until `quit` or end of input.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        write_response(&mut output, &self.ready())?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Command>(line) {
                Ok(Command::Quit) => {
                    write_response(&mut output, &ack("quit"))?;
                    tracing::info!("Session ended by quit");
                    return Ok(());
                }
                Ok(command) => {
                    tracing::debug!(cmd = command.name(), "Command");
                    self.handle(command)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed command");
                    Response::Error {
                        message: format!("invalid command: {e}"),
                        cmd: None,
                    }
                }
            };
            write_response(&mut output, &response)?;
        }

        tracing::info!("Session input closed");
        Ok(())
    }
}

fn ack(cmd: &str) -> Response {
    Response::Ack { cmd: cmd.to_string() }
}

fn error(cmd: &str, message: impl ToString) -> Response {
    Response::Error {
        message: message.to_string(),
        cmd: Some(cmd.to_string()),
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> Result<()> {
    let line = serde_json::to_string(response)
        .map_err(|e| SimError::InvalidState(format!("Failed to encode response: {e}")))?;
    writeln!(output, "{line}")?;
    output.flush()?;
    Ok(())
}
