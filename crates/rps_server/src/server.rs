//! TCP front end and task wiring.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use rps_core::config::Config;
use rps_core::ingest::{spawn_queue, SpawnValidator};
use rps_core::world::World;

use crate::protocol::RequestHandler;
use crate::sim::SimDriver;
use crate::{Result, ServerConfig, ServerError};

/// A bound server, ready to run.
pub struct Server {
    listener: TcpListener,
    handler: RequestHandler,
    driver: SimDriver,
    period: Duration,
}

impl Server {
    /// Build the world, the spawn queue and bind the listener.
    pub async fn bind(config: ServerConfig, world_config: Config) -> Result<Self> {
        config.validate()?;

        let mut world = World::new(world_config)?;
        config.validate_arena(world.config())?;
        if let Some(per_kind) = config.initial_batch {
            world.spawn_batch(Some(per_kind));
        }

        let validator = SpawnValidator::from_config(world.config()).with_margin(config.margin);
        let (queue, receiver) = spawn_queue(config.queue_capacity);
        let seed = world.seed();
        let (driver, snapshot) = SimDriver::new(world, receiver, config.dt());

        let listener = TcpListener::bind(config.bind_address()).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            seed,
            tick_rate = config.tick_rate,
            queue_capacity = config.queue_capacity,
            "Spawn server listening"
        );

        Ok(Self {
            listener,
            handler: RequestHandler::new(validator, queue, snapshot),
            driver,
            period: Duration::from_secs_f64(1.0 / f64::from(config.tick_rate)),
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve clients and tick the world until `shutdown` resolves, then
    /// return the final world.
    pub async fn run_until<F>(self, shutdown: F) -> Result<World>
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            handler,
            driver,
            period,
        } = self;

        let (stop_tx, stop_rx) = watch::channel(false);
        let sim = tokio::spawn(driver.run(period, stop_rx));

        let served = tokio::select! {
            result = accept_loop(&listener, &handler) => result,
            () = shutdown => {
                tracing::info!("Shutdown requested");
                Ok(())
            }
        };

        // The driver also stops if the sender is gone, so a failed send is fine
        let _ = stop_tx.send(true);
        let world = sim.await.map_err(|e| ServerError::TaskFailed(e.to_string()))?;
        served.map(|()| world)
    }
}

async fn accept_loop(listener: &TcpListener, handler: &RequestHandler) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        tracing::debug!(%peer, "Client connected");
        let handler = handler.clone();
        tokio::spawn(async move {
            match handle_connection(stream, &handler).await {
                Ok(requests) => tracing::debug!(%peer, requests, "Client disconnected"),
                Err(e) => tracing::warn!(%peer, error = %e, "Connection failed"),
            }
        });
    }
}

/// Answer request lines on `stream` until the client hangs up. Returns the
/// number of requests served.
pub async fn handle_connection(stream: TcpStream, handler: &RequestHandler) -> Result<usize> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let mut served = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = handler.respond(line);
        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        write.write_all(&encoded).await?;
        served += 1;
    }

    write.shutdown().await?;
    Ok(served)
}
