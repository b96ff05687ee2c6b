//! One connected session: drain inbound commands, push app-name changes

use super::clock::{Clock, Sleep};
use super::router::{CommandRouter, LineBuffer};
use crate::host::AppNameSource;
use crate::serial::{Channel, ReadOutcome};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Why a session ended on its own
#[derive(Debug, Error)]
pub enum DisconnectReason {
    #[error("device disconnected (EOF)")]
    Eof,
    #[error("device disconnected (read error: {0})")]
    ReadError(#[source] io::Error),
    #[error("device disconnected (write error: {0})")]
    WriteError(#[source] io::Error),
}

#[derive(Debug)]
pub enum SessionEnd {
    Disconnected(DisconnectReason),
    /// Shutdown was requested
    Interrupted,
}

/// How a tick that kept the device finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    /// Shutdown is pending; nothing more was dispatched or written
    Interrupted,
}

/// Per-session state plus borrowed collaborators
pub struct SessionLoop<'a> {
    router: &'a mut CommandRouter,
    app_names: &'a dyn AppNameSource,
    clock: &'a dyn Clock,
    tick_interval: Duration,
    buffer: LineBuffer,
    last_sent: String,
}

impl<'a> SessionLoop<'a> {
    pub fn new(
        router: &'a mut CommandRouter,
        app_names: &'a dyn AppNameSource,
        clock: &'a dyn Clock,
        tick_interval: Duration,
    ) -> Self {
        Self {
            router,
            app_names,
            clock,
            tick_interval,
            buffer: LineBuffer::new(),
            last_sent: String::new(),
        }
    }

    /// Last app name written to the device in this session
    pub fn last_sent(&self) -> &str {
        &self.last_sent
    }

    /// Tick until the channel fails or shutdown is requested.
    ///
    /// The channel is left open; closing it is the caller's job.
    pub fn run<C: Channel + ?Sized>(&mut self, channel: &mut C) -> SessionEnd {
        loop {
            match self.tick(channel) {
                Ok(Tick::Continue) => {}
                Ok(Tick::Interrupted) => return SessionEnd::Interrupted,
                Err(reason) => return SessionEnd::Disconnected(reason),
            }
            if self.clock.sleep(self.tick_interval) == Sleep::Interrupted {
                return SessionEnd::Interrupted;
            }
        }
    }

    /// One tick without the trailing sleep: commands first, then the app name
    pub fn tick<C: Channel + ?Sized>(&mut self, channel: &mut C) -> Result<Tick, DisconnectReason> {
        if self.clock.interrupted() {
            return Ok(Tick::Interrupted);
        }

        match channel.read_available() {
            ReadOutcome::NoData => {}
            ReadOutcome::Data(bytes) => {
                for line in self.buffer.feed(&bytes) {
                    self.router.dispatch(&line);
                }
            }
            ReadOutcome::Closed => return Err(DisconnectReason::Eof),
            ReadOutcome::Error(e) => return Err(DisconnectReason::ReadError(e)),
        }

        let app = single_line(&self.app_names.frontmost_app_name());
        if app.is_empty() || app == self.last_sent {
            return Ok(Tick::Continue);
        }
        // The name query can take a while; shutdown may have arrived meanwhile
        if self.clock.interrupted() {
            return Ok(Tick::Interrupted);
        }

        let payload = format!("{}\n", app);
        channel
            .write(payload.as_bytes())
            .map_err(DisconnectReason::WriteError)?;
        info!("Sent: {}", app);
        self.last_sent = app;
        Ok(Tick::Continue)
    }
}

/// Trim and fold embedded line breaks so the name is a single wire line
fn single_line(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.contains(['\n', '\r']) {
        debug!("Folding line breaks in app name {:?}", trimmed);
        trimmed.replace(['\n', '\r'], " ")
    } else {
        trimmed.to_string()
    }
}
