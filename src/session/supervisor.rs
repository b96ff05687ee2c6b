//! Reconnect supervisor
//!
//! Drives `Locating → Opening → Active → Cooldown → Locating …` forever.
//! Every failure becomes a cooldown; only shutdown reaches `Stopped`.

use super::clock::{Clock, Sleep};
use super::router::CommandRouter;
use super::session_loop::{SessionEnd, SessionLoop};
use crate::core::config::{SerialConfig, TimingConfig};
use crate::host::AppNameSource;
use crate::serial::{Channel, DevicePath, LocateError, OpenError, PortLocator, SerialChannel};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Finds and opens the device
pub trait Connector: Send {
    type Channel: Channel + Send;

    fn locate(&mut self) -> Result<DevicePath, LocateError>;

    fn open(&mut self, path: &DevicePath) -> Result<Self::Channel, OpenError>;
}

/// Connector for a real serial port
pub struct SerialConnector {
    explicit_port: Option<PathBuf>,
    locator: PortLocator,
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(explicit_port: Option<PathBuf>, config: SerialConfig) -> Self {
        let locator = PortLocator::new(&config.device_dir, config.device_prefix.clone());
        Self {
            explicit_port,
            locator,
            config,
        }
    }
}

impl Connector for SerialConnector {
    type Channel = SerialChannel;

    fn locate(&mut self) -> Result<DevicePath, LocateError> {
        self.locator.locate(self.explicit_port.as_deref())
    }

    fn open(&mut self, path: &DevicePath) -> Result<SerialChannel, OpenError> {
        SerialChannel::open(path, &self.config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Locating,
    Opening(DevicePath),
    Active,
    Cooldown,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Locating => f.write_str("locating"),
            SupervisorState::Opening(path) => write!(f, "opening {}", path),
            SupervisorState::Active => f.write_str("active"),
            SupervisorState::Cooldown => f.write_str("cooldown"),
            SupervisorState::Stopped => f.write_str("stopped"),
        }
    }
}

pub struct Supervisor<K: Connector, C: Clock> {
    connector: K,
    clock: C,
    router: CommandRouter,
    app_names: Box<dyn AppNameSource>,
    timing: TimingConfig,
    state: SupervisorState,
    channel: Option<K::Channel>,
}

impl<K: Connector, C: Clock> Supervisor<K, C> {
    pub fn new(
        connector: K,
        clock: C,
        router: CommandRouter,
        app_names: Box<dyn AppNameSource>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            connector,
            clock,
            router,
            app_names,
            timing,
            state: SupervisorState::Locating,
            channel: None,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Run until shutdown
    pub fn run(&mut self) {
        while self.step() != &SupervisorState::Stopped {}
        info!("Stopped.");
    }

    /// Perform one transition and return the new state
    pub fn step(&mut self) -> &SupervisorState {
        let next = match std::mem::replace(&mut self.state, SupervisorState::Stopped) {
            SupervisorState::Locating | SupervisorState::Opening(_)
                if self.clock.interrupted() =>
            {
                SupervisorState::Stopped
            }
            SupervisorState::Locating => match self.connector.locate() {
                Ok(path) => {
                    info!("Connecting to {}...", path);
                    SupervisorState::Opening(path)
                }
                Err(e) => {
                    info!(
                        "No MacroPad found ({}). Retrying in {:?}...",
                        e,
                        self.timing.retry_interval()
                    );
                    SupervisorState::Cooldown
                }
            },
            SupervisorState::Opening(path) => match self.connector.open(&path) {
                Ok(channel) => {
                    info!("Connected to {}", path);
                    self.channel = Some(channel);
                    SupervisorState::Active
                }
                Err(e) => {
                    warn!("{}", e);
                    SupervisorState::Cooldown
                }
            },
            SupervisorState::Active => self.run_active(),
            SupervisorState::Cooldown => match self.clock.sleep(self.timing.retry_interval()) {
                Sleep::Elapsed => SupervisorState::Locating,
                Sleep::Interrupted => SupervisorState::Stopped,
            },
            SupervisorState::Stopped => SupervisorState::Stopped,
        };
        debug!("Supervisor -> {}", next);
        self.state = next;
        &self.state
    }

    fn run_active(&mut self) -> SupervisorState {
        let Some(mut channel) = self.channel.take() else {
            return SupervisorState::Cooldown;
        };

        let end = SessionLoop::new(
            &mut self.router,
            self.app_names.as_ref(),
            &self.clock,
            self.timing.tick_interval(),
        )
        .run(&mut channel);
        channel.close();

        match end {
            SessionEnd::Disconnected(reason) => {
                info!("MacroPad {}.", reason);
                info!("Reconnecting in {:?}...", self.timing.retry_interval());
                SupervisorState::Cooldown
            }
            SessionEnd::Interrupted => SupervisorState::Stopped,
        }
    }
}
