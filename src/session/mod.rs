//! Session module - command routing, the tick loop and the reconnect supervisor

pub mod clock;
pub mod router;
pub mod session_loop;
pub mod supervisor;

pub use clock::{Clock, ShutdownClock, Sleep};
pub use router::{Command, CommandRouter, Dispatch, LineBuffer};
pub use session_loop::{DisconnectReason, SessionEnd, SessionLoop, Tick};
pub use supervisor::{Connector, SerialConnector, Supervisor, SupervisorState};
