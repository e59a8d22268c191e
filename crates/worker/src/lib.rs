// Duewatch worker
//
// Runs the deadline scheduler as a child process of a host (browser shell,
// desktop wrapper, test harness) that owns the real display, push and client
// capabilities. The two sides talk newline-delimited JSON over stdio; logs go
// to stderr.

pub mod bridge;
pub mod protocol;
pub mod runner;

pub use bridge::{write_commands, BridgeClients, BridgeClosed, HostBridge};
pub use protocol::{HostCommand, HostMessage};
pub use runner::{BridgeSummary, BridgeWorker, ShutdownTrigger};
