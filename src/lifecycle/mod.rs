//! Process lifecycle helpers for the daemon binary

mod shutdown;

pub use shutdown::ShutdownSignal;
