//! Orchestration and the log-append boundary.

mod assembler;
mod log;

pub use self::assembler::EntryAssembler;
pub use self::log::{AppendStatus, LogError, MemoryLog, TransparencyLog};
