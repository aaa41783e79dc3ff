//! The deferred stream adapter: command specs, caller handles, and the
//! execution pipeline.

mod command;
mod executor;
mod handles;
mod result;

pub use command::{CommandSpec, PREVIEW_LEN};
pub use executor::RemoteExecutor;
pub use handles::{ExecutionHandles, InputSink, OutputSource, TerminalSlot};
pub use result::{CompletionStatus, TerminalEvent};
