pub mod outcome;
pub mod prompt;
pub mod recorder;
pub mod replay;
pub mod session;

pub use outcome::{is_result_action, outcome_from_invocation, TaskOutcome};
pub use prompt::{build_task_prompt, SYSTEM_PROMPT};
pub use recorder::TraceRecorder;
pub use replay::{replay_trace, validate_trace, ReplayRun};
pub use session::{InvocationResult, PlannerSession, SessionConfig, SessionRun};
