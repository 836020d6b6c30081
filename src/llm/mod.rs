pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockPlanner;
pub use openai::{OpenAiPlanner, TokenUsage};
pub use traits::{ChatMessage, PlannedCall, PlannerClient, PlannerTurn, ToolSpec};
