pub mod executor;
pub mod locate;
pub mod locator;
pub mod pageops;
pub mod registry;
pub mod result;

pub use executor::ActionExecutor;
pub use locator::LOCATOR_FILL;
pub use registry::{build_registry, Action, ActionFailure, ActionRegistry};
