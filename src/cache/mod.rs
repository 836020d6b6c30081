pub mod entry;
pub mod fingerprint;
pub mod store;

pub use entry::{substitute_parameters, CacheEntry, CacheFile, ParameterMap, ToolInvocation, Trace};
pub use fingerprint::fingerprint;
pub use store::CacheStore;
