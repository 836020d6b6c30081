pub mod mock;
pub mod traits;

#[cfg(feature = "browser")]
pub mod chrome;

pub use mock::{MockElement, MockPage};
pub use traits::{BoundingBox, ElementId, Page, PageError};

#[cfg(feature = "browser")]
pub use chrome::ChromePage;
