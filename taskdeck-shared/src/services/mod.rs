//! Application services
//!
//! Each service is cheap to clone and holds only the shared store and clock.
//!
//! - [`filter`]: view/status/priority/project/search task listings
//! - [`lifecycle`]: task and project mutations, including the trash lifecycle
//! - [`profile`]: account profile, deletion and statistics

pub mod filter;
pub mod lifecycle;
pub mod profile;

use std::sync::Arc;

use mockable::Clock;

/// Clock shared by services; [`mockable::DefaultClock`] in production
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

pub use filter::{TaskCriteria, TaskFilterEngine};
pub use lifecycle::LifecycleManager;
pub use profile::ProfileService;
