//! Start-list generator: serpentine seeding of roster entries into bibs.

pub mod model;
pub mod seeding;
pub mod service;

pub use model::{DrawOrders, StartList, StartListEntry, StartListMeta};
pub use service::StartListService;
