pub mod daily;
pub mod engine;
pub mod error;
pub mod library;
pub mod matcher;
pub mod naming;
pub mod similarity;
pub mod stats;
pub mod window;

pub use daily::{DailyProfileBuilder, DailyProfiles, GapFiller};
pub use engine::*;
pub use error::*;
pub use library::*;
pub use matcher::*;
pub use naming::{DayType, ProfileTag, Season};
pub use similarity::*;
pub use window::*;
