pub mod file;
pub mod loader;
pub mod memory;
pub mod source;

pub use file::JsonFileSeriesStore;
pub use loader::*;
pub use memory::InMemorySeriesStore;
pub use source::*;
