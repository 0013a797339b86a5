pub mod file_store;
pub mod random;

pub use file_store::FileStore;
pub use random::ThreadRandom;
