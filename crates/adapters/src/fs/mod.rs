mod created;
mod scanner;

pub use created::FsCreationTimeStore;
pub use scanner::WalkdirFileScanner;
