pub mod convert;
pub mod engine;
pub mod merge;
pub mod preview;
pub mod storage;
pub mod sweeper;
