pub mod filename;
pub mod retry;
pub mod storage;
