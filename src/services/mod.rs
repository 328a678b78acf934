pub mod ai;
pub mod mail;
pub mod storage;
