pub mod http;
pub mod persistence;
pub mod signing;
pub mod storage;
