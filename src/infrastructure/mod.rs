//! 基础设施层
//!
//! 持有稀缺资源（HTTP 连接池、本地存储文件），只暴露能力

pub mod http_executor;
pub mod kv_store;

pub use http_executor::{HttpExecutor, HttpReply};
pub use kv_store::{FileKvStore, KvStore, MemoryKvStore, TOKEN_KEY, USER_DATA_KEY};
