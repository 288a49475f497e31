//! # Book Reader
//!
//! 电子书阅读器的 Rust 客户端
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `HttpExecutor` - 唯一的 reqwest::Client 持有者
//! - `KvStore` - 缓存令牌和用户资料的键值存储
//!
//! ### ② 接口层（Clients）
//! - `clients/` - 后端 REST 接口的类型化封装
//! - `ReaderApi` - 阅读会话依赖的三个接口
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 账号、书架、书签、书城
//!
//! ### ④ 流程层（Workflow）
//! - `ChapterSession` - 章节获取、预加载、阅读进度、书签
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 命令分发与阅读会话驱动
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ReaderApi, ReaderClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FileKvStore, HttpExecutor, KvStore, MemoryKvStore};
pub use models::{Chapter, ChapterFetch};
pub use orchestrator::{App, Command};
pub use workflow::{BookmarkNotice, ChapterSession, ChapterSlot, ReadingCtx, SessionSettings};
