//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 持有 HTTP 执行器和本地存储
//! - 分发命令行命令
//!
//! ### `reading_runner` - 阅读会话驱动器
//! - 打开一次阅读会话，用合成的翻页/滚动事件驱动它
//! - 输出本次阅读的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 Command)
//!     ↓
//! reading_runner (驱动一次阅读)      services (账号 / 书架 / 书签 / 书城)
//!     ↓                                  ↓
//! workflow::ChapterSession          clients::ReaderClient
//!     ↓                                  ↓
//! clients::ReaderApi  ──────────→  infrastructure (HttpExecutor / KvStore)
//! ```

pub mod app;
pub mod command;
pub mod reading_runner;

// 重新导出主要类型
pub use app::App;
pub use command::{Command, USAGE};
pub use reading_runner::{run_reading, ReadingStats};
