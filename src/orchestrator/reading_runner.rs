//! 阅读会话驱动器 - 编排层
//!
//! 用合成事件驱动一次阅读会话：打开、等首批章节、逐页"读完"并翻页

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::ReaderApi;
use crate::infrastructure::KvStore;
use crate::utils::logging::truncate_text;
use crate::workflow::{ChapterSession, ReadingCtx, SessionSettings};

/// 一次阅读的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReadingStats {
    /// 实际读完的页数
    pub pages_read: u32,
    /// 最远读完的章节
    pub furthest_completed: u32,
    /// 是否已经发现书的末尾
    pub end_detected: bool,
}

/// 连续阅读 `pages` 页
///
/// 每页滚动到底（触发进度上报）后翻到下一页；
/// 当前章节加载失败或下一页已确定不存在时提前结束
pub async fn run_reading(
    ctx: ReadingCtx,
    api: Arc<dyn ReaderApi>,
    store: Arc<dyn KvStore>,
    settings: SessionSettings,
    pages: u32,
) -> Result<ReadingStats> {
    let mut session = ChapterSession::open(ctx, api, store, settings);
    let mut stats = ReadingStats::default();

    for _ in 0..pages {
        session.settle().await;

        let index = session.current_index();
        let Some(chapter) = session.current_chapter() else {
            warn!("{} ⚠️ 第 {} 章未能加载", session.ctx(), index + 1);
            break;
        };

        println!("\n{}", "=".repeat(40));
        println!("第 {} 章  {}", index + 1, chapter.title);
        println!("{}", "=".repeat(40));
        for paragraph in chapter.paragraphs.iter().take(3) {
            println!("  {}", truncate_text(paragraph, 60));
        }
        if chapter.paragraphs.len() > 3 {
            println!("  ……（共 {} 段）", chapter.paragraphs.len());
        }

        session.on_content_scrolled(index, 1.0);
        stats.pages_read += 1;

        if !session.on_page_settled(index + 1) {
            break;
        }
    }

    // 翻页后触发的请求可能刚好揭示书已到头
    session.settle().await;
    stats.end_detected = !session.has_more();
    stats.furthest_completed = session.furthest_completed();
    info!(
        "{} 📊 读完 {} 页，最远第 {} 章{}",
        session.ctx(),
        stats.pages_read,
        stats.furthest_completed,
        if stats.end_detected { "（已到全书末尾）" } else { "" }
    );

    session.close().await;
    Ok(stats)
}
