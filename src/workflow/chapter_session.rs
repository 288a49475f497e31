//! 章节阅读会话 - 流程层
//!
//! 核心职责：管理一次阅读会话中的章节获取、预加载和阅读进度
//!
//! 事件顺序由宿主保证（打开、翻页停稳、正文滚动、添加书签），
//! 所有状态变更都经过 `&mut self`，会话内部不需要锁。
//! 章节请求在后台并发执行，完成结果带着各自的章节号通过通道送回，
//! 由 [`ChapterSession::next_completion`] 等方法逐个应用。

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clients::ReaderApi;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{KvStore, TOKEN_KEY};
use crate::models::{BookmarkCreate, Chapter, ChapterFetch};
use crate::utils::logging::truncate_text;
use crate::workflow::chapter_slot::ChapterSlot;
use crate::workflow::reading_ctx::ReadingCtx;

/// 会话参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// 滚动比例达到该值视为读完本章
    pub progress_threshold: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            progress_threshold: 0.80,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            progress_threshold: config.progress_threshold,
        }
    }
}

/// 应用一次请求结果之后，某个章节位置发生的变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchEvent {
    /// 章节内容已就绪
    Resolved(u32),
    /// 该章不存在，之后不再发起任何请求
    BeyondEnd(u32),
    /// 请求失败，位置恢复为未请求
    Failed(u32),
}

/// 添加书签后给用户的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkNotice {
    Added { chapter: u32 },
    AlreadyExists { chapter: u32 },
    /// 当前章节内容还没加载好，没有发请求
    NotReady,
    /// 本地没有令牌
    SignInRequired,
    Failed(String),
}

impl BookmarkNotice {
    /// 展示给用户的文字
    pub fn message(&self) -> String {
        match self {
            BookmarkNotice::Added { chapter } => format!("已添加第 {} 章书签", chapter),
            BookmarkNotice::AlreadyExists { chapter } => format!("第 {} 章已添加过书签", chapter),
            BookmarkNotice::NotReady => "内容尚未加载完成".to_string(),
            BookmarkNotice::SignInRequired => "请先登录".to_string(),
            BookmarkNotice::Failed(reason) => format!("添加书签失败: {}", reason),
        }
    }
}

/// 一次章节请求的完成消息
#[derive(Debug)]
struct FetchOutcome {
    chapter: u32,
    result: AppResult<ChapterFetch>,
}

/// 保证每个已发出的请求都会送回一条完成消息
///
/// 后台任务被取消或 panic 时，drop 里补发一条失败消息，
/// 在途计数因此总能归零
struct CompletionGuard {
    chapter: u32,
    tx: Option<mpsc::UnboundedSender<FetchOutcome>>,
}

impl CompletionGuard {
    fn complete(mut self, result: AppResult<ChapterFetch>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(FetchOutcome {
                chapter: self.chapter,
                result,
            });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(FetchOutcome {
                chapter: self.chapter,
                result: Err(AppError::Other("章节请求被中断".to_string())),
            });
        }
    }
}

static UNFETCHED: ChapterSlot = ChapterSlot::Unfetched;

/// 滚动比例：(滚动偏移 + 可视高度) / 内容高度
///
/// 内容高度为 0（空章节）视为已读完
pub fn scroll_fraction(scroll_offset: f64, viewport_height: f64, content_height: f64) -> f64 {
    if content_height <= 0.0 {
        return 1.0;
    }
    (scroll_offset + viewport_height) / content_height
}

/// 章节阅读会话
///
/// - 以章节号（从1开始）为键保存稀疏的章节位置
/// - 决定何时请求哪一章，同一章不会重复请求
/// - 记录读完的最远章节，每个新值只上报一次进度
/// - 为当前章节添加书签
///
/// 必须在 tokio 运行时内创建和使用
pub struct ChapterSession {
    ctx: ReadingCtx,
    api: Arc<dyn ReaderApi>,
    store: Arc<dyn KvStore>,
    settings: SessionSettings,

    slots: BTreeMap<u32, ChapterSlot>,
    /// 当前可见页（从0开始），对应第 current_index + 1 章
    current_index: u32,
    furthest_completed: u32,
    has_more: bool,
    in_flight: usize,

    completions_tx: mpsc::UnboundedSender<FetchOutcome>,
    completions_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    /// 未完成的进度上报任务
    background: Vec<JoinHandle<()>>,
}

impl ChapterSession {
    /// 打开阅读会话并发出首批请求
    ///
    /// - 指定起始章节 N：当前页为 N-1，请求第 N-1、N、N+1 章（跳过小于1的章节号）
    /// - 未指定：当前页为 0，请求第 1、2 章
    pub fn open(
        ctx: ReadingCtx,
        api: Arc<dyn ReaderApi>,
        store: Arc<dyn KvStore>,
        settings: SessionSettings,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let mut session = Self {
            ctx,
            api,
            store,
            settings,
            slots: BTreeMap::new(),
            current_index: 0,
            furthest_completed: 0,
            has_more: true,
            in_flight: 0,
            completions_tx,
            completions_rx,
            background: Vec::new(),
        };

        info!("{} 📖 打开阅读会话", session.ctx);

        match session.ctx.start_chapter {
            Some(start) => {
                session.current_index = start.saturating_sub(1);
                for chapter in [start.saturating_sub(1), start, start.saturating_add(1)] {
                    session.fetch_chapter(chapter);
                }
            }
            None => {
                session.fetch_chapter(1);
                session.fetch_chapter(2);
            }
        }

        session
    }

    // ========== 章节请求 ==========

    /// 请求第 `chapter` 章
    ///
    /// 仅当章节号 ≥ 1、书还没到头、且该位置尚未请求时才会发出请求。
    /// 返回是否真的发出了请求
    pub fn fetch_chapter(&mut self, chapter: u32) -> bool {
        if chapter < 1 || !self.has_more {
            return false;
        }
        if self.slots.contains_key(&chapter) {
            return false;
        }

        self.slots.insert(chapter, ChapterSlot::Pending);
        self.in_flight += 1;
        debug!("{} 请求第 {} 章 (在途 {})", self.ctx, chapter, self.in_flight);

        let api = Arc::clone(&self.api);
        let book_id = self.ctx.book_id.clone();
        let guard = CompletionGuard {
            chapter,
            tx: Some(self.completions_tx.clone()),
        };

        tokio::spawn(async move {
            let result = api.fetch_chapter(&book_id, chapter).await;
            guard.complete(result);
        });

        true
    }

    /// 等待并应用下一个完成的请求
    ///
    /// 没有在途请求时立即返回 `None`
    pub async fn next_completion(&mut self) -> Option<FetchEvent> {
        if self.in_flight == 0 {
            return None;
        }
        // 会话自己持有发送端，通道不会关闭
        let outcome = self.completions_rx.recv().await?;
        Some(self.apply_outcome(outcome))
    }

    /// 应用所有已经完成的请求，不等待
    pub fn drain_completions(&mut self) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        while let Ok(outcome) = self.completions_rx.try_recv() {
            events.push(self.apply_outcome(outcome));
        }
        events
    }

    /// 等待所有在途请求完成
    pub async fn settle(&mut self) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_completion().await {
            events.push(event);
        }
        events
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> FetchEvent {
        let FetchOutcome { chapter, result } = outcome;
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            Ok(ChapterFetch::Found(content)) => {
                debug!(
                    "{} ✓ 第 {} 章: {}",
                    self.ctx,
                    chapter,
                    truncate_text(&content.title, 30)
                );
                self.slots.insert(chapter, ChapterSlot::Resolved(content));
                FetchEvent::Resolved(chapter)
            }
            Ok(ChapterFetch::NotFound) => {
                if self.has_more {
                    info!("{} 📕 第 {} 章不存在，停止继续加载", self.ctx, chapter);
                }
                self.has_more = false;
                self.slots.insert(chapter, ChapterSlot::BeyondEnd);
                self.keep_current_viewable();
                FetchEvent::BeyondEnd(chapter)
            }
            Err(e) => {
                warn!("{} ⚠️ 获取第 {} 章失败: {}", self.ctx, chapter, e);
                self.slots.remove(&chapter);
                // 书已到头时这一章再也不会被请求
                if !self.has_more {
                    self.keep_current_viewable();
                }
                FetchEvent::Failed(chapter)
            }
        }
    }

    /// 书已到头后，当前页必须停在已获取或请求中的章节上
    ///
    /// 向前找最近的这样一章；前面没有时退到最小的已获取章节
    fn keep_current_viewable(&mut self) {
        let current = self.current_chapter_number();
        if self.has_more || self.slot(current).is_viewable() {
            return;
        }

        let target = self
            .slots
            .range(..current)
            .rev()
            .find(|(_, slot)| slot.is_viewable())
            .or_else(|| self.slots.iter().find(|(_, slot)| slot.chapter().is_some()))
            .map(|(chapter, _)| *chapter);

        match target {
            Some(chapter) => {
                let before = self.current_index;
                self.current_index = chapter - 1;
                debug!(
                    "{} 第 {} 页已无法显示，移到第 {} 页",
                    self.ctx, before, self.current_index
                );
            }
            None => warn!("{} ⚠️ 没有任何可显示的章节", self.ctx),
        }
    }

    // ========== 宿主事件 ==========

    /// 横向翻页停稳
    ///
    /// 预加载后两页（第 new_index + 2 章），并补请求前一页（第 new_index 章）。
    /// 停在未请求的页上时顺带请求当前页。
    /// 目标页已确定不存在，或书已到头而目标页从未请求过时不移动，返回 `false`
    pub fn on_page_settled(&mut self, new_index: u32) -> bool {
        let chapter = new_index.saturating_add(1);
        let target = self.slot(chapter);
        if matches!(target, ChapterSlot::BeyondEnd) {
            debug!("{} 第 {} 页超出书的末尾，忽略", self.ctx, new_index);
            return false;
        }
        // 书已到头，未请求的章节不会再有内容
        if !self.has_more && !target.is_viewable() {
            debug!("{} 第 {} 页不会再加载，忽略", self.ctx, new_index);
            return false;
        }

        self.current_index = new_index;

        self.fetch_chapter(new_index.saturating_add(2));
        if new_index > 0 {
            self.fetch_chapter(new_index);
        }
        if matches!(self.slot(chapter), ChapterSlot::Unfetched) {
            self.fetch_chapter(chapter);
        }

        true
    }

    /// 正文纵向滚动
    ///
    /// 滚动比例达到阈值且该章超过已读完的最远章节时，更新最远章节并上报一次进度。
    /// 返回新的最远章节（章节号从1开始）
    pub fn on_content_scrolled(&mut self, chapter_index: u32, scroll_fraction: f64) -> Option<u32> {
        // NaN 不会通过这个比较
        if !(scroll_fraction >= self.settings.progress_threshold) {
            return None;
        }

        let chapter = chapter_index.saturating_add(1);
        if chapter <= self.furthest_completed {
            return None;
        }

        self.furthest_completed = chapter;
        info!("{} 📌 已读完第 {} 章", self.ctx, chapter);
        self.dispatch_progress(chapter);

        Some(chapter)
    }

    /// 后台上报阅读进度，失败只记录日志
    fn dispatch_progress(&mut self, chapter: u32) {
        self.background.retain(|handle| !handle.is_finished());

        let api = Arc::clone(&self.api);
        let store = Arc::clone(&self.store);
        let book_id = self.ctx.book_id.clone();

        self.background.push(tokio::spawn(async move {
            let token = match store.get(TOKEN_KEY).await {
                Ok(Some(token)) => token,
                Ok(None) => {
                    debug!("未登录，跳过进度上报 (书籍 {} 第 {} 章)", book_id, chapter);
                    return;
                }
                Err(e) => {
                    warn!("读取令牌失败，跳过进度上报: {}", e);
                    return;
                }
            };

            match api.update_progress(&token, &book_id, chapter).await {
                Ok(()) => debug!("✓ 进度已上报: 书籍 {} 第 {} 章", book_id, chapter),
                Err(e) => warn!("⚠️ 进度上报失败 (书籍 {} 第 {} 章): {}", book_id, chapter, e),
            }
        }));
    }

    /// 为当前章节添加书签
    pub async fn add_bookmark(&self) -> BookmarkNotice {
        let chapter = self.current_chapter_number();
        if self.current_chapter().is_none() {
            return BookmarkNotice::NotReady;
        }

        let token = match self.store.get(TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => return BookmarkNotice::SignInRequired,
            Err(e) => {
                warn!("读取令牌失败: {}", e);
                return BookmarkNotice::SignInRequired;
            }
        };

        let notice = match self
            .api
            .create_bookmark(&token, &self.ctx.book_id, chapter)
            .await
        {
            Ok(BookmarkCreate::Created) => BookmarkNotice::Added { chapter },
            Ok(BookmarkCreate::AlreadyExists) => BookmarkNotice::AlreadyExists { chapter },
            Err(e) if e.is_auth_error() => BookmarkNotice::SignInRequired,
            Err(e) => {
                warn!("{} ⚠️ 添加书签失败: {}", self.ctx, e);
                BookmarkNotice::Failed(e.server_message().map_or_else(|| e.to_string(), str::to_string))
            }
        };

        info!("{} 🔖 {}", self.ctx, notice.message());
        notice
    }

    /// 等待所有后台进度上报结束
    pub async fn flush_background(&mut self) {
        let handles: Vec<_> = self.background.drain(..).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("进度上报任务异常结束: {}", e);
            }
        }
    }

    /// 关闭会话，等待后台上报完成
    pub async fn close(mut self) {
        self.flush_background().await;
        info!(
            "{} 📕 关闭阅读会话，最远读完第 {} 章",
            self.ctx, self.furthest_completed
        );
    }

    // ========== 状态查询 ==========

    pub fn ctx(&self) -> &ReadingCtx {
        &self.ctx
    }

    /// 某一章（从1开始）的状态
    pub fn slot(&self, chapter: u32) -> &ChapterSlot {
        self.slots.get(&chapter).unwrap_or(&UNFETCHED)
    }

    /// 当前可见页（从0开始）
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    /// 当前可见章节号（从1开始）
    pub fn current_chapter_number(&self) -> u32 {
        self.current_index.saturating_add(1)
    }

    /// 当前章节内容（已获取时）
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.slot(self.current_chapter_number()).chapter()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn furthest_completed(&self) -> u32 {
        self.furthest_completed
    }

    /// 在途请求数
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// 宿主需要渲染的页数
    ///
    /// 覆盖当前页以及所有已请求（未到头）的章节，低位未请求的页按占位处理
    pub fn page_count(&self) -> u32 {
        let highest = self
            .slots
            .iter()
            .rev()
            .find(|(_, slot)| !matches!(slot, ChapterSlot::BeyondEnd))
            .map(|(chapter, _)| *chapter)
            .unwrap_or(0);
        highest.max(self.current_chapter_number())
    }

    /// 已获取的章节，按章节号排序
    pub fn resolved_chapters(&self) -> impl Iterator<Item = (u32, &Chapter)> {
        self.slots
            .iter()
            .filter_map(|(number, slot)| slot.chapter().map(|chapter| (*number, chapter)))
    }
}
