//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动日志、创建 HTTP 执行器和本地存储
//! 2. **命令分发**：把命令行命令交给对应的服务或阅读会话
//! 3. **结果展示**：把服务返回的数据和提示打印给用户
//!
//! 不处理单个请求的细节，只做调度和展示

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clients::{ReaderApi, ReaderClient};
use crate::config::Config;
use crate::infrastructure::{FileKvStore, HttpExecutor, KvStore};
use crate::orchestrator::command::Command;
use crate::orchestrator::reading_runner::{run_reading, ReadingStats};
use crate::services::{AuthService, BookmarkService, BookshelfService, CatalogService};
use crate::utils::logging;
use crate::workflow::{ReadingCtx, SessionSettings};

/// 应用主结构
pub struct App {
    config: Config,
    client: ReaderClient,
    store: Arc<dyn KvStore>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let executor = HttpExecutor::new(&config)?;
        let client = ReaderClient::new(executor);
        let store: Arc<dyn KvStore> = Arc::new(FileKvStore::new(&config.store_path));

        Ok(Self::with_parts(config, client, store))
    }

    /// 使用现成的客户端和存储组装应用
    pub fn with_parts(config: Config, client: ReaderClient, store: Arc<dyn KvStore>) -> Self {
        Self {
            config,
            client,
            store,
        }
    }

    /// 执行一条命令
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Read {
                book_id,
                start_chapter,
                pages,
            } => {
                self.read(ReadingCtx::new(book_id, start_chapter)?, pages)
                    .await?;
            }
            Command::Search(keyword) => self.search(&keyword).await?,
            Command::Home => self.home().await?,
            Command::Collection(id) => self.collection(&id).await?,
            Command::Shelf => self.shelf().await?,
            Command::RemoveFromShelf(book_id) => {
                BookshelfService::new(self.client.clone(), Arc::clone(&self.store))
                    .remove(&book_id)
                    .await?;
                println!("已移出书架");
            }
            Command::Bookmarks => self.bookmarks().await?,
            Command::DeleteBookmark(bookmark_id) => {
                BookmarkService::new(self.client.clone(), Arc::clone(&self.store))
                    .delete(&bookmark_id)
                    .await?;
                println!("书签已删除");
            }
            Command::Login { username, password } => {
                let user = self.auth().login(&username, &password).await?;
                println!("欢迎回来，{}", user.username);
            }
            Command::Register { username, password } => {
                self.auth().register(&username, &password).await?;
                println!("注册成功，请登录");
            }
            Command::ChangePassword {
                current,
                new,
                confirm,
            } => {
                self.auth()
                    .change_password(&current, &new, &confirm)
                    .await?;
                println!("密码修改成功！");
            }
            Command::Logout => self.auth().logout().await?,
        }
        Ok(())
    }

    /// 阅读一本书
    pub async fn read(&self, ctx: ReadingCtx, pages: u32) -> Result<ReadingStats> {
        if let Some(user) = self.auth().restore().await? {
            info!("当前用户: {}", user.username);
        } else {
            info!("未登录，阅读进度不会上报");
        }

        let api: Arc<dyn ReaderApi> = Arc::new(self.client.clone());
        run_reading(
            ctx,
            api,
            Arc::clone(&self.store),
            SessionSettings::from(&self.config),
            pages,
        )
        .await
    }

    /// 搜索
    ///
    /// 模拟逐字输入，经过防抖后只有完整关键字会真正发出请求
    async fn search(&self, keyword: &str) -> Result<()> {
        let catalog = Arc::new(self.catalog());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = catalog.debounced_search(
            Duration::from_millis(self.config.search_debounce_ms),
            tx,
        );

        let mut typed = String::new();
        for ch in keyword.chars() {
            typed.push(ch);
            debouncer.call(typed.clone());
        }

        let Some((keyword, result)) = rx.recv().await else {
            warn!("搜索已取消");
            return Ok(());
        };
        let books = result?;
        if books.is_empty() {
            println!("没有找到与 \"{}\" 相关的书籍", keyword);
        }
        for book in books {
            println!(
                "{}  {} · {} · {}",
                book.book_id,
                book.title,
                book.author,
                if book.is_collected() { "已收藏" } else { "未收藏" }
            );
        }
        Ok(())
    }

    async fn home(&self) -> Result<()> {
        let feed = self.catalog().home().await?;
        println!("📚 每日推荐");
        for book in &feed.recommendations {
            println!("  {}  {} · {}", book.book_id, book.title, book.author);
        }
        println!("🗂  分类");
        for category in &feed.categories {
            println!("  {}  {}", category.collection_id, category.name);
        }
        Ok(())
    }

    async fn collection(&self, collection_id: &str) -> Result<()> {
        let books = self.catalog().collection_books(collection_id).await?;
        for book in books {
            println!(
                "{}  {} · {} · {:.0}%",
                book.book_id,
                book.title,
                book.author,
                book.progress * 100.0
            );
        }
        Ok(())
    }

    async fn shelf(&self) -> Result<()> {
        let shelf = BookshelfService::new(self.client.clone(), Arc::clone(&self.store));
        match shelf.list().await {
            Ok(books) => {
                if books.is_empty() {
                    println!("书架是空的");
                }
                for book in books {
                    println!(
                        "{}  {} · {} · 读到第 {} 章",
                        book.book_id, book.title, book.author, book.current_chapter
                    );
                }
                Ok(())
            }
            Err(e) if e.is_auth_error() => {
                println!("请先登录");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn bookmarks(&self) -> Result<()> {
        let bookmarks = BookmarkService::new(self.client.clone(), Arc::clone(&self.store));
        let list = bookmarks.list().await?;
        if list.is_empty() {
            println!("暂无书签");
        }
        for bookmark in list {
            println!(
                "{}  《{}》{} · {}",
                bookmark.bookmark_id,
                bookmark.book_title,
                bookmark.chapter_title,
                bookmark.created_at_display()
            );
        }
        Ok(())
    }

    fn auth(&self) -> AuthService {
        AuthService::new(self.client.clone(), Arc::clone(&self.store))
    }

    fn catalog(&self) -> CatalogService {
        CatalogService::new(self.client.clone(), Arc::clone(&self.store))
    }
}
