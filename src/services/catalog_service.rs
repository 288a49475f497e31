//! 书城服务 - 业务能力层
//!
//! 首页推荐、分类、搜索

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::clients::ReaderClient;
use crate::error::AppResult;
use crate::infrastructure::{KvStore, TOKEN_KEY};
use crate::models::{Book, Category, CollectionBook};
use crate::utils::Debouncer;

/// 首页数据
#[derive(Debug, Clone, PartialEq)]
pub struct HomeFeed {
    pub recommendations: Vec<Book>,
    pub categories: Vec<Category>,
}

/// 书城服务
pub struct CatalogService {
    client: ReaderClient,
    store: Arc<dyn KvStore>,
}

impl CatalogService {
    pub fn new(client: ReaderClient, store: Arc<dyn KvStore>) -> Self {
        Self { client, store }
    }

    /// 并行获取推荐和分类，任一失败则整体失败
    pub async fn home(&self) -> AppResult<HomeFeed> {
        let (recommendations, categories) =
            tokio::try_join!(self.client.recommendations(), self.client.categories())?;
        Ok(HomeFeed {
            recommendations,
            categories,
        })
    }

    /// 按关键字搜索，空关键字不发请求
    pub async fn search(&self, keyword: &str) -> AppResult<Vec<Book>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        // 搜索不强制登录，有令牌就带上
        let token = match self.store.get(TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                warn!("读取令牌失败: {}", e);
                None
            }
        };

        let books = self.client.search(token.as_deref(), keyword).await?;
        debug!("搜索 \"{}\" 得到 {} 本书", keyword, books.len());
        Ok(books)
    }

    pub async fn collection_books(&self, collection_id: &str) -> AppResult<Vec<CollectionBook>> {
        self.client.collection_books(collection_id).await
    }

    /// 防抖搜索
    ///
    /// 输入停止 `delay` 后才发请求，结果（关键字, 搜索结果）送入 `results`
    pub fn debounced_search(
        self: &Arc<Self>,
        delay: Duration,
        results: mpsc::UnboundedSender<(String, AppResult<Vec<Book>>)>,
    ) -> Debouncer<String> {
        let service = Arc::clone(self);
        Debouncer::new(delay, move |keyword: String| {
            let service = Arc::clone(&service);
            let results = results.clone();
            async move {
                let outcome = service.search(&keyword).await;
                let _ = results.send((keyword, outcome));
            }
        })
    }
}
