//! 书架服务 - 业务能力层

use std::sync::Arc;

use tracing::info;

use crate::clients::ReaderClient;
use crate::error::AppResult;
use crate::infrastructure::KvStore;
use crate::models::ShelfBook;
use crate::services::require_token;

/// 书架服务
///
/// 书架属于个人数据，未登录时返回 `AuthRequired`
pub struct BookshelfService {
    client: ReaderClient,
    store: Arc<dyn KvStore>,
}

impl BookshelfService {
    pub fn new(client: ReaderClient, store: Arc<dyn KvStore>) -> Self {
        Self { client, store }
    }

    pub async fn list(&self) -> AppResult<Vec<ShelfBook>> {
        let token = require_token(self.store.as_ref()).await?;
        self.client.user_books(&token).await
    }

    /// 移出书架
    pub async fn remove(&self, book_id: &str) -> AppResult<()> {
        let token = require_token(self.store.as_ref()).await?;
        self.client.remove_user_book(&token, book_id).await?;
        info!("✓ 已移出书架: {}", book_id);
        Ok(())
    }
}
