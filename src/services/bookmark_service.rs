//! 书签服务 - 业务能力层
//!
//! 列出和删除书签；添加书签在阅读会话里完成

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::ReaderClient;
use crate::error::AppResult;
use crate::infrastructure::{KvStore, TOKEN_KEY};
use crate::models::Bookmark;
use crate::services::require_token;

/// 书签服务
pub struct BookmarkService {
    client: ReaderClient,
    store: Arc<dyn KvStore>,
}

impl BookmarkService {
    pub fn new(client: ReaderClient, store: Arc<dyn KvStore>) -> Self {
        Self { client, store }
    }

    /// 未登录时返回空列表
    pub async fn list(&self) -> AppResult<Vec<Bookmark>> {
        match self.store.get(TOKEN_KEY).await? {
            Some(token) => self.client.bookmarks(&token).await,
            None => {
                debug!("未登录，书签列表为空");
                Ok(Vec::new())
            }
        }
    }

    pub async fn delete(&self, bookmark_id: &str) -> AppResult<()> {
        let token = require_token(self.store.as_ref()).await?;
        self.client.delete_bookmark(&token, bookmark_id).await?;
        info!("✓ 书签已删除: {}", bookmark_id);
        Ok(())
    }
}
