//! 业务能力层
//!
//! 每个服务只描述"我能做什么"，令牌从本地存储读取

pub mod auth_service;
pub mod bookmark_service;
pub mod bookshelf_service;
pub mod catalog_service;

pub use auth_service::{validate_password_change, AuthService};
pub use bookmark_service::BookmarkService;
pub use bookshelf_service::BookshelfService;
pub use catalog_service::{CatalogService, HomeFeed};

use crate::error::{AppResult, BusinessError};
use crate::infrastructure::{KvStore, TOKEN_KEY};

/// 读取令牌，没有则返回 `AuthRequired`
pub(crate) async fn require_token(store: &dyn KvStore) -> AppResult<String> {
    store
        .get(TOKEN_KEY)
        .await?
        .ok_or_else(|| BusinessError::AuthRequired.into())
}
