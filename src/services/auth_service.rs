//! 账号服务 - 业务能力层
//!
//! 登录、注册、修改密码，以及本地令牌和用户资料的缓存

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::ReaderClient;
use crate::error::{AppError, AppResult, BusinessError};
use crate::infrastructure::{KvStore, TOKEN_KEY, USER_DATA_KEY};
use crate::models::User;
use crate::services::require_token;

/// 新密码最少字符数
const MIN_PASSWORD_LEN: usize = 6;

/// 修改密码前的本地校验
pub fn validate_password_change(
    current_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), BusinessError> {
    if current_password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
        return Err(BusinessError::MissingField);
    }
    if new_password != confirm_password {
        return Err(BusinessError::PasswordMismatch);
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BusinessError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// 账号服务
pub struct AuthService {
    client: ReaderClient,
    store: Arc<dyn KvStore>,
}

impl AuthService {
    pub fn new(client: ReaderClient, store: Arc<dyn KvStore>) -> Self {
        Self { client, store }
    }

    /// 登录并缓存令牌与用户资料
    ///
    /// 获取用户资料失败时清除刚保存的令牌
    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(BusinessError::MissingField.into());
        }

        let token = self.client.login(username.trim(), password).await?;
        self.store.set(TOKEN_KEY, &token).await?;

        match self.refresh_profile(&token).await {
            Ok(user) => {
                info!("✓ 登录成功: {}", user.username);
                Ok(user)
            }
            Err(e) => {
                warn!("登录流程失败: {}", e);
                self.store.remove(TOKEN_KEY).await?;
                Err(e)
            }
        }
    }

    /// 启动时恢复登录状态
    ///
    /// 有令牌则重新拉取用户资料，失败时退出登录
    pub async fn restore(&self) -> AppResult<Option<User>> {
        let Some(token) = self.store.get(TOKEN_KEY).await? else {
            return Ok(None);
        };

        match self.refresh_profile(&token).await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("自动登录失败: {}", e);
                self.logout().await?;
                Ok(None)
            }
        }
    }

    /// 退出登录
    pub async fn logout(&self) -> AppResult<()> {
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(USER_DATA_KEY).await?;
        info!("已退出登录");
        Ok(())
    }

    /// 注册，成功后需要再登录
    pub async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(BusinessError::MissingField.into());
        }
        self.client.register(username.trim(), password).await?;
        info!("✓ 注册成功: {}", username.trim());
        Ok(())
    }

    /// 修改密码
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        validate_password_change(current_password, new_password, confirm_password)?;
        let token = require_token(self.store.as_ref()).await?;
        self.client
            .change_password(&token, current_password, new_password)
            .await?;
        info!("✓ 密码修改成功");
        Ok(())
    }

    /// 本地缓存的用户资料
    pub async fn cached_user(&self) -> AppResult<Option<User>> {
        match self.store.get(USER_DATA_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn is_signed_in(&self) -> AppResult<bool> {
        Ok(self.store.get(TOKEN_KEY).await?.is_some())
    }

    async fn refresh_profile(&self, token: &str) -> AppResult<User> {
        let user = self.client.me(token).await?;
        if !user.is_valid() {
            return Err(AppError::Other("无效的用户数据格式".to_string()));
        }
        self.store
            .set(USER_DATA_KEY, &serde_json::to_string(&user)?)
            .await?;
        Ok(user)
    }
}
