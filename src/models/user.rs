use serde::{Deserialize, Serialize};

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl User {
    /// 基本数据校验
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.username.is_empty()
    }
}

/// 登录接口返回
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
