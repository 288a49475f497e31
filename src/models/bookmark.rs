use serde::{Deserialize, Serialize};

/// 服务端保存的书签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub bookmark_id: String,
    pub book_id: String,
    pub chapter_id: String,
    pub created_at: String,
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub chapter_title: String,
    #[serde(default)]
    pub cover_url: String,
}

impl Bookmark {
    /// 创建时间的本地化显示，无法解析时原样返回
    pub fn created_at_display(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|_| self.created_at.clone())
    }
}

/// 新建书签的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkCreate {
    /// 新建成功
    Created,
    /// 该书该章已有书签（服务端返回 409）
    AlreadyExists,
}
