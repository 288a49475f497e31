use serde::{Deserialize, Serialize};

/// 推荐/搜索结果中的书籍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub total_chapters: u32,
    /// 1 表示已收藏
    #[serde(default)]
    pub status: u8,
}

impl Book {
    pub fn is_collected(&self) -> bool {
        self.status == 1
    }
}

/// 书架中的书
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfBook {
    pub book_id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub current_chapter: u32,
    #[serde(default)]
    pub progress: f64,
}

/// 分类下的书
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionBook {
    pub book_id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover: String,
    /// 0-1 之间的进度值
    #[serde(default)]
    pub progress: f64,
}

/// 书籍分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub collection_id: String,
    pub name: String,
}
