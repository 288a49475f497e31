use serde::{Deserialize, Serialize};

/// 一章正文
///
/// 获取之后不再变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_id: String,
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

/// 单次章节请求的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterFetch {
    /// 正常返回章节内容
    Found(Chapter),
    /// 服务端明确表示该章节不存在（书已读到头）
    NotFound,
}
