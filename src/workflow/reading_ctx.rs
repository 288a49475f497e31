//! 阅读会话上下文
//!
//! 封装"我正在读哪本书、从第几章开始"这一信息

use crate::error::{AppResult, BusinessError};
use std::fmt::Display;

/// 阅读会话上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingCtx {
    /// 书籍ID
    pub book_id: String,

    /// 起始章节（从1开始），未指定时从第一章读起
    pub start_chapter: Option<u32>,
}

impl ReadingCtx {
    /// 创建新的阅读上下文
    ///
    /// 章节号从1开始，传入 0 视为非法
    pub fn new(book_id: impl Into<String>, start_chapter: Option<u32>) -> AppResult<Self> {
        if start_chapter == Some(0) {
            return Err(BusinessError::InvalidChapter { chapter: 0 }.into());
        }
        Ok(Self {
            book_id: book_id.into(),
            start_chapter,
        })
    }

    /// 从头开始阅读
    pub fn from_start(book_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            start_chapter: None,
        }
    }
}

impl Display for ReadingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.start_chapter {
            Some(chapter) => write!(f, "[书籍 ID#{} 起始章节#{}]", self.book_id, chapter),
            None => write!(f, "[书籍 ID#{}]", self.book_id),
        }
    }
}
