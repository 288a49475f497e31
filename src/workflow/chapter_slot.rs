use crate::models::Chapter;

/// 章节位置的获取状态
///
/// 状态流转：`Unfetched → Pending → {Resolved | BeyondEnd}`，
/// 请求失败时 `Pending → Unfetched`，之后可以重新请求
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChapterSlot {
    /// 尚未请求
    #[default]
    Unfetched,
    /// 请求进行中
    Pending,
    /// 已获取
    Resolved(Chapter),
    /// 服务端表示这一章不存在，书已到头
    BeyondEnd,
}

impl ChapterSlot {
    /// 当前页可以停在这里：内容已到或正在路上
    pub fn is_viewable(&self) -> bool {
        matches!(self, ChapterSlot::Resolved(_) | ChapterSlot::Pending)
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        match self {
            ChapterSlot::Resolved(chapter) => Some(chapter),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewable_slots() {
        let chapter = Chapter {
            chapter_id: "c1".to_string(),
            title: "第一章".to_string(),
            paragraphs: Vec::new(),
        };
        assert!(ChapterSlot::Pending.is_viewable());
        assert!(ChapterSlot::Resolved(chapter).is_viewable());
        assert!(!ChapterSlot::Unfetched.is_viewable());
        assert!(!ChapterSlot::BeyondEnd.is_viewable());
    }
}
