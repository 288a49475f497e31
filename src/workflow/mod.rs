pub mod chapter_session;
pub mod chapter_slot;
pub mod reading_ctx;

pub use chapter_session::{
    scroll_fraction, BookmarkNotice, ChapterSession, FetchEvent, SessionSettings,
};
pub use chapter_slot::ChapterSlot;
pub use reading_ctx::ReadingCtx;
