pub mod book;
pub mod bookmark;
pub mod chapter;
pub mod user;

pub use book::{Book, Category, CollectionBook, ShelfBook};
pub use bookmark::{Bookmark, BookmarkCreate};
pub use chapter::{Chapter, ChapterFetch};
pub use user::{LoginResponse, User};
