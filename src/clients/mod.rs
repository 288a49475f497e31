pub mod reader_client;

pub use reader_client::{ReaderApi, ReaderClient};
