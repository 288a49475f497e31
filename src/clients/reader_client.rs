//! 阅读器后端 API 客户端
//!
//! 封装所有与后端 REST API 相关的调用逻辑
use crate::error::AppResult;
use crate::infrastructure::HttpExecutor;
use crate::models::{
    Book, Bookmark, BookmarkCreate, Category, Chapter, ChapterFetch, CollectionBook,
    LoginResponse, ShelfBook, User,
};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

/// 服务端表示"没有这一章"的错误文本
const CHAPTER_NOT_FOUND: &str = "Chapter not found";

/// 阅读会话需要的三个接口
///
/// 单独抽成 trait，阅读会话只依赖它
#[async_trait]
pub trait ReaderApi: Send + Sync {
    /// 获取某本书的第 `chapter` 章（从1开始）
    async fn fetch_chapter(&self, book_id: &str, chapter: u32) -> AppResult<ChapterFetch>;

    /// 上报阅读进度（读完的最远章节）
    async fn update_progress(&self, token: &str, book_id: &str, chapter: u32) -> AppResult<()>;

    /// 为某本书的某一章添加书签
    async fn create_bookmark(
        &self,
        token: &str,
        book_id: &str,
        chapter: u32,
    ) -> AppResult<BookmarkCreate>;
}

/// 后端 API 客户端
#[derive(Clone, Debug)]
pub struct ReaderClient {
    executor: HttpExecutor,
}

impl ReaderClient {
    /// 创建新的客户端
    pub fn new(executor: HttpExecutor) -> Self {
        Self { executor }
    }

    // ========== 账号 ==========

    /// 登录，返回令牌
    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let reply = self
            .executor
            .post_json(
                "/auth/login",
                None,
                &json!({ "username": username, "password": password }),
            )
            .await?;
        let login: LoginResponse = reply.json()?;
        Ok(login.token)
    }

    /// 注册
    pub async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        self.executor
            .post_json(
                "/auth/register",
                None,
                &json!({ "username": username, "password": password }),
            )
            .await?;
        Ok(())
    }

    /// 获取当前用户资料
    pub async fn me(&self, token: &str) -> AppResult<User> {
        self.executor.get_json("/api/me", Some(token), &[]).await
    }

    /// 修改密码
    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        self.executor
            .post_json(
                "/change-password",
                Some(token),
                &json!({
                    "currentPassword": current_password,
                    "newPassword": new_password
                }),
            )
            .await?;
        Ok(())
    }

    // ========== 书架 ==========

    pub async fn user_books(&self, token: &str) -> AppResult<Vec<ShelfBook>> {
        self.executor
            .get_json("/api/user_books", Some(token), &[])
            .await
    }

    pub async fn remove_user_book(&self, token: &str, book_id: &str) -> AppResult<()> {
        self.executor
            .delete(&format!("/api/user_books/{}", book_id), Some(token))
            .await
    }

    // ========== 书签 ==========

    pub async fn bookmarks(&self, token: &str) -> AppResult<Vec<Bookmark>> {
        self.executor.get_json("/bookmarks", Some(token), &[]).await
    }

    pub async fn delete_bookmark(&self, token: &str, bookmark_id: &str) -> AppResult<()> {
        self.executor
            .delete(&format!("/bookmarks/{}", bookmark_id), Some(token))
            .await
    }

    // ========== 书城 ==========

    pub async fn recommendations(&self) -> AppResult<Vec<Book>> {
        self.executor
            .get_json("/api/recommendations", None, &[])
            .await
    }

    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        self.executor.get_json("/api/categories", None, &[]).await
    }

    /// 按关键字搜索
    pub async fn search(&self, token: Option<&str>, keyword: &str) -> AppResult<Vec<Book>> {
        self.executor
            .get_json("/api/search", token, &[("keyword", keyword.to_string())])
            .await
    }

    pub async fn collection_books(&self, collection_id: &str) -> AppResult<Vec<CollectionBook>> {
        self.executor
            .get_json(
                &format!("/api/collections/{}/books", collection_id),
                None,
                &[],
            )
            .await
    }
}

#[async_trait]
impl ReaderApi for ReaderClient {
    async fn fetch_chapter(&self, book_id: &str, chapter: u32) -> AppResult<ChapterFetch> {
        let endpoint = "/bookcontent";
        let reply = self
            .executor
            .send(
                Method::GET,
                endpoint,
                None,
                &[("bookId", book_id.to_string()), ("chapter", chapter.to_string())],
                None,
            )
            .await?;

        // 只认 error 字段，状态码不论；没有这段文字的 404 多半是地址配错了
        if reply.body.get("error").and_then(|v| v.as_str()) == Some(CHAPTER_NOT_FOUND) {
            debug!("《{}》第 {} 章不存在", book_id, chapter);
            return Ok(ChapterFetch::NotFound);
        }
        if reply.status == StatusCode::NOT_FOUND {
            warn!("{} 返回 404 但没有章节不存在的标记，按请求失败处理", endpoint);
        }

        let chapter: Chapter = reply.error_for_status(endpoint)?.json()?;
        Ok(ChapterFetch::Found(chapter))
    }

    async fn update_progress(&self, token: &str, book_id: &str, chapter: u32) -> AppResult<()> {
        self.executor
            .post_json(
                "/api/reading_progress",
                Some(token),
                &json!({ "bookId": book_id, "chapter": chapter }),
            )
            .await?;
        Ok(())
    }

    async fn create_bookmark(
        &self,
        token: &str,
        book_id: &str,
        chapter: u32,
    ) -> AppResult<BookmarkCreate> {
        let endpoint = "/bookmarks";
        let reply = self
            .executor
            .send(
                Method::POST,
                endpoint,
                Some(token),
                &[],
                Some(&json!({ "bookId": book_id, "chapter": chapter })),
            )
            .await?;

        if reply.status == StatusCode::CONFLICT {
            return Ok(BookmarkCreate::AlreadyExists);
        }
        reply.error_for_status(endpoint)?;
        Ok(BookmarkCreate::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AppError};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ReaderClient {
        ReaderClient::new(HttpExecutor::with_base_url(server.uri()))
    }

    #[tokio::test]
    async fn test_fetch_chapter_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookcontent"))
            .and(query_param("bookId", "b1"))
            .and(query_param("chapter", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chapterId": "c3",
                "title": "第三章",
                "paragraphs": ["一", "二"]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let fetched = client.fetch_chapter("b1", 3).await.unwrap();
        match fetched {
            ChapterFetch::Found(chapter) => {
                assert_eq!(chapter.chapter_id, "c3");
                assert_eq!(chapter.paragraphs.len(), 2);
            }
            ChapterFetch::NotFound => panic!("应该返回章节内容"),
        }
    }

    #[tokio::test]
    async fn test_fetch_chapter_not_found_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookcontent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "Chapter not found"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client.fetch_chapter("b1", 10).await.unwrap(),
            ChapterFetch::NotFound
        );
    }

    #[tokio::test]
    async fn test_fetch_chapter_404_with_marker_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookcontent"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "Chapter not found"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client.fetch_chapter("b1", 99).await.unwrap(),
            ChapterFetch::NotFound
        );
    }

    #[tokio::test]
    async fn test_fetch_chapter_bare_404_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookcontent"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Cannot GET /bookcontent"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_chapter("b1", 2).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Api(ApiError::BadResponse { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_chapter_garbage_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bookcontent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_chapter("b1", 1).await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::JsonParseFailed { .. })));
    }

    #[tokio::test]
    async fn test_create_bookmark_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bookmarks"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({"bookId": "b1", "chapter": 2})))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(
            client.create_bookmark("tok", "b1", 2).await.unwrap(),
            BookmarkCreate::AlreadyExists
        );
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"username": "chen", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t-1"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.login("chen", "secret").await.unwrap(), "t-1");
    }
}
