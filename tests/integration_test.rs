use std::sync::Arc;

use book_reader::clients::ReaderClient;
use book_reader::infrastructure::{HttpExecutor, KvStore, MemoryKvStore};
use book_reader::orchestrator::run_reading;
use book_reader::utils::logging;
use book_reader::workflow::{
    BookmarkNotice, ChapterSession, ChapterSlot, FetchEvent, ReadingCtx, SessionSettings,
};
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 一本只有 `chapters` 章的书
async fn mount_book(server: &MockServer, book_id: &str, chapters: u32) {
    for n in 1..=chapters {
        Mock::given(method("GET"))
            .and(path("/bookcontent"))
            .and(query_param("bookId", book_id))
            .and(query_param("chapter", n.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chapterId": format!("{}-{}", book_id, n),
                "title": format!("第{}章", n),
                "paragraphs": [format!("第{}章第一段", n), format!("第{}章第二段", n)]
            })))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/bookcontent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Chapter not found"})),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> Arc<ReaderClient> {
    Arc::new(ReaderClient::new(HttpExecutor::with_base_url(server.uri())))
}

#[tokio::test]
async fn test_reading_session_against_http_backend() {
    logging::init(false);

    let server = MockServer::start().await;
    mount_book(&server, "b1", 3).await;
    Mock::given(method("POST"))
        .and(path("/api/reading_progress"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({"bookId": "b1", "chapter": 2})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bookmarks"))
        .and(body_json(json!({"bookId": "b1", "chapter": 2})))
        .respond_with(ResponseTemplate::new(201))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bookmarks"))
        .respond_with(ResponseTemplate::new(409))
        .with_priority(10)
        .mount(&server)
        .await;

    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::with_token("tok"));
    let ctx = assert_ok!(ReadingCtx::new("b1", Some(2)));
    let mut session =
        ChapterSession::open(ctx, client(&server), store, SessionSettings::default());

    let events = session.settle().await;
    assert_eq!(events.len(), 3);
    assert_eq!(session.current_chapter().unwrap().title, "第2章");
    assert!(session.has_more());

    // 第 4 章不存在
    session.on_page_settled(2);
    let events = session.settle().await;
    assert_eq!(events, vec![FetchEvent::BeyondEnd(4)]);
    assert!(!session.has_more());
    assert!(!session.fetch_chapter(5));

    session.on_page_settled(1);
    assert_eq!(session.on_content_scrolled(1, 0.85), Some(2));
    assert_eq!(session.on_content_scrolled(0, 0.95), None);

    assert_eq!(session.add_bookmark().await, BookmarkNotice::Added { chapter: 2 });
    assert_eq!(
        session.add_bookmark().await,
        BookmarkNotice::AlreadyExists { chapter: 2 }
    );

    session.close().await;
}

#[tokio::test]
async fn test_transient_failure_then_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bookcontent"))
        .and(query_param("chapter", "2"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_book(&server, "b2", 5).await;

    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let mut session = ChapterSession::open(
        ReadingCtx::from_start("b2"),
        client(&server),
        store,
        SessionSettings::default(),
    );

    let events = session.settle().await;
    assert!(events.contains(&FetchEvent::Failed(2)));
    assert_eq!(session.slot(2), &ChapterSlot::Unfetched);
    assert!(session.has_more());

    // 翻到第 2 页时当前页未加载，会重新请求
    session.on_page_settled(1);
    session.settle().await;
    assert_eq!(session.current_chapter().unwrap().chapter_id, "b2-2");
    assert_eq!(session.slot(3).chapter().unwrap().title, "第3章");

    // 未登录不能添加书签，也不会发请求
    assert_eq!(session.add_bookmark().await, BookmarkNotice::SignInRequired);
}

#[tokio::test]
async fn test_run_reading_stops_at_end_of_book() {
    let server = MockServer::start().await;
    mount_book(&server, "b3", 2).await;

    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let stats = run_reading(
        ReadingCtx::from_start("b3"),
        client(&server),
        store,
        SessionSettings::default(),
        10,
    )
    .await
    .unwrap();

    assert_eq!(stats.pages_read, 2);
    assert_eq!(stats.furthest_completed, 2);
    assert!(stats.end_detected);
}
