//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 reqwest::Client，只暴露"发请求"的能力

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 Client（内部是连接池，clone 代价很低）
/// - 拼接地址、附带 Bearer 令牌
/// - 不认识 Chapter / Bookmark
/// - 不处理业务流程
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
}

/// 一次请求的原始结果
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: JsonValue,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 服务端返回的提示信息，`message` 优先，其次 `error`
    pub fn message(&self) -> Option<String> {
        ["message", "error"]
            .iter()
            .find_map(|key| self.body.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    /// 非 2xx 状态转换为错误
    pub fn error_for_status(self, endpoint: &str) -> AppResult<Self> {
        if self.status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Api(ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
            }));
        }
        if !self.is_success() {
            return Err(AppError::bad_response(
                endpoint,
                self.status.as_u16(),
                self.message(),
            ));
        }
        Ok(self)
    }

    /// 反序列化响应体
    pub fn json<T: DeserializeOwned>(self) -> AppResult<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}

impl HttpExecutor {
    /// 根据配置创建执行器
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 使用默认 Client 指向任意地址（测试用）
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 发送请求并读取 JSON 响应体
    ///
    /// 不检查状态码，由调用方决定如何解读
    ///
    /// # 参数
    /// - `method`: HTTP 方法
    /// - `path`: 以 `/` 开头的路径
    /// - `token`: Bearer 令牌（可选）
    /// - `query`: 查询参数
    /// - `body`: JSON 请求体（可选）
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&JsonValue>,
    ) -> AppResult<HttpReply> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(path, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(path, e))?;

        // 空响应体或非 JSON 文本都保留下来，交给调用方判断
        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        };

        debug!("{} -> {}", path, status);

        Ok(HttpReply { status, body })
    }

    /// GET 并反序列化，非 2xx 视为错误
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        self.send(Method::GET, path, token, query, None)
            .await?
            .error_for_status(path)?
            .json()
    }

    /// POST JSON，非 2xx 视为错误，返回原始响应
    pub async fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: &JsonValue,
    ) -> AppResult<HttpReply> {
        self.send(Method::POST, path, token, &[], Some(body))
            .await?
            .error_for_status(path)
    }

    /// DELETE，非 2xx 视为错误
    pub async fn delete(&self, path: &str, token: Option<&str>) -> AppResult<()> {
        self.send(Method::DELETE, path, token, &[], None)
            .await?
            .error_for_status(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_json_sends_bearer_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("keyword", "三体"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
            .mount(&server)
            .await;

        let executor = HttpExecutor::with_base_url(server.uri());
        let values: Vec<u32> = executor
            .get_json("/api/search", Some("abc"), &[("keyword", "三体".to_string())])
            .await
            .unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_error_status_keeps_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "用户名已存在"})),
            )
            .mount(&server)
            .await;

        let executor = HttpExecutor::with_base_url(server.uri());
        let err = executor
            .post_json("/auth/register", None, &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.server_message(), Some("用户名已存在"));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let executor = HttpExecutor::with_base_url(format!("{}/", server.uri()));
        let err = executor
            .get_json::<JsonValue>("/api/me", Some("stale"), &[])
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_reply_message_prefers_message_field() {
        let reply = HttpReply {
            status: StatusCode::NOT_FOUND,
            body: json!({"error": "Chapter not found", "message": "没有这一章"}),
        };
        assert_eq!(reply.message().as_deref(), Some("没有这一章"));

        let reply = HttpReply {
            status: StatusCode::OK,
            body: json!({"error": "Chapter not found"}),
        };
        assert_eq!(reply.message().as_deref(), Some("Chapter not found"));
    }
}
