// SubmissionSource - フォーム投稿の取得元
//
// Netlify APIから投稿一覧を取得する。
// ハンドラーからはトレイト経由で呼び出し、テストではモックに差し替える。

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use url::Url;

use super::config::GuestbookConfig;
use crate::domain::RawSubmission;

/// リクエストタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// 接続タイムアウト（秒）
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// エラーログに含めるレスポンスボディの上限（バイト）
const MAX_LOGGED_BODY_BYTES: usize = 1024;

/// 投稿取得のエラー型
///
/// いずれも呼び出し元には同じ汎用メッセージとして返す。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionSourceError {
    /// HTTPクライアントの構築失敗
    #[error("HTTPクライアント構築エラー: {0}")]
    ClientBuild(String),

    /// ネットワークエラー（接続失敗、タイムアウト等）
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// Netlify APIが成功以外のステータスを返した
    #[error("Netlify APIエラー: status={status}, reason={reason}")]
    UpstreamStatus {
        /// HTTPステータスコード
        status: u16,
        /// ステータスの理由フレーズ
        reason: String,
    },

    /// レスポンスボディが投稿の配列として解釈できない
    #[error("レスポンス解析エラー: {0}")]
    InvalidBody(String),
}

/// フォーム投稿の取得元トレイト
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// フォームの投稿一覧を取得
    ///
    /// # 戻り値
    /// * 成功時はNetlify APIが返した順序の投稿一覧
    /// * 失敗時は`Err(SubmissionSourceError)`
    async fn fetch_submissions(&self) -> Result<Vec<RawSubmission>, SubmissionSourceError>;
}

/// Netlify APIクライアント
///
/// `GET {base}/forms/{form_id}/submissions`をBearerトークン付きで呼び出す。
/// 再試行は行わない。
#[derive(Clone)]
pub struct NetlifySubmissionClient {
    client: Client,
    submissions_url: Url,
    access_token: String,
}

impl std::fmt::Debug for NetlifySubmissionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlifySubmissionClient")
            .field("submissions_url", &self.submissions_url.as_str())
            .finish_non_exhaustive()
    }
}

impl NetlifySubmissionClient {
    /// 設定からクライアントを作成
    ///
    /// # 戻り値
    /// * `Ok(NetlifySubmissionClient)` - 初期化されたクライアント
    /// * `Err(SubmissionSourceError::ClientBuild)` - URLまたはHTTPクライアントの構築に失敗
    pub fn new(config: &GuestbookConfig) -> Result<Self, SubmissionSourceError> {
        let submissions_url = config
            .submissions_url()
            .map_err(|e| SubmissionSourceError::ClientBuild(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SubmissionSourceError::ClientBuild(e.to_string()))?;

        debug!(url = %submissions_url, "NetlifySubmissionClientを初期化");

        Ok(Self {
            client,
            submissions_url,
            access_token: config.access_token().to_string(),
        })
    }

    /// 投稿一覧エンドポイントURLを取得
    pub fn submissions_url(&self) -> &Url {
        &self.submissions_url
    }
}

#[async_trait]
impl SubmissionSource for NetlifySubmissionClient {
    #[instrument(skip(self), fields(url = %self.submissions_url))]
    async fn fetch_submissions(&self) -> Result<Vec<RawSubmission>, SubmissionSourceError> {
        let response = self
            .client
            .get(self.submissions_url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Netlify APIリクエスト失敗");
                SubmissionSourceError::Network(e.to_string())
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = %truncate_for_log(&body, MAX_LOGGED_BODY_BYTES),
                "Netlify APIエラーレスポンス"
            );
            return Err(SubmissionSourceError::UpstreamStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            error!(error = %e, "Netlify APIレスポンスの読み込み失敗");
            SubmissionSourceError::Network(e.to_string())
        })?;

        let submissions: Vec<RawSubmission> = serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = %e, "Netlify APIレスポンスの解析失敗");
            SubmissionSourceError::InvalidBody(e.to_string())
        })?;

        info!(count = submissions.len(), "投稿一覧を取得");

        Ok(submissions)
    }
}

/// 文字境界を保ったまま先頭`max_bytes`バイト以内に切り詰める
fn truncate_for_log(body: &str, max_bytes: usize) -> &str {
    if body.len() <= max_bytes {
        return body;
    }

    let mut end = max_bytes;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use axum::extract::Request;
    use axum::http::header::{HeaderName, CONTENT_TYPE};
    use axum::http::StatusCode;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // ==================== テスト用スタブ ====================

    /// スタブサーバーが受け取ったリクエスト
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: String,
        pub path: String,
        pub authorization: Option<String>,
        pub content_type: Option<String>,
    }

    /// Netlify APIのスタブサーバーを起動
    ///
    /// すべてのリクエストに指定のステータスとボディを返し、
    /// 受信内容を記録する。
    ///
    /// # 戻り値
    /// (APIベースURL, 記録されたリクエスト)
    pub async fn spawn_stub_api(
        status: StatusCode,
        body: &'static str,
    ) -> (Url, Arc<Mutex<Vec<RecordedRequest>>>) {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let recorder = recorded.clone();

        let app = Router::new().fallback(move |request: Request| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(RecordedRequest {
                    method: request.method().to_string(),
                    path: request.uri().path().to_string(),
                    authorization: header_str(&request, AUTHORIZATION),
                    content_type: header_str(&request, CONTENT_TYPE),
                });
                (status, [(CONTENT_TYPE, "application/json")], body)
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = Url::parse(&format!("http://{addr}/api/v1")).unwrap();
        (base_url, recorded)
    }

    fn header_str(request: &Request, name: HeaderName) -> Option<String> {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// 接続を受け付けないベースURL（バインド直後に解放したポート）
    pub fn unreachable_base_url() -> Url {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Url::parse(&format!("http://{addr}/api/v1")).unwrap()
    }

    /// ユニットテスト用のモックSubmissionSource
    #[derive(Debug, Clone)]
    pub struct MockSubmissionSource {
        /// fetch_submissionsが返す結果
        result: Arc<Mutex<Result<Vec<RawSubmission>, SubmissionSourceError>>>,
        /// 呼び出し回数
        calls: Arc<AtomicUsize>,
    }

    impl MockSubmissionSource {
        pub fn with_submissions(submissions: Vec<RawSubmission>) -> Self {
            Self {
                result: Arc::new(Mutex::new(Ok(submissions))),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn with_error(error: SubmissionSourceError) -> Self {
            Self {
                result: Arc::new(Mutex::new(Err(error))),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SubmissionSource for MockSubmissionSource {
        async fn fetch_submissions(&self) -> Result<Vec<RawSubmission>, SubmissionSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.lock().unwrap().clone()
        }
    }

    fn client_for(base_url: Url) -> NetlifySubmissionClient {
        let config = GuestbookConfig::new("test-token", "form-123").with_api_base_url(base_url);
        NetlifySubmissionClient::new(&config).unwrap()
    }

    // ==================== クライアント作成テスト ====================

    #[test]
    fn test_new_builds_submissions_url() {
        let client = NetlifySubmissionClient::new(&GuestbookConfig::new("token", "form-123")).unwrap();

        assert_eq!(
            client.submissions_url().as_str(),
            "https://api.netlify.com/api/v1/forms/form-123/submissions"
        );
    }

    #[test]
    fn test_debug_hides_access_token() {
        let client =
            NetlifySubmissionClient::new(&GuestbookConfig::new("super-secret-token", "form-123"))
                .unwrap();

        let debug_str = format!("{:?}", client);

        assert!(debug_str.contains("NetlifySubmissionClient"));
        assert!(!debug_str.contains("super-secret-token"));
    }

    // ==================== fetch_submissions テスト ====================

    #[tokio::test]
    async fn test_fetch_sends_bearer_token_get() {
        let (base_url, recorded) = spawn_stub_api(StatusCode::OK, "[]").await;
        let client = client_for(base_url);

        client.fetch_submissions().await.unwrap();

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/api/v1/forms/form-123/submissions");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer test-token"));
        // ボディの無いGETにContent-Typeは付けない
        assert!(requests[0].content_type.is_none());
    }

    #[tokio::test]
    async fn test_fetch_parses_submissions() {
        let body = r#"[
            {"data":{"name":"A","message":"Hi","website":"x.com"},"created_at":"2024-01-01T00:00:00Z"},
            {"data":{"name":"B","message":"Yo"},"created_at":"2024-01-02T00:00:00Z","id":"ignored"}
        ]"#;
        let (base_url, _) = spawn_stub_api(StatusCode::OK, body).await;

        let submissions = client_for(base_url).fetch_submissions().await.unwrap();

        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].data.name, Some(serde_json::json!("A")));
        assert_eq!(submissions[0].data.website, Some(serde_json::json!("x.com")));
        assert_eq!(
            submissions[1].created_at,
            Some(serde_json::json!("2024-01-02T00:00:00Z"))
        );
        assert!(submissions[1].data.website.is_none());
    }

    #[tokio::test]
    async fn test_fetch_accepts_loosely_typed_records() {
        // created_at欠落・null・数値の入力値もそのまま受け付ける
        let body = r#"[
            {"data":{"name":"A","message":"Hi"}},
            {"data":{"name":42,"message":"Yo"},"created_at":null}
        ]"#;
        let (base_url, _) = spawn_stub_api(StatusCode::OK, body).await;

        let submissions = client_for(base_url).fetch_submissions().await.unwrap();

        assert_eq!(submissions.len(), 2);
        assert!(submissions[0].created_at.is_none());
        assert_eq!(submissions[1].data.name, Some(serde_json::json!(42)));
        assert_eq!(submissions[1].created_at, Some(serde_json::Value::Null));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let (base_url, _) =
            spawn_stub_api(StatusCode::FORBIDDEN, r#"{"code":403,"message":"Forbidden"}"#).await;

        let result = client_for(base_url).fetch_submissions().await;

        assert_eq!(
            result.unwrap_err(),
            SubmissionSourceError::UpstreamStatus {
                status: 403,
                reason: "Forbidden".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let (base_url, _) = spawn_stub_api(StatusCode::OK, "<html>not json</html>").await;

        let result = client_for(base_url).fetch_submissions().await;

        assert!(matches!(result, Err(SubmissionSourceError::InvalidBody(_))));
    }

    #[tokio::test]
    async fn test_fetch_json_object_instead_of_array() {
        let (base_url, _) = spawn_stub_api(StatusCode::OK, r#"{"data":[]}"#).await;

        let result = client_for(base_url).fetch_submissions().await;

        assert!(matches!(result, Err(SubmissionSourceError::InvalidBody(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let result = client_for(unreachable_base_url()).fetch_submissions().await;

        assert!(matches!(result, Err(SubmissionSourceError::Network(_))));
    }

    // ==================== SubmissionSourceError テスト ====================

    #[test]
    fn test_error_display_upstream_status() {
        let error = SubmissionSourceError::UpstreamStatus {
            status: 403,
            reason: "Forbidden".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("Netlify APIエラー"));
        assert!(display.contains("403"));
        assert!(display.contains("Forbidden"));
    }

    #[test]
    fn test_error_display_invalid_body() {
        let error = SubmissionSourceError::InvalidBody("expected value".to_string());
        assert!(error.to_string().contains("expected value"));
    }

    // ==================== ログ出力の切り詰め ====================

    #[test]
    fn test_truncate_for_log_short_body_unchanged() {
        assert_eq!(truncate_for_log("Forbidden", MAX_LOGGED_BODY_BYTES), "Forbidden");
    }

    #[test]
    fn test_truncate_for_log_limits_length() {
        let body = "x".repeat(10 * 1024);

        let logged = truncate_for_log(&body, MAX_LOGGED_BODY_BYTES);

        assert_eq!(logged.len(), MAX_LOGGED_BODY_BYTES);
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        // 3バイト文字の途中で切らない
        let body = "あいう";

        assert_eq!(truncate_for_log(body, 4), "あ");
        assert_eq!(truncate_for_log(body, 6), "あい");
    }

    #[tokio::test]
    async fn test_fetch_large_error_body_still_reports_status() {
        let body: &'static str = Box::leak("e".repeat(64 * 1024).into_boxed_str());
        let (base_url, _) = spawn_stub_api(StatusCode::BAD_GATEWAY, body).await;

        let result = client_for(base_url).fetch_submissions().await;

        assert_eq!(
            result.unwrap_err(),
            SubmissionSourceError::UpstreamStatus {
                status: 502,
                reason: "Bad Gateway".to_string(),
            }
        );
    }

    // ==================== 定数値テスト ====================

    #[test]
    fn test_timeouts() {
        assert_eq!(REQUEST_TIMEOUT_SECS, 10);
        assert_eq!(CONNECT_TIMEOUT_SECS, 5);
        assert_eq!(MAX_LOGGED_BODY_BYTES, 1024);
    }
}
