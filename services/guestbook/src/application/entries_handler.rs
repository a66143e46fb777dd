// ゲストブックエントリ取得ハンドラー
//
// SubmissionSourceから投稿一覧を取得して公開用に整形し、
// HTTPレスポンスを構築する。

use crate::domain::{to_public_submissions, ErrorBody, PublicSubmission};
use crate::infrastructure::{GuestbookConfigError, SubmissionSource, SubmissionSourceError};
use lambda_http::http::header::{HeaderValue, CONTENT_TYPE};
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Response};
use serde::Serialize;
use tracing::{error, info};

/// ゲストブックエントリ取得ハンドラー
///
/// 結果は成功（200）か失敗（500）のどちらかで、部分的な結果は返さない。
pub struct EntriesHandler<S>
where
    S: SubmissionSource,
{
    /// 投稿の取得元
    source: S,
    /// `website`フィールドを含めるかどうか
    include_website: bool,
}

impl<S> EntriesHandler<S>
where
    S: SubmissionSource,
{
    /// 新しいEntriesHandlerを作成
    pub fn new(source: S, include_website: bool) -> Self {
        Self {
            source,
            include_website,
        }
    }

    /// 投稿一覧を取得して公開用に変換
    pub async fn fetch_entries(&self) -> Result<Vec<PublicSubmission>, SubmissionSourceError> {
        let raw_submissions = self.source.fetch_submissions().await?;
        Ok(to_public_submissions(raw_submissions, self.include_website))
    }

    /// リクエストを処理してレスポンスを生成
    ///
    /// # 戻り値
    /// * 成功時はHTTP 200と投稿のJSON配列
    /// * 取得に失敗した場合はHTTP 500と汎用エラーメッセージ
    ///   （失敗理由はログにのみ出力する）
    pub async fn handle(&self) -> Result<Response<Body>, Error> {
        match self.fetch_entries().await {
            Ok(entries) => {
                info!(count = entries.len(), "ゲストブックエントリを返却");
                json_response(StatusCode::OK, &entries)
            }
            Err(err) => {
                error!(error = %err, "ゲストブックエントリの取得に失敗");
                generic_failure_response()
            }
        }
    }
}

/// 設定エラーのレスポンスを生成（HTTP 500）
pub fn configuration_error_response(err: &GuestbookConfigError) -> Result<Response<Body>, Error> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorBody::new(err.to_string()),
    )
}

/// 汎用の取得失敗レスポンスを生成（HTTP 500）
pub fn generic_failure_response() -> Result<Response<Body>, Error> {
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &ErrorBody::generic_failure())
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Body>, Error> {
    let json = serde_json::to_string(body)?;

    let response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(Body::Text(json))?;

    Ok(response)
}
