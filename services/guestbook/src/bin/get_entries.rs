/// ゲストブックエントリ取得HTTP Lambdaエントリポイント
///
/// Netlifyフォームの投稿一覧をNetlify APIから取得し、
/// フロントエンド向けに整形したJSON配列を返却する。
use guestbook::application::{
    configuration_error_response, generic_failure_response, EntriesHandler,
};
use guestbook::infrastructure::{init_logging, GuestbookConfig, NetlifySubmissionClient};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tracing::{error, info, info_span, Instrument};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    info!("get-entries Lambda関数を初期化");

    run(service_fn(handler)).await
}

/// HTTPリクエストハンドラー
///
/// # Arguments
/// * `_request` - HTTPリクエスト（ボディ・クエリは使用しない）
///
/// # Returns
/// 投稿のJSON配列（200）、または`{"error": ...}`（500）
async fn handler(_request: Request) -> Result<Response<Body>, Error> {
    info!("ゲストブックエントリ取得リクエスト受信");

    // 秘密情報が揃っていなければNetlify APIは呼び出さない
    let config = match GuestbookConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, detail = ?err, "設定の読み込みに失敗");
            return configuration_error_response(&err);
        }
    };

    let client = match NetlifySubmissionClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "Netlify APIクライアントの作成に失敗");
            return generic_failure_response();
        }
    };

    let span = info_span!("get_entries", form_id = config.form_id());
    EntriesHandler::new(client, config.include_website())
        .handle()
        .instrument(span)
        .await
}
