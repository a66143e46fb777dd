/// ログ基盤モジュール
///
/// Lambda環境向けにJSON形式の構造化ログを設定する。
/// 失敗の詳細（Netlify APIのステータス、解析エラー等）はここを通してのみ出力する。
use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// デフォルトのログレベル
const DEFAULT_LOG_LEVEL: &str = "info";

static INIT: Once = Once::new();

/// ログサブスクライバーを初期化する
///
/// `RUST_LOG`が設定されていればそのフィルタを、なければ`info`を使用する。
/// 複数回呼び出しても初期化は最初の1回だけ行われる。
///
/// # 使用例
/// ```ignore
/// use guestbook::infrastructure::init_logging;
///
/// init_logging();
/// tracing::info!("get-entries started");
/// ```
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter = build_env_filter(DEFAULT_LOG_LEVEL);

        // CloudWatch Logs向けに1イベント1行のJSONで出力
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false);

        // テストから先にサブスクライバーが設定されている場合もパニックしない
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init();
    });
}

/// テスト用のログサブスクライバーを初期化する（人間が読みやすい形式）
#[cfg(test)]
pub fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let _ = tracing_subscriber::registry()
            .with(build_env_filter("debug"))
            .with(fmt_layer)
            .try_init();
    });
}

fn build_env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
