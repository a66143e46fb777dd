// アプリケーション層モジュール
pub mod entries_handler;

// 再エクスポート
pub use entries_handler::{configuration_error_response, generic_failure_response, EntriesHandler};
