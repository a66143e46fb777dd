// エラーレスポンスボディ
//
// 呼び出し元に返す`{"error": "..."}`形式のJSON。

use serde::{Deserialize, Serialize};

/// 実行時エラーで返す汎用メッセージ
///
/// 失敗の具体的な理由はサーバー側のログにのみ出力する。
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to fetch guestbook entries.";

/// エラーレスポンスのボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    /// 任意のメッセージでエラーボディを作成
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// 汎用の取得失敗エラーボディを作成
    pub fn generic_failure() -> Self {
        Self::new(GENERIC_FAILURE_MESSAGE)
    }
}
