// ゲストブック投稿モデル
//
// Netlify APIが返すフォーム投稿（RawSubmission）と、
// フロントエンドに公開する整形済み投稿（PublicSubmission）を定義する。
// 値の型は検証せず、JSONの値をそのまま引き継ぐ。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Netlify APIが返すフォーム投稿
///
/// Netlify側が所有する読み取り専用のレコード。
/// 使用しないフィールド（id, email, ip等）は無視する。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSubmission {
    /// フォームに入力された値
    pub data: RawSubmissionData,
    /// 投稿日時（Netlifyの表現のまま保持）
    #[serde(default, deserialize_with = "present")]
    pub created_at: Option<Value>,
}

/// フォーム入力値
///
/// 欠落したフィールドは`None`、`null`は`Some(Value::Null)`として保持する。
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawSubmissionData {
    /// 投稿者名
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    /// メッセージ本文
    #[serde(default, deserialize_with = "present")]
    pub message: Option<Value>,
    /// 投稿者のWebサイト（任意入力）
    #[serde(default, deserialize_with = "present")]
    pub website: Option<Value>,
}

/// キーが存在すれば`null`も含めて`Some`にする
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// フロントエンドに返却する投稿
///
/// 値が`None`のフィールドはJSONから省略される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicSubmission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    /// `created_at`をそのままコピーした値
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<Value>,
}

impl PublicSubmission {
    /// RawSubmissionから公開用の投稿を生成
    ///
    /// # Arguments
    /// * `raw` - Netlify APIの投稿
    /// * `include_website` - `website`フィールドを含めるかどうか
    pub fn from_raw(raw: RawSubmission, include_website: bool) -> Self {
        let RawSubmission { data, created_at } = raw;

        Self {
            name: data.name,
            message: data.message,
            date: created_at,
            website: if include_website { data.website } else { None },
        }
    }
}

/// 投稿一覧を公開用に変換（順序は維持する）
pub fn to_public_submissions(
    raw_submissions: Vec<RawSubmission>,
    include_website: bool,
) -> Vec<PublicSubmission> {
    raw_submissions
        .into_iter()
        .map(|raw| PublicSubmission::from_raw(raw, include_website))
        .collect()
}
