// ゲストブック設定
//
// Netlify API呼び出しに必要な秘密情報と動作設定を環境変数から読み込む。
// 呼び出しごとに読み込み、キャッシュはしない。

use thiserror::Error;
use tracing::info;
use url::Url;

/// アクセストークンの環境変数名
pub const ACCESS_TOKEN_ENV: &str = "NETLIFY_ACCESS_TOKEN";

/// フォームIDの環境変数名
pub const FORM_ID_ENV: &str = "GUESTBOOK_FORM_ID";

/// APIベースURLの環境変数名（任意）
pub const API_BASE_URL_ENV: &str = "NETLIFY_API_BASE_URL";

/// websiteフィールド出力可否の環境変数名（任意）
pub const INCLUDE_WEBSITE_ENV: &str = "GUESTBOOK_INCLUDE_WEBSITE";

/// Netlify APIのデフォルトベースURL
pub const DEFAULT_API_BASE_URL: &str = "https://api.netlify.com/api/v1";

/// ゲストブック設定エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuestbookConfigError {
    /// 必須の秘密情報が未設定または空
    #[error(
        "Configuration error: Please set NETLIFY_ACCESS_TOKEN and GUESTBOOK_FORM_ID in your Netlify site settings."
    )]
    MissingSecret {
        /// 未設定だった環境変数名
        var: &'static str,
    },

    /// APIベースURLが解析できない
    #[error("Configuration error: NETLIFY_API_BASE_URL is not a valid URL ({0}).")]
    InvalidBaseUrl(String),
}

/// ゲストブック設定
///
/// # フィールド
/// - `access_token`: Netlifyのパーソナルアクセストークン
/// - `form_id`: 投稿を取得するフォームのID
/// - `api_base_url`: Netlify APIのベースURL
/// - `include_website`: レスポンスに`website`を含めるかどうか
#[derive(Clone)]
pub struct GuestbookConfig {
    access_token: String,
    form_id: String,
    api_base_url: Url,
    include_website: bool,
}

// アクセストークンをログに出さない
impl std::fmt::Debug for GuestbookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestbookConfig")
            .field("form_id", &self.form_id)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("include_website", &self.include_website)
            .finish_non_exhaustive()
    }
}

impl GuestbookConfig {
    /// 新しい設定を作成（ベースURLはデフォルト、websiteは出力する）
    ///
    /// # 引数
    /// - `access_token`: Netlifyアクセストークン
    /// - `form_id`: フォームID
    pub fn new(access_token: impl Into<String>, form_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            form_id: form_id.into(),
            api_base_url: default_api_base_url(),
            include_website: true,
        }
    }

    /// APIベースURLを差し替える
    pub fn with_api_base_url(mut self, api_base_url: Url) -> Self {
        self.api_base_url = api_base_url;
        self
    }

    /// websiteフィールドの出力可否を設定する
    pub fn with_include_website(mut self, include_website: bool) -> Self {
        self.include_website = include_website;
        self
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `NETLIFY_ACCESS_TOKEN`: アクセストークン（必須）
    /// - `GUESTBOOK_FORM_ID`: フォームID（必須）
    /// - `NETLIFY_API_BASE_URL`: APIベースURL（任意、デフォルト: https://api.netlify.com/api/v1）
    /// - `GUESTBOOK_INCLUDE_WEBSITE`: websiteを出力するか（任意、デフォルト: true）
    ///
    /// # 戻り値
    /// - `Ok(GuestbookConfig)`: 設定が正常に読み込まれた
    /// - `Err(GuestbookConfigError)`: 必須の環境変数が未設定、またはベースURLが不正
    pub fn from_env() -> Result<Self, GuestbookConfigError> {
        let access_token = required_env(ACCESS_TOKEN_ENV)?;
        let form_id = required_env(FORM_ID_ENV)?;

        let api_base_url = match optional_env(API_BASE_URL_ENV) {
            Some(value) => Url::parse(&value)
                .map_err(|e| GuestbookConfigError::InvalidBaseUrl(e.to_string()))?,
            None => default_api_base_url(),
        };

        let include_website = parse_env_bool(INCLUDE_WEBSITE_ENV, true);

        Ok(Self {
            access_token,
            form_id,
            api_base_url,
            include_website,
        })
    }

    /// アクセストークンを取得
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// フォームIDを取得
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// APIベースURLを取得
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// websiteフィールドを出力するかどうか
    pub fn include_website(&self) -> bool {
        self.include_website
    }

    /// 投稿一覧エンドポイントURLを構築
    ///
    /// フォームIDは1つのパスセグメントとしてエンコードされる。
    ///
    /// # 戻り値
    /// 例: "https://api.netlify.com/api/v1/forms/{form_id}/submissions"
    pub fn submissions_url(&self) -> Result<Url, GuestbookConfigError> {
        let mut url = self.api_base_url.clone();

        url.path_segments_mut()
            .map_err(|_| {
                GuestbookConfigError::InvalidBaseUrl(format!(
                    "cannot be a base: {}",
                    self.api_base_url
                ))
            })?
            .pop_if_empty()
            .extend(["forms", self.form_id.as_str(), "submissions"]);

        Ok(url)
    }
}

fn default_api_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("DEFAULT_API_BASE_URLは有効なURL")
}

/// 空文字（空白のみ含む）はNone扱い
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// 秘密情報は未設定か空文字のみ欠落扱い（空白は値として扱う）
fn required_env(key: &'static str) -> Result<String, GuestbookConfigError> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(GuestbookConfigError::MissingSecret { var: key })
}

/// 環境変数からbool値を読み込む
///
/// 未設定またはパースエラーの場合はデフォルト値を返す。
fn parse_env_bool(key: &str, default: bool) -> bool {
    let Some(value) = optional_env(key) else {
        return default;
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            info!(
                key,
                value = %value,
                default,
                "Environment variable parse error, using default"
            );
            default
        }
    }
}
