// インフラストラクチャ層モジュール
pub mod config;
pub mod logging;
pub mod submission_source;

// 再エクスポート
pub use config::{GuestbookConfig, GuestbookConfigError};
pub use logging::init_logging;
pub use submission_source::{NetlifySubmissionClient, SubmissionSource, SubmissionSourceError};
