// ドメイン層モジュール
pub mod error_body;
pub mod submission;

// 再エクスポート
pub use error_body::{ErrorBody, GENERIC_FAILURE_MESSAGE};
pub use submission::{to_public_submissions, PublicSubmission, RawSubmission, RawSubmissionData};
