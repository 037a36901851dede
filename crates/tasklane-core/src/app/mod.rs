//! App - アプリケーション層
//!
//! ports を組み合わせて受付側と処理側のパイプラインを実装します。
//!
//! # 主要コンポーネント
//! - **validate / sanitize**: リクエストの検証と正規化（純粋関数）
//! - **EnvelopeBuilder**: task_id / created_at の付与
//! - **IngestionGateway**: 検証 → 正規化 → 送信、HTTP 応答の組み立て
//! - **BatchConsumer**: バッチ内の各メッセージを独立に処理
//! - **Poller**: 受信 → 処理 → delete / release のループ

pub mod consumer;
pub mod envelope_builder;
pub mod ingestion;
pub mod poller;
pub mod response;
pub mod sanitizer;
pub mod validator;

// 主要な型を再エクスポート
pub use self::consumer::BatchConsumer;
pub use self::envelope_builder::EnvelopeBuilder;
pub use self::ingestion::{IngestResult, IngestionGateway};
pub use self::poller::{MAX_BATCH_SIZE, PollSummary, Poller, PollerHandle, settle};
pub use self::response::ApiResponse;
pub use self::sanitizer::sanitize;
pub use self::validator::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, parse_iso8601, validate};
