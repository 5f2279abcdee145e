//! Hierarchy assembly and inline edit staging for ECOE exam content.
//!
//! An [`EditSession`] holds one station's browsing tree (station, qblocks,
//! questions and lazily loaded options) together with two staging caches,
//! one for question rows and one for option rows. A presentation layer reads
//! the tree and the caches and calls the session's operations in response
//! to user actions.
//!
//! # Module Organization
//!
//! - [`assembler`]: Builds the tree from the resource API
//! - [`session`]: Session state, reload, move panel flags
//! - [`cache`]: Staging records, generation stamps, local id allocation
//! - [`questions`]: Start edit, save, cancel, delete and add for questions
//! - [`options`]: Lazy option loading plus the same row operations for options
//! - [`reorder`]: Pairwise order swap between adjacent options
//! - [`relocate`]: Moving a question between qblocks
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use ecoe_client::{ClientConfig, HttpFetcher};
//! use ecoe_editor::{EditSession, ExamScope};
//! use ecoe_model::ExamId;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new(&ClientConfig::default())?;
//! let mut session = EditSession::load(&fetcher, ExamScope::exam(ExamId(1))).await?;
//! let question = session.root().and_then(|root| root.questions().next()).map(|q| q.id);
//! if let Some(question) = question {
//!     session.load_options_by_question(&fetcher, true, question).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod cache;
pub mod error;
pub mod options;
pub mod questions;
pub mod relocate;
pub mod reorder;
pub mod session;

pub use assembler::{ExamScope, Hierarchy, StationNode, assemble, select_station};
pub use cache::{EditCache, LocalIdAllocator, RowState, StagingRecord};
pub use error::{EditorError, Result};
pub use options::PendingOptionSave;
pub use questions::PendingQuestionSave;
pub use relocate::{membership_route, membership_uri};
pub use reorder::{MoveDirection, PendingOrderSwap};
pub use session::EditSession;
