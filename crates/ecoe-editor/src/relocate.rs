//! Cross-qblock question relocation.
//!
//! There is no atomic move on the server. Moving a question from qblock A
//! to qblock B removes the A membership and adds the B membership as two
//! concurrent requests. Only when both succeed is the move panel closed and
//! the whole tree reloaded; the tree is never patched locally.

use ecoe_client::ResourceFetcher;
use ecoe_model::{QblockId, QuestionId, ResourceKind, ResourceRef};
use futures_util::future::try_join;

use crate::error::{EditorError, Result};
use crate::session::EditSession;

/// Route of the membership collection of `qblock`, used to add a member.
#[must_use]
pub fn membership_route(qblock: QblockId) -> String {
    format!("{}/{}/questions", ResourceKind::Qblock.route(), qblock)
}

/// URI of one membership, used to remove a member.
#[must_use]
pub fn membership_uri(qblock: QblockId, question: QuestionId) -> String {
    format!("{}/questions/{}", ResourceKind::Qblock.uri(qblock.get()), question)
}

impl EditSession {
    /// Move `question` from qblock `from` to qblock `to`, then reload.
    ///
    /// Moving a question onto the qblock it is in does nothing.
    ///
    /// # Errors
    ///
    /// Fails when either membership request fails. One half may already be
    /// applied on the server; the tree is left untouched until the next
    /// successful reload.
    pub async fn move_question<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        question: QuestionId,
        from: QblockId,
        to: QblockId,
    ) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let node = self
            .qblock(from)
            .ok_or(EditorError::UnknownQblock(from))?
            .question(question)
            .ok_or(EditorError::UnknownQuestion(question))?;
        if !node.is_persisted() {
            return Err(EditorError::NotPersisted(question.get()));
        }
        let member = serde_json::to_value(ResourceRef::to(ResourceKind::Question, question.get()))
            .map_err(ecoe_client::RequestError::from)?;

        tracing::debug!(question = %question, from = %from, to = %to, "moving question");
        try_join(
            fetcher.delete_resource(&membership_uri(from, question)),
            fetcher.create_resource(&membership_route(to), member),
        )
        .await
        .inspect_err(|err| {
            tracing::warn!(
                question = %question,
                error = %err,
                "move failed, memberships may be partial"
            );
        })?;

        self.close_move_panel(question);
        self.reload(fetcher).await?;
        tracing::info!(question = %question, from = %from, to = %to, "moved question");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_paths() {
        assert_eq!(membership_route(QblockId(4)), "qblock/4/questions");
        assert_eq!(
            membership_uri(QblockId(4), QuestionId(9)),
            "/api/qblock/4/questions/9"
        );
    }
}
