//! Option reordering by pairwise order exchange.
//!
//! Moving an option one position up or down swaps its `order` value with
//! the adjacent option's. Both updates are sent concurrently and merged only
//! when both succeed. If one fails, the other may already be applied on the
//! server; no compensation is attempted and a reload shows the server state.

use std::fmt;

use ecoe_client::{ResourceFetcher, update};
use ecoe_model::{OptionDraft, OptionId, OrderPatch, QuestionId, QuestionOption, ResourceKind};
use futures_util::future::try_join;

use crate::cache::StagingRecord;
use crate::error::{EditorError, Result};
use crate::session::EditSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// One half of an order swap.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderUpdate {
    option: OptionId,
    uri: String,
    patch: OrderPatch,
    generation: Option<u64>,
}

/// The two order updates of a swap, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrderSwap {
    question: QuestionId,
    moved: OrderUpdate,
    neighbour: OrderUpdate,
}

impl PendingOrderSwap {
    /// Ids of the moved option and its neighbour.
    #[must_use]
    pub fn options(&self) -> (OptionId, OptionId) {
        (self.moved.option, self.neighbour.option)
    }

    /// Send both updates concurrently. Fails if either fails.
    pub async fn send<F: ResourceFetcher>(
        &self,
        fetcher: &F,
    ) -> Result<(QuestionOption, QuestionOption)> {
        tracing::debug!(
            moved = %self.moved.option,
            neighbour = %self.neighbour.option,
            "swapping option order"
        );
        let saved: (QuestionOption, QuestionOption) = try_join(
            update(fetcher, &self.moved.uri, &self.moved.patch),
            update(fetcher, &self.neighbour.uri, &self.neighbour.patch),
        )
        .await
        .inspect_err(|err| {
            tracing::warn!(error = %err, "order swap failed, server may hold one half");
        })?;
        Ok(saved)
    }
}

impl EditSession {
    /// Build the order swap moving `option` one step in `direction`.
    ///
    /// # Errors
    ///
    /// - [`EditorError::NoAdjacentOption`] when the option is already first or last
    /// - [`EditorError::NotPersisted`] when either option has not been saved
    pub fn prepare_order_swap(
        &self,
        question: QuestionId,
        option: OptionId,
        direction: MoveDirection,
    ) -> Result<PendingOrderSwap> {
        let options = &self
            .question(question)
            .ok_or(EditorError::UnknownQuestion(question))?
            .options;
        let index = options
            .iter()
            .position(|item| item.id == option)
            .ok_or(EditorError::UnknownOption { question, option })?;
        let adjacent = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1),
        };
        let neighbour = adjacent
            .and_then(|index| options.get(index))
            .ok_or(EditorError::NoAdjacentOption(option))?;
        let moved = &options[index];

        Ok(PendingOrderSwap {
            question,
            moved: OrderUpdate {
                option: moved.id,
                uri: persisted_uri(moved)?,
                patch: OrderPatch {
                    order: neighbour.order,
                },
                generation: self.option_generation(moved.id),
            },
            neighbour: OrderUpdate {
                option: neighbour.id,
                uri: persisted_uri(neighbour)?,
                patch: OrderPatch { order: moved.order },
                generation: self.option_generation(neighbour.id),
            },
        })
    }

    /// Merge both answers of a swap and re-sort the option list.
    ///
    /// A row in edit mode only takes the new order into its draft, unless it
    /// was edited while the swap was in flight, in which case its draft is
    /// left alone. Other rows are restaged from the server state. Options
    /// deleted from the tree meanwhile are not restaged.
    pub fn complete_order_swap(
        &mut self,
        pending: &PendingOrderSwap,
        saved: (QuestionOption, QuestionOption),
    ) {
        let (moved, neighbour) = saved;
        let mut present = (false, false);
        for node in self.question_nodes_mut(pending.question) {
            for slot in &mut node.options {
                if slot.id == moved.id {
                    *slot = moved.clone();
                    present.0 = true;
                } else if slot.id == neighbour.id {
                    *slot = neighbour.clone();
                    present.1 = true;
                }
            }
            node.sort_options();
        }

        let merges = [
            (&moved, &pending.moved, present.0),
            (&neighbour, &pending.neighbour, present.1),
        ];
        for (option, sent, present) in merges {
            if !present {
                tracing::warn!(option = %option.id, "swapped option is no longer in the tree");
                continue;
            }
            let current = match sent.generation {
                Some(generation) => self.option_cache.is_current(option.id, generation),
                None => !self.option_cache.contains(option.id),
            };
            if !self.option_cache.is_editing(option.id) {
                self.option_cache
                    .insert(option.id, StagingRecord::clean(OptionDraft::from_option(option)));
            } else if current {
                self.option_cache
                    .edit(option.id, |draft| draft.order = option.order);
            } else {
                tracing::warn!(
                    option = %option.id,
                    "row changed while swapping, keeping newer draft"
                );
            }
        }
        tracing::info!(moved = %moved.id, neighbour = %neighbour.id, "swapped option order");
    }

    fn option_generation(&self, option: OptionId) -> Option<u64> {
        self.option_cache.get(option).map(StagingRecord::generation)
    }

    /// Move `option` one position up or down.
    pub async fn change_option_order<F: ResourceFetcher>(
        &mut self,
        fetcher: &F,
        question: QuestionId,
        option: OptionId,
        direction: MoveDirection,
    ) -> Result<()> {
        let pending = self.prepare_order_swap(question, option, direction)?;
        let saved = pending.send(fetcher).await?;
        self.complete_order_swap(&pending, saved);
        Ok(())
    }
}

fn persisted_uri(option: &QuestionOption) -> Result<String> {
    match &option.uri {
        Some(uri) => Ok(uri.clone()),
        None => Err(EditorError::NotPersisted(option.id.get())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display() {
        assert_eq!(MoveDirection::Up.to_string(), "up");
        assert_eq!(MoveDirection::Down.to_string(), "down");
    }

    #[test]
    fn test_persisted_uri_rejects_unsaved_rows() {
        let option = QuestionOption::blank(OptionId(7), QuestionId(1));
        assert!(matches!(
            persisted_uri(&option),
            Err(EditorError::NotPersisted(7))
        ));

        let saved = QuestionOption {
            uri: Some(ResourceKind::Option.uri(7)),
            ..option
        };
        assert_eq!(persisted_uri(&saved).unwrap(), "/api/option/7");
    }
}
