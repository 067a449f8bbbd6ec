//! Recursive block-tree walker.
//!
//! Children are listed one parent at a time, depth first, so a subtree never
//! fans out into parallel requests. A visited set and a depth ceiling bound
//! the traversal: a block seen before, or one at the ceiling, keeps an empty
//! child list.
//!
//! `child_page` blocks are not descended into. They are recorded as
//! [`ChildPageRef`]s so the caller can fetch each child page as its own
//! artifact.

use super::NotionRepository;
use crate::algebras::VisitTracker;
use crate::attachments;
use crate::constants::MAX_TREE_DEPTH;
use crate::error::AppError;
use crate::model::{Block, ChildPageRef};
use crate::types::BlockId;
use futures::future::{BoxFuture, FutureExt};

/// Counters describing one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub blocks: usize,
    pub attachments: usize,
    pub skipped_revisits: usize,
    pub depth_limited: usize,
}

/// Materialized tree plus what classification found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkOutcome {
    pub blocks: Vec<Block>,
    /// Child pages in tree order, each listed once.
    pub child_pages: Vec<ChildPageRef>,
    pub stats: WalkStats,
}

pub struct TreeWalker<'a, R: ?Sized> {
    repository: &'a R,
    max_depth: u8,
}

impl<'a, R: NotionRepository + ?Sized> TreeWalker<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self {
            repository,
            max_depth: MAX_TREE_DEPTH,
        }
    }

    /// Lowers the depth ceiling; values above the default are clamped.
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        if max_depth > MAX_TREE_DEPTH {
            log::warn!(
                "Requested depth {} exceeds the ceiling {}; clamping",
                max_depth,
                MAX_TREE_DEPTH
            );
        }
        self.max_depth = max_depth.min(MAX_TREE_DEPTH);
        self
    }

    /// Fetches the full tree under `root`.
    ///
    /// Any listing failure fails the walk; callers skip the page at their
    /// own boundary.
    pub async fn walk(
        &self,
        root: &BlockId,
        tracker: &dyn VisitTracker,
    ) -> Result<WalkOutcome, AppError> {
        tracker.visit(&root.cast()).await;

        let mut state = WalkState::default();
        let blocks = self.children_of(root.clone(), 1, tracker, &mut state).await?;

        log::debug!(
            "Walked {}: {} blocks, {} child pages, {} attachments",
            root,
            state.stats.blocks,
            state.child_pages.len(),
            state.stats.attachments
        );

        Ok(WalkOutcome {
            blocks,
            child_pages: state.child_pages,
            stats: state.stats,
        })
    }

    fn children_of<'b>(
        &'b self,
        parent: BlockId,
        depth: u8,
        tracker: &'b dyn VisitTracker,
        state: &'b mut WalkState,
    ) -> BoxFuture<'b, Result<Vec<Block>, AppError>> {
        async move {
            let mut blocks = self.repository.list_all_children(&parent).await?;

            for block in blocks.iter_mut() {
                state.classify(block);

                if !should_descend(block) {
                    continue;
                }
                if depth >= self.max_depth {
                    log::warn!(
                        "Block {} is at depth {}; not fetching its children",
                        block.id(),
                        depth
                    );
                    state.stats.depth_limited += 1;
                    continue;
                }
                if !tracker.visit(&block.id().cast()).await {
                    log::warn!("Block {} was already visited; skipping its children", block.id());
                    state.stats.skipped_revisits += 1;
                    continue;
                }

                let children = self
                    .children_of(block.id().clone(), depth + 1, tracker, state)
                    .await?;
                block.set_children(children);
            }

            Ok(blocks)
        }
        .boxed()
    }
}

/// Child pages become separate artifacts and synced references are never
/// dereferenced.
fn should_descend(block: &Block) -> bool {
    if !block.has_children() || block.is_child_page() {
        return false;
    }
    !matches!(block, Block::SyncedBlock(synced) if synced.synced_from.is_some())
}

#[derive(Default)]
struct WalkState {
    child_pages: Vec<ChildPageRef>,
    stats: WalkStats,
}

impl WalkState {
    /// Marks attachments with their display name and records child pages.
    fn classify(&mut self, block: &mut Block) {
        self.stats.blocks += 1;

        if let Some((kind, media)) = block.media_mut() {
            if kind.is_attachment() {
                media.display_name = Some(attachments::display_name(kind, media));
                self.stats.attachments += 1;
            }
            return;
        }

        if let Block::ChildPage(child) = block {
            let reference = ChildPageRef::from_block(child);
            if !self.child_pages.iter().any(|seen| seen.id == reference.id) {
                self.child_pages.push(reference);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebras::PageVisitLedger;
    use crate::api::types::{PaginatedResponse, StatusFilter};
    use crate::model::*;
    use crate::types::{DatabaseId, PageId, RichTextSpan};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Serves children from a map, two per page, and logs every request.
    #[derive(Default)]
    struct MapRepository {
        children: HashMap<BlockId, Vec<Block>>,
        requests: Mutex<Vec<(BlockId, Option<String>)>>,
    }

    #[async_trait::async_trait]
    impl NotionRepository for MapRepository {
        async fn retrieve_database(&self, _: &DatabaseId) -> Result<DatabaseSchema, AppError> {
            unimplemented!()
        }

        async fn query_database(
            &self,
            _: &DatabaseId,
            _: Option<&StatusFilter>,
            _: Option<String>,
        ) -> Result<PaginatedResponse<PageMetadata>, AppError> {
            unimplemented!()
        }

        async fn retrieve_page(&self, _: &PageId) -> Result<PageMetadata, AppError> {
            unimplemented!()
        }

        async fn list_block_children(
            &self,
            id: &BlockId,
            cursor: Option<String>,
        ) -> Result<PaginatedResponse<Block>, AppError> {
            self.requests.lock().push((id.clone(), cursor.clone()));
            let all = self.children.get(id).cloned().unwrap_or_default();
            let start: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            let end = (start + 2).min(all.len());
            Ok(PaginatedResponse {
                object: "list".to_string(),
                results: all[start..end].to_vec(),
                has_more: end < all.len(),
                next_cursor: (end < all.len()).then(|| end.to_string()),
            })
        }
    }

    fn bid(n: u32) -> BlockId {
        BlockId::parse(&format!("{:032x}", n)).unwrap()
    }

    fn paragraph(n: u32, has_children: bool) -> Block {
        Block::Paragraph(ParagraphBlock {
            common: BlockCommon {
                id: bid(n),
                has_children,
                children: vec![],
            },
            content: TextBlockContent::new(vec![RichTextSpan::plain(format!("p{}", n))]),
        })
    }

    fn ids(blocks: &[Block]) -> Vec<BlockId> {
        flatten_blocks(blocks).into_iter().map(|b| b.id().clone()).collect()
    }

    #[tokio::test]
    async fn visits_every_block_once_in_source_order() {
        let mut repo = MapRepository::default();
        repo.children.insert(
            bid(100),
            vec![paragraph(1, true), paragraph(2, false), paragraph(3, false)],
        );
        repo.children.insert(bid(1), vec![paragraph(4, false), paragraph(5, false)]);

        let outcome = TreeWalker::new(&repo)
            .walk(&bid(100), &PageVisitLedger::new())
            .await
            .unwrap();

        assert_eq!(ids(&outcome.blocks), vec![bid(1), bid(4), bid(5), bid(2), bid(3)]);
        assert_eq!(outcome.stats.blocks, 5);
        // root needs two pages, block 1 fits in one
        assert_eq!(repo.requests.lock().len(), 3);
    }

    #[tokio::test]
    async fn cycles_terminate() {
        let mut repo = MapRepository::default();
        repo.children.insert(bid(100), vec![paragraph(1, true)]);
        repo.children.insert(bid(1), vec![paragraph(1, true)]);

        let outcome = TreeWalker::new(&repo)
            .walk(&bid(100), &PageVisitLedger::new())
            .await
            .unwrap();

        let inner = &outcome.blocks[0].children()[0];
        assert_eq!(inner.id(), &bid(1));
        assert!(inner.children().is_empty());
        assert_eq!(outcome.stats.skipped_revisits, 1);
    }

    #[tokio::test]
    async fn depth_ceiling_stops_descent() {
        let mut repo = MapRepository::default();
        repo.children.insert(bid(100), vec![paragraph(1, true)]);
        for n in 1..20 {
            repo.children.insert(bid(n), vec![paragraph(n + 1, true)]);
        }

        let outcome = TreeWalker::new(&repo)
            .with_max_depth(3)
            .walk(&bid(100), &PageVisitLedger::new())
            .await
            .unwrap();

        assert_eq!(count_blocks(&outcome.blocks), 3);
        assert_eq!(outcome.stats.depth_limited, 1);
    }

    #[tokio::test]
    async fn classifies_child_pages_and_attachments() {
        let mut repo = MapRepository::default();
        let child_page = Block::ChildPage(ChildPageBlock {
            common: BlockCommon {
                id: bid(7),
                has_children: true,
                children: vec![],
            },
            title: "Sub".to_string(),
        });
        let file = Block::Pdf(MediaBlock {
            common: BlockCommon::new(bid(8)),
            ..Default::default()
        });
        repo.children.insert(bid(100), vec![child_page, file]);

        let outcome = TreeWalker::new(&repo)
            .walk(&bid(100), &PageVisitLedger::new())
            .await
            .unwrap();

        assert_eq!(outcome.child_pages.len(), 1);
        assert_eq!(outcome.child_pages[0].slug.as_str(), format!("post-{:032x}", 7));
        let (_, media) = outcome.blocks[1].media().unwrap();
        assert_eq!(media.display_name.as_deref(), Some("PDF 문서"));
        // the child page's own content is not fetched here
        assert!(repo.requests.lock().iter().all(|(id, _)| id != &bid(7)));
    }

    #[tokio::test]
    async fn listing_failure_fails_the_walk() {
        struct Failing;

        #[async_trait::async_trait]
        impl NotionRepository for Failing {
            async fn retrieve_database(&self, _: &DatabaseId) -> Result<DatabaseSchema, AppError> {
                unimplemented!()
            }
            async fn query_database(
                &self,
                _: &DatabaseId,
                _: Option<&StatusFilter>,
                _: Option<String>,
            ) -> Result<PaginatedResponse<PageMetadata>, AppError> {
                unimplemented!()
            }
            async fn retrieve_page(&self, _: &PageId) -> Result<PageMetadata, AppError> {
                unimplemented!()
            }
            async fn list_block_children(
                &self,
                _: &BlockId,
                _: Option<String>,
            ) -> Result<PaginatedResponse<Block>, AppError> {
                Err(AppError::MalformedResponse("down".to_string()))
            }
        }

        let result = TreeWalker::new(&Failing)
            .walk(&bid(1), &PageVisitLedger::new())
            .await;
        assert!(result.is_err());
    }
}
