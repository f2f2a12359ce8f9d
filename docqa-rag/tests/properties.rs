//! Property tests for chunking termination and search ordering.

mod common;

use std::sync::Arc;

use common::HashEmbedder;
use docqa_rag::{DocumentStore, FlatStore, Metadata, SentenceChunker};
use proptest::prelude::*;

/// **Property: chunking terminates and covers the input.**
/// *For any* text and any configuration with `chunk_overlap < chunk_size`,
/// chunking SHALL terminate, produce at least one chunk for non-empty
/// input, and produce at least two chunks when the text exceeds
/// `chunk_size`.
mod prop_chunker_termination {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn terminates_and_produces_chunks(
            text in "[a-zA-Z0-9 .!?\n]{1,600}",
            chunk_size in 8usize..200,
            overlap_fraction in 0usize..100,
        ) {
            // Derive overlap strictly below chunk_size.
            let chunk_overlap = (chunk_size - 1) * overlap_fraction / 100;
            let chunker = SentenceChunker::new(chunk_size, chunk_overlap);

            let chunks = chunker.chunk(&text);

            prop_assert!(!chunks.is_empty());
            if text.len() <= chunk_size {
                prop_assert_eq!(chunks.len(), 1);
                prop_assert_eq!(chunks[0].as_str(), text.trim());
            }
            // Every chunk is bounded by the window and drawn from the
            // source text.
            for chunk in &chunks {
                prop_assert!(chunk.len() <= chunk_size);
                if !chunk.is_empty() {
                    prop_assert!(text.contains(chunk.as_str()));
                }
            }
        }
    }
}

/// **Property: flat store search ordering.**
/// *For any* set of stored texts, searching SHALL return at most `top_k`
/// results ordered by ascending distance.
mod prop_flat_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn results_ascending_and_bounded_by_top_k(
            texts in proptest::collection::vec("[a-z]{2,8}( [a-z]{2,8}){0,5}", 1..12),
            query in "[a-z]{2,8}( [a-z]{2,8}){0,3}",
            top_k in 1usize..15,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let hits = rt.block_on(async {
                let dir = tempfile::tempdir().unwrap();
                let store =
                    FlatStore::open(dir.path(), "test", Arc::new(HashEmbedder::new(16)));
                let metadatas = vec![Metadata::new(); texts.len()];
                store.add_documents(&texts, &metadatas, None).await.unwrap();
                store.search(&query, top_k).await.unwrap()
            });

            prop_assert!(hits.len() <= top_k);
            prop_assert!(hits.len() <= texts.len());
            prop_assert_eq!(hits.documents.len(), hits.metadatas.len());
            prop_assert_eq!(hits.documents.len(), hits.distances.len());
            for window in hits.distances.windows(2) {
                prop_assert!(
                    window[0] <= window[1],
                    "distances not ascending: {} > {}",
                    window[0],
                    window[1],
                );
            }
        }
    }
}
