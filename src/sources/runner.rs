// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Source Fan-Out Runner
 * One concurrent task per enabled source, results over a bounded channel
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::SourceError;
use crate::sources::Source;
use crate::types::SourceResult;

/// Spawn one task per source and return the receiving end of a bounded
/// channel. Each message is either a source's batch or its failure; the
/// channel closes when every source has reported.
pub fn spawn_all(
    sources: Vec<Arc<dyn Source>>,
    domain: &str,
) -> mpsc::Receiver<Result<SourceResult, SourceError>> {
    let (tx, rx) = mpsc::channel(sources.len().max(1));

    for source in sources {
        let tx = tx.clone();
        let domain = domain.to_string();

        tokio::spawn(async move {
            debug!(
                source = source.name(),
                source_type = %source.source_type(),
                "Starting source"
            );

            let result = source.enumerate(&domain).await;

            // A closed receiver means the scan was cancelled; dropping the
            // batch is the correct behavior then.
            let _ = tx.send(result).await;
        });
    }

    rx
}
