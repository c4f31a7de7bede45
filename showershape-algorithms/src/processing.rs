//! Batch helpers running many events through one aggregator.

use rayon::prelude::*;
use showershape_core::{Event, OutputRecord};

use crate::aggregate::EventAggregator;
use crate::Result;

/// Processes events in parallel straight into output records, keeping input
/// order in the output.
///
/// Each event owns its clusters and accumulators; only the aggregator's
/// configuration and layer table are shared.
pub fn process_batch_records(
    aggregator: &EventAggregator,
    events: &[Event],
) -> Vec<Result<OutputRecord>> {
    events
        .par_iter()
        .map(|event| aggregator.process_record(event))
        .collect()
}

/// Processes a stream of events sequentially.
///
/// Stops at the first failing event.
///
/// # Errors
/// Returns the error of the first event that could not be processed.
pub fn process_stream<I>(aggregator: &EventAggregator, events: I) -> Result<Vec<OutputRecord>>
where
    I: IntoIterator<Item = Event>,
{
    events
        .into_iter()
        .map(|event| aggregator.process_record(&event))
        .collect()
}
