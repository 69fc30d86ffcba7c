use gcprobe_types::{MemoryReport, TypeCount, now_unix_ns};
use tracing::debug;

use crate::collector::{CollectorControl, CollectorFacade};
use crate::error::ProbeError;
use crate::gauges::MemoryGauges;

/// One-shot view of process memory and collector state.
///
/// `top` caps the number of object types listed; types are ordered by count,
/// largest first, with ties broken by name.
pub fn gather_report<G, C>(
    gauges: &G,
    facade: &CollectorFacade<C>,
    top: usize,
) -> Result<MemoryReport, ProbeError>
where
    G: MemoryGauges + ?Sized,
    C: CollectorControl,
{
    let memory = gauges.read()?;
    let collector = facade.snapshot();
    let census = facade.control().type_census();
    let total_objects = if census.is_empty() {
        collector.tracked_objects
    } else {
        census.iter().map(|entry| entry.count).sum()
    };
    let top_types = top_types(census, top);
    debug!(
        rss = memory.resident_set_bytes,
        total_objects,
        types = top_types.len(),
        "gathered memory report"
    );
    Ok(MemoryReport {
        timestamp_ns: now_unix_ns(),
        memory,
        collector,
        total_objects,
        top_types,
    })
}

fn top_types(mut census: Vec<TypeCount>, top: usize) -> Vec<TypeCount> {
    census.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.type_name.cmp(&b.type_name))
    });
    census.truncate(top);
    census
}
