use folio_domain::stats::{GlobalStats, format_global_stats};

use crate::search::SearchItem;

pub const RETRIEVAL_UNAVAILABLE: &str =
	"Semantic retrieval is unavailable; the knowledge base has not been indexed yet.";

const RECORDS_HEADER: &str = "RELEVANT RECORDS:";

/// Assembles the hybrid context block: global aggregates first, then the
/// retrieved rows in ranked order, each reusing its synthesized sentence.
/// `retrieved = None` means search reported an unbuilt index; a single
/// placeholder line replaces the records section and the caller must not
/// follow up with a completion call.
///
/// Bullets past the character budget are dropped from the tail; the stats
/// block is always kept.
pub fn build_context(
	stats: &GlobalStats,
	retrieved: Option<&[SearchItem]>,
	max_chars: usize,
) -> String {
	let mut out = format_global_stats(stats);

	let Some(items) = retrieved else {
		out.push_str("\n\n");
		out.push_str(RETRIEVAL_UNAVAILABLE);

		return out;
	};

	out.push_str("\n\n");
	out.push_str(RECORDS_HEADER);

	let mut emitted = 0_usize;

	for hit in items {
		if out.len() + hit.item.text.len() + 3 > max_chars {
			break;
		}

		out.push_str("\n- ");
		out.push_str(&hit.item.text);

		emitted += 1;
	}

	if emitted < items.len() {
		tracing::debug!(
			dropped = items.len() - emitted,
			"Context character budget dropped trailing retrieved rows."
		);
	}

	out
}
