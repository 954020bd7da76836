//! Decides whether a demand line participates in stock tracking

use shared::DemandLine;
use tracing::trace;

use super::catalog::SubjectResolver;

/// Whether the line can carry stock assignments.
///
/// Subject resolution may be cached or fail transiently, so callers check
/// again right before assigning.
pub fn supports_assignments<L, R>(line: &L, subjects: &R) -> bool
where
    L: DemandLine + ?Sized,
    R: SubjectResolver + ?Sized,
{
    let id = line.line_id();

    // Compound lines delegate to their children
    if line.has_children() {
        trace!(line = %id, "Compound line");
        return false;
    }

    if line.as_assignable().is_none() {
        trace!(line = %id, "Line cannot carry assignments");
        return false;
    }

    let Some(subject) = line.subject_id().and_then(|s| subjects.resolve(s)) else {
        trace!(line = %id, "Subject not resolved");
        return false;
    };

    if subject.compound {
        trace!(line = %id, subject = %subject.id, "Compound subject");
        return false;
    }

    if !subject.is_stock_tracked() {
        trace!(
            line = %id,
            subject = %subject.id,
            stock_mode = subject.stock_mode.as_str(),
            "Stock not tracked"
        );
        return false;
    }

    true
}
