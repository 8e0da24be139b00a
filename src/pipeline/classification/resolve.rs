use super::parser::ParsedAnswer;
use super::snapshot::RequirementSnapshot;
use super::ClassificationError;
use crate::models::{ClassificationDecision, DestinationId, Verdict};

/// Selection law over qualifying destinations: the most requirements
/// wins, ties go to the smallest identifier. Identifiers that are not
/// offered in the snapshot are ignored.
pub fn select_by_law(
    snapshot: &RequirementSnapshot,
    qualifying: impl IntoIterator<Item = DestinationId>,
) -> Option<DestinationId> {
    qualifying
        .into_iter()
        .filter_map(|id| snapshot.find_offered(id))
        .max_by(|a, b| {
            a.requirement_count()
                .cmp(&b.requirement_count())
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|d| d.id)
}

/// Check a parsed answer against the snapshot it was produced from.
///
/// When the oracle reported its qualifying set, the selection law is
/// applied here rather than trusted. A `Matched` verdict must name a
/// destination the oracle was actually offered.
pub fn resolve_decision(
    answer: ParsedAnswer,
    snapshot: &RequirementSnapshot,
    raw_response: String,
) -> Result<ClassificationDecision, ClassificationError> {
    let verdict = match answer.qualified {
        Some(qualified) => {
            if let Some(unknown) = qualified
                .iter()
                .copied()
                .find(|id| snapshot.find_offered(*id).is_none())
            {
                return Err(ClassificationError::UnknownDestination(unknown));
            }

            let selected = match select_by_law(snapshot, qualified) {
                Some(id) => Verdict::Matched(id),
                None => Verdict::Unmatched,
            };
            if selected != answer.candidate {
                tracing::warn!(
                    oracle = ?answer.candidate,
                    selected = ?selected,
                    "Oracle answer disagrees with its qualifying set; applying selection law"
                );
            }
            selected
        }
        None => answer.candidate,
    };

    if let Verdict::Matched(id) = verdict {
        if snapshot.find_offered(id).is_none() {
            return Err(ClassificationError::UnknownDestination(id));
        }
    }

    Ok(ClassificationDecision {
        verdict,
        raw_response,
    })
}
