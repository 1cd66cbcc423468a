//! ZIP code to rating county resolution

use crate::error::EngineResult;
use crate::traits::ReferenceStore;
use shared::{CountyId, CountySource, ZipCode};

/// Deduplicated candidate counties, ascending by id
pub fn candidate_counties(mut county_ids: Vec<CountyId>) -> Vec<CountyId> {
    county_ids.sort();
    county_ids.dedup();
    county_ids
}

/// Candidate counties for a ZIP from the reference store
pub async fn counties_for_zip<R>(store: &R, zip_code: &ZipCode) -> EngineResult<Vec<CountyId>>
where
    R: ReferenceStore + ?Sized,
{
    let raw = store.counties_for_zip(zip_code).await?;
    Ok(candidate_counties(raw))
}

/// Result of applying the county selection policy to one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountyResolution {
    Resolved { county_id: CountyId, source: CountySource },
    /// More than one candidate and nothing to choose between them
    Ambiguous(Vec<CountyId>),
    /// The ZIP maps to no county
    NoCandidates,
}

impl CountyResolution {
    /// Apply a run-level county to a member whose county is still unresolved
    pub fn or_run_override(self, run_override: Option<&CountyId>) -> Self {
        match (self, run_override) {
            (CountyResolution::Resolved { county_id, source }, _) => {
                CountyResolution::Resolved { county_id, source }
            }
            (_, Some(county_id)) => CountyResolution::Resolved {
                county_id: county_id.clone(),
                source: CountySource::RunOverride,
            },
            (unresolved, None) => unresolved,
        }
    }
}

/// Select one county: explicit choice, then stored county, then the unique
/// candidate. Several candidates are never guessed between.
pub fn resolve_county(
    explicit: Option<&CountyId>,
    stored: Option<&CountyId>,
    candidates: &[CountyId],
) -> CountyResolution {
    if let Some(county_id) = explicit {
        return CountyResolution::Resolved {
            county_id: county_id.clone(),
            source: CountySource::Explicit,
        };
    }
    if let Some(county_id) = stored {
        return CountyResolution::Resolved {
            county_id: county_id.clone(),
            source: CountySource::Stored,
        };
    }
    match candidates {
        [] => CountyResolution::NoCandidates,
        [only] => CountyResolution::Resolved {
            county_id: only.clone(),
            source: CountySource::Unique,
        },
        many => CountyResolution::Ambiguous(many.to_vec()),
    }
}
