//! Core quoting logic
//!
//! Pure calculations plus the reference-data joins they need. Nothing here
//! writes anywhere; every function is deterministic for a given store.

pub mod affordability;
pub mod age;
pub mod benchmark;
pub mod geography;
pub mod lines;
pub mod lookup;
pub mod poverty;
pub mod subsidy;
pub mod summary;

pub use age::age_on;
pub use benchmark::{benchmark_silver, select_benchmark};
pub use geography::{candidate_counties, resolve_county, CountyResolution};
pub use lines::{adjusted_cost, build_quote_lines, filter_options};
pub use lookup::{priced_plans, PricedPlan};
pub use poverty::{PovertyGuidelines, StateGroup};
pub use subsidy::{applicable_percentage, calculate_subsidy, SubsidyInput};
pub use summary::{choose_plan, employee_summary};
