//! Shared types for the group quoting system
//!
//! Domain records read by the engine, the wire shapes exchanged between the
//! webserver and its clients, and the logging setup every binary uses.

pub mod types;
pub mod errors;
pub mod logging;
pub mod messages;

pub use types::*;
pub use errors::*;

pub use messages::{
    // Batch snapshot and per-member entries
    QuoteBatch, RunContext, MemberQuoteEntry, QuoteOutcome, CountySource, QuoteLine,

    // Affordability and skip taxonomy
    AffordabilitySummary, AffordabilitySource, SkipReason, SkipCategory,

    // Request and response bodies
    RunQuotesRequest, PreviewRequest, BenchmarkRequest, BenchmarkResponse, Benchmark,
    SilverCandidate, SubsidyBreakdown, CountyCandidates, FilterOptions, ErrorBody,

    // Employee cost comparison
    EmployeeSummaryRequest, EmployeeSummary, EmployeeRow, SummaryFilters, SummaryTotals, ChosenBy,
    ChosenPlan, parse_filter_list, parse_market_flag,
};
