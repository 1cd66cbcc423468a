//! Quote batch orchestration
//!
//! `QuoteEngine` runs the per-member pipeline (geography, plan lookup,
//! benchmark, subsidy) across a whole group and persists one immutable batch
//! per run. The same pipeline backs the stateless single-member preview used
//! to resolve members whose ZIP spans several counties.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::core::affordability::{internal_summary, merge_external};
use crate::core::geography::{self, CountyResolution};
use crate::core::{
    age_on, benchmark_silver, build_quote_lines, calculate_subsidy, employee_summary, filter_options, priced_plans,
    SubsidyInput,
};
use crate::error::{EngineError, EngineResult};
use crate::traits::{
    AffordabilityProvider, AffordabilityRequest, BatchStore, ExternalAffordability, MemberDirectory,
    QuoteService, RatingLocation, ReferenceStore,
};
use shared::{
    logging, service_debug, service_warn, AffordabilitySummary, Benchmark, BenchmarkRequest,
    BenchmarkResponse, CountyCandidates, CountyId, CountySource, EmployeeSummary, EmployeeSummaryRequest,
    FilterOptions, GroupId, Member,
    MemberId, MemberQuoteEntry, MemberSnapshot, MemberZip, PreviewRequest, QuoteBatch, QuoteOutcome,
    RunContext, RunQuotesRequest, ServiceId, SkipReason, ZipCode,
};

/// Run identity and coverage date every member of one run is priced with
#[derive(Debug, Clone, Copy)]
struct RunScope {
    run_id: Uuid,
    effective_date: NaiveDate,
}

impl RunScope {
    fn new(effective_date: Option<NaiveDate>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            effective_date: effective_date.unwrap_or_else(|| Utc::now().date_naive()),
        }
    }
}

/// Inputs shared by every member of one run
struct RunParams {
    scope: RunScope,
    tobacco: Option<bool>,
    county_override: Option<CountyId>,
    county_choices: BTreeMap<MemberId, CountyId>,
}

/// Quote engine wired to its reference data, members, batch store and provider
pub struct QuoteEngine<R, M, B, A>
where
    R: ReferenceStore + 'static,
    M: MemberDirectory + 'static,
    B: BatchStore + 'static,
    A: AffordabilityProvider + 'static,
{
    reference: R,
    members: M,
    batches: B,
    provider: A,
    config: EngineConfig,
}

impl<R, M, B, A> QuoteEngine<R, M, B, A>
where
    R: ReferenceStore + 'static,
    M: MemberDirectory + 'static,
    B: BatchStore + 'static,
    A: AffordabilityProvider + 'static,
{
    /// Create new engine with injected dependencies
    pub fn new(reference: R, members: M, batches: B, provider: A, config: EngineConfig) -> Self {
        Self {
            reference,
            members,
            batches,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn group_members(&self, group_id: &GroupId) -> EngineResult<Vec<Member>> {
        self.members
            .members_of(group_id)
            .await?
            .ok_or_else(|| EngineError::GroupNotFound {
                group_id: group_id.clone(),
            })
    }

    async fn group_member(&self, group_id: &GroupId, member_id: &MemberId) -> EngineResult<Member> {
        self.group_members(group_id)
            .await?
            .into_iter()
            .find(|member| &member.id == member_id)
            .ok_or_else(|| EngineError::MemberNotFound {
                group_id: group_id.clone(),
                member_id: member_id.clone(),
            })
    }

    /// Price every member and persist one new batch.
    ///
    /// Every member yields exactly one entry. Only reference-data or
    /// persistence failures fail the run, and then nothing is written.
    pub async fn generate_batch(&self, group_id: &GroupId, request: RunQuotesRequest) -> EngineResult<QuoteBatch> {
        let members = self.group_members(group_id).await?;
        if members.is_empty() {
            return Err(EngineError::NoMembers {
                group_id: group_id.clone(),
            });
        }

        let run = RunParams {
            scope: RunScope::new(request.effective_date),
            tobacco: request.tobacco,
            county_override: request.county_id,
            county_choices: request.county_choices,
        };

        logging::log_progress(
            ServiceId::current(),
            "Generating quotes",
            &format!("group {} ({} members, effective {})", group_id, members.len(), run.scope.effective_date),
        );

        let member_quotes: Vec<_> = members
            .iter()
            .map(|member| self.quote_member(group_id, member, &run))
            .collect();
        let entries: Vec<MemberQuoteEntry> = stream::iter(member_quotes)
        .buffered(self.config.max_concurrency.max(1))
        .try_collect()
        .await?;
        debug_assert_eq!(entries.len(), members.len());

        let batch = QuoteBatch {
            id: run.scope.run_id,
            group_id: group_id.clone(),
            created_at: Utc::now(),
            run_context: RunContext {
                member_count: members.len(),
                effective_date: run.scope.effective_date,
                tobacco: run.tobacco,
                county_override: run.county_override,
                county_choices: run.county_choices,
            },
            entries,
        };

        if let Err(error) = self.batches.append(&batch).await {
            logging::log_error(ServiceId::current(), "Persisting quote batch", &error);
            return Err(match error {
                EngineError::Persistence { .. } => error,
                other => EngineError::persistence(other),
            });
        }

        let priced = batch.entries.iter().filter(|e| e.is_priced()).count();
        let skipped = batch.entries.iter().filter(|e| e.is_skipped()).count();
        let pending = batch.entries.len() - priced - skipped;
        logging::log_success(
            ServiceId::current(),
            &format!(
                "Batch {} for group {}: {} priced, {} need a county, {} skipped",
                batch.id, group_id, priced, pending, skipped
            ),
        );

        Ok(batch)
    }

    pub async fn latest_batch(&self, group_id: &GroupId) -> EngineResult<Option<QuoteBatch>> {
        self.batches.latest(group_id).await
    }

    pub async fn batch_history(&self, group_id: &GroupId) -> EngineResult<Vec<QuoteBatch>> {
        self.batches.history(group_id).await
    }

    /// Run the pipeline for one member against one caller-chosen county.
    /// Nothing is persisted.
    pub async fn preview_member(&self, group_id: &GroupId, request: PreviewRequest) -> EngineResult<MemberQuoteEntry> {
        let member_id = request.member_id.ok_or_else(|| EngineError::missing("member_id"))?;
        let county_id = request.county_id.ok_or_else(|| EngineError::missing("county_id"))?;
        let member = self.group_member(group_id, &member_id).await?;

        let scope = RunScope::new(request.effective_date);
        let age = member_age(&member, scope.effective_date)?;
        let tobacco = request.tobacco.unwrap_or(member.tobacco);

        let outcome = self
            .price_in_county(
                group_id,
                &member,
                county_id,
                CountySource::Explicit,
                age,
                tobacco,
                scope,
            )
            .await?;

        Ok(MemberQuoteEntry {
            member: MemberSnapshot::from(&member),
            outcome,
        })
    }

    /// Benchmark plan and subsidy breakdown for one member in one county
    pub async fn benchmark_for_member(
        &self,
        group_id: &GroupId,
        request: BenchmarkRequest,
    ) -> EngineResult<BenchmarkResponse> {
        let member_id = request.member_id.ok_or_else(|| EngineError::missing("member_id"))?;
        let county_id = request.county_id.ok_or_else(|| EngineError::missing("county_id"))?;
        let member = self.group_member(group_id, &member_id).await?;

        let effective_date = request.effective_date.unwrap_or_else(|| Utc::now().date_naive());
        let age = member_age(&member, effective_date)?;
        let tobacco = request.tobacco.unwrap_or(member.tobacco);

        let benchmark = benchmark_silver(&self.reference, &county_id, age, tobacco).await?;

        let state_code = request.state_code.or_else(|| member.state_code.clone());
        let input = subsidy_input(&member, &benchmark, effective_date, state_code);
        let (subsidy, subsidy_error) = match calculate_subsidy(&input, &self.config.guidelines) {
            Ok(breakdown) => (Some(breakdown), None),
            Err(error) => (None, Some(error.to_string())),
        };

        Ok(BenchmarkResponse {
            member: MemberSnapshot {
                tobacco,
                ..MemberSnapshot::from(&member)
            },
            county_id,
            age,
            tobacco,
            benchmark,
            subsidy,
            subsidy_error,
        })
    }

    /// Candidate counties for a ZIP, ascending, with display names
    pub async fn counties_for_zip(&self, zip_code: &ZipCode) -> EngineResult<CountyCandidates> {
        let ids = geography::counties_for_zip(&self.reference, zip_code).await?;
        let names = self.county_names(ids.clone()).await?;
        Ok(CountyCandidates {
            zip_code: zip_code.clone(),
            ids,
            names,
        })
    }

    pub async fn county_names(&self, county_ids: Vec<CountyId>) -> EngineResult<BTreeMap<CountyId, String>> {
        let mut names: BTreeMap<CountyId, String> = county_ids
            .iter()
            .map(|id| (id.clone(), id.to_string()))
            .collect();
        for county in self.reference.counties(&county_ids).await? {
            names.insert(county.id, county.name);
        }
        Ok(names)
    }

    /// Filter options of the latest batch; empty when the group has none
    pub async fn filter_options(&self, group_id: &GroupId) -> EngineResult<FilterOptions> {
        Ok(self
            .latest_batch(group_id)
            .await?
            .map(|batch| filter_options(&batch))
            .unwrap_or_default())
    }

    /// Old versus new monthly cost of every member against the latest batch.
    /// Members are listed even before the first run, with no plan chosen.
    pub async fn employee_summary(
        &self,
        group_id: &GroupId,
        request: EmployeeSummaryRequest,
    ) -> EngineResult<EmployeeSummary> {
        let members = self.group_members(group_id).await?;
        let latest = self.latest_batch(group_id).await?;
        let summary = employee_summary(group_id, &members, latest.as_ref(), &request);
        service_debug!(
            ServiceId::current(),
            "Employee summary for group {}: {} rows, batch {:?}",
            group_id,
            summary.employees.len(),
            summary.batch_id
        );
        Ok(summary)
    }

    async fn quote_member(&self, group_id: &GroupId, member: &Member, run: &RunParams) -> EngineResult<MemberQuoteEntry> {
        let outcome = self.member_outcome(group_id, member, run).await?;
        if let QuoteOutcome::Skipped { detail, .. } = &outcome {
            service_debug!(ServiceId::current(), "⏭️ Skipped member {}: {}", member.id, detail);
        }
        Ok(MemberQuoteEntry {
            member: MemberSnapshot::from(member),
            outcome,
        })
    }

    async fn member_outcome(&self, group_id: &GroupId, member: &Member, run: &RunParams) -> EngineResult<QuoteOutcome> {
        let zip_code = match &member.zip_code {
            MemberZip::Valid(zip_code) => zip_code,
            MemberZip::Missing => return Ok(QuoteOutcome::skipped(SkipReason::MissingZipCode)),
            MemberZip::Invalid(raw) => {
                return Ok(QuoteOutcome::skipped(SkipReason::InvalidZipCode {
                    zip_code: raw.clone(),
                }))
            }
        };
        let Some(date_of_birth) = member.date_of_birth else {
            return Ok(QuoteOutcome::skipped(SkipReason::MissingDateOfBirth));
        };
        let Some(age) = age_on(date_of_birth, run.scope.effective_date) else {
            return Ok(QuoteOutcome::skipped(SkipReason::AgeUncomputable));
        };
        let tobacco = run.tobacco.unwrap_or(member.tobacco);

        let explicit = run.county_choices.get(&member.id);
        let stored = member.county_id.as_ref();
        let candidates = if explicit.is_none() && stored.is_none() {
            geography::counties_for_zip(&self.reference, zip_code).await?
        } else {
            Vec::new()
        };

        let resolution = geography::resolve_county(explicit, stored, &candidates)
            .or_run_override(run.county_override.as_ref());

        match resolution {
            CountyResolution::Resolved { county_id, source } => {
                self.price_in_county(group_id, member, county_id, source, age, tobacco, run.scope)
                    .await
            }
            CountyResolution::Ambiguous(county_ids) => Ok(QuoteOutcome::NeedsCounty {
                zip_code: zip_code.clone(),
                county_ids,
            }),
            CountyResolution::NoCandidates => Ok(QuoteOutcome::skipped(SkipReason::NoCountiesForZip {
                zip_code: zip_code.clone(),
            })),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn price_in_county(
        &self,
        group_id: &GroupId,
        member: &Member,
        county_id: CountyId,
        county_source: CountySource,
        age: u32,
        tobacco: bool,
        scope: RunScope,
    ) -> EngineResult<QuoteOutcome> {
        let priced = match priced_plans(&self.reference, &county_id, age, tobacco).await {
            Ok(priced) => priced,
            Err(EngineError::Lookup(error)) => return Ok(QuoteOutcome::skipped(error.into())),
            Err(other) => return Err(other),
        };

        let affordability = match self
            .affordability(group_id, member, &county_id, age, tobacco, scope)
            .await?
        {
            Ok(summary) => summary,
            Err(reason) => return Ok(QuoteOutcome::skipped(reason)),
        };

        let quotes = build_quote_lines(priced, &affordability);
        Ok(QuoteOutcome::Priced {
            county_id,
            county_source,
            age,
            tobacco,
            affordability,
            quotes,
        })
    }

    /// External credit when the provider supplies one, otherwise the internal
    /// benchmark and subsidy. The inner `Err` is why neither was available.
    async fn affordability(
        &self,
        group_id: &GroupId,
        member: &Member,
        county_id: &CountyId,
        age: u32,
        tobacco: bool,
        scope: RunScope,
    ) -> EngineResult<Result<AffordabilitySummary, SkipReason>> {
        let (internal, external) = futures_util::join!(
            self.internal_affordability(member, county_id, age, tobacco, scope.effective_date),
            self.external_affordability(group_id, member, scope),
        );
        let internal = internal?;

        if let Some(external) = external {
            if let Some(summary) = merge_external(&external, internal.as_ref().ok()) {
                return Ok(Ok(summary));
            }
        }
        Ok(internal)
    }

    async fn internal_affordability(
        &self,
        member: &Member,
        county_id: &CountyId,
        age: u32,
        tobacco: bool,
        effective_date: NaiveDate,
    ) -> EngineResult<Result<AffordabilitySummary, SkipReason>> {
        let benchmark = match benchmark_silver(&self.reference, county_id, age, tobacco).await {
            Ok(benchmark) => benchmark,
            Err(EngineError::Benchmark(error)) => return Ok(Err(error.into())),
            Err(other) => return Err(other),
        };

        let input = subsidy_input(member, &benchmark, effective_date, member.state_code.clone());
        Ok(calculate_subsidy(&input, &self.config.guidelines)
            .map(|breakdown| internal_summary(&benchmark, &breakdown))
            .map_err(SkipReason::from))
    }

    /// Bounded call to the external provider; any failure means "absent"
    async fn external_affordability(
        &self,
        group_id: &GroupId,
        member: &Member,
        scope: RunScope,
    ) -> Option<ExternalAffordability> {
        let zip_code = member.zip_code.valid()?.clone();
        let request = AffordabilityRequest {
            run_id: scope.run_id,
            group_id: group_id.clone(),
            member: member.clone(),
            effective_date: scope.effective_date,
            plan_year: scope.effective_date.year(),
            rating_location: RatingLocation::Zip { zip_code },
        };

        match timeout(self.config.provider_timeout, self.provider.determine(&request)).await {
            Ok(Ok(determination)) => determination,
            Ok(Err(error)) => {
                service_warn!(
                    ServiceId::current(),
                    "⚠️ Affordability provider failed for member {}, using internal subsidy: {}",
                    member.id,
                    error
                );
                None
            }
            Err(_) => {
                service_warn!(
                    ServiceId::current(),
                    "⚠️ Affordability provider timed out after {}ms for member {}, using internal subsidy",
                    self.config.provider_timeout.as_millis(),
                    member.id
                );
                None
            }
        }
    }
}

fn member_age(member: &Member, effective_date: NaiveDate) -> EngineResult<u32> {
    let date_of_birth = member
        .date_of_birth
        .ok_or_else(|| EngineError::missing("member.date_of_birth"))?;
    age_on(date_of_birth, effective_date).ok_or_else(|| EngineError::AgeUncomputable {
        member_id: member.id.clone(),
    })
}

fn subsidy_input(
    member: &Member,
    benchmark: &Benchmark,
    effective_date: NaiveDate,
    state_code: Option<String>,
) -> SubsidyInput {
    SubsidyInput {
        income: member.income,
        household_size: member.household_size,
        tax_year: member.tax_year.unwrap_or_else(|| effective_date.year()),
        state_code,
        benchmark_premium: benchmark.premium,
    }
}

#[async_trait::async_trait]
impl<R, M, B, A> QuoteService for QuoteEngine<R, M, B, A>
where
    R: ReferenceStore + 'static,
    M: MemberDirectory + 'static,
    B: BatchStore + 'static,
    A: AffordabilityProvider + 'static,
{
    async fn generate_batch(&self, group_id: &GroupId, request: RunQuotesRequest) -> EngineResult<QuoteBatch> {
        QuoteEngine::generate_batch(self, group_id, request).await
    }

    async fn latest_batch(&self, group_id: &GroupId) -> EngineResult<Option<QuoteBatch>> {
        QuoteEngine::latest_batch(self, group_id).await
    }

    async fn batch_history(&self, group_id: &GroupId) -> EngineResult<Vec<QuoteBatch>> {
        QuoteEngine::batch_history(self, group_id).await
    }

    async fn preview_member(&self, group_id: &GroupId, request: PreviewRequest) -> EngineResult<MemberQuoteEntry> {
        QuoteEngine::preview_member(self, group_id, request).await
    }

    async fn benchmark_for_member(
        &self,
        group_id: &GroupId,
        request: BenchmarkRequest,
    ) -> EngineResult<BenchmarkResponse> {
        QuoteEngine::benchmark_for_member(self, group_id, request).await
    }

    async fn counties_for_zip(&self, zip_code: &ZipCode) -> EngineResult<CountyCandidates> {
        QuoteEngine::counties_for_zip(self, zip_code).await
    }

    async fn county_names(&self, county_ids: Vec<CountyId>) -> EngineResult<BTreeMap<CountyId, String>> {
        QuoteEngine::county_names(self, county_ids).await
    }

    async fn filter_options(&self, group_id: &GroupId) -> EngineResult<FilterOptions> {
        QuoteEngine::filter_options(self, group_id).await
    }

    async fn employee_summary(
        &self,
        group_id: &GroupId,
        request: EmployeeSummaryRequest,
    ) -> EngineResult<EmployeeSummary> {
        QuoteEngine::employee_summary(self, group_id, request).await
    }
}
