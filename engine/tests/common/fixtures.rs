//! Test fixtures and data for engine tests
//!
//! One group in the Atlanta area: a ZIP with a single county, a ZIP spanning
//! three counties, an unmapped ZIP, and members exercising each skip reason.

use chrono::NaiveDate;

use engine::services::ReferenceData;

use super::builders::{sample_plan, ReferenceDataBuilder};
use shared::{GroupId, IncomeComponents, Member, MemberId, ZipCode};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const GROUP: &'static str = "g1";
    pub const EMPTY_GROUP: &'static str = "empty";

    pub const FULTON: &'static str = "13121";
    pub const DEKALB: &'static str = "13089";
    pub const COBB: &'static str = "13067";

    /// Maps to Fulton only
    pub const SINGLE_COUNTY_ZIP: &'static str = "30301";
    /// Maps to Cobb, DeKalb and Fulton
    pub const MULTI_COUNTY_ZIP: &'static str = "30339";
    /// Maps to nothing
    pub const UNMAPPED_ZIP: &'static str = "99999";

    /// Age 39 on the effective date
    pub const AGE: u32 = 39;
    pub const INCOME: f64 = 30_000.0;

    pub fn group_id() -> GroupId {
        GroupId::from(Self::GROUP)
    }

    pub fn effective_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    pub fn zip(zip: &str) -> ZipCode {
        ZipCode::parse(zip).unwrap()
    }

    /// Silver plans S1-S3 and gold G1 on-market, silver X1 off-market and cheapest.
    /// SLCSP for age 39 non-tobacco is S3 at 310.
    pub fn reference_data() -> ReferenceData {
        let counties = [Self::FULTON, Self::DEKALB, Self::COBB];
        ReferenceData::default()
            .with_county(Self::FULTON, "Fulton", "GA")
            .with_county(Self::DEKALB, "DeKalb", "GA")
            .with_county(Self::COBB, "Cobb", "GA")
            .with_zip(Self::zip(Self::SINGLE_COUNTY_ZIP), Self::FULTON)
            .with_zip(Self::zip(Self::MULTI_COUNTY_ZIP), Self::FULTON)
            .with_zip(Self::zip(Self::MULTI_COUNTY_ZIP), Self::DEKALB)
            .with_zip(Self::zip(Self::MULTI_COUNTY_ZIP), Self::COBB)
            .with_plan(sample_plan("S1", "Acme", "Silver", true), &counties)
            .with_plan(sample_plan("S2", "Beta", "Silver", true), &counties)
            .with_plan(sample_plan("S3", "Gamma", "Silver", true), &counties)
            .with_plan(sample_plan("G1", "Acme", "Gold", true), &counties)
            .with_plan(sample_plan("X1", "Delta", "Silver", false), &counties)
            .with_price("S1", Self::AGE, false, 320.0)
            .with_price("S2", Self::AGE, false, 305.0)
            .with_price("S3", Self::AGE, false, 310.0)
            .with_price("G1", Self::AGE, false, 450.0)
            .with_price("X1", Self::AGE, false, 200.0)
            .with_price("S1", Self::AGE, true, 400.0)
            .with_price("S2", Self::AGE, true, 380.0)
            .with_price("G1", Self::AGE, true, 560.0)
    }

    pub fn member(id: &str, zip: Option<&str>) -> Member {
        Member {
            id: MemberId::from(id),
            first_name: format!("First-{id}"),
            last_name: format!("Last-{id}"),
            external_id: Some(format!("ext-{id}")),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 15),
            zip_code: zip.map(Self::zip).into(),
            tobacco: false,
            county_id: None,
            household_size: 1,
            income: IncomeComponents {
                adjusted_gross_income: Self::INCOME,
                ..IncomeComponents::default()
            },
            tax_year: Some(2024),
            state_code: Some("GA".to_string()),
            old_employee_contribution: 0.0,
        }
    }

    /// Six members: unique ZIP, ambiguous ZIP, no ZIP, no birth date,
    /// unmapped ZIP, and an ambiguous ZIP with a stored county
    pub fn members() -> Vec<Member> {
        let mut no_dob = Self::member("m4", Some(Self::SINGLE_COUNTY_ZIP));
        no_dob.date_of_birth = None;

        let mut stored = Self::member("m6", Some(Self::MULTI_COUNTY_ZIP));
        stored.county_id = Some(Self::DEKALB.into());

        vec![
            Self::member("m1", Some(Self::SINGLE_COUNTY_ZIP)),
            Self::member("m2", Some(Self::MULTI_COUNTY_ZIP)),
            Self::member("m3", None),
            no_dob,
            Self::member("m5", Some(Self::UNMAPPED_ZIP)),
            stored,
        ]
    }
}
