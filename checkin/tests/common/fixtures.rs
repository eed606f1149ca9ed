//! Test fixtures and data for check-in tests

use shared::{CheckinPerson, InstanceId, LabelContent, PersonId};

/// Standard test data
pub struct TestFixtures;

impl TestFixtures {
    pub const INSTANCE: u64 = 7;
    pub const API_KEY: &'static str = "test-breeze-key";

    pub const ADA: u64 = 101;
    pub const BO: u64 = 102;
    pub const CY: u64 = 103;

    pub fn instance_id() -> InstanceId {
        InstanceId::new(Self::INSTANCE)
    }

    pub fn person(id: u64, name: &str) -> CheckinPerson {
        CheckinPerson::new(
            id,
            name,
            checkin::encode(PersonId::new(id), Self::instance_id()).into_string(),
        )
    }

    /// Three children from one family
    pub fn family() -> Vec<CheckinPerson> {
        vec![
            Self::person(Self::ADA, "Ada Lovelace"),
            Self::person(Self::BO, "Bo Lovelace"),
            Self::person(Self::CY, "Cy Lovelace"),
        ]
    }

    /// Parent tear-off label listing the children
    pub fn parent_label() -> LabelContent {
        LabelContent::new("Lovelace Family")
            .with_code(checkin::encode(PersonId::new(Self::ADA), Self::instance_id()).into_string())
            .with_extra("Ada, Bo, Cy")
    }

    /// `count` distinct people, ids starting at 1
    pub fn crowd(count: u64) -> Vec<CheckinPerson> {
        (1..=count)
            .map(|id| Self::person(id, &format!("Guest {id}")))
            .collect()
    }
}
