//! Member directory backed by a JSON file of groups

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{EngineError, EngineResult};
use crate::traits::MemberDirectory;
use shared::{service_debug, service_warn, GroupId, Member, MemberZip, ServiceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryData {
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

/// Read-only directory of groups and their members
pub struct RealMemberDirectory {
    groups: HashMap<GroupId, Vec<Member>>,
}

impl RealMemberDirectory {
    pub fn from_data(data: DirectoryData) -> Self {
        Self {
            groups: data
                .groups
                .into_iter()
                .map(|group| (group.id, group.members))
                .collect(),
        }
    }

    /// Directory with a single group
    pub fn single_group(group_id: GroupId, members: Vec<Member>) -> Self {
        Self::from_data(DirectoryData {
            groups: vec![GroupRecord {
                id: group_id,
                name: String::new(),
                members,
            }],
        })
    }

    pub async fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| EngineError::ReferenceData {
            message: format!("reading {}: {e}", path.display()),
        })?;
        let data: DirectoryData =
            serde_json::from_str(&content).map_err(|e| EngineError::ReferenceData {
                message: format!("parsing {}: {e}", path.display()),
            })?;

        for group in &data.groups {
            for member in &group.members {
                if let MemberZip::Invalid(raw) = &member.zip_code {
                    service_warn!(
                        ServiceId::current(),
                        "⚠️ Member {} of group {} has an invalid ZIP code {:?}; it will be skipped",
                        member.id,
                        group.id,
                        raw
                    );
                }
            }
        }

        service_debug!(
            ServiceId::current(),
            "👥 Loaded member directory: {} groups",
            data.groups.len()
        );
        Ok(Self::from_data(data))
    }
}

#[async_trait]
impl MemberDirectory for RealMemberDirectory {
    async fn members_of(&self, group_id: &GroupId) -> EngineResult<Option<Vec<Member>>> {
        Ok(self.groups.get(group_id).cloned())
    }
}
