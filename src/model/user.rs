//! Employee record and planning node types.

use serde::Deserialize;

use crate::model::action::Action;

/// Raw employee record as returned by the SoT `queryDlpEmp` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "userCode")]
    pub code: String,
    #[serde(rename = "userName")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub status: String,
    #[serde(rename = "OAID")]
    pub oa_id: String,
    #[serde(rename = "orgCode")]
    pub org_code: String,
}

/// A user after SoT filtering, carrying the target-side shadow fields
/// filled in during planning (§4.6).
#[derive(Debug, Clone)]
pub struct UserNode {
    pub code: String,
    pub name: String,
    pub email: String,
    pub oa_id: String,
    pub org_code: String,

    pub id: Option<String>,
    pub org_id: Option<String>,
    pub dep_id: Option<String>,
    pub action: Action,
}

impl UserNode {
    pub fn from_record(record: &UserRecord, org_id: Option<String>, dep_id: Option<String>) -> UserNode {
        UserNode {
            code: record.code.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            oa_id: record.oa_id.clone(),
            org_code: record.org_code.clone(),
            id: None,
            org_id,
            dep_id,
            action: Action::NONE,
        }
    }

    /// A user is eligible for sync only if name/oaId are non-empty and the
    /// SoT marks them active. Mirrors `ProcessDataApiEmpRsp`'s inline filter.
    pub fn is_eligible(record: &UserRecord) -> bool {
        !record.name.is_empty() && !record.oa_id.is_empty() && record.status == "1"
    }
}
