//! Wire shapes for the target identity-management API (spec.md §6).
//!
//! These mirror the JSON the target actually returns/accepts; the planner
//! and executor never see them directly, only through `TargetApi` and the
//! snapshot maps built from them.

use serde::{Deserialize, Serialize};

/// One entry from `GET /api/v1/account/org`.
#[derive(Debug, Clone, Deserialize)]
pub struct RootInfo {
    #[serde(rename = "orgId")]
    pub org_id: String,
    pub name: String,
    #[serde(rename = "originId")]
    pub origin_id: String,
}

/// One entry from `GET /api/v1/account/org/{orgId}/tree`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    #[serde(rename = "depId")]
    pub dep_id: String,
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<String>,
    #[serde(rename = "originId")]
    pub origin_id: String,
    pub name: String,
}

/// A user's department membership as the target reports it in
/// `listUsers`: one `orgId` can carry several `depId`s, but this agent
/// only ever writes a single department per user, so `first_department`
/// narrows to the shape `snapshot::scan` actually consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetUserDepartment {
    #[serde(rename = "orgId")]
    pub org_id: String,
    #[serde(rename = "depId", default)]
    pub dep_id: Vec<String>,
}

/// One entry from `GET /api/v1/account/user`.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetUserInfo {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    #[serde(default)]
    pub account: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub department: Vec<TargetUserDepartment>,
}

impl TargetUserInfo {
    /// The one department the snapshot builder records a user under —
    /// the first entry with at least one `depId`, matching the
    /// single-department shape every create/update payload writes.
    pub fn first_department(&self) -> Option<(String, String)> {
        self.department
            .iter()
            .find(|d| !d.dep_id.is_empty())
            .map(|d| (d.org_id.clone(), d.dep_id[0].clone()))
    }
}

/// Body for `createUser`/`updateUser`. The target's `updateUser` wraps
/// this same shape in a `{"propval": ...}` envelope (see
/// `TargetClient::update_user`); `createUser` posts it directly.
#[derive(Debug, Clone, Serialize)]
pub struct UserPayload {
    pub account: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    pub email: String,
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    #[serde(rename = "orgId")]
    pub org_id: String,
    #[serde(rename = "departmentId")]
    pub department_id: Vec<String>,
    #[serde(rename = "groupId")]
    pub group_id: Vec<String>,
    pub birthday: String,
    pub gender: String,
}

impl UserPayload {
    pub fn new(oa_id: &str, display_name: &str, email: &str, employee_id: &str, org_id: &str, dep_id: &str) -> UserPayload {
        UserPayload {
            account: oa_id.to_string(),
            display_name: display_name.to_string(),
            first_name: display_name.to_string(),
            email: email.to_string(),
            employee_id: employee_id.to_string(),
            org_id: org_id.to_string(),
            department_id: vec![dep_id.to_string()],
            group_id: vec!["1".to_string()],
            birthday: "2022-06-06".to_string(),
            gender: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateUserEnvelope<'a> {
    pub propval: &'a UserPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RootListResponse {
    #[serde(default)]
    pub organizations: Vec<RootInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    #[serde(rename = "treeStruct", default)]
    pub tree_struct: Vec<TreeNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserListResponse {
    #[serde(default)]
    pub users: Vec<TargetUserInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateOrgResponse {
    #[serde(rename = "orgId")]
    pub org_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateDepartmentResponse {
    #[serde(rename = "depId")]
    pub dep_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateUserResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NameBody<'a> {
    pub name: &'a str,
}
