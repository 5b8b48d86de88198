//! Department tree node types.
//!
//! `OrgRecord` is the raw shape returned by the SoT. `OrgNode` is the
//! reconstructed forest node: owned by a `HashMap<String, OrgNode>` keyed by
//! `code` rather than by pointer, so parent/child links are plain `String`
//! keys into that map (see DESIGN.md for why: Rust doesn't let a node own
//! its children while a sibling holds a back-reference to the same parent
//! without `Rc<RefCell<_>>`, and an arena keyed by the already-unique `code`
//! is the simpler fit here).

use serde::Deserialize;

use crate::model::action::Action;

/// Raw department record as returned by the SoT `queryDlpOrg` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgRecord {
    #[serde(rename = "orgUnitCode")]
    pub code: String,
    #[serde(rename = "orgUnitName")]
    pub name: String,
    pub status: String,
    #[serde(rename = "upperOrgUnitCode", default)]
    pub parent_code: String,
    #[serde(rename = "upperOrgUnitName", default)]
    pub parent_name: String,
}

/// Status of a reconstructed forest node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Active,
    Inactive,
    Filtered,
}

impl NodeStatus {
    pub fn from_sot(status: &str) -> NodeStatus {
        match status {
            "1" => NodeStatus::Active,
            _ => NodeStatus::Inactive,
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, NodeStatus::Active)
    }
}

/// A node in the reconstructed SoT department forest.
///
/// `parent` and `children` are `code` keys into the owning forest's map,
/// not pointers — see the module doc comment.
#[derive(Debug, Clone)]
pub struct OrgNode {
    pub code: String,
    pub name: String,
    pub parent_code: Option<String>,
    pub parent_name: String,
    pub status: NodeStatus,
    pub children: Vec<String>,
    pub root: bool,

    // Planning shadow fields, populated during diff (§4.5).
    pub org_id: Option<String>,
    pub dep_id: Option<String>,
    pub father_id: Option<String>,
    pub action: Action,
}

impl OrgNode {
    pub fn new_virtual(code: String, name: String) -> OrgNode {
        OrgNode {
            code,
            name,
            parent_code: None,
            parent_name: String::new(),
            status: NodeStatus::Inactive,
            children: Vec::new(),
            root: false,
            org_id: None,
            dep_id: None,
            father_id: None,
            action: Action::NONE,
        }
    }

    pub fn new_root(code: String, name: String) -> OrgNode {
        OrgNode {
            code,
            name,
            parent_code: None,
            parent_name: String::new(),
            status: NodeStatus::Active,
            children: Vec::new(),
            root: true,
            org_id: None,
            dep_id: None,
            father_id: None,
            action: Action::NONE,
        }
    }

    /// Display form `"name(code)"` used by the target's directory paths.
    pub fn ou_label(&self) -> String {
        format!("{}({})", self.name, self.code)
    }
}

/// Normalize a name the way the target's path escaping requires: literal
/// commas become spaces, since the target encodes department ancestry as a
/// comma-joined path.
pub fn normalize_name(name: &str) -> String {
    name.replace(',', " ")
}
