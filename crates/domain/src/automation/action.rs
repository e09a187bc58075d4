//! Action — the effect performed when an automation fires.
//!
//! Stored and exchanged as `{ "type": "...", "params": { ... } }`. Parsing
//! never fails: unknown types become [`Action::Unknown`] and known types
//! with a missing parameter become [`Action::Incomplete`], so one odd row
//! cannot stop the other rules from loading.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{ListId, UserId};

/// An operation to execute when a rule's trigger fires and its conditions hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAction", into = "RawAction")]
pub enum Action {
    /// Set the task status (`params.status`).
    ChangeStatus { status: String },
    /// Set the task priority (`params.priority`).
    ChangePriority { priority: String },
    /// Move the task to another list (`params.listId`).
    MoveToProject { list_id: ListId },
    /// Assign the task (`params.userId`).
    AssignToUser { user_id: UserId },
    /// Post to the owner's Slack incoming webhook (`params.message`, optional).
    SendSlack { message: Option<String> },
    /// A known type missing a required parameter.
    Incomplete {
        kind: String,
        missing: String,
        params: BTreeMap<String, String>,
    },
    /// A type this engine does not know. Executes as a no-op.
    Unknown {
        kind: String,
        params: BTreeMap<String, String>,
    },
}

impl Action {
    /// Wire name of the action type.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::ChangeStatus { .. } => "change_status",
            Self::ChangePriority { .. } => "change_priority",
            Self::MoveToProject { .. } => "move_to_project",
            Self::AssignToUser { .. } => "assign_to_user",
            Self::SendSlack { .. } => "send_slack",
            Self::Incomplete { kind, .. } | Self::Unknown { kind, .. } => kind,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeStatus { status } => write!(f, "change_status({status})"),
            Self::ChangePriority { priority } => write!(f, "change_priority({priority})"),
            Self::MoveToProject { list_id } => write!(f, "move_to_project({list_id})"),
            Self::AssignToUser { user_id } => write!(f, "assign_to_user({user_id})"),
            Self::SendSlack { .. } => f.write_str("send_slack"),
            Self::Incomplete { kind, missing, .. } => write!(f, "{kind}(missing {missing})"),
            Self::Unknown { kind, .. } => write!(f, "unknown({kind})"),
        }
    }
}

/// Serialized shape of an [`Action`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let RawAction { kind, mut params } = raw;
        let required = match kind.as_str() {
            "change_status" => "status",
            "change_priority" => "priority",
            "move_to_project" => "listId",
            "assign_to_user" => "userId",
            "send_slack" => {
                return Self::SendSlack {
                    message: params.remove("message").filter(|m| !m.is_empty()),
                };
            }
            _ => return Self::Unknown { kind, params },
        };

        let Some(value) = params.get(required).cloned() else {
            return Self::Incomplete {
                kind,
                missing: required.to_string(),
                params,
            };
        };

        match kind.as_str() {
            "change_status" => Self::ChangeStatus { status: value },
            "change_priority" => Self::ChangePriority { priority: value },
            "move_to_project" => Self::MoveToProject {
                list_id: ListId::new(value),
            },
            _ => Self::AssignToUser {
                user_id: UserId::new(value),
            },
        }
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let kind = action.kind().to_string();
        let params = match action {
            Action::ChangeStatus { status } => BTreeMap::from([("status".to_string(), status)]),
            Action::ChangePriority { priority } => {
                BTreeMap::from([("priority".to_string(), priority)])
            }
            Action::MoveToProject { list_id } => {
                BTreeMap::from([("listId".to_string(), list_id.to_string())])
            }
            Action::AssignToUser { user_id } => {
                BTreeMap::from([("userId".to_string(), user_id.to_string())])
            }
            Action::SendSlack { message } => message
                .map(|m| BTreeMap::from([("message".to_string(), m)]))
                .unwrap_or_default(),
            Action::Incomplete { params, .. } | Action::Unknown { params, .. } => params,
        };
        Self { kind, params }
    }
}
