use serde::{Deserialize, Deserializer};
use std::fmt;

/// A todo as returned by `getTodos`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Todo {
    #[serde(deserialize_with = "graphql_id")]
    pub id: String,
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "graphql_id")]
    pub id: String,
    pub name: String,
}

impl Todo {
    /// Assignee name, empty when unassigned
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("")
    }

    pub fn status(&self) -> Status {
        if self.completed {
            Status::Completed
        } else {
            Status::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Completed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "Pending"),
            Status::Completed => write!(f, "Completed"),
        }
    }
}

/// GraphQL `ID` scalars serialize as either a string or an integer.
fn graphql_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}
