use serde::{Deserialize, Serialize};

/// Worker account as returned by `GET /user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    // older records carried a capitalized field name
    #[serde(rename = "lastName", alias = "LastName", default)]
    pub last_name: String,
}

/// Staff member who can be assigned folders. Folders reference workers by
/// id only; the join happens at presentation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Worker {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

impl From<UserRecord> for Worker {
    fn from(record: UserRecord) -> Self {
        Worker {
            user_id: record.user_id,
            first_name: record.first_name,
            last_name: record.last_name,
        }
    }
}
