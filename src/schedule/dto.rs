use serde::{Deserialize, Serialize};

use crate::activity::repo::Activity;
use crate::pagination::PaginationMeta;
use crate::schedule::repo::Schedule;

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub name: String,
    pub url: String,
}

/// Partial update: absent fields leave the stored value untouched.
#[derive(Debug, Deserialize)]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub url: Option<String>,
}

/// Query string for the paginated schedule detail endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    10
}

/// Schedule detail merged with one page of its activities.
#[derive(Debug, Serialize)]
pub struct ScheduleWithActivities {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub activities: Vec<Activity>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 10);

        let q: PageQuery = serde_json::from_str(r#"{"page":3,"pageSize":25}"#).unwrap();
        assert_eq!(q.page, 3);
        assert_eq!(q.page_size, 25);
    }

    #[test]
    fn patch_fields_are_optional() {
        let p: SchedulePatch = serde_json::from_str(r#"{"name":"X"}"#).unwrap();
        assert_eq!(p.name.as_deref(), Some("X"));
        assert!(p.url.is_none());
    }
}
