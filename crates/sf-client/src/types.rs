//! Response shapes shared by the Salesforce REST surfaces.

use serde::{Deserialize, Serialize};

/// One page of a SOQL query.
///
/// `done` and `nextRecordsUrl` are optional on the wire; a page is only
/// followed when `done` is explicitly `false` and a cursor is present.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryResult<T> {
    /// Total number of records matching the query.
    #[serde(rename = "totalSize", default)]
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    #[serde(default)]
    pub done: Option<bool>,

    /// URL to fetch next batch of results.
    #[serde(rename = "nextRecordsUrl", default)]
    pub next_records_url: Option<String>,

    /// The records.
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

impl<T> QueryResult<T> {
    /// Cursor of the next page, if another page must be fetched.
    pub fn next_page(&self) -> Option<&str> {
        match (self.done, self.next_records_url.as_deref()) {
            (Some(false), Some(url)) if !url.is_empty() => Some(url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_query_result_last_page() {
        let page: QueryResult<Value> = serde_json::from_value(json!({
            "totalSize": 1,
            "done": true,
            "records": [{"Id": "a00xx0000001"}]
        }))
        .unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn test_query_result_with_cursor() {
        let page: QueryResult<Value> = serde_json::from_value(json!({
            "totalSize": 4000,
            "done": false,
            "nextRecordsUrl": "/services/data/v62.0/query/01gxx0000000001-2000",
            "records": []
        }))
        .unwrap();

        assert_eq!(
            page.next_page(),
            Some("/services/data/v62.0/query/01gxx0000000001-2000")
        );
    }

    #[test]
    fn test_missing_flag_or_cursor_stops_paging() {
        let no_flag: QueryResult<Value> = serde_json::from_value(json!({
            "nextRecordsUrl": "/services/data/v62.0/query/01g-2000",
            "records": []
        }))
        .unwrap();
        assert_eq!(no_flag.next_page(), None);

        let no_cursor: QueryResult<Value> =
            serde_json::from_value(json!({"done": false, "records": []})).unwrap();
        assert_eq!(no_cursor.next_page(), None);

        let no_records: QueryResult<Value> = serde_json::from_value(json!({})).unwrap();
        assert!(no_records.records.is_empty());
    }
}
