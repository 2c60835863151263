//! Query and lookup operations.

use busbar_sf_client::{Connection, QueryResult, RequestOptions};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{from_remote, query_statement, SObjectStorage};
use crate::error::{Error, Result};
use crate::property_map::PropertyMap;

impl<C: Connection> SObjectStorage<C> {
    /// Run a query and return every matching record in friendly format.
    ///
    /// Options map friendly property names to values; see
    /// [`build_query_statement`](Self::build_query_statement). All result
    /// pages are fetched.
    #[instrument(skip(self, options))]
    pub async fn query(&self, options: Option<&Map<String, Value>>) -> Result<Vec<Value>> {
        async {
            let map = self.property_map().await?;
            let object_name = self.object_name()?;
            self.query_with(&map, &object_name, options).await
        }
        .await
        .map_err(|err| self.report("query", &options, err))
    }

    /// Return the first record matching `options`.
    ///
    /// At least one option must name a declared property with a non-null
    /// value. When nothing matches, the configured not-found error is
    /// returned.
    #[instrument(skip(self, options))]
    pub async fn get(&self, options: &Map<String, Value>) -> Result<Value> {
        async {
            let map = self.property_map().await?;
            let usable = options
                .iter()
                .any(|(name, value)| map.get(name).is_some() && !value.is_null());
            if !usable {
                return Err(Error::validation(format!(
                    "at least one of {} is required",
                    map.property_names().join(", ")
                )));
            }

            let object_name = self.object_name()?;
            let mut records = self.query_with(&map, &object_name, Some(options)).await?;
            if records.is_empty() {
                return Err((self.not_found)(&object_name, &Value::Object(options.clone())));
            }
            Ok(records.swap_remove(0))
        }
        .await
        .map_err(|err| self.report("get", options, err))
    }

    async fn query_with(
        &self,
        map: &PropertyMap,
        object_name: &str,
        options: Option<&Map<String, Value>>,
    ) -> Result<Vec<Value>> {
        let statement = query_statement(map, object_name, options)?;
        debug!(object = object_name, statement = %statement, "Executing query");

        let request = RequestOptions::get(self.data_path("query")).query("q", statement);
        let mut page: QueryResult<Value> =
            serde_json::from_value(self.connection.request(request).await?)?;
        let mut records = std::mem::take(&mut page.records);

        while let Some(next) = page.next_page().map(str::to_string) {
            debug!(next_records_url = %next, "Fetching next page");
            page = serde_json::from_value(self.connection.request(RequestOptions::get(next)).await?)?;
            records.append(&mut page.records);
        }

        records
            .iter()
            .map(|record| from_remote(map, record).map(Value::Object))
            .collect()
    }
}
