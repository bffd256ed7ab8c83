use serde::{Deserialize, Serialize};

use crate::{
   catalog::ItemRecord,
   config,
   error::{Error, Result},
   index::SearchIndex,
   types::ItemId,
};

/// Elasticsearch-compatible search backend client.
pub struct ElasticIndex {
   client:   reqwest::Client,
   base_url: String,
   index:    String,
}

#[derive(Debug, Serialize)]
struct QueryString<'a> {
   query: &'a str,
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
   query_string: QueryString<'a>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
   query: QueryBody<'a>,
   size:  usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
   hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
   hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
   #[serde(rename = "_id")]
   id: String,
}

#[derive(Debug, Serialize)]
struct ItemDocument<'a> {
   product_title:       &'a str,
   product_description: &'a str,
   #[serde(skip_serializing_if = "Option::is_none")]
   attributes:          Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
   count: u64,
}

impl ElasticIndex {
   /// Connects to the endpoint and index named by the environment, falling
   /// back to `http://localhost:9200` / `products`.
   pub fn new() -> Result<Self> {
      Ok(Self::with_endpoint(config::index_url(), config::index_name()))
   }

   pub fn with_endpoint(base_url: impl Into<String>, index: impl Into<String>) -> Self {
      Self {
         client:   reqwest::Client::new(),
         base_url: base_url.into(),
         index:    index.into(),
      }
   }

   fn url(&self, suffix: &str) -> String {
      format!("{}/{}/{}", self.base_url, self.index, suffix)
   }
}

#[async_trait::async_trait]
impl SearchIndex for ElasticIndex {
   async fn query(&self, query: &str, limit: usize) -> Result<Vec<ItemId>> {
      let request = SearchRequest {
         query: QueryBody { query_string: QueryString { query } },
         size:  limit,
      };

      let response = self
         .client
         .post(self.url("_search"))
         .json(&request)
         .send()
         .await?;

      let status = response.status();
      if !status.is_success() {
         return Err(Error::Backend {
            op:     "search",
            reason: format!("{}: {}", status, response.text().await.unwrap_or_default()),
         });
      }

      let body: SearchResponse = response.json().await?;
      parse_hit_ids(&body.hits.hits)
   }

   async fn index_batch(&self, records: &[ItemRecord]) -> Result<usize> {
      let mut indexed = 0;

      for record in records {
         let document = ItemDocument {
            product_title:       &record.title,
            product_description: &record.description,
            attributes:          record.attributes.as_deref(),
         };

         let response = self
            .client
            .put(self.url(&format!("_doc/{}", record.id)))
            .json(&document)
            .send()
            .await?;

         // a rejected document is logged and skipped, it must not abort the batch
         if response.status().is_success() {
            indexed += 1;
         } else {
            tracing::warn!(
               id = record.id,
               status = %response.status(),
               "backend rejected document"
            );
         }
      }

      Ok(indexed)
   }

   async fn doc_count(&self) -> Result<u64> {
      let response = self.client.get(self.url("_count")).send().await?;

      if !response.status().is_success() {
         return Err(Error::Backend {
            op:     "count",
            reason: response.status().to_string(),
         });
      }

      let body: CountResponse = response.json().await?;
      Ok(body.count)
   }
}

fn parse_hit_ids(hits: &[Hit]) -> Result<Vec<ItemId>> {
   hits
      .iter()
      .map(|hit| {
         hit.id.parse::<ItemId>().map_err(|_| Error::Backend {
            op:     "search",
            reason: format!("non-numeric hit id: {:?}", hit.id),
         })
      })
      .collect()
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn parse_hit_ids_accepts_numeric_ids() {
      let body: SearchResponse = serde_json::from_str(
         r#"{"hits":{"hits":[{"_id":"101","_score":1.5},{"_id":"102","_score":0.9}]}}"#,
      )
      .unwrap();
      assert_eq!(parse_hit_ids(&body.hits.hits).unwrap(), vec![101, 102]);
   }

   #[test]
   fn parse_hit_ids_rejects_non_numeric_ids() {
      let hits = vec![Hit { id: "abc".to_string() }];
      assert!(parse_hit_ids(&hits).is_err());
   }

   #[test]
   fn search_request_shape_matches_query_string_api() {
      let request = SearchRequest {
         query: QueryBody { query_string: QueryString { query: "red chair" } },
         size:  20,
      };
      let json = serde_json::to_value(&request).unwrap();
      assert_eq!(json["query"]["query_string"]["query"], "red chair");
      assert_eq!(json["size"], 20);
   }
}
