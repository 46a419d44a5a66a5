use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::{FromRedisValue, Value as RedisValue};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::StoreError;
use crate::store::{
    path_field, DocumentStore, FieldFilter, FieldKind, IndexSchema, Lease, SearchDocument,
    SearchQuery,
};

const RELEASE_LEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

/// [`DocumentStore`] over Redis with the RedisJSON and RediSearch modules.
pub struct RedisDocumentStore {
    pool: Pool,
    timeout: Duration,
}

impl RedisDocumentStore {
    pub async fn new(config: &AppConfig) -> Result<Self, StoreError> {
        let redis_url = config.redis_url_or_default();

        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Pool(format!("Pool creation error: {}", e)))?;

        let store = Self {
            pool,
            timeout: config.store_timeout(),
        };

        // Test connection
        let pong: String = store.query("PING", redis::cmd("PING")).await?;
        debug!("Redis answered {}", pong);
        info!("Redis document store initialized successfully");

        Ok(store)
    }

    async fn get_connection(&self) -> Result<Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to get Redis connection: {}", e)))
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout {
                operation,
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }

    async fn query<T: FromRedisValue>(
        &self,
        operation: &'static str,
        cmd: redis::Cmd,
    ) -> Result<T, StoreError> {
        self.timed(operation, async {
            let mut conn = self.get_connection().await?;
            let value: T = cmd.query_async(&mut conn).await?;
            Ok(value)
        })
        .await
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut cmd = redis::cmd("JSON.GET");
        cmd.arg(key);

        let raw: Option<String> = self.query("JSON.GET", cmd).await?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn set(&self, key: &str, path: &str, document: &Value) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("JSON.SET");
        cmd.arg(key).arg(path).arg(serde_json::to_string(document)?);

        let reply: Option<String> = self.query("JSON.SET", cmd).await?;
        if reply.is_none() {
            // Nil means the parent of a non-root path does not exist.
            return Err(StoreError::MissingDocument(key.to_string()));
        }
        Ok(())
    }

    async fn arr_append(&self, key: &str, path: &str, element: &Value) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("JSON.ARRAPPEND");
        cmd.arg(key).arg(path).arg(serde_json::to_string(element)?);

        let _: RedisValue = self.query("JSON.ARRAPPEND", cmd).await?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut cmd = redis::cmd("KEYS");
        cmd.arg(pattern);

        self.query("KEYS", cmd).await
    }

    async fn mget(&self, keys: &[String], path: &str) -> Result<Vec<Option<Value>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("JSON.MGET");
        cmd.arg(keys).arg(legacy_path(path)?);

        let raw: Vec<Option<String>> = self.query("JSON.MGET", cmd).await?;
        raw.into_iter()
            .map(|item| item.map(|json| serde_json::from_str(&json)).transpose())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    async fn search(
        &self,
        index: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchDocument>, StoreError> {
        let rendered = render_query(query);
        debug!("FT.SEARCH {} {}", index, rendered);

        let mut cmd = redis::cmd("FT.SEARCH");
        cmd.arg(index)
            .arg(&rendered)
            .arg("LIMIT")
            .arg(query.offset)
            .arg(query.limit);

        let reply = self
            .timed("FT.SEARCH", async {
                let mut conn = self.get_connection().await?;
                cmd.query_async::<_, RedisValue>(&mut conn)
                    .await
                    .map_err(|e| StoreError::Search(e.to_string()))
            })
            .await?;

        parse_search_reply(reply)
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("FT.CREATE");
        cmd.arg(&schema.name)
            .arg("ON")
            .arg("JSON")
            .arg("PREFIX")
            .arg(1)
            .arg(&schema.prefix)
            .arg("SCHEMA");
        for field in &schema.fields {
            cmd.arg(&field.path).arg("AS").arg(&field.alias).arg(match field.kind {
                FieldKind::Tag => "TAG",
                FieldKind::Text => "TEXT",
            });
        }

        match self.query::<String>("FT.CREATE", cmd).await {
            Ok(_) => {
                info!("Created search index {}", schema.name);
                Ok(())
            }
            Err(StoreError::Redis(e)) if e.to_string().contains("Index already exists") => {
                debug!("Search index {} already exists", schema.name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn acquire_lease(&self, key: &str, ttl: Duration) -> Result<Option<Lease>, StoreError> {
        let lease_id = Uuid::new_v4().to_string();

        let mut cmd = redis::cmd("SET");
        cmd.arg(key)
            .arg(&lease_id)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64);

        let reply: Option<String> = self.query("SET NX", cmd).await?;
        Ok(reply.map(|_| Lease {
            key: key.to_string(),
            id: lease_id,
        }))
    }

    async fn release_lease(&self, lease: &Lease) -> Result<(), StoreError> {
        let script = redis::Script::new(RELEASE_LEASE_SCRIPT);

        let released: i64 = self
            .timed("EVALSHA", async {
                let mut conn = self.get_connection().await?;
                let released: i64 = script
                    .key(&lease.key)
                    .arg(&lease.id)
                    .invoke_async(&mut conn)
                    .await?;
                Ok(released)
            })
            .await?;

        if released == 0 {
            debug!("Lease {} on {} had already expired", lease.id, lease.key);
        }
        Ok(())
    }
}

/// `JSON.MGET` returns arrays for `$` paths; the legacy form returns the value.
fn legacy_path(path: &str) -> Result<String, StoreError> {
    Ok(match path_field(path)? {
        None => ".".to_string(),
        Some(field) => format!(".{}", field),
    })
}

pub(crate) fn render_query(query: &SearchQuery) -> String {
    let mut parts: Vec<String> = query.all.iter().map(render_filter).collect();

    if !query.any.is_empty() {
        let alternatives: Vec<String> = query.any.iter().map(render_filter).collect();
        parts.push(format!("({})", alternatives.join(" | ")));
    }

    if parts.is_empty() {
        "*".to_string()
    } else {
        parts.join(" ")
    }
}

fn render_filter(filter: &FieldFilter) -> String {
    let value = escape_query_value(&filter.value);
    match filter.kind {
        FieldKind::Tag => format!("@{}:{{{}}}", filter.field, value),
        FieldKind::Text => format!("@{}:({})", filter.field, value),
    }
}

fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if !(c.is_alphanumeric() || c == '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reply layout: `[total, key, [field, value, ...], key, [...], ...]`. JSON
/// indexes return the whole document under the `$` field.
pub(crate) fn parse_search_reply(reply: RedisValue) -> Result<Vec<SearchDocument>, StoreError> {
    let items = match reply {
        RedisValue::Bulk(items) => items,
        other => {
            return Err(StoreError::Search(format!(
                "Unexpected FT.SEARCH reply: {:?}",
                other
            )))
        }
    };

    let mut documents = Vec::new();
    let mut entries = items.into_iter().skip(1);

    while let Some(key) = entries.next() {
        let id: String = redis::from_redis_value(&key)?;
        let fields = match entries.next() {
            Some(RedisValue::Bulk(fields)) => fields,
            _ => continue,
        };

        for pair in fields.chunks(2) {
            if let [name, raw] = pair {
                let name: String = redis::from_redis_value(name)?;
                if name == "$" {
                    let json: String = redis::from_redis_value(raw)?;
                    documents.push(SearchDocument {
                        id: id.clone(),
                        value: serde_json::from_str(&json)?,
                    });
                }
            }
        }
    }

    Ok(documents)
}
