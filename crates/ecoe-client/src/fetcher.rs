//! The resource fetcher contract and typed helpers on top of it.

use std::future::Future;

use ecoe_model::ResourceKind;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::query::Query;

/// A raw resource record as returned by the API.
pub type Record = Value;

/// Issues filtered queries and CRUD calls against the resource API.
///
/// Implementations attach credentials and handle transport; callers only see
/// records and [`RequestError`](crate::RequestError)s. Every method is a
/// suspension point: the returned future resolves once the server answered.
pub trait ResourceFetcher {
    /// Every record of `kind` matching `query`.
    fn get_resources(
        &self,
        kind: ResourceKind,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Record>>>;

    /// Create a record under `route` (e.g. `question` or
    /// `qblock/4/questions`). The server assigns the id.
    fn create_resource(&self, route: &str, body: Record) -> impl Future<Output = Result<Record>>;

    /// Apply a partial update to the record at `uri`.
    fn update_resource(&self, uri: &str, body: Record) -> impl Future<Output = Result<Record>>;

    /// Delete the record (or relation member) at `uri`.
    fn delete_resource(&self, uri: &str) -> impl Future<Output = Result<()>>;
}

impl<F: ResourceFetcher> ResourceFetcher for &F {
    fn get_resources(
        &self,
        kind: ResourceKind,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Record>>> {
        (**self).get_resources(kind, query)
    }

    fn create_resource(&self, route: &str, body: Record) -> impl Future<Output = Result<Record>> {
        (**self).create_resource(route, body)
    }

    fn update_resource(&self, uri: &str, body: Record) -> impl Future<Output = Result<Record>> {
        (**self).update_resource(uri, body)
    }

    fn delete_resource(&self, uri: &str) -> impl Future<Output = Result<()>> {
        (**self).delete_resource(uri)
    }
}

/// Fetch and decode every record of `kind` matching `query`.
pub async fn fetch_all<T, F>(fetcher: &F, kind: ResourceKind, query: &Query) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: ResourceFetcher,
{
    let records = fetcher.get_resources(kind, query).await?;
    tracing::debug!(%kind, count = records.len(), "fetched records");
    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(Into::into))
        .collect()
}

/// Create a record from a typed body and decode the server's answer.
pub async fn create<T, B, F>(fetcher: &F, route: &str, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize,
    F: ResourceFetcher,
{
    let body = serde_json::to_value(body)?;
    let record = fetcher.create_resource(route, body).await?;
    Ok(serde_json::from_value(record)?)
}

/// Update a record from a typed body and decode the server's answer.
pub async fn update<T, B, F>(fetcher: &F, uri: &str, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize,
    F: ResourceFetcher,
{
    let body = serde_json::to_value(body)?;
    let record = fetcher.update_resource(uri, body).await?;
    Ok(serde_json::from_value(record)?)
}
