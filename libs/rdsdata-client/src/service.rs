use std::future::Future;
use std::pin::Pin;

use rdsdata_api::{ColumnMetadata, Row, SqlParameter, WireField};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// ════════════════════════════════════════════════════════════════
//  Request / response schema
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecimalReturnType {
    String,
    DoubleOrLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetOptions {
    pub decimal_return_type: DecimalReturnType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStatementRequest {
    pub resource_arn: String,
    pub secret_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub sql: String,
    #[serde(default)]
    pub parameters: Vec<SqlParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub continue_after_timeout: bool,
    #[serde(default)]
    pub include_result_metadata: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set_options: Option<ResultSetOptions>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStatementResponse {
    #[serde(default)]
    pub column_metadata: Vec<ColumnMetadata>,
    #[serde(default)]
    pub records: Vec<Row>,
    #[serde(default)]
    pub number_of_records_updated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExecuteStatementRequest {
    pub resource_arn: String,
    pub secret_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub sql: String,
    #[serde(default)]
    pub parameter_sets: Vec<Vec<SqlParameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    #[serde(default)]
    pub generated_fields: Vec<WireField>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExecuteStatementResponse {
    #[serde(default)]
    pub update_results: Vec<UpdateResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginTransactionRequest {
    pub resource_arn: String,
    pub secret_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginTransactionResponse {
    pub transaction_id: String,
}

/// Request shape shared by commit and rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndTransactionRequest {
    pub resource_arn: String,
    pub secret_arn: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndTransactionResponse {
    #[serde(default)]
    pub transaction_status: Option<String>,
}

// ════════════════════════════════════════════════════════════════
//  Transport
// ════════════════════════════════════════════════════════════════

pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// The remote SQL execution API.
///
/// Implemented over whatever transport carries the calls (HTTP client,
/// SDK, in-memory fake). Timeouts and retries belong to the implementation.
pub trait DataService: Send + Sync {
    fn execute_statement(
        &self,
        request: ExecuteStatementRequest,
    ) -> ServiceFuture<'_, ExecuteStatementResponse>;

    fn batch_execute_statement(
        &self,
        request: BatchExecuteStatementRequest,
    ) -> ServiceFuture<'_, BatchExecuteStatementResponse>;

    fn begin_transaction(
        &self,
        request: BeginTransactionRequest,
    ) -> ServiceFuture<'_, BeginTransactionResponse>;

    fn commit_transaction(
        &self,
        request: EndTransactionRequest,
    ) -> ServiceFuture<'_, EndTransactionResponse>;

    fn rollback_transaction(
        &self,
        request: EndTransactionRequest,
    ) -> ServiceFuture<'_, EndTransactionResponse>;
}
