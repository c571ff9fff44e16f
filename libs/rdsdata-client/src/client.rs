use std::fmt;
use std::sync::Arc;

use rdsdata_api::{MappingOptions, ResultSet, SqlParameter, Value};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::executor::{Executor, ParameterSet};
use crate::placeholder::convert_to_named;
use crate::service::{
    BatchExecuteStatementRequest, BeginTransactionRequest, DataService, DecimalReturnType,
    EndTransactionRequest, ExecuteStatementRequest, ResultSetOptions,
};

pub const ERROR_EMPTY_OR_NULL_SQL: &str = "SQL parameter is null or empty";

/// Entry point for running SQL against one database cluster.
///
/// Cheap to clone; clones share the underlying [`DataService`].
#[derive(Clone)]
pub struct RdsData {
    service: Arc<dyn DataService>,
    database: Option<String>,
    resource_arn: String,
    secret_arn: String,
    mapping_options: MappingOptions,
}

impl fmt::Debug for RdsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdsData")
            .field("database", &self.database)
            .field("resource_arn", &self.resource_arn)
            .field("secret_arn", &self.secret_arn)
            .field("mapping_options", &self.mapping_options)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct RdsDataBuilder {
    service: Option<Arc<dyn DataService>>,
    database: Option<String>,
    resource_arn: Option<String>,
    secret_arn: Option<String>,
    mapping_options: MappingOptions,
}

impl RdsDataBuilder {
    pub fn service(mut self, service: Arc<dyn DataService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn resource_arn(mut self, arn: impl Into<String>) -> Self {
        self.resource_arn = Some(arn.into());
        self
    }

    pub fn secret_arn(mut self, arn: impl Into<String>) -> Self {
        self.secret_arn = Some(arn.into());
        self
    }

    pub fn mapping_options(mut self, options: MappingOptions) -> Self {
        self.mapping_options = options;
        self
    }

    pub fn build(self) -> Result<RdsData, ClientError> {
        let service = self
            .service
            .ok_or_else(|| ClientError::argument("data service is not set"))?;
        let resource_arn = self
            .resource_arn
            .filter(|arn| !arn.is_empty())
            .ok_or_else(|| ClientError::argument("resource ARN is not set"))?;
        let secret_arn = self
            .secret_arn
            .filter(|arn| !arn.is_empty())
            .ok_or_else(|| ClientError::argument("secret ARN is not set"))?;

        Ok(RdsData {
            service,
            database: self.database,
            resource_arn,
            secret_arn,
            mapping_options: self.mapping_options,
        })
    }
}

impl RdsData {
    pub fn builder() -> RdsDataBuilder {
        RdsDataBuilder::default()
    }

    pub fn from_config(
        config: ClientConfig,
        service: Arc<dyn DataService>,
    ) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .service(service)
            .resource_arn(config.resource_arn)
            .secret_arn(config.secret_arn)
            .mapping_options(config.mapping);
        if let Some(database) = config.database {
            builder = builder.database(database);
        }
        builder.build()
    }

    /// Copy of this client that maps results with `options`.
    pub fn with_mapping_options(&self, options: MappingOptions) -> Self {
        Self {
            mapping_options: options,
            ..self.clone()
        }
    }

    pub fn mapping_options(&self) -> MappingOptions {
        self.mapping_options
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Starts building a call for `sql`. Named placeholders (`:name`) are
    /// bound through the returned [`Executor`].
    pub fn for_sql(&self, sql: &str) -> Result<Executor<'_>, ClientError> {
        if sql.is_empty() {
            return Err(ClientError::argument(ERROR_EMPTY_OR_NULL_SQL));
        }
        Ok(Executor::new(sql.to_string(), self))
    }

    /// Starts building a call for `sql` with positional `?` placeholders,
    /// bound to `params` in order.
    pub fn for_sql_with(&self, sql: &str, params: Vec<Value>) -> Result<Executor<'_>, ClientError> {
        if sql.is_empty() {
            return Err(ClientError::argument(ERROR_EMPTY_OR_NULL_SQL));
        }
        let (named_sql, bound) = convert_to_named(sql, params)?;
        Ok(Executor::new(named_sql, self).with_sets(vec![ParameterSet::Map(bound)]))
    }

    /// Starts a transaction and returns its id.
    pub async fn begin_transaction(&self) -> Result<String, ClientError> {
        let request = BeginTransactionRequest {
            resource_arn: self.resource_arn.clone(),
            secret_arn: self.secret_arn.clone(),
            database: self.database.clone(),
        };
        let response = self.service.begin_transaction(request).await?;
        tracing::info!(transaction_id = %response.transaction_id, "transaction started");
        Ok(response.transaction_id)
    }

    pub async fn commit_transaction(&self, transaction_id: &str) -> Result<(), ClientError> {
        let response = self
            .service
            .commit_transaction(self.end_request(transaction_id))
            .await?;
        tracing::info!(
            transaction_id = %transaction_id,
            status = response.transaction_status.as_deref().unwrap_or(""),
            "transaction committed"
        );
        Ok(())
    }

    pub async fn rollback_transaction(&self, transaction_id: &str) -> Result<(), ClientError> {
        let response = self
            .service
            .rollback_transaction(self.end_request(transaction_id))
            .await?;
        tracing::info!(
            transaction_id = %transaction_id,
            status = response.transaction_status.as_deref().unwrap_or(""),
            "transaction rolled back"
        );
        Ok(())
    }

    fn end_request(&self, transaction_id: &str) -> EndTransactionRequest {
        EndTransactionRequest {
            resource_arn: self.resource_arn.clone(),
            secret_arn: self.secret_arn.clone(),
            transaction_id: transaction_id.to_string(),
        }
    }

    pub(crate) async fn execute_statement(
        &self,
        transaction_id: Option<String>,
        sql: &str,
        parameters: Vec<SqlParameter>,
        continue_after_timeout: bool,
    ) -> Result<ResultSet, ClientError> {
        tracing::debug!(
            sql = %sql,
            params = parameters.len(),
            in_transaction = transaction_id.is_some(),
            "execute statement"
        );
        let request = ExecuteStatementRequest {
            resource_arn: self.resource_arn.clone(),
            secret_arn: self.secret_arn.clone(),
            database: self.database.clone(),
            sql: sql.to_string(),
            parameters,
            transaction_id,
            continue_after_timeout,
            include_result_metadata: true,
            result_set_options: Some(ResultSetOptions {
                decimal_return_type: DecimalReturnType::String,
            }),
        };
        let response = self.service.execute_statement(request).await?;
        tracing::debug!(
            rows = response.records.len(),
            updated = response.number_of_records_updated,
            "statement executed"
        );
        Ok(ResultSet::new(
            response.column_metadata,
            response.records,
            response.number_of_records_updated,
            self.mapping_options,
        ))
    }

    pub(crate) async fn batch_execute_statement(
        &self,
        transaction_id: Option<String>,
        sql: &str,
        parameter_sets: Vec<Vec<SqlParameter>>,
    ) -> Result<ResultSet, ClientError> {
        tracing::debug!(
            sql = %sql,
            sets = parameter_sets.len(),
            in_transaction = transaction_id.is_some(),
            "batch execute statement"
        );
        let request = BatchExecuteStatementRequest {
            resource_arn: self.resource_arn.clone(),
            secret_arn: self.secret_arn.clone(),
            database: self.database.clone(),
            sql: sql.to_string(),
            parameter_sets,
            transaction_id,
        };
        self.service.batch_execute_statement(request).await?;
        Ok(ResultSet::empty(0, self.mapping_options))
    }
}
