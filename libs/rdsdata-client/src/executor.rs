use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rdsdata_api::reader::{ObjectParameters, Parameters, encode_map};
use rdsdata_api::schema::Mapped;
use rdsdata_api::{ResultSet, SqlParameter, Value};

use crate::client::RdsData;
use crate::error::ClientError;
use crate::placeholder::find_named;

pub const ERROR_PARAMETERS_ALREADY_SUPPLIED: &str = "Parameters are already supplied";

/// One set of values for a single execution of a statement.
pub enum ParameterSet {
    /// Values read out of a mapped object, one per `:name` placeholder.
    Object(Box<dyn ObjectParameters>),
    /// Values bound by name, sent as is.
    Map(BTreeMap<String, Value>),
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSet::Object(_) => f.write_str("Object(..)"),
            ParameterSet::Map(map) => f.debug_tuple("Map").field(map).finish(),
        }
    }
}

impl ParameterSet {
    fn encode(&self, placeholders: &BTreeSet<String>) -> Result<Parameters, ClientError> {
        let params = match self {
            ParameterSet::Object(object) => object.read_parameters(placeholders)?,
            ParameterSet::Map(map) => encode_map(map)?,
        };
        Ok(params)
    }
}

/// Call builder for one SQL statement.
///
/// One parameter set (or none) runs a single statement; more than one runs
/// a batch.
#[derive(Debug)]
pub struct Executor<'a> {
    sql: String,
    client: &'a RdsData,
    param_sets: Vec<ParameterSet>,
    transaction_id: Option<String>,
    continue_after_timeout: bool,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(sql: String, client: &'a RdsData) -> Self {
        Self {
            sql,
            client,
            param_sets: Vec::new(),
            transaction_id: None,
            continue_after_timeout: false,
        }
    }

    pub(crate) fn with_sets(mut self, sets: Vec<ParameterSet>) -> Self {
        self.param_sets = sets;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Uses `param` as the only parameter set.
    pub fn with_parameter<T: Mapped + Send + Sync>(self, param: T) -> Self {
        self.with_sets(vec![ParameterSet::Object(Box::new(param))])
    }

    /// Uses each of `params` as a parameter set.
    pub fn with_param_sets<T: Mapped + Send + Sync>(self, params: impl IntoIterator<Item = T>) -> Self {
        let sets = params
            .into_iter()
            .map(|p| ParameterSet::Object(Box::new(p) as Box<dyn ObjectParameters>))
            .collect();
        self.with_sets(sets)
    }

    pub fn with_map_param_sets(self, params: impl IntoIterator<Item = BTreeMap<String, Value>>) -> Self {
        let sets = params.into_iter().map(ParameterSet::Map).collect();
        self.with_sets(sets)
    }

    /// Binds one named value in the first parameter set.
    ///
    /// Cannot be combined with object parameter sets.
    pub fn with_named_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ClientError> {
        if self.param_sets.is_empty() {
            self.param_sets.push(ParameterSet::Map(BTreeMap::new()));
        }
        match self.param_sets.first_mut() {
            Some(ParameterSet::Map(map)) => {
                map.insert(name.into(), value.into());
                Ok(self)
            }
            _ => Err(ClientError::argument(ERROR_PARAMETERS_ALREADY_SUPPLIED)),
        }
    }

    /// Runs inside `transaction_id`. An empty id means no transaction.
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        let id = transaction_id.into();
        self.transaction_id = (!id.is_empty()).then_some(id);
        self
    }

    pub fn with_continue_after_timeout(mut self) -> Self {
        self.continue_after_timeout = true;
        self
    }

    pub async fn execute(&self) -> Result<ResultSet, ClientError> {
        if self.param_sets.len() > 1 {
            self.execute_as_batch().await
        } else {
            self.execute_as_single().await
        }
    }

    async fn execute_as_batch(&self) -> Result<ResultSet, ClientError> {
        let placeholders = find_named(&self.sql);
        let sets = self
            .param_sets
            .iter()
            .map(|set| set.encode(&placeholders).map(to_sql_parameters))
            .collect::<Result<Vec<_>, _>>()?;
        self.client
            .batch_execute_statement(self.transaction_id.clone(), &self.sql, sets)
            .await
    }

    async fn execute_as_single(&self) -> Result<ResultSet, ClientError> {
        let parameters = match self.param_sets.first() {
            Some(set) => to_sql_parameters(set.encode(&find_named(&self.sql))?),
            None => Vec::new(),
        };
        self.client
            .execute_statement(
                self.transaction_id.clone(),
                &self.sql,
                parameters,
                self.continue_after_timeout,
            )
            .await
    }
}

fn to_sql_parameters(params: Parameters) -> Vec<SqlParameter> {
    params
        .into_iter()
        .map(|(name, value)| SqlParameter::new(name, value))
        .collect()
}
