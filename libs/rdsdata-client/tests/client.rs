use std::collections::BTreeMap;
use std::sync::Arc;

use rdsdata_api::{ColumnMetadata, Mapped, MappingError, MappingOptions, Row, Value, WireField};
use rdsdata_client::client::ERROR_EMPTY_OR_NULL_SQL;
use rdsdata_client::executor::ERROR_PARAMETERS_ALREADY_SUPPLIED;
use rdsdata_client::placeholder::ERROR_NUMBER_OF_PARAMS_MISMATCH;
use rdsdata_client::service::{
    BatchExecuteStatementRequest, BatchExecuteStatementResponse, BeginTransactionRequest,
    BeginTransactionResponse, DecimalReturnType, EndTransactionRequest, EndTransactionResponse,
    ExecuteStatementRequest, ExecuteStatementResponse, ServiceFuture,
};
use rdsdata_client::{ClientConfig, ClientError, DataService, RdsData, ServiceError};
use tokio::sync::Mutex;

// ═══════════════════════════════════════════════════════════════
// Recording service
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Call {
    Execute(ExecuteStatementRequest),
    Batch(BatchExecuteStatementRequest),
    Begin(BeginTransactionRequest),
    Commit(EndTransactionRequest),
    Rollback(EndTransactionRequest),
}

#[derive(Default)]
struct RecordingService {
    calls: Mutex<Vec<Call>>,
    response: ExecuteStatementResponse,
    failure: Option<ServiceError>,
}

impl RecordingService {
    fn responding(response: ExecuteStatementResponse) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    fn failing(error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    async fn record(&self, call: Call) -> Result<(), ServiceError> {
        self.calls.lock().await.push(call);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }
}

impl DataService for RecordingService {
    fn execute_statement(
        &self,
        request: ExecuteStatementRequest,
    ) -> ServiceFuture<'_, ExecuteStatementResponse> {
        Box::pin(async move {
            self.record(Call::Execute(request)).await?;
            Ok(self.response.clone())
        })
    }

    fn batch_execute_statement(
        &self,
        request: BatchExecuteStatementRequest,
    ) -> ServiceFuture<'_, BatchExecuteStatementResponse> {
        Box::pin(async move {
            self.record(Call::Batch(request)).await?;
            Ok(BatchExecuteStatementResponse::default())
        })
    }

    fn begin_transaction(
        &self,
        request: BeginTransactionRequest,
    ) -> ServiceFuture<'_, BeginTransactionResponse> {
        Box::pin(async move {
            self.record(Call::Begin(request)).await?;
            Ok(BeginTransactionResponse {
                transaction_id: "tx-1".to_string(),
            })
        })
    }

    fn commit_transaction(
        &self,
        request: EndTransactionRequest,
    ) -> ServiceFuture<'_, EndTransactionResponse> {
        Box::pin(async move {
            self.record(Call::Commit(request)).await?;
            Ok(EndTransactionResponse {
                transaction_status: Some("Transaction Committed".to_string()),
            })
        })
    }

    fn rollback_transaction(
        &self,
        request: EndTransactionRequest,
    ) -> ServiceFuture<'_, EndTransactionResponse> {
        Box::pin(async move {
            self.record(Call::Rollback(request)).await?;
            Ok(EndTransactionResponse::default())
        })
    }
}

fn client_for(service: &Arc<RecordingService>) -> RdsData {
    RdsData::builder()
        .service(service.clone())
        .database("app")
        .resource_arn("arn:cluster")
        .secret_arn("arn:secret")
        .build()
        .unwrap()
}

async fn single_request(service: &RecordingService) -> ExecuteStatementRequest {
    match service.calls().await.as_slice() {
        [Call::Execute(request)] => request.clone(),
        other => panic!("expected one execute call, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════

#[derive(Mapped, Default, Debug, PartialEq)]
#[mapping(default)]
pub struct User {
    pub id: i64,
    pub name: String,
}

#[derive(Mapped)]
pub struct Filter {
    id: i64,
    name: String,
    #[allow(dead_code)]
    active: bool,
}

// ═══════════════════════════════════════════════════════════════
// Building requests
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn single_statement_request_carries_client_settings() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    client
        .for_sql("SELECT * FROM users WHERE id = :id")
        .unwrap()
        .with_named_parameter("id", 7i64)
        .unwrap()
        .execute()
        .await
        .unwrap();

    let request = single_request(&service).await;
    assert_eq!(request.resource_arn, "arn:cluster");
    assert_eq!(request.secret_arn, "arn:secret");
    assert_eq!(request.database.as_deref(), Some("app"));
    assert_eq!(request.sql, "SELECT * FROM users WHERE id = :id");
    assert!(request.include_result_metadata);
    assert!(!request.continue_after_timeout);
    assert_eq!(request.transaction_id, None);
    assert_eq!(
        request.result_set_options.map(|o| o.decimal_return_type),
        Some(DecimalReturnType::String)
    );
    assert_eq!(request.parameters.len(), 1);
    assert_eq!(request.parameters[0].name, "id");
    assert_eq!(request.parameters[0].value, WireField::Integer(7));
    assert_eq!(request.parameters[0].type_hint, None);
}

#[tokio::test]
async fn object_parameters_follow_placeholders() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    client
        .for_sql("UPDATE users SET name = :name WHERE id = :id")
        .unwrap()
        .with_parameter(Filter {
            id: 3,
            name: "Ann".into(),
            active: true,
        })
        .execute()
        .await
        .unwrap();

    let request = single_request(&service).await;
    let params: Vec<_> = request
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.value.clone()))
        .collect();
    assert_eq!(
        params,
        vec![
            ("id", WireField::Integer(3)),
            ("name", WireField::Text("Ann".into())),
        ]
    );
}

#[tokio::test]
async fn unknown_placeholder_is_a_mapping_error() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    let err = client
        .for_sql("SELECT * FROM users WHERE team = :team")
        .unwrap()
        .with_parameter(Filter {
            id: 1,
            name: String::new(),
            active: false,
        })
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Mapping(MappingError::FieldNotFound { ref field, .. }) if field == "team"
    ));
    assert!(service.calls().await.is_empty());
}

#[tokio::test]
async fn several_parameter_sets_run_as_batch() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    let users = vec![
        User { id: 1, name: "a".into() },
        User { id: 2, name: "b".into() },
    ];
    let result = client
        .for_sql("INSERT INTO users VALUES (:id, :name)")
        .unwrap()
        .with_param_sets(users)
        .execute()
        .await
        .unwrap();

    assert_eq!(result.number_of_records_updated(), 0);
    assert!(result.rows().is_empty());

    match service.calls().await.as_slice() {
        [Call::Batch(request)] => {
            assert_eq!(request.parameter_sets.len(), 2);
            assert_eq!(request.parameter_sets[1][0].name, "id");
            assert_eq!(request.parameter_sets[1][0].value, WireField::Integer(2));
            assert_eq!(request.parameter_sets[1][1].value, WireField::Text("b".into()));
        }
        other => panic!("expected one batch call, got {other:?}"),
    }
}

#[tokio::test]
async fn one_parameter_set_is_not_a_batch() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    client
        .for_sql("INSERT INTO users VALUES (:id, :name)")
        .unwrap()
        .with_param_sets(vec![User { id: 1, name: "a".into() }])
        .execute()
        .await
        .unwrap();

    let request = single_request(&service).await;
    assert_eq!(request.parameters.len(), 2);
}

#[tokio::test]
async fn map_parameter_sets_are_sent_verbatim() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    let sets = (1..=3i64).map(|id| {
        let mut set = BTreeMap::new();
        set.insert("id".to_string(), Value::from(id));
        set
    });
    client
        .for_sql("DELETE FROM users WHERE id = :id")
        .unwrap()
        .with_map_param_sets(sets)
        .execute()
        .await
        .unwrap();

    match service.calls().await.as_slice() {
        [Call::Batch(request)] => assert_eq!(request.parameter_sets.len(), 3),
        other => panic!("expected one batch call, got {other:?}"),
    }
}

#[tokio::test]
async fn continue_after_timeout_is_forwarded() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    client
        .for_sql("VACUUM")
        .unwrap()
        .with_continue_after_timeout()
        .execute()
        .await
        .unwrap();

    assert!(single_request(&service).await.continue_after_timeout);
}

// ═══════════════════════════════════════════════════════════════
// Argument checks
// ═══════════════════════════════════════════════════════════════

#[test]
fn empty_sql_is_rejected() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    let err = client.for_sql("").unwrap_err();
    assert!(matches!(err, ClientError::Argument(ref m) if m == ERROR_EMPTY_OR_NULL_SQL));

    let err = client.for_sql_with("", vec![]).unwrap_err();
    assert!(matches!(err, ClientError::Argument(ref m) if m == ERROR_EMPTY_OR_NULL_SQL));
}

#[test]
fn named_parameter_after_object_is_rejected() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    let err = client
        .for_sql("SELECT :id")
        .unwrap()
        .with_parameter(User::default())
        .with_named_parameter("id", 1i64)
        .unwrap_err();
    assert!(matches!(err, ClientError::Argument(ref m) if m == ERROR_PARAMETERS_ALREADY_SUPPLIED));
}

#[test]
fn positional_count_mismatch_is_rejected() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    let err = client
        .for_sql_with("SELECT ?, ?", vec![Value::from(1i32)])
        .unwrap_err();
    assert!(matches!(err, ClientError::Argument(ref m) if m == ERROR_NUMBER_OF_PARAMS_MISMATCH));
}

#[test]
fn builder_requires_service_and_arns() {
    let err = RdsData::builder()
        .resource_arn("arn:cluster")
        .secret_arn("arn:secret")
        .build()
        .unwrap_err();
    assert!(matches!(err, ClientError::Argument(_)));

    let err = RdsData::builder()
        .service(Arc::new(RecordingService::default()))
        .resource_arn("arn:cluster")
        .build()
        .unwrap_err();
    assert!(matches!(err, ClientError::Argument(_)));
}

#[tokio::test]
async fn positional_parameters_are_renamed() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    client
        .for_sql_with(
            "SELECT * FROM users WHERE id = ? AND name = ?",
            vec![Value::from(5i64), Value::from("bob")],
        )
        .unwrap()
        .execute()
        .await
        .unwrap();

    let request = single_request(&service).await;
    assert_eq!(request.sql, "SELECT * FROM users WHERE id = :1 AND name = :2");
    assert_eq!(request.parameters[0].name, "1");
    assert_eq!(request.parameters[0].value, WireField::Integer(5));
    assert_eq!(request.parameters[1].name, "2");
    assert_eq!(request.parameters[1].value, WireField::Text("bob".into()));
}

// ═══════════════════════════════════════════════════════════════
// Transactions
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn transaction_lifecycle_passes_through() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    let tx = client.begin_transaction().await.unwrap();
    assert_eq!(tx, "tx-1");

    client
        .for_sql("DELETE FROM users")
        .unwrap()
        .with_transaction_id(tx.clone())
        .execute()
        .await
        .unwrap();
    client.commit_transaction(&tx).await.unwrap();
    client.rollback_transaction(&tx).await.unwrap();

    let calls = service.calls().await;
    assert_eq!(calls.len(), 4);
    match &calls[0] {
        Call::Begin(request) => assert_eq!(request.database.as_deref(), Some("app")),
        other => panic!("expected begin, got {other:?}"),
    }
    match &calls[1] {
        Call::Execute(request) => assert_eq!(request.transaction_id.as_deref(), Some("tx-1")),
        other => panic!("expected execute, got {other:?}"),
    }
    match &calls[2] {
        Call::Commit(request) => assert_eq!(request.transaction_id, "tx-1"),
        other => panic!("expected commit, got {other:?}"),
    }
    assert!(matches!(&calls[3], Call::Rollback(request) if request.transaction_id == "tx-1"));
}

#[tokio::test]
async fn empty_transaction_id_is_omitted() {
    let service = Arc::new(RecordingService::default());
    let client = client_for(&service);

    client
        .for_sql("SELECT 1")
        .unwrap()
        .with_transaction_id("")
        .execute()
        .await
        .unwrap();

    assert_eq!(single_request(&service).await.transaction_id, None);
}

#[tokio::test]
async fn service_failure_is_reported() {
    let service = Arc::new(RecordingService::failing(
        ServiceError::new("cluster is paused").with_code("BadRequestException"),
    ));
    let client = client_for(&service);

    let err = client.begin_transaction().await.unwrap_err();
    match err {
        ClientError::Service(e) => {
            assert_eq!(e.code.as_deref(), Some("BadRequestException"));
            assert_eq!(e.to_string(), "cluster is paused");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════
// Results
// ═══════════════════════════════════════════════════════════════

fn users_response() -> ExecuteStatementResponse {
    ExecuteStatementResponse {
        column_metadata: vec![
            ColumnMetadata::new("user_id").with_label("id"),
            ColumnMetadata::new("user_name").with_label("name"),
        ],
        records: vec![
            Row::new(vec![WireField::Integer(1), WireField::Text("ann".into())]),
            Row::new(vec![WireField::Integer(2), WireField::Text("bob".into())]),
        ],
        number_of_records_updated: 0,
    }
}

#[tokio::test]
async fn results_map_with_client_options() {
    let service = Arc::new(RecordingService::responding(users_response()));
    let client = client_for(&service)
        .with_mapping_options(MappingOptions::DEFAULT.with_use_label_for_mapping(true));

    let users: Vec<User> = client
        .for_sql("SELECT user_id AS id, user_name AS name FROM users")
        .unwrap()
        .execute()
        .await
        .unwrap()
        .map_to_list()
        .unwrap();

    assert_eq!(
        users,
        vec![
            User { id: 1, name: "ann".into() },
            User { id: 2, name: "bob".into() },
        ]
    );

    let count: i64 = client
        .for_sql("SELECT count(*) FROM users")
        .unwrap()
        .execute()
        .await
        .unwrap()
        .single_value()
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn results_without_labels_use_column_names() {
    let service = Arc::new(RecordingService::responding(users_response()));
    let client = client_for(&service);

    let err = client
        .for_sql("SELECT user_id AS id, user_name AS name FROM users")
        .unwrap()
        .execute()
        .await
        .unwrap()
        .map_to_single::<User>()
        .unwrap_err();

    assert!(matches!(err, MappingError::NoFieldOrSetter { ref field, .. } if field == "user_id"));
}

// ═══════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════

#[test]
fn client_from_config() {
    let config = ClientConfig::parse(
        r#"
        resource_arn = "arn:cluster"
        secret_arn = "arn:secret"

        [mapping]
        ignore_missing_setters = true
        "#,
    )
    .unwrap();
    let client = RdsData::from_config(config, Arc::new(RecordingService::default())).unwrap();

    assert_eq!(client.database(), None);
    assert!(client.mapping_options().ignore_missing_setters);
}
