//! Call orchestration for the RDS Data API.
//!
//! [`RdsData`] builds requests for a [`DataService`] transport, binds
//! parameters from mapped objects or named values, and returns results as
//! [`ResultSet`](rdsdata_api::ResultSet)s ready to be mapped.
//!
//! ```ignore
//! let client = RdsData::builder()
//!     .service(service)
//!     .resource_arn(resource_arn)
//!     .secret_arn(secret_arn)
//!     .build()?;
//!
//! let users: Vec<User> = client
//!     .for_sql("SELECT * FROM users WHERE team = :team")?
//!     .with_named_parameter("team", "core")?
//!     .execute()
//!     .await?
//!     .map_to_list()?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod placeholder;
pub mod service;

pub use rdsdata_api;

pub use client::{RdsData, RdsDataBuilder};
pub use config::ClientConfig;
pub use error::{ClientError, ServiceError};
pub use executor::{Executor, ParameterSet};
pub use service::DataService;
