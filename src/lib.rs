//! Bearer-token interceptor for HTTP clients: attach the stored credential to every request,
//! and recover from a rejected credential by running one shared refresh across all concurrently
//! failing requests before retrying each of them exactly once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod ambient;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod obs;
pub mod refresh;
pub mod store;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::OnceCell as AsyncOnceCell;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
