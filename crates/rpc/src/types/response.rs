use serde::Serialize;

/// The plain `{ "data": ... }` wrapper.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn json(data: T) -> warp::reply::Json {
        warp::reply::json(&Self::new(data))
    }
}

/// The versioned wrapper:
/// `{ "version": ..., "execution_optimistic": "false", "data": ... }`.
/// The gateway only serves finalized data, so the optimistic flag is a
/// constant.
#[derive(Debug, Serialize)]
pub struct VersionedDataResponse<T> {
    pub version: String,
    pub execution_optimistic: &'static str,
    pub data: T,
}

impl<T: Serialize> VersionedDataResponse<T> {
    pub fn new(version: String, data: T) -> Self {
        Self {
            version,
            execution_optimistic: "false",
            data,
        }
    }

    pub fn json(version: String, data: T) -> warp::reply::Json {
        warp::reply::json(&Self::new(version, data))
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub root: alloy_primitives::B256,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: u16,
}
