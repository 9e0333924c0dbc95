use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::error::{Error, ErrorKind};

/// API错误类型
pub struct AppError(pub anyhow::Error);

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<Error>().map(Error::kind) {
            Some(ErrorKind::Decode) => StatusCode::BAD_REQUEST,
            Some(ErrorKind::Config) => StatusCode::CONFLICT,
            Some(ErrorKind::Computation) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {:#}", self.0);
        }
        (status, format!("Something went wrong: {}", self.0)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
