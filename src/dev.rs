use crate::config::LoaderOptions;
use crate::loader::generate_dev_script;
use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Answers a single virtual path with the development loader.
#[derive(Debug, Clone)]
pub struct DevLoader {
    path: String,
    body: String,
}

impl DevLoader {
    pub fn new(path: impl Into<String>, dev_entry: &str) -> Self {
        Self {
            path: path.into(),
            body: generate_dev_script(dev_entry),
        }
    }

    pub fn from_options(options: &LoaderOptions) -> Self {
        Self::new(options.dev_path.clone(), &options.dev_entry)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Installs the interceptor around every route and fallback of `router`.
    pub fn layer<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(Arc::new(self), intercept))
    }
}

pub async fn intercept(
    State(loader): State<Arc<DevLoader>>,
    request: Request,
    next: Next,
) -> Response {
    let readable = matches!(*request.method(), Method::GET | Method::HEAD);
    if !readable || request.uri().path() != loader.path {
        return next.run(request).await;
    }
    tracing::debug!(path = %loader.path, method = %request.method(), "serving dev loader");
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/javascript"),
        )],
        loader.body.clone(),
    )
        .into_response()
}
