use crate::{
    error::Error,
    service::{StubResponse, StubState, SECURITY_HEADERS},
    util,
};
use futures::channel::oneshot;
use hyper::{
    body,
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
use std::{
    convert::Infallible,
    iter,
    net::SocketAddr,
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};
use tokio::runtime;

/// In-process booking service on an ephemeral local port. Every instance owns
/// its own state; dropping it shuts the server down.
#[derive(Debug)]
pub struct StubServer {
    address: SocketAddr,
    state: Arc<Mutex<StubState>>,
    shutdown: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub fn start() -> Result<Self, Error> {
        let state = Arc::new(Mutex::new(StubState::new()));
        let (address_sender, address_receiver) = mpsc::channel();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();

        let server_state = Arc::clone(&state);
        let join_handle = thread::Builder::new()
            .name("booker-stub".into())
            .spawn(move || {
                let runtime = match runtime::Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = address_sender.send(Err(Error::from(e)));
                        return;
                    }
                };

                runtime.block_on(async move {
                    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
                    let builder = match Server::try_bind(&addr) {
                        Ok(builder) => builder,
                        Err(e) => {
                            let _ = address_sender.send(Err(Error::from(e)));
                            return;
                        }
                    };

                    let server = builder.serve(make_service_fn(move |_| {
                        let state = Arc::clone(&server_state);
                        async move {
                            Ok::<_, Infallible>(service_fn(move |request| {
                                handle_request(Arc::clone(&state), request)
                            }))
                        }
                    }));
                    let _ = address_sender.send(Ok(server.local_addr()));

                    let server = server.with_graceful_shutdown(async move {
                        let _ = shutdown_receiver.await;
                    });
                    if let Err(e) = server.await {
                        tracing::error!(error = %e, "Stub server error");
                    }
                });
            })?;

        let address = address_receiver.recv().map_err(|_| Error::NotStarted)??;
        tracing::debug!(%address, "Stub server listening");

        Ok(Self {
            address,
            state,
            shutdown: Some(shutdown_sender),
            join_handle: Some(join_handle),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Requests received for `path` (query excluded), whatever the method.
    pub fn request_count(&self, path: &str) -> usize {
        self.state().request_count(path)
    }

    pub fn booking_count(&self) -> usize {
        self.state().booking_count()
    }

    /// Answers `method path` with a fixed response until overrides are cleared.
    pub fn override_response(&self, method: Method, path: &str, status_code: u16, body: &str) {
        self.state().override_response(
            method,
            path.into(),
            StubResponse::canned(status_code, body.into()),
        );
    }

    pub fn clear_overrides(&self) {
        self.state().clear_overrides();
    }

    pub fn set_latency(&self, latency: Duration) {
        self.state().set_latency(latency);
    }

    /// Replaces the accepted credentials and invalidates issued tokens.
    pub fn set_credentials<S1: Into<String>, S2: Into<String>>(&self, username: S1, password: S2) {
        self.state().set_credentials(username.into(), password.into());
    }

    // the state stays usable if a handler panicked while holding the lock
    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Some(join_handle) = self.join_handle.take() {
            if join_handle.join().is_err() {
                tracing::error!("Couldn't gracefully shut down the stub server thread");
            }
        }
    }
}

async fn handle_request(
    state: Arc<Mutex<StubState>>,
    request: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    match respond(state, request).await {
        Ok(response) => Ok(response),
        Err(e) => {
            tracing::error!(error = %e, "Stub server failed to answer");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            Ok(response)
        }
    }
}

async fn respond(
    state: Arc<Mutex<StubState>>,
    mut request: Request<Body>,
) -> Result<Response<Body>, Error> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let headers = util::header_strings(request.headers());
    let body = body::to_bytes(request.body_mut())
        .await
        .map_err(|_| Error::InvalidBody)?;
    let body = String::from_utf8_lossy(&body).into_owned();

    let latency = with_state(&state, |state| state.latency())?;
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    let answer = with_state(&state, |state| state.handle(&method, &path, &headers, &body))?;
    tracing::debug!(
        %method,
        path = path.as_str(),
        status_code = answer.status_code,
        "Stub answered"
    );

    let mut response_builder = Response::builder().status(answer.status_code);
    if let Some(header_map) = response_builder.headers_mut() {
        util::put_headers(
            header_map,
            SECURITY_HEADERS
                .iter()
                .copied()
                .chain(iter::once(("Content-Type", answer.content_type))),
        )?;
    }

    Ok(response_builder.body(answer.body.into())?)
}

fn with_state<T, F: FnOnce(&mut StubState) -> T>(
    state: &Mutex<StubState>,
    f: F,
) -> Result<T, Error> {
    let mut guard = state.lock()?;
    Ok(f(&mut guard))
}
