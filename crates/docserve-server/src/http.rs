use bytes::Bytes;
use docserve_http::{Handler, Request, Response};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::StatusCode;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::error::{Result, ServerError};
use crate::shutdown::ShutdownCoordinator;

/// Largest request body accepted before answering 413 Payload Too Large
pub const MAX_REQUEST_BODY: usize = 64 * 1024;

/// HTTP/1.1 server driving a single [`Handler`]
pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	/// Create a new server with the given handler
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use docserve_server::HttpServer;
	/// use docserve_http::{Handler, Request, Response};
	///
	/// struct MyHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for MyHandler {
	///     async fn handle(&self, _req: Request) -> docserve_http::Result<Response> {
	///         Ok(Response::ok().with_body("Hello"))
	///     }
	/// }
	///
	/// let server = HttpServer::new(Arc::new(MyHandler));
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	/// Get a clone of the server's handler
	pub fn handler(&self) -> Arc<dyn Handler> {
		Arc::clone(&self.handler)
	}

	/// Bind `addr` and serve until `coordinator` signals shutdown
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use std::net::SocketAddr;
	/// use std::time::Duration;
	/// use docserve_server::{HttpServer, ShutdownCoordinator};
	/// use docserve_http::{Handler, Request, Response};
	///
	/// struct MyHandler;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for MyHandler {
	///     async fn handle(&self, _req: Request) -> docserve_http::Result<Response> {
	///         Ok(Response::ok())
	///     }
	/// }
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let server = HttpServer::new(Arc::new(MyHandler));
	/// let addr: SocketAddr = "127.0.0.1:8080".parse()?;
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
	/// server.listen_with_shutdown(addr, coordinator).await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		coordinator: ShutdownCoordinator,
	) -> Result<()> {
		let listener = bind(addr).await?;
		self.serve_listener(listener, coordinator).await
	}

	/// Serve connections from an already bound listener until shutdown
	pub async fn serve_listener(
		self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> Result<()> {
		if let Ok(local) = listener.local_addr() {
			tracing::info!(addr = %local, "server listening");
		}

		let mut shutdown_rx = coordinator.subscribe();
		if coordinator.is_shutting_down() {
			coordinator.notify_shutdown_complete();
			return Ok(());
		}

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, socket_addr) = result.map_err(ServerError::Accept)?;
					let handler = self.handler();
					let guard = coordinator.connection_guard();
					let conn_shutdown = coordinator.subscribe();

					tokio::task::spawn(async move {
						let _guard = guard;
						if let Err(e) =
							Self::handle_connection(stream, socket_addr, handler, conn_shutdown).await
						{
							tracing::debug!(peer = %socket_addr, error = %e, "connection error");
						}
					});
				}
				_ = shutdown_rx.recv() => {
					tracing::info!("shutdown signal received, no longer accepting connections");
					break;
				}
			}
		}

		coordinator.notify_shutdown_complete();
		Ok(())
	}

	/// Serve HTTP/1.1 requests on one TCP connection.
	///
	/// When `shutdown` fires, the connection finishes the request in flight
	/// and then closes instead of waiting for the next one.
	pub async fn handle_connection(
		stream: TcpStream,
		socket_addr: SocketAddr,
		handler: Arc<dyn Handler>,
		mut shutdown: broadcast::Receiver<()>,
	) -> Result<()> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			remote_addr: socket_addr,
		};

		let conn = http1::Builder::new().serve_connection(io, service);
		tokio::pin!(conn);

		tokio::select! {
			result = conn.as_mut() => return Ok(result?),
			_ = shutdown.recv() => conn.as_mut().graceful_shutdown(),
		}
		conn.await?;
		Ok(())
	}
}

async fn bind(addr: SocketAddr) -> Result<TcpListener> {
	TcpListener::bind(addr)
		.await
		.map_err(|source| ServerError::Bind { addr, source })
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<
		Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send + 'static>,
	>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = Arc::clone(&self.handler);
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();

			// Refuse a declared oversized body before reading any of it
			if body.size_hint().lower() > MAX_REQUEST_BODY as u64 {
				tracing::warn!(
					peer = %remote_addr,
					declared = body.size_hint().lower(),
					"request body too large"
				);
				return Ok(into_hyper(payload_too_large())?);
			}

			let body = match Limited::new(body, MAX_REQUEST_BODY).collect().await {
				Ok(collected) => collected.to_bytes(),
				Err(e) if e.is::<LengthLimitError>() => {
					tracing::warn!(peer = %remote_addr, "request body exceeded limit");
					return Ok(into_hyper(payload_too_large())?);
				}
				Err(e) => return Err(e),
			};

			let request = Request {
				method: parts.method,
				uri: parts.uri,
				version: parts.version,
				headers: parts.headers,
				body,
				remote_addr: Some(remote_addr),
			};
			let method = request.method.clone();
			let path = request.path().to_string();

			let response = match handler.handle(request).await {
				Ok(response) => response,
				Err(e) => {
					tracing::error!(path = %path, error = %e, "handler failed");
					Response::internal_server_error()
				}
			};
			tracing::debug!(
				peer = %remote_addr,
				method = %method,
				path = %path,
				status = response.status.as_u16(),
				"request handled"
			);

			Ok(into_hyper(response)?)
		})
	}
}

fn payload_too_large() -> Response {
	Response::new(StatusCode::PAYLOAD_TOO_LARGE).with_body("Request body too large")
}

fn into_hyper(
	response: Response,
) -> std::result::Result<hyper::Response<Full<Bytes>>, hyper::http::Error> {
	let mut hyper_response = hyper::Response::builder().status(response.status);
	for (key, value) in response.headers.iter() {
		hyper_response = hyper_response.header(key, value);
	}
	hyper_response.body(Full::new(response.body))
}

#[cfg(test)]
mod tests {
	use super::*;

	struct TestHandler;

	#[async_trait::async_trait]
	impl Handler for TestHandler {
		async fn handle(&self, _request: Request) -> docserve_http::Result<Response> {
			Ok(Response::ok().with_body("Hello, World!"))
		}
	}

	#[tokio::test]
	async fn test_http_server_handler_is_shared() {
		let handler: Arc<dyn Handler> = Arc::new(TestHandler);
		let server = HttpServer::new(Arc::clone(&handler));
		assert!(Arc::ptr_eq(&server.handler(), &handler));
	}

	#[tokio::test]
	async fn test_bind_error_names_address() {
		let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = taken.local_addr().unwrap();

		match bind(addr).await {
			Err(ServerError::Bind { addr: failed, .. }) => assert_eq!(failed, addr),
			other => panic!("expected bind failure, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_serve_listener_returns_when_already_shut_down() {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let coordinator = ShutdownCoordinator::new(std::time::Duration::from_secs(1));
		coordinator.shutdown();

		HttpServer::new(Arc::new(TestHandler))
			.serve_listener(listener, coordinator.clone())
			.await
			.unwrap();
		assert!(!coordinator.is_accepting());
	}
}
