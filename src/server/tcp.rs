//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor TCP que atiende cada conexión en su propio thread. El thread
//! principal queda bloqueado en la secuencia de apagado del
//! [`ShutdownCoordinator`](crate::shutdown::ShutdownCoordinator): `run()`
//! retorna cuando se pidió el drenado y terminaron todos los jobs pendientes.

use crate::config::Config;
use crate::error::ServerError;
use crate::http::{Request, Response, StatusCode};
use crate::jobs::handlers as job_handlers;
use crate::router::Router;
use crate::service::HashService;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Tamaño de cada lectura del socket
const READ_CHUNK: usize = 4096;

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    config: Config,
    router: Arc<Router>,
    service: Arc<HashService>,
    listener: TcpListener,
}

/// Límites aplicados a cada conexión
#[derive(Debug, Clone, Copy)]
struct ConnectionLimits {
    max_request_bytes: usize,
    read_timeout: Duration,
}

/// Resultado de leer un request del socket
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// El peer cerró sin enviar nada
    Closed,
    TooLarge,
    Complete(Vec<u8>),
}

impl Server {
    /// Valida la configuración, arma el router y hace bind del listener
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        Self::with_service(config, Arc::new(HashService::new()))
    }

    /// Igual que [`Server::bind`] pero con un servicio ya construido
    pub fn with_service(config: Config, service: Arc<HashService>) -> Result<Self, ServerError> {
        config.validate()?;

        let mut router = Router::new();
        job_handlers::register_routes(&mut router)?;

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;

        log::info!("Server listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            router: Arc::new(router),
            service,
            listener,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn service(&self) -> Arc<HashService> {
        Arc::clone(&self.service)
    }

    /// Atiende conexiones hasta completar el drenado
    ///
    /// El accept loop corre en su propio thread; este método bloquea hasta que
    /// se pidió `/shutdown` y no quedan jobs pendientes.
    pub fn run(self) -> Result<(), ServerError> {
        let Server {
            config,
            router,
            service,
            listener,
        } = self;

        let limits = ConnectionLimits {
            max_request_bytes: config.max_request_bytes,
            read_timeout: config.read_timeout(),
        };

        let accept_service = Arc::clone(&service);
        thread::Builder::new()
            .name("accept".to_string())
            .spawn(move || Self::accept_loop(listener, router, accept_service, limits))?;

        log::info!("Concurrent mode: one thread per connection");

        service.shutdown().wait_for_shutdown();
        Ok(())
    }

    fn accept_loop(
        listener: TcpListener,
        router: Arc<Router>,
        service: Arc<HashService>,
        limits: ConnectionLimits,
    ) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    // Sin thread disponible se cierra la conexión y el loop sigue
                    if let Err(e) = Self::spawn_connection(stream, &router, &service, limits) {
                        log::error!("Failed to spawn connection thread: {}", e);
                    }
                }
                Err(e) => log::warn!("Failed to accept connection: {}", e),
            }
        }
    }

    /// Atiende la conexión en un thread nuevo
    fn spawn_connection(
        stream: TcpStream,
        router: &Arc<Router>,
        service: &Arc<HashService>,
        limits: ConnectionLimits,
    ) -> io::Result<()> {
        let router = Arc::clone(router);
        let service = Arc::clone(service);

        thread::Builder::new()
            .name("connection".to_string())
            .spawn(move || {
                if let Err(e) = Self::handle_connection(stream, &router, &service, limits) {
                    log::warn!("Connection error: {}", e);
                }
            })?;

        Ok(())
    }

    fn handle_connection(
        mut stream: TcpStream,
        router: &Router,
        service: &HashService,
        limits: ConnectionLimits,
    ) -> io::Result<()> {
        let start = Instant::now();
        stream.set_read_timeout(Some(limits.read_timeout))?;

        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let (response, label) = match read_request(&mut stream, limits.max_request_bytes)? {
            ReadOutcome::Closed => {
                log::debug!("Connection from {} closed without request", peer);
                return Ok(());
            }
            ReadOutcome::TooLarge => (
                Response::error(StatusCode::PayloadTooLarge, "Request too large"),
                "<too large>".to_string(),
            ),
            ReadOutcome::Complete(buffer) => match Request::parse(&buffer) {
                Ok(request) => {
                    let label = format!("{} {}", request.method().as_str(), request.path());
                    (router.route(&request, service), label)
                }
                Err(e) => (
                    Response::error(StatusCode::BadRequest, &format!("Invalid: {}", e)),
                    "<parse error>".to_string(),
                ),
            },
        };

        stream.write_all(&response.to_bytes())?;
        stream.flush()?;

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        if response.status().is_server_error() {
            log::warn!("{} {} -> {} ({:.2}ms)", peer, label, response.status(), latency_ms);
        } else {
            log::info!("{} {} -> {} ({:.2}ms)", peer, label, response.status(), latency_ms);
        }

        Ok(())
    }
}

/// Lee hasta tener headers completos y `Content-Length` bytes de body
///
/// Si el peer cierra antes, se retorna lo recibido hasta ese momento.
fn read_request(stream: &mut impl Read, max_bytes: usize) -> io::Result<ReadOutcome> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let bytes_read = stream.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }

        buffer.extend_from_slice(&chunk[..bytes_read]);
        if buffer.len() > max_bytes {
            return Ok(ReadOutcome::TooLarge);
        }

        if let Some(expected) = Request::expected_len(&buffer) {
            if expected > max_bytes {
                return Ok(ReadOutcome::TooLarge);
            }
            if buffer.len() >= expected {
                break;
            }
        }
    }

    if buffer.is_empty() {
        Ok(ReadOutcome::Closed)
    } else {
        Ok(ReadOutcome::Complete(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LIMITS: ConnectionLimits = ConnectionLimits {
        max_request_bytes: 4096,
        read_timeout: Duration::from_secs(5),
    };

    fn test_router() -> Arc<Router> {
        let mut router = Router::new();
        job_handlers::register_routes(&mut router).unwrap();
        Arc::new(router)
    }

    /// Acepta una conexión, la procesa y retorna lo que recibió el cliente
    fn roundtrip(raw: &[u8], service: Arc<HashService>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        let router = test_router();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Server::handle_connection(stream, &router, &service, LIMITS).unwrap();
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(std::net::Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();

        String::from_utf8_lossy(&buf).into_owned()
    }

    fn service() -> Arc<HashService> {
        Arc::new(HashService::with_delay(Duration::from_millis(20)))
    }

    #[test]
    fn test_read_request_waits_for_body() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 10\r\n\r\npassword=x".to_vec();
        let mut cursor = Cursor::new(raw.clone());

        assert_eq!(
            read_request(&mut cursor, 4096).unwrap(),
            ReadOutcome::Complete(raw)
        );
    }

    #[test]
    fn test_read_request_closed() {
        let mut cursor = Cursor::new(Vec::new());
        assert_eq!(read_request(&mut cursor, 4096).unwrap(), ReadOutcome::Closed);
    }

    #[test]
    fn test_read_request_too_large() {
        let raw = "POST /hash HTTP/1.0\r\nContent-Length: 99999\r\n\r\n".to_string();
        let mut cursor = Cursor::new(raw.into_bytes());
        assert_eq!(read_request(&mut cursor, 4096).unwrap(), ReadOutcome::TooLarge);

        let mut cursor = Cursor::new(vec![b'a'; 5000]);
        assert_eq!(read_request(&mut cursor, 4096).unwrap(), ReadOutcome::TooLarge);
    }

    #[test]
    fn test_handle_connection_submit() {
        let text = roundtrip(
            b"POST /hash HTTP/1.0\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 20\r\n\r\npassword=angryMonkey",
            service(),
        );

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n1\n"));
    }

    #[test]
    fn test_handle_connection_parse_error() {
        let text = roundtrip(b"\x00\x01\x02\x03garbage", service());

        assert!(text.contains("400 Bad Request"));
        assert!(text.contains("Invalid:"));
    }

    #[test]
    fn test_handle_connection_draining() {
        let service = service();
        service.request_drain();

        let text = roundtrip(b"GET /stats HTTP/1.0\r\n\r\n", service);
        assert!(text.contains("503 Service Unavailable"));
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        let router = test_router();
        let service = service();

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Server::handle_connection(stream, &router, &service, LIMITS).unwrap();
        });

        drop(TcpStream::connect(addr).unwrap());
        t.join().unwrap();
    }

    #[test]
    fn test_spawn_connection_serves_request() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        let (router, service) = (test_router(), service());

        let mut client = TcpStream::connect(addr).unwrap();
        let (stream, _) = listener.accept().unwrap();
        Server::spawn_connection(stream, &router, &service, LIMITS).unwrap();

        client.write_all(b"GET /stats HTTP/1.0\r\n\r\n").unwrap();
        let mut buf = String::new();
        client.read_to_string(&mut buf).unwrap();

        assert!(buf.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(buf.contains(r#"{"Total":0,"Average":0}"#));
    }

    #[test]
    fn test_bind_rejects_invalid_config() {
        let config = Config {
            read_timeout_ms: 0,
            ..Config::default()
        };
        assert!(matches!(Server::bind(config), Err(ServerError::Config(_))));
    }
}
