//! Lightweight HTTP fixtures for tests.
//!
//! Provides helpers for spawning simple HTTP servers that answer a scripted
//! sequence of responses, one per connection. The listener is configured in
//! non-blocking mode and guarded by a deadline so hung clients cannot stall
//! the test suite.

use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

/// A canned HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code to send.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// A `200 OK` response carrying `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// An empty response with `status`.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Join handle for a spawned HTTP fixture.
///
/// The handle joins the underlying thread when dropped to avoid leaking
/// background work if a test aborts early. Call [`HttpServer::join`] to surface
/// any panic from the server thread explicitly.
#[derive(Debug)]
#[must_use]
pub struct HttpServer {
    handle: Option<thread::JoinHandle<()>>,
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
}

impl HttpServer {
    /// Number of requests answered so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Join the server thread and propagate any panic.
    pub fn join(mut self) -> thread::Result<()> {
        self.shutdown_listener();
        self.handle.take().expect("server already joined").join()
    }

    fn shutdown_listener(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Connect to unblock the accept loop; the outcome is irrelevant.
        let _ = TcpStream::connect(self.addr);
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.shutdown_listener();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn a single-use HTTP server that returns `body` for the first request.
///
/// Returns the base URL (`http://127.0.0.1:<port>`) and the server handle.
pub fn spawn_http_server(body: impl Into<String>) -> (String, HttpServer) {
    spawn_http_sequence([HttpResponse::ok(body)])
}

/// Spawn a server that answers each connection with the next response.
///
/// The server stops once the sequence is exhausted, when the handle is
/// dropped, or after a short idle deadline.
pub fn spawn_http_sequence(
    responses: impl IntoIterator<Item = HttpResponse>,
) -> (String, HttpServer) {
    let responses: VecDeque<HttpResponse> = responses.into_iter().collect();
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind HTTP listener");
    listener
        .set_nonblocking(true)
        .expect("set listener non-blocking");
    let addr = listener.local_addr().expect("local addr");
    let url = format!("http://{addr}");
    let hits = Arc::new(AtomicUsize::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let handle = {
        let hits = Arc::clone(&hits);
        let stop = Arc::clone(&stop);
        thread::spawn(move || run_http_server(&listener, responses, &hits, &stop))
    };
    (
        url,
        HttpServer {
            handle: Some(handle),
            addr,
            hits,
            stop,
        },
    )
}

fn run_http_server(
    listener: &TcpListener,
    mut responses: VecDeque<HttpResponse>,
    hits: &AtomicUsize,
    stop: &AtomicBool,
) {
    while let Some(response) = responses.front() {
        let accept_deadline = Instant::now() + Duration::from_secs(5);
        let Some(mut stream) = accept_connection(listener, accept_deadline, stop) else {
            return;
        };
        stream
            .set_nonblocking(true)
            .expect("set stream non-blocking");
        let read_deadline = Instant::now() + Duration::from_millis(500);
        if read_request(&mut stream, read_deadline) == 0 {
            if stop.load(Ordering::SeqCst) {
                return;
            }
            continue;
        }
        hits.fetch_add(1, Ordering::SeqCst);
        write_response(&mut stream, response);
        responses.pop_front();
    }
}

fn accept_connection(
    listener: &TcpListener,
    deadline: Instant,
    stop: &AtomicBool,
) -> Option<TcpStream> {
    loop {
        match listener.accept() {
            Ok((stream, _)) => return Some(stream),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                if stop.load(Ordering::SeqCst) || Instant::now() >= deadline {
                    return None;
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(err) => panic!("failed to accept connection: {err}"),
        }
    }
}

fn read_request(stream: &mut TcpStream, deadline: Instant) -> usize {
    let mut buf = [0u8; 1024];
    loop {
        if Instant::now() >= deadline {
            return 0;
        }

        match stream.read(&mut buf) {
            Ok(n) => return n,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(_) => return 0,
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

fn write_response(stream: &mut TcpStream, response: &HttpResponse) {
    let text = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason_phrase(response.status),
        response.body.len(),
        response.body
    );
    let _ = stream.write_all(text.as_bytes());
    let _ = stream.flush();
}
