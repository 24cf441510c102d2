//! Loopback HTTP server for catalog and retrieval tests.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

pub struct TestServer {
    pub base: String,
    shutdown: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    /// Serve a fixed path -> response map on a random loopback port.
    pub fn serve(routes: HashMap<&'static str, Route>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let addr = server.server_addr();
        let base = format!("http://{addr}");

        let (shutdown, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url);

                let response = match routes.get(path) {
                    Some(route) => tiny_http::Response::from_data(route.body.clone())
                        .with_status_code(route.status),
                    None => tiny_http::Response::from_data(b"not found".to_vec())
                        .with_status_code(404),
                };

                let _ = request.respond(response);
            }
        });

        Self {
            base,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> url::Url {
        url::Url::parse(&format!("{}{}", self.base, path)).expect("valid test url")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
