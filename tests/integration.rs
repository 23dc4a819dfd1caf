use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use rax_ftp_core::client::AuthPhase;
use rax_ftp_core::error::ServerError;
use rax_ftp_core::middleware::ServerLogger;
use rax_ftp_core::{Driver, Listener, MemoryDriver, ServerConfig, SessionConfig, Termination};

struct TestServer {
    addr: SocketAddr,
    terminations: mpsc::UnboundedReceiver<Termination>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn start(config: ServerConfig, driver: Arc<dyn Driver>) -> Self {
        let sessions = SessionConfig::from_server_config(&config, driver);
        let (tx, terminations) = mpsc::unbounded_channel();
        let listener = Listener::bind(&config, sessions, ServerLogger::new("integration"))
            .await
            .unwrap()
            .notify_terminations(tx);
        let addr = listener.local_addr().unwrap();

        let (shutdown, signal) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            listener
                .run_until(async {
                    let _ = signal.await;
                })
                .await
        });

        Self {
            addr,
            terminations,
            shutdown: Some(shutdown),
            handle,
        }
    }

    async fn next_termination(&mut self) -> Termination {
        tokio::time::timeout(Duration::from_secs(5), self.terminations.recv())
            .await
            .expect("termination notice timed out")
            .expect("listener dropped the notifier")
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        control_port: 0,
        ..ServerConfig::default()
    }
}

fn test_driver() -> Arc<dyn Driver> {
    Arc::new(
        MemoryDriver::default()
            .with_user("alice", "correct")
            .with_user("bob", "hunter2"),
    )
}

struct Client {
    stream: BufReader<TcpStream>,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            stream: BufReader::new(stream),
        }
    }

    async fn read_reply(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), self.stream.read_line(&mut line))
            .await
            .expect("reply timed out")
            .unwrap();
        line
    }

    async fn send(&mut self, line: &str) -> String {
        self.stream
            .get_mut()
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
        self.read_reply().await
    }
}

#[tokio::test]
async fn test_greeting_and_login() {
    let mut server = TestServer::start(test_config(), test_driver()).await;

    let mut client = Client::connect(server.addr).await;
    assert_eq!(client.read_reply().await, "220 Welcome to RAX FTP Server\r\n");
    assert_eq!(
        client.send("USER alice").await,
        "331 User name ok, password required\r\n"
    );
    assert_eq!(client.send("PASS correct").await, "230 Password ok, continue\r\n");
    assert_eq!(client.send("LIST").await, "500 Command not found\r\n");
    drop(client);

    let termination = server.next_termination().await;
    assert_eq!(termination.state.current_user(), Some("alice"));
    assert_eq!(termination.session_id, 1);
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let mut server = TestServer::start(test_config(), test_driver()).await;

    let mut a = Client::connect(server.addr).await;
    let mut b = Client::connect(server.addr).await;
    a.read_reply().await;
    b.read_reply().await;

    assert!(a.send("USER alice").await.starts_with("331 "));
    assert!(b.send("USER bob").await.starts_with("331 "));
    assert!(b.send("PASS hunter2").await.starts_with("230 "));
    // alice's pending name is untouched by bob's login
    assert!(a.send("PASS correct").await.starts_with("230 "));
    drop(a);
    drop(b);

    let mut users = vec![
        server.next_termination().await,
        server.next_termination().await,
    ]
    .into_iter()
    .map(|t| {
        assert_eq!(t.state.auth_phase(), AuthPhase::Authenticated);
        assert_eq!(t.state.pending_username(), None);
        t.state.current_user().unwrap().to_string()
    })
    .collect::<Vec<_>>();
    users.sort();
    assert_eq!(users, vec!["alice".to_string(), "bob".to_string()]);
}

#[tokio::test]
async fn test_many_parallel_logins() {
    let mut server = TestServer::start(
        ServerConfig {
            max_clients: 32,
            ..test_config()
        },
        Arc::new(|user: &str, pass: &str| pass == format!("{user}-pw")),
    )
    .await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            let user = format!("user{i}");
            let mut client = Client::connect(addr).await;
            client.read_reply().await;
            assert!(client.send(&format!("USER {user}")).await.starts_with("331 "));
            let expected = if i % 2 == 0 { "230 " } else { "530 " };
            let password = if i % 2 == 0 {
                format!("{user}-pw")
            } else {
                "nope".to_string()
            };
            assert!(client.send(&format!("PASS {password}")).await.starts_with(expected));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut logged_in = 0;
    for _ in 0..16 {
        let termination = server.next_termination().await;
        if let Some(user) = termination.state.current_user() {
            let n: usize = user.trim_start_matches("user").parse().unwrap();
            assert_eq!(n % 2, 0);
            logged_in += 1;
        }
    }
    assert_eq!(logged_in, 8);
}

#[tokio::test]
async fn test_blocked_driver_stalls_only_its_session() {
    let (release, gate) = std::sync::mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let driver = Arc::new(move |user: &str, pass: &str| {
        if user == "slow" {
            let _ = gate.lock().unwrap().recv();
        }
        pass == "pw"
    });
    let server = TestServer::start(test_config(), driver).await;

    let mut slow = Client::connect(server.addr).await;
    slow.read_reply().await;
    slow.send("USER slow").await;
    slow.stream.get_mut().write_all(b"PASS pw\r\n").await.unwrap();

    let mut fast = Client::connect(server.addr).await;
    fast.read_reply().await;
    assert!(fast.send("USER fast").await.starts_with("331 "));
    assert!(fast.send("PASS pw").await.starts_with("230 "));

    release.send(()).unwrap();
    assert_eq!(slow.read_reply().await, "230 Password ok, continue\r\n");
}

#[tokio::test]
async fn test_connections_over_capacity_are_refused() {
    let mut server = TestServer::start(
        ServerConfig {
            max_clients: 1,
            ..test_config()
        },
        test_driver(),
    )
    .await;

    let mut first = Client::connect(server.addr).await;
    assert!(first.read_reply().await.starts_with("220 "));

    let mut second = Client::connect(server.addr).await;
    let mut rest = String::new();
    second.stream.read_to_string(&mut rest).await.unwrap();
    assert_eq!(rest, "421 Too many connections. Try again later.\r\n");

    drop(first);
    server.next_termination().await;

    let mut third = Client::connect(server.addr).await;
    assert!(third.read_reply().await.starts_with("220 "));
}

#[tokio::test]
async fn test_shutdown_stops_accept_loop() {
    let mut server = TestServer::start(test_config(), test_driver()).await;

    let mut client = Client::connect(server.addr).await;
    client.read_reply().await;

    server.shutdown.take().unwrap().send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("listener did not stop")
        .unwrap();
    assert!(result.is_ok());

    // Running sessions outlive the accept loop
    assert!(client.send("USER alice").await.starts_with("331 "));
}
