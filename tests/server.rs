//! End-to-end: a mounted app served over a real socket.

use std::time::Duration;

use mounting::{App, Server, StatusCode, mount};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Sends a bare HTTP/1.1 request and returns the raw response text.
async fn request(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

fn status_line(code: StatusCode) -> String {
    format!("HTTP/1.1 {}", code.as_u16())
}

#[tokio::test]
async fn serves_mounted_apps() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let api = App::named("api").with_fn(|ctx, next| {
        Box::pin(async move {
            next.run(ctx).await?;
            let body = format!("api saw {}", ctx.path());
            ctx.set_text(body);
            Ok(())
        })
    });
    let app = App::new().with_boxed(mount("/api", api).unwrap());

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::from_listener(listener).serve_with_shutdown(app, async {
            let _ = stopped.await;
        }),
    );

    let res = request(addr, "/api/users?limit=5").await;
    assert!(res.starts_with(&status_line(StatusCode::OK)), "{res}");
    assert!(res.ends_with("api saw /users"), "{res}");

    let res = request(addr, "/apiary").await;
    assert!(res.starts_with(&status_line(StatusCode::NOT_FOUND)), "{res}");

    stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server drains and stops")
        .unwrap()
        .unwrap();
}
