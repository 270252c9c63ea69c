//! Socket options applied to every new connection.

use socket2::SockRef;
use tokio::net::TcpStream;

use crate::ClientConfig;

/// Disable Nagle and, if configured, enable `SO_KEEPALIVE`.
///
/// Chat frames are small and latency sensitive, so they go out immediately.
pub(crate) fn configure_stream(stream: &TcpStream, config: &ClientConfig) -> std::io::Result<()> {
    stream.set_nodelay(true)?;

    if config.tcp_keepalive {
        SockRef::from(stream).set_keepalive(true)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn options_are_applied() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await });

        let stream = TcpStream::connect(addr).await.unwrap();
        configure_stream(&stream, &ClientConfig::default()).unwrap();

        assert!(stream.nodelay().unwrap());
        assert!(SockRef::from(&stream).keepalive().unwrap());
        drop(accept.await);
    }
}
