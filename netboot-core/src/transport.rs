use std::io;
use std::net::{SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

/// Datagram transport used by the exchange.
///
/// Deadlines are absolute. Once a deadline has passed, the matching operation
/// fails with an error for which [`is_timeout`] returns `true`.
pub trait Transport {
    /// Send one datagram to `dest`.
    fn send_to(&mut self, buf: &[u8], dest: SocketAddr) -> io::Result<usize>;
    /// Receive one datagram into `buf`.
    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
    /// Arm the deadline for subsequent receives.
    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()>;
    /// Arm the deadline for subsequent sends.
    fn set_write_deadline(&mut self, deadline: Instant) -> io::Result<()>;
}

/// Whether an I/O error means a deadline elapsed.
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

/// [`Transport`] over a std UDP socket with broadcast enabled.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
}

impl UdpTransport {
    /// Bind `local` and scope the socket to `ifname`.
    pub fn bind(ifname: &str, local: SocketAddrV4) -> io::Result<Self> {
        let socket = UdpSocket::bind(local)?;
        socket.set_broadcast(true)?;
        bind_to_device(&socket, ifname)?;
        Ok(Self::from_socket(socket))
    }

    /// Wrap an already configured socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            read_deadline: None,
            write_deadline: None,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send_to(&mut self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        let timeout = remaining(self.write_deadline)?;
        self.socket.set_write_timeout(timeout)?;
        self.socket.send_to(buf, dest)
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let timeout = remaining(self.read_deadline)?;
        self.socket.set_read_timeout(timeout)?;
        self.socket.recv_from(buf)
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        self.read_deadline = Some(deadline);
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        self.write_deadline = Some(deadline);
        Ok(())
    }
}

// std rejects a zero socket timeout, so an expired deadline is reported
// before touching the socket.
fn remaining(deadline: Option<Instant>) -> io::Result<Option<Duration>> {
    let Some(deadline) = deadline else {
        return Ok(None);
    };
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"));
    }
    Ok(Some(left))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn bind_to_device(socket: &UdpSocket, ifname: &str) -> io::Result<()> {
    use nix::sys::socket::{setsockopt, sockopt::BindToDevice};

    setsockopt(socket, BindToDevice, &std::ffi::OsString::from(ifname)).map_err(io::Error::from)
}

/// Device binding is a no-op outside Linux. The socket listens on every
/// interface and replies for other hosts are dropped by the transaction id
/// check in the exchange loop.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn bind_to_device(_socket: &UdpSocket, ifname: &str) -> io::Result<()> {
    tracing::debug!(ifname, "interface binding not available; relying on xid filtering");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_deadline_is_reported_as_timeout() {
        let err = remaining(Some(Instant::now() - Duration::from_millis(5)))
            .expect_err("deadline in the past");
        assert!(is_timeout(&err));
    }

    #[test]
    fn no_deadline_means_blocking() {
        assert_eq!(remaining(None).expect("no deadline"), None);
    }

    #[test]
    fn loopback_receive_honours_read_deadline() {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind");
        let mut transport = UdpTransport::from_socket(socket);
        transport
            .set_read_deadline(Instant::now() + Duration::from_millis(20))
            .expect("deadline");

        let mut buf = [0u8; 16];
        let err = transport.recv_from(&mut buf).expect_err("nothing was sent");
        assert!(is_timeout(&err), "unexpected error kind: {:?}", err.kind());
    }

    #[test]
    fn loopback_round_trip() {
        let receiver = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
        let dest = receiver.local_addr().expect("addr");
        let mut sender = UdpTransport::from_socket(UdpSocket::bind("127.0.0.1:0").expect("bind"));
        sender
            .set_write_deadline(Instant::now() + Duration::from_secs(1))
            .expect("deadline");
        sender.send_to(b"ping", dest).expect("send");

        let mut rx = UdpTransport::from_socket(receiver);
        rx.set_read_deadline(Instant::now() + Duration::from_secs(1))
            .expect("deadline");
        let mut buf = [0u8; 16];
        let (n, _) = rx.recv_from(&mut buf).expect("receive");
        assert_eq!(&buf[..n], b"ping");
    }
}
