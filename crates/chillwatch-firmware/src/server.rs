//! TCP accept loop serving the monitor routes
//!
//! One connection at a time: read the request head, answer it and close.
//! Sensor reads inside the handler block the executor; `/` holds it for about
//! 1.5 s with both units configured.

use chillwatch_core::Monitor;
use chillwatch_core::http::{MAX_REQUEST_SIZE, find_head_end};
use chillwatch_core::routes::{self, MAX_BODY_SIZE};
use chillwatch_core::sensors::TemperatureBus;
use embassy_net::Stack;
use embassy_net::tcp::{Error, TcpSocket};
use embassy_time::Duration;
use embedded_hal::digital::InputPin;
use log::warn;

pub const HTTP_PORT: u16 = 80;

const SOCKET_BUFFER_SIZE: usize = 1024;
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn serve_forever<B, P>(stack: Stack<'static>, monitor: &mut Monitor<B, P>) -> !
where
    B: TemperatureBus,
    P: InputPin,
{
    let mut rx_buffer = [0u8; SOCKET_BUFFER_SIZE];
    let mut tx_buffer = [0u8; SOCKET_BUFFER_SIZE];

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        if let Err(e) = socket.accept(HTTP_PORT).await {
            warn!("accept error: {:?}", e);
            continue;
        }

        if let Err(e) = serve_connection(&mut socket, monitor).await {
            warn!("connection error: {:?}", e);
        }

        socket.close();
        let _ = socket.flush().await;
        socket.abort();
    }
}

async fn serve_connection<B, P>(
    socket: &mut TcpSocket<'_>,
    monitor: &mut Monitor<B, P>,
) -> Result<(), Error>
where
    B: TemperatureBus,
    P: InputPin,
{
    let mut request = [0u8; MAX_REQUEST_SIZE];
    let mut len = 0;
    loop {
        let n = socket.read(&mut request[len..]).await?;
        if n == 0 {
            // Peer closed before sending anything
            if len == 0 {
                return Ok(());
            }
            break;
        }
        len += n;
        if len == request.len() || find_head_end(&request[..len]).is_some() {
            break;
        }
    }

    let mut body = [0u8; MAX_BODY_SIZE];
    let response = routes::handle(&request[..len], monitor, &mut body);
    let head = match response.head() {
        Ok(head) => head,
        Err(e) => {
            warn!("failed to format response head: {}", e);
            return Ok(());
        }
    };

    write_all(socket, head.as_bytes()).await?;
    write_all(socket, response.body).await?;
    socket.flush().await
}

async fn write_all(socket: &mut TcpSocket<'_>, mut buf: &[u8]) -> Result<(), Error> {
    while !buf.is_empty() {
        match socket.write(buf).await? {
            0 => return Err(Error::ConnectionReset),
            n => buf = &buf[n..],
        }
    }
    Ok(())
}
