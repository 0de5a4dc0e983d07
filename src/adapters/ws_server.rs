//! WebSocket endpoint on the ESP-IDF HTTP server.
//!
//! Every callback from the server task is turned into a [`LinkEvent`] and
//! handed to the [`SharedTransport`].  Frames are received whole; nothing
//! here decodes a command.

use esp_idf_svc::http::server::ws::EspHttpWsConnection;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::sys::EspError;
use esp_idf_svc::ws::FrameType;
use log::{info, warn};

use crate::link::{FrameInfo, LinkEvent, MAX_MESSAGE_LEN, Opcode, SharedTransport};

pub const HTTP_PORT: u16 = 80;
pub const WS_PATH: &str = "/ws";

fn frame_info(frame: FrameType, len: usize) -> FrameInfo {
    let (fin, opcode) = match frame {
        FrameType::Text(fragmented) => (!fragmented, Opcode::Text),
        FrameType::Binary(fragmented) => (!fragmented, Opcode::Binary),
        FrameType::Continue(last) => (last, Opcode::Continuation),
        FrameType::Ping => (true, Opcode::Ping),
        FrameType::Pong => (true, Opcode::Pong),
        FrameType::Close | FrameType::SocketClose => (true, Opcode::Close),
    };
    FrameInfo {
        fin,
        offset: 0,
        total_len: len,
        opcode,
    }
}

fn on_frame(ws: &mut EspHttpWsConnection, link: &SharedTransport) -> Result<(), EspError> {
    let client = ws.session() as u32;

    if ws.is_new() {
        link.on_event(LinkEvent::Connected { client });
        return Ok(());
    }
    if ws.is_closed() {
        link.on_event(LinkEvent::Disconnected { client });
        return Ok(());
    }

    let (frame, len) = ws.recv(&mut [])?;
    // One spare byte for the NUL the server appends to text frames.
    let mut buf = [0u8; MAX_MESSAGE_LEN + 1];
    if len > buf.len() {
        warn!("ws: client {} sent a {} byte frame, closing", client, len);
        link.on_event(LinkEvent::Error { client });
        return ws.send(FrameType::Close, &[]);
    }
    ws.recv(&mut buf)?;

    let payload = match &buf[..len] {
        [text @ .., 0] => text,
        bytes => bytes,
    };
    let info = frame_info(frame, payload.len());
    match info.opcode {
        Opcode::Pong => {
            link.on_event(LinkEvent::Pong { client });
        }
        Opcode::Close => {
            link.on_event(LinkEvent::Disconnected { client });
        }
        _ => {
            link.on_event(LinkEvent::Data {
                client,
                frame: info,
                payload,
            });
        }
    }
    Ok(())
}

/// Start the HTTP server with the control endpoint at [`WS_PATH`].
///
/// The returned server must be kept alive for the endpoint to stay up.
pub fn start(link: SharedTransport) -> Result<EspHttpServer<'static>, EspError> {
    let mut server = EspHttpServer::new(&Configuration {
        http_port: HTTP_PORT,
        ..Default::default()
    })?;
    server.ws_handler(WS_PATH, move |ws: &mut EspHttpWsConnection| {
        on_frame(ws, &link)
    })?;
    info!("ws: listening on :{}{}", HTTP_PORT, WS_PATH);
    Ok(server)
}
