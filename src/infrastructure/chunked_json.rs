// Chunked JSON event streaming utilities
use crate::application::events::LayoutEvent;
use crate::infrastructure::blueprint::{event_message, EventMessage};
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Create a chunked streaming response of length-prefixed JSON frames
pub fn chunked_json_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = EventMessage> + Send + 'static,
{
    let byte_stream = stream.map(|msg| encode_frame(&msg));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked");

    response
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// 4-byte big-endian payload length followed by the JSON payload.
pub fn encode_frame(msg: &EventMessage) -> Result<Bytes, std::io::Error> {
    let payload = serde_json::to_vec(msg)?;

    let length = u32::try_from(payload.len())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream every event from `rx`, starting with `initial` when given.
/// Lagging subscribers skip the events they missed and keep going.
pub fn stream_from_receiver(
    initial: Option<EventMessage>,
    mut rx: broadcast::Receiver<LayoutEvent>,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        if let Some(msg) = initial {
            yield msg;
        }
        loop {
            match rx.recv().await {
                Ok(event) => yield event_message(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    match chunked_json_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::PanelId;

    #[test]
    fn test_frame_layout() {
        let msg = event_message(&LayoutEvent::SelectionChange(Some(PanelId::new("p7"))));
        let frame = encode_frame(&msg).unwrap();

        let length = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(length, frame.len() - 4);

        let decoded: serde_json::Value = serde_json::from_slice(&frame[4..]).unwrap();
        assert_eq!(decoded["type"], "selection:change");
        assert_eq!(decoded["panelId"], "p7");
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_drops() {
        let (tx, rx) = broadcast::channel(8);
        tx.send(LayoutEvent::SelectionChange(None)).unwrap();
        drop(tx);

        let response = stream_from_receiver(None, rx).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let length = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize;
        assert_eq!(body.len(), 4 + length);
    }
}
