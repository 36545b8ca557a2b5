//! Line framing for streamed HTTP bodies (NDJSON and server-sent events)

use crate::error::{Error, Result};
use eventsource_stream::{EventStreamError, Eventsource};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Response;

/// Stream the response body one line at a time, without the line terminator
pub(crate) fn body_lines(response: Response) -> BoxStream<'static, Result<String>> {
    let body = response.bytes_stream().boxed();

    stream::unfold(
        (body, Vec::<u8>::new(), false),
        |(mut body, mut buffer, mut finished)| async move {
            loop {
                if let Some(idx) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=idx).collect();
                    let line = String::from_utf8_lossy(&line)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    return Some((Ok(line), (body, buffer, finished)));
                }

                if finished {
                    if buffer.is_empty() {
                        return None;
                    }
                    let line = String::from_utf8_lossy(&buffer).trim_end().to_string();
                    buffer.clear();
                    return Some((Ok(line), (body, buffer, finished)));
                }

                match body.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        buffer.clear();
                        return Some((Err(Error::Http(e)), (body, buffer, true)));
                    }
                    None => finished = true,
                }
            }
        },
    )
    .boxed()
}

/// Stream the `data` payload of each server-sent event, skipping the `[DONE]` marker
pub(crate) fn sse_events(response: Response) -> BoxStream<'static, Result<String>> {
    response
        .bytes_stream()
        .eventsource()
        .filter_map(|event| {
            future::ready(match event {
                Ok(event) => event_data(&event.data).map(Ok),
                Err(e) => Some(Err(event_stream_error(e))),
            })
        })
        .boxed()
}

fn event_data(data: &str) -> Option<String> {
    if data.is_empty() || data == "[DONE]" {
        None
    } else {
        Some(data.to_string())
    }
}

fn event_stream_error(err: EventStreamError<reqwest::Error>) -> Error {
    match err {
        EventStreamError::Transport(e) => Error::Http(e),
        other => Error::Parse(format!("Malformed event stream: {}", other)),
    }
}
