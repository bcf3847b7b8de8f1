//! Request translator - HTTP-shaped requests to device operations

use bytes::Bytes;

use crate::engine::ProtocolEngine;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{ContentFormat, OperationKind, OperationRequest, ResourceUri, TEXT_PLAIN};

/// REST request addressed to `/endpoints/{device}{path}`
#[derive(Debug, Clone)]
pub struct InboundRequest<'a> {
    pub method: &'a str,
    pub device: &'a str,
    /// Resource path, including the leading `/`
    pub path: &'a str,
    pub content_type: Option<&'a str>,
    pub body: Bytes,
}

/// Validate `request` and turn it into an operation descriptor.
///
/// Checks run in order: verb, content type, write body, device, path. The
/// first failing check decides the error; nothing is changed on failure.
pub fn translate(
    request: InboundRequest<'_>,
    engine: &dyn ProtocolEngine,
) -> GatewayResult<OperationRequest> {
    let kind = match request.method {
        "GET" => OperationKind::Read,
        "PUT" => OperationKind::Write,
        "POST" => OperationKind::Execute,
        other => return Err(GatewayError::MethodNotAllowed(other.to_string())),
    };

    let media_type = request.content_type.map(essence);
    let format = match kind {
        OperationKind::Read => None,
        OperationKind::Write => {
            let media_type = media_type.ok_or_else(|| {
                GatewayError::UnsupportedMediaType("missing Content-Type".to_string())
            })?;
            let format = ContentFormat::from_write_media_type(media_type)
                .ok_or_else(|| GatewayError::UnsupportedMediaType(media_type.to_string()))?;
            Some(format)
        }
        OperationKind::Execute => match media_type {
            None | Some(TEXT_PLAIN) => Some(ContentFormat::Text),
            Some(other) => return Err(GatewayError::UnsupportedMediaType(other.to_string())),
        },
    };

    if kind == OperationKind::Write && request.body.is_empty() {
        return Err(GatewayError::BadRequest("write requires a body".to_string()));
    }

    let client = engine
        .find_client(request.device)
        .ok_or_else(|| GatewayError::DeviceGone(request.device.to_string()))?;

    let uri: ResourceUri = request
        .path
        .parse()
        .map_err(|e| GatewayError::InvalidPath(format!("{}: {}", request.path, e)))?;

    let payload = match kind {
        OperationKind::Read => None,
        OperationKind::Write | OperationKind::Execute => Some(request.body),
    };

    Ok(OperationRequest {
        client,
        kind,
        uri,
        format,
        payload,
    })
}

/// Media type without parameters
fn essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;

    fn engine() -> MockEngine {
        let engine = MockEngine::new();
        engine.add_client("sensor-1");
        engine
    }

    fn request<'a>(
        method: &'a str,
        device: &'a str,
        path: &'a str,
        content_type: Option<&'a str>,
        body: &'static [u8],
    ) -> InboundRequest<'a> {
        InboundRequest {
            method,
            device,
            path,
            content_type,
            body: Bytes::from_static(body),
        }
    }

    #[test]
    fn test_read() {
        let op = translate(request("GET", "sensor-1", "/3/0/1", None, b""), &engine()).unwrap();
        assert_eq!(op.kind, OperationKind::Read);
        assert_eq!(op.uri, ResourceUri::resource(3, 0, 1));
        assert_eq!(op.client.name, "sensor-1");
        assert!(op.payload.is_none());
    }

    #[test]
    fn test_write_formats() {
        let op = translate(
            request(
                "PUT",
                "sensor-1",
                "/3/0/1",
                Some("application/vnd.oma.lwm2m+tlv"),
                b"\xc1\x01\x05",
            ),
            &engine(),
        )
        .unwrap();
        assert_eq!(op.kind, OperationKind::Write);
        assert_eq!(op.format, Some(ContentFormat::Tlv));
        assert_eq!(op.payload.unwrap(), Bytes::from_static(b"\xc1\x01\x05"));
    }

    #[test]
    fn test_write_media_type_errors() {
        let engine = engine();
        for content_type in [None, Some("text/plain"), Some("application/json")] {
            let err = translate(
                request("PUT", "sensor-1", "/3/0/1", content_type, b"x"),
                &engine,
            )
            .unwrap_err();
            assert_eq!(err.status_code(), 415, "content type {:?}", content_type);
        }
    }

    #[test]
    fn test_write_empty_body() {
        let err = translate(
            request("PUT", "sensor-1", "/3/0/1", Some("application/octet-stream"), b""),
            &engine(),
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_execute_content_types() {
        let engine = engine();
        let op = translate(request("POST", "sensor-1", "/3/0/4", None, b""), &engine).unwrap();
        assert_eq!(op.kind, OperationKind::Execute);
        assert_eq!(op.format, Some(ContentFormat::Text));

        let op = translate(
            request("POST", "sensor-1", "/3/0/4", Some("text/plain; charset=utf-8"), b"5"),
            &engine,
        )
        .unwrap();
        assert_eq!(op.payload.unwrap(), Bytes::from_static(b"5"));

        let err = translate(
            request("POST", "sensor-1", "/3/0/4", Some("application/octet-stream"), b""),
            &engine,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 415);
    }

    #[test]
    fn test_other_verbs() {
        for method in ["DELETE", "PATCH", "HEAD"] {
            let err =
                translate(request(method, "sensor-1", "/3/0/1", None, b""), &engine()).unwrap_err();
            assert_eq!(err.status_code(), 405);
        }
    }

    #[test]
    fn test_unknown_device_is_gone() {
        let err = translate(request("GET", "nobody", "/3/0/1", None, b""), &engine()).unwrap_err();
        assert!(matches!(err, GatewayError::DeviceGone(_)));
        assert_eq!(err.status_code(), 410);
    }

    #[test]
    fn test_bad_path_is_not_found() {
        let err = translate(request("GET", "sensor-1", "/3/x", None, b""), &engine()).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidPath(_)));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_check_order() {
        let engine = engine();
        // verb before everything
        let err = translate(request("DELETE", "nobody", "/bad", None, b""), &engine).unwrap_err();
        assert_eq!(err.status_code(), 405);
        // content type before device
        let err = translate(request("PUT", "nobody", "/bad", None, b""), &engine).unwrap_err();
        assert_eq!(err.status_code(), 415);
        // body before device
        let err = translate(
            request("PUT", "nobody", "/bad", Some("application/octet-stream"), b""),
            &engine,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
        // device before path
        let err = translate(request("GET", "nobody", "/bad", None, b""), &engine).unwrap_err();
        assert_eq!(err.status_code(), 410);
    }
}
