//! Device response codes and their HTTP equivalents

use std::fmt;

/// Response code reported by a device, encoded as `class << 5 | detail`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoapStatus(pub u8);

impl CoapStatus {
    pub const CREATED: CoapStatus = CoapStatus::new(2, 1);
    pub const DELETED: CoapStatus = CoapStatus::new(2, 2);
    pub const VALID: CoapStatus = CoapStatus::new(2, 3);
    pub const CHANGED: CoapStatus = CoapStatus::new(2, 4);
    pub const CONTENT: CoapStatus = CoapStatus::new(2, 5);
    pub const BAD_REQUEST: CoapStatus = CoapStatus::new(4, 0);
    pub const UNAUTHORIZED: CoapStatus = CoapStatus::new(4, 1);
    pub const BAD_OPTION: CoapStatus = CoapStatus::new(4, 2);
    pub const FORBIDDEN: CoapStatus = CoapStatus::new(4, 3);
    pub const NOT_FOUND: CoapStatus = CoapStatus::new(4, 4);
    pub const METHOD_NOT_ALLOWED: CoapStatus = CoapStatus::new(4, 5);
    pub const NOT_ACCEPTABLE: CoapStatus = CoapStatus::new(4, 6);
    pub const REQUEST_ENTITY_INCOMPLETE: CoapStatus = CoapStatus::new(4, 8);
    pub const PRECONDITION_FAILED: CoapStatus = CoapStatus::new(4, 12);
    pub const REQUEST_ENTITY_TOO_LARGE: CoapStatus = CoapStatus::new(4, 13);
    pub const UNSUPPORTED_CONTENT_FORMAT: CoapStatus = CoapStatus::new(4, 15);
    pub const INTERNAL_SERVER_ERROR: CoapStatus = CoapStatus::new(5, 0);
    pub const NOT_IMPLEMENTED: CoapStatus = CoapStatus::new(5, 1);
    pub const BAD_GATEWAY: CoapStatus = CoapStatus::new(5, 2);
    pub const SERVICE_UNAVAILABLE: CoapStatus = CoapStatus::new(5, 3);
    pub const GATEWAY_TIMEOUT: CoapStatus = CoapStatus::new(5, 4);
    pub const PROXYING_NOT_SUPPORTED: CoapStatus = CoapStatus::new(5, 5);

    /// Build a code from its class and detail digits
    pub const fn new(class: u8, detail: u8) -> Self {
        CoapStatus((class << 5) | (detail & 0x1f))
    }

    pub const fn class(self) -> u8 {
        self.0 >> 5
    }

    pub const fn detail(self) -> u8 {
        self.0 & 0x1f
    }

    /// HTTP status code reported to REST clients
    pub fn to_http(self) -> u16 {
        match (self.class(), self.detail()) {
            (2, 1) => 201,
            (2, 2..=5) => 200,
            (4, 0) => 400,
            (4, 1) => 401,
            (4, 2) => 400,
            (4, 3) => 403,
            (4, 4) => 404,
            (4, 5) => 405,
            (4, 6) => 406,
            (4, 8) => 408,
            (4, 12) => 412,
            (4, 13) => 413,
            (4, 15) => 415,
            (5, detail @ 0..=4) => 500 + detail as u16,
            (5, 5) => 502,
            (2, _) => 200,
            (4, _) => 400,
            (5, _) => 500,
            _ => 502,
        }
    }
}

impl From<u8> for CoapStatus {
    fn from(raw: u8) -> Self {
        CoapStatus(raw)
    }
}

impl fmt::Display for CoapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.class(), self.detail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_codes() {
        assert_eq!(CoapStatus::CREATED.to_http(), 201);
        assert_eq!(CoapStatus::DELETED.to_http(), 200);
        assert_eq!(CoapStatus::VALID.to_http(), 200);
        assert_eq!(CoapStatus::CHANGED.to_http(), 200);
        assert_eq!(CoapStatus::CONTENT.to_http(), 200);
    }

    #[test]
    fn test_client_error_codes() {
        assert_eq!(CoapStatus::BAD_REQUEST.to_http(), 400);
        assert_eq!(CoapStatus::UNAUTHORIZED.to_http(), 401);
        assert_eq!(CoapStatus::BAD_OPTION.to_http(), 400);
        assert_eq!(CoapStatus::FORBIDDEN.to_http(), 403);
        assert_eq!(CoapStatus::NOT_FOUND.to_http(), 404);
        assert_eq!(CoapStatus::METHOD_NOT_ALLOWED.to_http(), 405);
        assert_eq!(CoapStatus::NOT_ACCEPTABLE.to_http(), 406);
        assert_eq!(CoapStatus::REQUEST_ENTITY_INCOMPLETE.to_http(), 408);
        assert_eq!(CoapStatus::PRECONDITION_FAILED.to_http(), 412);
        assert_eq!(CoapStatus::REQUEST_ENTITY_TOO_LARGE.to_http(), 413);
        assert_eq!(CoapStatus::UNSUPPORTED_CONTENT_FORMAT.to_http(), 415);
    }

    #[test]
    fn test_server_error_codes() {
        assert_eq!(CoapStatus::INTERNAL_SERVER_ERROR.to_http(), 500);
        assert_eq!(CoapStatus::NOT_IMPLEMENTED.to_http(), 501);
        assert_eq!(CoapStatus::BAD_GATEWAY.to_http(), 502);
        assert_eq!(CoapStatus::SERVICE_UNAVAILABLE.to_http(), 503);
        assert_eq!(CoapStatus::GATEWAY_TIMEOUT.to_http(), 504);
        assert_eq!(CoapStatus::PROXYING_NOT_SUPPORTED.to_http(), 502);
    }

    #[test]
    fn test_unlisted_codes_fall_back_by_class() {
        assert_eq!(CoapStatus::new(2, 31).to_http(), 200);
        assert_eq!(CoapStatus::new(4, 9).to_http(), 400);
        assert_eq!(CoapStatus::new(5, 20).to_http(), 500);
        assert_eq!(CoapStatus::new(0, 1).to_http(), 502);
        assert_eq!(CoapStatus::new(7, 0).to_http(), 502);
    }

    #[test]
    fn test_display() {
        assert_eq!(CoapStatus::CONTENT.to_string(), "2.05");
        assert_eq!(CoapStatus::PRECONDITION_FAILED.to_string(), "4.12");
        assert_eq!(CoapStatus::from(0x45), CoapStatus::CONTENT);
    }
}
