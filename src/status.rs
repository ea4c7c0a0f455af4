//! Numeric HTTP status codes.

use std::fmt;

use crate::error::{KitError, KitResult};

macro_rules! http_statuses {
    ($( $(#[$doc:meta])* $variant:ident = $code:literal, $reason:literal; )+) => {
        /// HTTP response status codes as a closed numeric enum.
        ///
        /// The discriminant is the wire value, so `status as u16` and
        /// [`as_u16`](HttpStatus::as_u16) agree.
        ///
        /// # Examples
        ///
        /// ```
        /// use ferrous_kit::HttpStatus;
        ///
        /// let status = HttpStatus::try_from(404u16).unwrap();
        /// assert_eq!(status, HttpStatus::NotFound);
        /// assert!(status.is_client_error());
        /// assert_eq!(status.to_string(), "404 Not Found");
        /// assert_eq!(HttpStatus::Created as u16, 201);
        /// ```
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum HttpStatus {
            $( $(#[$doc])* $variant = $code, )+
        }

        impl HttpStatus {
            /// Every known status, in ascending numeric order.
            pub const ALL: &'static [HttpStatus] = &[ $( HttpStatus::$variant, )+ ];

            /// Canonical reason phrase, e.g. `"Not Found"`.
            pub fn reason_phrase(self) -> &'static str {
                match self {
                    $( HttpStatus::$variant => $reason, )+
                }
            }

            /// Looks a status up by its numeric code.
            pub fn from_u16(code: u16) -> KitResult<Self> {
                match code {
                    $( $code => Ok(HttpStatus::$variant), )+
                    other => Err(KitError::UnknownStatus(other)),
                }
            }
        }
    };
}

http_statuses! {
    Continue = 100, "Continue";
    SwitchingProtocols = 101, "Switching Protocols";
    Ok = 200, "OK";
    Created = 201, "Created";
    Accepted = 202, "Accepted";
    NoContent = 204, "No Content";
    MovedPermanently = 301, "Moved Permanently";
    Found = 302, "Found";
    SeeOther = 303, "See Other";
    NotModified = 304, "Not Modified";
    TemporaryRedirect = 307, "Temporary Redirect";
    PermanentRedirect = 308, "Permanent Redirect";
    BadRequest = 400, "Bad Request";
    Unauthorized = 401, "Unauthorized";
    PaymentRequired = 402, "Payment Required";
    Forbidden = 403, "Forbidden";
    NotFound = 404, "Not Found";
    MethodNotAllowed = 405, "Method Not Allowed";
    NotAcceptable = 406, "Not Acceptable";
    RequestTimeout = 408, "Request Timeout";
    Conflict = 409, "Conflict";
    Gone = 410, "Gone";
    PayloadTooLarge = 413, "Payload Too Large";
    UnsupportedMediaType = 415, "Unsupported Media Type";
    UnprocessableEntity = 422, "Unprocessable Entity";
    TooManyRequests = 429, "Too Many Requests";
    InternalServerError = 500, "Internal Server Error";
    NotImplemented = 501, "Not Implemented";
    BadGateway = 502, "Bad Gateway";
    ServiceUnavailable = 503, "Service Unavailable";
    GatewayTimeout = 504, "Gateway Timeout";
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn is_informational(self) -> bool {
        (100..200).contains(&self.as_u16())
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_redirection(self) -> bool {
        (300..400).contains(&self.as_u16())
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    pub fn is_server_error(self) -> bool {
        self.as_u16() >= 500
    }

    /// 4xx and 5xx.
    pub fn is_error(self) -> bool {
        self.as_u16() >= 400
    }
}

impl Default for HttpStatus {
    fn default() -> Self {
        HttpStatus::Ok
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = KitError;

    fn try_from(code: u16) -> KitResult<Self> {
        HttpStatus::from_u16(code)
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.as_u16()
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HttpStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HttpStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = <u16 as serde::Deserialize>::deserialize(deserializer)?;
        HttpStatus::from_u16(code).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        assert!(HttpStatus::Continue.is_informational());
        assert!(HttpStatus::NoContent.is_success());
        assert!(HttpStatus::SeeOther.is_redirection());
        assert!(HttpStatus::Conflict.is_client_error());
        assert!(HttpStatus::BadGateway.is_server_error());
        assert!(!HttpStatus::Ok.is_error());
        assert!(HttpStatus::TooManyRequests.is_error());
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(HttpStatus::try_from(418u16), Err(KitError::UnknownStatus(418)));
    }

    #[test]
    fn test_all_is_sorted_and_unique() {
        for pair in HttpStatus::ALL.windows(2) {
            assert!(pair[0].as_u16() < pair[1].as_u16());
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_number() {
        assert_eq!(serde_json::to_string(&HttpStatus::Forbidden).unwrap(), "403");
        let parsed: HttpStatus = serde_json::from_str("503").unwrap();
        assert_eq!(parsed, HttpStatus::ServiceUnavailable);
        assert!(serde_json::from_str::<HttpStatus>("299").is_err());
    }
}
