#![allow(dead_code)]

use chrono::{DateTime, Utc};

pub use lineagehook_test_utils::{init_tracing, with_timeout};

pub mod builders {
    pub use lineagehook_test_utils::builders::*;
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}
