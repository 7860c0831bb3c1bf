//! HTTP method as a typed enum.
//!
//! Covers RFC 9110 standard methods, the WebDAV family (RFC 4918 / 4791 / 3253 /
//! 3648 / 5323 / 5842 / 3744), UPnP/SSDP and GENA methods, the `QUERY`
//! draft, and `PURGE` used by nginx and Varnish for cache invalidation.
//!
//! Methods are compared case-insensitively and printed in normalized lowercase,
//! so a route registered for [`Method::Get`] matches `GET`, `get` and `Get`.
//! Registration also accepts any method name as a string, see
//! [`Stack::on`](crate::Stack::on), for methods outside this list.

use std::fmt;
use std::str::FromStr;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    // RFC 9110 ─────────────────────────────────────────────────────────────────
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    Query, // draft-ietf-httpbis-safe-method-w-body
    // WebDAV RFC 4918 ──────────────────────────────────────────────────────────
    Copy,
    Lock,
    Mkcol,
    Move,
    Propfind,
    Proppatch,
    Unlock,
    // WebDAV extensions ────────────────────────────────────────────────────────
    Acl,        // RFC 3744
    Bind,       // RFC 5842
    Checkout,   // RFC 3253
    Merge,      // RFC 3253
    Mkactivity, // RFC 3253
    Mkcalendar, // RFC 4791 — CalDAV
    Rebind,     // RFC 5842
    Report,     // RFC 3253
    Search,     // RFC 5323
    Unbind,     // RFC 5842
    // Link relations (RFC 2068) ────────────────────────────────────────────────
    Link,
    Unlink,
    // UPnP / SSDP / GENA ───────────────────────────────────────────────────────
    MSearch,
    Notify,
    Subscribe,
    Unsubscribe,
    // Icecast ──────────────────────────────────────────────────────────────────
    Source,
    // Cache invalidation ───────────────────────────────────────────────────────
    Purge, // nginx / Varnish
}

impl Method {
    /// Every known method, in declaration order.
    pub const ALL: [Method; 35] = [
        Self::Connect, Self::Delete, Self::Get, Self::Head, Self::Options,
        Self::Patch, Self::Post, Self::Put, Self::Trace, Self::Query,
        Self::Copy, Self::Lock, Self::Mkcol, Self::Move, Self::Propfind,
        Self::Proppatch, Self::Unlock, Self::Acl, Self::Bind, Self::Checkout,
        Self::Merge, Self::Mkactivity, Self::Mkcalendar, Self::Rebind, Self::Report,
        Self::Search, Self::Unbind, Self::Link, Self::Unlink, Self::MSearch,
        Self::Notify, Self::Subscribe, Self::Unsubscribe, Self::Source, Self::Purge,
    ];

    /// Normalized lowercase name (e.g. `"get"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acl         => "acl",
            Self::Bind        => "bind",
            Self::Checkout    => "checkout",
            Self::Connect     => "connect",
            Self::Copy        => "copy",
            Self::Delete      => "delete",
            Self::Get         => "get",
            Self::Head        => "head",
            Self::Link        => "link",
            Self::Lock        => "lock",
            Self::MSearch     => "m-search",
            Self::Merge       => "merge",
            Self::Mkactivity  => "mkactivity",
            Self::Mkcalendar  => "mkcalendar",
            Self::Mkcol       => "mkcol",
            Self::Move        => "move",
            Self::Notify      => "notify",
            Self::Options     => "options",
            Self::Patch       => "patch",
            Self::Post        => "post",
            Self::Propfind    => "propfind",
            Self::Proppatch   => "proppatch",
            Self::Purge       => "purge",
            Self::Put         => "put",
            Self::Query       => "query",
            Self::Rebind      => "rebind",
            Self::Report      => "report",
            Self::Search      => "search",
            Self::Source      => "source",
            Self::Subscribe   => "subscribe",
            Self::Trace       => "trace",
            Self::Unbind      => "unbind",
            Self::Unlink      => "unlink",
            Self::Unlock      => "unlock",
            Self::Unsubscribe => "unsubscribe",
        }
    }

    /// Whether a raw request method names this method, ignoring case.
    pub fn matches(self, raw: &str) -> bool {
        raw.eq_ignore_ascii_case(self.as_str())
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown http method `{0}`")]
pub struct UnknownMethod(pub String);

/// Parses a method name in any letter case.
impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.matches(s))
            .ok_or_else(|| UnknownMethod(s.to_owned()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_ignores_case() {
        assert_eq!("GET".parse::<Method>(), Ok(Method::Get));
        assert_eq!("get".parse::<Method>(), Ok(Method::Get));
        assert_eq!("PropFind".parse::<Method>(), Ok(Method::Propfind));
        assert_eq!("M-SEARCH".parse::<Method>(), Ok(Method::MSearch));
        assert_eq!("BREW".parse::<Method>(), Err(UnknownMethod("BREW".into())));
    }

    #[test]
    fn every_method_round_trips_through_its_name() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
            assert_eq!(method.to_string(), method.as_str());
        }
    }

    #[test]
    fn matches_raw_wire_names() {
        assert!(Method::Post.matches("POST"));
        assert!(Method::Post.matches("post"));
        assert!(!Method::Post.matches("put"));
        assert!(Method::Subscribe.matches("SUBSCRIBE"));
        assert!(Method::Query.matches("query"));
    }
}
