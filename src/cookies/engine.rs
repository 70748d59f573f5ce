//! The cookie selection engine seam.
//!
//! A [`CookieEngine`] decides which stored cookies apply to a request URL.
//! [`PersistentJar`](crate::cookies::jar::PersistentJar) only talks to the
//! engine through this trait, so any implementation with RFC 6265 matching
//! can stand in for the bundled [`CookieMonster`](crate::cookies::monster::CookieMonster).

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use url::Url;

pub trait CookieEngine {
    /// Cookies that apply to a request for `url`, in send order.
    fn cookies(&self, url: &Url) -> Vec<CanonicalCookie>;

    /// Every live cookie that some request to `origin` would carry,
    /// regardless of request path. This is the view a snapshot records.
    ///
    /// Engines without a path-independent query fall back to [`cookies`](Self::cookies).
    fn origin_cookies(&self, origin: &Url) -> Vec<CanonicalCookie> {
        self.cookies(origin)
    }

    /// Store `cookies` as if received in a response from `url`.
    ///
    /// Each rejected cookie yields one error; the rest are still processed.
    fn set_cookies(&self, url: &Url, cookies: Vec<CanonicalCookie>) -> Vec<NetError>;

    /// Drop every stored cookie.
    fn clear(&self);

    /// Domains that lost cookies to eviction since the last call.
    ///
    /// Engines that never evict can rely on the default.
    fn drain_evicted(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<E: CookieEngine + ?Sized> CookieEngine for Box<E> {
    fn cookies(&self, url: &Url) -> Vec<CanonicalCookie> {
        (**self).cookies(url)
    }

    fn origin_cookies(&self, origin: &Url) -> Vec<CanonicalCookie> {
        (**self).origin_cookies(origin)
    }

    fn set_cookies(&self, url: &Url, cookies: Vec<CanonicalCookie>) -> Vec<NetError> {
        (**self).set_cookies(url, cookies)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn drain_evicted(&self) -> Vec<String> {
        (**self).drain_evicted()
    }
}
