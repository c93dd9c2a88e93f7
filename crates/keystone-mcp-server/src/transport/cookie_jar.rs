use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use url::Url;

/// Raw cookie fragments accumulated over the lifetime of one session.
///
/// Fragments are kept verbatim and in arrival order. Nothing is deduplicated or merged by
/// cookie name, and every request made through the owning client carries all of them.
#[derive(Debug, Default)]
pub struct CookieJar {
    fragments: Mutex<Vec<String>>,
}

impl CookieJar {
    /// Create a jar seeded with an initial cookie string, typically the `Cookie` header of an
    /// inbound request
    pub fn new(initial: Option<&str>) -> Self {
        let jar = Self::default();
        if let Some(initial) = initial.map(str::trim).filter(|cookie| !cookie.is_empty()) {
            jar.lock().push(initial.to_string());
        }
        jar
    }

    /// Append every fragment of a `Set-Cookie` header value
    pub fn append_set_cookie(&self, set_cookie: &str) {
        let mut fragments = self.lock();
        fragments.extend(
            set_cookie
                .split(',')
                .map(str::trim)
                .filter(|fragment| !fragment.is_empty())
                .map(str::to_string),
        );
    }

    /// The value to send as the `Cookie` header, if there is anything to send
    pub fn header(&self) -> Option<String> {
        let fragments = self.lock();
        (!fragments.is_empty()).then(|| fragments.join("; "))
    }

    pub fn fragments(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.fragments.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            match header.to_str() {
                Ok(set_cookie) => {
                    debug!(%url, "Storing cookies from response");
                    self.append_set_cookie(set_cookie);
                }
                Err(_) => warn!(%url, "Ignoring non-ASCII Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        self.header().and_then(|cookie| HeaderValue::from_str(&cookie).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_jar_sends_nothing() {
        let jar = CookieJar::new(None);
        assert!(jar.is_empty());
        assert_eq!(jar.header(), None);
    }

    #[test]
    fn blank_initial_cookie_is_ignored() {
        let jar = CookieJar::new(Some("   "));
        assert!(jar.is_empty());
    }

    #[test]
    fn appends_after_the_initial_cookie() {
        let jar = CookieJar::new(Some("sid=abc"));
        jar.append_set_cookie("sid=xyz; Path=/");

        assert_eq!(jar.header().as_deref(), Some("sid=abc; sid=xyz; Path=/"));
    }

    #[rstest]
    #[case("a=1, b=2", vec!["a=1", "b=2"])]
    #[case(" a=1 ,,b=2 ", vec!["a=1", "b=2"])]
    #[case("a=1; HttpOnly", vec!["a=1; HttpOnly"])]
    fn splits_set_cookie_on_commas(#[case] set_cookie: &str, #[case] expected: Vec<&str>) {
        let jar = CookieJar::new(None);
        jar.append_set_cookie(set_cookie);
        assert_eq!(jar.fragments(), expected);
    }

    #[test]
    fn does_not_deduplicate() {
        let jar = CookieJar::new(Some("sid=abc"));
        jar.append_set_cookie("sid=abc");
        assert_eq!(jar.fragments(), vec!["sid=abc", "sid=abc"]);
    }

    #[test]
    fn cookie_store_round_trip() {
        let jar = CookieJar::new(Some("sid=abc"));
        let url = Url::parse("http://localhost:3003/api/graphql").unwrap();
        let headers = [
            HeaderValue::from_static("keystonejs-session=s1; Path=/; HttpOnly"),
            HeaderValue::from_static("theme=dark"),
        ];

        jar.set_cookies(&mut headers.iter(), &url);

        assert_eq!(
            jar.cookies(&url),
            Some(HeaderValue::from_static(
                "sid=abc; keystonejs-session=s1; Path=/; HttpOnly; theme=dark"
            ))
        );
    }

    #[test]
    fn clear_empties_the_jar() {
        let jar = CookieJar::new(Some("sid=abc"));
        jar.clear();
        assert_eq!(jar.cookies(&Url::parse("http://localhost").unwrap()), None);
    }
}
