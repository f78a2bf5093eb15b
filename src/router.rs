//! Path-based routing of inbound requests.
//!
//! Applications register the paths they serve. Each registered path owns a
//! FIFO queue; an inbound request lands in the queue of the longest
//! registered prefix of its target. Requests nobody registered for are
//! answered by a built-in fallback.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::codec::{Method, Request, Response, StatusCode};

/// Default path answered with `200 OK` by the built-in fallback.
pub const DEFAULT_LIVENESS_PATH: &str = "/ping";

/// What [`InboundRouter::route`] did with a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The request was appended to the queue of `path`.
    Queued {
        /// Registered path that received the request.
        path: String,
    },
    /// An identical request is already waiting in the queue of `path`.
    Duplicate {
        /// Registered path holding the earlier copy.
        path: String,
    },
    /// No registration matched; send this response instead.
    Fallback(Response),
}

/// Normalise `path` to `/seg1/seg2` form.
///
/// Empty segments are dropped, so `""` and `"/"` both become `"/"`.
///
/// # Examples
///
/// ```
/// use serp::router::normalise_path;
///
/// assert_eq!(normalise_path("lights//hall/"), "/lights/hall");
/// assert_eq!(normalise_path(""), "/");
/// ```
#[must_use]
pub fn normalise_path(path: &str) -> String {
    let mut normalised = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        normalised.push('/');
        normalised.push_str(segment);
    }
    if normalised.is_empty() {
        normalised.push('/');
    }
    normalised
}

/// Registered paths and their queues of received requests.
///
/// # Examples
///
/// ```
/// use serp::{
///     codec::{Method, Request},
///     router::{InboundRouter, RouteOutcome},
/// };
///
/// let mut router = InboundRouter::default();
/// router.register_path("/lights");
///
/// let outcome = router.route(Request::new(Method::Put, "/lights/hall"));
/// assert_eq!(outcome, RouteOutcome::Queued { path: "/lights".into() });
/// assert_eq!(router.pop("/lights").map(|r| r.target), Some("/lights/hall".into()));
/// ```
#[derive(Debug)]
pub struct InboundRouter {
    queues: HashMap<String, VecDeque<Request>>,
    liveness_path: String,
}

impl Default for InboundRouter {
    fn default() -> Self { Self::new(DEFAULT_LIVENESS_PATH) }
}

impl InboundRouter {
    /// Create a router whose fallback answers `GET liveness_path`.
    #[must_use]
    pub fn new(liveness_path: &str) -> Self {
        Self {
            queues: HashMap::new(),
            liveness_path: normalise_path(liveness_path),
        }
    }

    /// Path answered by the built-in liveness probe.
    #[must_use]
    pub fn liveness_path(&self) -> &str { &self.liveness_path }

    /// Start queueing requests for `path` and everything below it.
    ///
    /// Returns `false`, keeping the existing queue, if `path` is already
    /// registered.
    pub fn register_path(&mut self, path: &str) -> bool {
        let path = normalise_path(path);
        if self.queues.contains_key(&path) {
            return false;
        }
        debug!("path registered: path={path}");
        self.queues.insert(path, VecDeque::new());
        true
    }

    /// Stop queueing requests for `path`.
    ///
    /// Returns the requests still waiting in its queue, or `None` if the path
    /// was not registered.
    pub fn unregister_path(&mut self, path: &str) -> Option<Vec<Request>> {
        let path = normalise_path(path);
        let queue = self.queues.remove(&path)?;
        if !queue.is_empty() {
            debug!(
                "path unregistered with queued requests: path={path}, dropped={}",
                queue.len()
            );
        }
        Some(queue.into())
    }

    /// Returns true if `path` is registered.
    #[must_use]
    pub fn is_registered(&self, path: &str) -> bool {
        self.queues.contains_key(&normalise_path(path))
    }

    /// Registered paths in lexicographic order.
    #[must_use]
    pub fn registered_paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.queues.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Longest registered prefix of `target`, matched on whole segments.
    ///
    /// Candidates are `/seg1`, `/seg1/seg2` and so on, so the root path `/`
    /// never matches, even when registered.
    #[must_use]
    pub fn resolve(&self, target: &str) -> Option<&str> {
        let mut prefix = String::with_capacity(target.len());
        let mut matched = None;
        for segment in target.split('/').filter(|segment| !segment.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            if let Some((path, _)) = self.queues.get_key_value(prefix.as_str()) {
                matched = Some(path);
            }
        }
        matched.map(String::as_str)
    }

    /// Deliver `request` to the queue of its most specific registered path.
    ///
    /// A request whose `(source, message_id)` is already queued there is not
    /// queued again. Unmatched requests get the fallback response: `200 OK`
    /// for a GET on the liveness path, `404 Not Found` otherwise.
    pub fn route(&mut self, request: Request) -> RouteOutcome {
        let Some(path) = self.resolve(&request.target).map(str::to_owned) else {
            return RouteOutcome::Fallback(self.fallback(&request));
        };
        let Some(queue) = self.queues.get_mut(&path) else {
            return RouteOutcome::Fallback(self.fallback(&request));
        };

        let duplicate = queue.iter().any(|queued| {
            queued.header.source == request.header.source
                && queued.header.message_id == request.header.message_id
        });
        if duplicate {
            debug!(
                "duplicate request suppressed: path={path}, source={}, message_id={}",
                request.header.source, request.header.message_id
            );
            return RouteOutcome::Duplicate { path };
        }

        queue.push_back(request);
        RouteOutcome::Queued { path }
    }

    fn fallback(&self, request: &Request) -> Response {
        if request.method == Method::Get && normalise_path(&request.target) == self.liveness_path {
            return Response::reply_to(request, StatusCode::Ok);
        }
        warn!(
            "no route for request: method={}, target={}, source={}",
            request.method, request.target, request.header.source
        );
        Response::reply_to(request, StatusCode::NotFound)
    }

    /// Take the oldest request queued for `path`.
    pub fn pop(&mut self, path: &str) -> Option<Request> {
        self.queues.get_mut(&normalise_path(path))?.pop_front()
    }

    /// Number of requests queued for `path`, or `None` if unregistered.
    #[must_use]
    pub fn queue_len(&self, path: &str) -> Option<usize> {
        self.queues.get(&normalise_path(path)).map(VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tracing_test::traced_test;

    use super::*;
    use crate::codec::{MessageId, PeerId};

    fn request(method: Method, target: &str, source: u16, id: u32) -> Request {
        let mut request = Request::new(method, target);
        request.header.source = PeerId::new(source);
        request.header.destination = PeerId::new(1);
        request.header.message_id = MessageId::new(id);
        request
    }

    #[fixture]
    fn router() -> InboundRouter {
        let mut router = InboundRouter::default();
        router.register_path("/a");
        router.register_path("/a/b");
        router
    }

    #[rstest]
    #[case("/a", Some("/a"))]
    #[case("/a/c", Some("/a"))]
    #[case("/a/b", Some("/a/b"))]
    #[case("/a/b/c/d", Some("/a/b"))]
    #[case("a//b/", Some("/a/b"))]
    #[case("/ab", None)]
    #[case("/b/a", None)]
    #[case("", None)]
    fn longest_registered_prefix_wins(
        router: InboundRouter,
        #[case] target: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(router.resolve(target), expected);
    }

    #[rstest]
    fn root_registration_never_matches(mut router: InboundRouter) {
        router.register_path("/");
        assert_eq!(router.resolve("/zzz"), None);
        assert_eq!(router.resolve(""), None);
        assert_eq!(router.resolve("/a/x"), Some("/a"));

        let ping = request(Method::Get, "/ping", 7, 1);
        let expected = Response::reply_to(&ping, StatusCode::Ok);
        assert_eq!(router.route(ping), RouteOutcome::Fallback(expected));

        let RouteOutcome::Fallback(reply) = router.route(request(Method::Get, "", 7, 2)) else {
            panic!("empty target must get the built-in answer");
        };
        assert_eq!(reply.status, StatusCode::NotFound);
        assert_eq!(router.queue_len("/"), Some(0));
    }

    #[rstest]
    fn queues_are_fifo(mut router: InboundRouter) {
        for id in 1..=3 {
            router.route(request(Method::Post, "/a/x", 7, id));
        }
        let ids: Vec<_> = std::iter::from_fn(|| router.pop("/a"))
            .map(|r| r.header.message_id.get())
            .collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[rstest]
    fn duplicate_source_and_id_is_queued_once(mut router: InboundRouter) {
        let outcome = router.route(request(Method::Put, "/a/b", 7, 1));
        assert_eq!(outcome, RouteOutcome::Queued { path: "/a/b".into() });
        let outcome = router.route(request(Method::Put, "/a/b", 7, 1));
        assert_eq!(outcome, RouteOutcome::Duplicate { path: "/a/b".into() });
        assert_eq!(router.queue_len("/a/b"), Some(1));

        router.route(request(Method::Put, "/a/b", 8, 1));
        router.route(request(Method::Put, "/a/b", 7, 2));
        assert_eq!(router.queue_len("/a/b"), Some(3));
    }

    #[rstest]
    fn popped_request_may_be_queued_again(mut router: InboundRouter) {
        router.route(request(Method::Get, "/a", 7, 1));
        assert!(router.pop("/a").is_some());
        let outcome = router.route(request(Method::Get, "/a", 7, 1));
        assert!(matches!(outcome, RouteOutcome::Queued { .. }));
    }

    #[rstest]
    #[case(Method::Get, "/ping", StatusCode::Ok)]
    #[case(Method::Get, "ping/", StatusCode::Ok)]
    #[case(Method::Put, "/ping", StatusCode::NotFound)]
    #[case(Method::Get, "/pong", StatusCode::NotFound)]
    #[case(Method::Get, "", StatusCode::NotFound)]
    fn fallback_answers_unrouted_requests(
        mut router: InboundRouter,
        #[case] method: Method,
        #[case] target: &str,
        #[case] status: StatusCode,
    ) {
        let RouteOutcome::Fallback(response) = router.route(request(method, target, 7, 9)) else {
            panic!("expected fallback");
        };
        assert_eq!(response.status, status);
        assert_eq!(response.header.destination, PeerId::new(7));
        assert_eq!(response.header.source, PeerId::new(1));
        assert_eq!(response.header.message_id, MessageId::new(9));
    }

    #[rstest]
    #[traced_test]
    fn routing_miss_is_logged(mut router: InboundRouter) {
        router.route(request(Method::Delete, "/nowhere", 7, 9));
        assert!(logs_contain("no route for request: method=DELETE, target=/nowhere"));
    }

    #[rstest]
    fn registration_is_normalised_and_idempotent(mut router: InboundRouter) {
        assert!(!router.register_path("a/"));
        assert!(router.register_path("c"));
        assert!(router.is_registered("/c"));
        assert_eq!(router.registered_paths(), ["/a", "/a/b", "/c"]);
    }

    #[rstest]
    fn unregister_returns_waiting_requests(mut router: InboundRouter) {
        router.route(request(Method::Post, "/a/b/c", 7, 1));
        let dropped = router.unregister_path("/a/b").expect("registered");
        assert_eq!(dropped.len(), 1);
        assert_eq!(router.unregister_path("/a/b"), None);
        assert_eq!(router.resolve("/a/b/c"), Some("/a"));
        assert_eq!(router.pop("/a/b"), None);
    }
}
