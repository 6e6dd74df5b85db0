/* src/core/rust/src/history.rs */

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

pub type ListenerId = u64;

pub type Listener = Arc<dyn Fn(&Location) + Send + Sync>;

/// A history entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
  pub pathname: String,
  /// Query string including the leading `?`, or empty.
  pub search: String,
  /// Fragment including the leading `#`, or empty.
  pub hash: String,
  pub state: Option<Value>,
}

impl Location {
  /// Split `url` (`/path?query#hash`) into its parts.
  pub fn parse(url: &str, state: Option<Value>) -> Self {
    let (rest, hash) = match url.find('#') {
      Some(i) => (&url[..i], &url[i..]),
      None => (url, ""),
    };
    let (pathname, search) = match rest.find('?') {
      Some(i) => (&rest[..i], &rest[i..]),
      None => (rest, ""),
    };
    let pathname = if pathname.is_empty() { "/" } else { pathname };
    Self { pathname: pathname.to_string(), search: search.to_string(), hash: hash.to_string(), state }
  }

  /// The state value stored under `key`, if the state is an object.
  pub fn state_key(&self, key: &str) -> Option<&Value> {
    self.state.as_ref()?.get(key)
  }
}

/// Session navigation history.
///
/// Listeners run synchronously, in registration order, on the thread that
/// changed the history and after every internal lock is released. A
/// listener may therefore navigate again.
pub trait History: Send + Sync {
  fn location(&self) -> Location;

  fn push(&self, url: &str, state: Option<Value>);

  fn replace(&self, url: &str, state: Option<Value>);

  /// Move `delta` entries through the stack. Out-of-range moves are clamped.
  fn go(&self, delta: isize);

  fn back(&self) {
    self.go(-1);
  }

  fn forward(&self) {
    self.go(1);
  }

  fn listen(&self, listener: Listener) -> ListenerId;

  fn unlisten(&self, id: ListenerId);
}

struct Inner {
  entries: Vec<Location>,
  index: usize,
  next_id: ListenerId,
  listeners: Vec<(ListenerId, Listener)>,
}

/// In-memory history stack.
pub struct MemoryHistory {
  inner: Mutex<Inner>,
}

impl Default for MemoryHistory {
  fn default() -> Self {
    Self::new("/")
  }
}

impl MemoryHistory {
  pub fn new(initial: &str) -> Self {
    Self {
      inner: Mutex::new(Inner {
        entries: vec![Location::parse(initial, None)],
        index: 0,
        next_id: 0,
        listeners: Vec::new(),
      }),
    }
  }

  pub fn len(&self) -> usize {
    self.inner.lock().entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.lock().entries.is_empty()
  }

  pub fn index(&self) -> usize {
    self.inner.lock().index
  }

  fn notify(&self) {
    let (location, listeners) = {
      let inner = self.inner.lock();
      let listeners: Vec<Listener> = inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
      (inner.entries[inner.index].clone(), listeners)
    };
    trace!(path = %location.pathname, listeners = listeners.len(), "history changed");
    for listener in listeners {
      listener(&location);
    }
  }
}

impl History for MemoryHistory {
  fn location(&self) -> Location {
    let inner = self.inner.lock();
    inner.entries[inner.index].clone()
  }

  fn push(&self, url: &str, state: Option<Value>) {
    {
      let mut inner = self.inner.lock();
      let next = inner.index + 1;
      inner.entries.truncate(next);
      inner.entries.push(Location::parse(url, state));
      inner.index = next;
    }
    self.notify();
  }

  fn replace(&self, url: &str, state: Option<Value>) {
    {
      let mut inner = self.inner.lock();
      let index = inner.index;
      inner.entries[index] = Location::parse(url, state);
    }
    self.notify();
  }

  fn go(&self, delta: isize) {
    let moved = {
      let mut inner = self.inner.lock();
      let last = inner.entries.len() - 1;
      let target = inner.index.saturating_add_signed(delta).min(last);
      let moved = target != inner.index;
      inner.index = target;
      moved
    };
    if moved {
      self.notify();
    }
  }

  fn listen(&self, listener: Listener) -> ListenerId {
    let mut inner = self.inner.lock();
    let id = inner.next_id;
    inner.next_id += 1;
    inner.listeners.push((id, listener));
    id
  }

  fn unlisten(&self, id: ListenerId) {
    self.inner.lock().listeners.retain(|(listener_id, _)| *listener_id != id);
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn recorder(history: &MemoryHistory) -> (Arc<Mutex<Vec<String>>>, ListenerId) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = history.listen(Arc::new(move |location: &Location| {
      sink.lock().push(location.pathname.clone());
    }));
    (seen, id)
  }

  #[test]
  fn parses_urls() {
    let location = Location::parse("/a/b?x=1#top", Some(json!({ "k": 1 })));
    assert_eq!(location.pathname, "/a/b");
    assert_eq!(location.search, "?x=1");
    assert_eq!(location.hash, "#top");
    assert_eq!(location.state_key("k"), Some(&json!(1)));

    let bare = Location::parse("", None);
    assert_eq!(bare.pathname, "/");
    assert!(bare.search.is_empty() && bare.hash.is_empty());
    assert_eq!(Location::parse("/p#a?b", None).hash, "#a?b");
  }

  #[test]
  fn push_back_forward() {
    let history = MemoryHistory::new("/");
    let (seen, _) = recorder(&history);

    history.push("/a", None);
    history.push("/b", None);
    history.back();
    assert_eq!(history.location().pathname, "/a");
    history.forward();
    assert_eq!(history.location().pathname, "/b");
    assert_eq!(*seen.lock(), vec!["/a", "/b", "/a", "/b"]);
  }

  #[test]
  fn push_drops_forward_entries() {
    let history = MemoryHistory::new("/");
    history.push("/a", None);
    history.push("/b", None);
    history.go(-2);
    history.push("/c", None);
    assert_eq!(history.len(), 2);
    history.forward();
    assert_eq!(history.location().pathname, "/c");
  }

  #[test]
  fn replace_keeps_length_and_state() {
    let history = MemoryHistory::new("/a");
    history.replace("/b", Some(json!({ "skip": "1/x" })));
    assert_eq!(history.len(), 1);
    let location = history.location();
    assert_eq!(location.pathname, "/b");
    assert_eq!(location.state_key("skip"), Some(&json!("1/x")));
  }

  #[test]
  fn out_of_range_moves_are_clamped_and_silent() {
    let history = MemoryHistory::new("/");
    let (seen, _) = recorder(&history);
    history.back();
    history.go(5);
    assert!(seen.lock().is_empty());
    assert_eq!(history.index(), 0);
  }

  #[test]
  fn unlisten_stops_delivery() {
    let history = MemoryHistory::new("/");
    let (seen, id) = recorder(&history);
    history.unlisten(id);
    history.push("/a", None);
    assert!(seen.lock().is_empty());
  }

  #[test]
  fn listeners_may_navigate() {
    let history = Arc::new(MemoryHistory::new("/"));
    let inner = Arc::clone(&history);
    history.listen(Arc::new(move |location: &Location| {
      if location.pathname == "/old" {
        inner.replace("/new", None);
      }
    }));
    history.push("/old", None);
    assert_eq!(history.location().pathname, "/new");
  }
}
