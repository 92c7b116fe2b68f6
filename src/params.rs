use std::ops::Index;
use std::sync::Arc;

use serde::de;
use serde::Deserialize;

use crate::de::ParamsDeserializer;
use crate::Request;

/// Dynamic segment values captured from a matched path.
///
/// Dispatch stores a `Params` in the matched request's extension map; use
/// [`RequestExt::params`](crate::RequestExt::params) to read it back inside
/// middleware and handlers. Values keep the order in which their segments
/// appear in the route template.
#[derive(Debug, Clone, Default)]
pub struct Params {
    segments: Vec<(Arc<str>, String)>,
}

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Params {
        Params::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Params {
        Params {
            segments: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: String) {
        self.segments.push((name, value));
    }

    pub(crate) fn segments(&self) -> &[(Arc<str>, String)] {
        &self.segments
    }

    /// Returns `true` if no segments were captured.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of captured segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns the value captured for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(seg_name, _)| &**seg_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the value captured for `name`, or an empty string.
    pub fn query(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    /// Iterates over `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.segments
            .iter()
            .map(|(name, value)| (&**name, value.as_str()))
    }

    /// Deserializes the captured segments into `T`.
    ///
    /// Structs deserialize by segment name, tuples and sequences by position,
    /// and a single scalar from a single captured segment.
    ///
    /// # Errors
    /// Returns an error when the captured values cannot be deserialized into
    /// `T`.
    ///
    /// # Examples
    /// ```
    /// use clear_router::{Params, PathPattern};
    ///
    /// #[derive(serde::Deserialize)]
    /// struct Info {
    ///     id: u32,
    ///     slug: String,
    /// }
    ///
    /// let pattern = PathPattern::new("/post/{id:[0-9]+}-{slug}");
    /// let params = pattern.capture("/post/42-hello").unwrap();
    /// let info: Info = params.load().unwrap();
    /// assert_eq!(info.id, 42);
    /// assert_eq!(info.slug, "hello");
    /// ```
    pub fn load<'de, T: Deserialize<'de>>(&'de self) -> Result<T, de::value::Error> {
        T::deserialize(ParamsDeserializer::new(self))
    }
}

impl<'a> Index<&'a str> for Params {
    type Output = str;

    fn index(&self, name: &'a str) -> &str {
        self.get(name)
            .unwrap_or_else(|| panic!("no value for path parameter {}", name))
    }
}

impl Index<usize> for Params {
    type Output = str;

    fn index(&self, idx: usize) -> &str {
        &self.segments[idx].1
    }
}

/// Router-specific accessors on the request type.
pub trait RequestExt {
    /// Returns the path parameters bound by dispatch.
    ///
    /// Empty when the request did not go through dispatch or its route has no
    /// dynamic segments.
    fn params(&self) -> &Params;
}

impl RequestExt for Request {
    fn params(&self) -> &Params {
        static EMPTY: Params = Params {
            segments: Vec::new(),
        };

        self.extensions().get::<Params>().unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Params {
        let mut params = Params::with_capacity(2);
        params.push(Arc::from("id"), "42".to_owned());
        params.push(Arc::from("slug"), "hello".to_owned());
        params
    }

    #[test]
    fn lookup() {
        let params = sample();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id").unwrap(), "42");
        assert_eq!(params.get("slug").unwrap(), "hello");
        assert!(params.get("missing").is_none());
        assert_eq!(params.query("missing"), "");
        assert_eq!(&params["id"], "42");
        assert_eq!(&params[1], "hello");
    }

    #[test]
    fn iteration_keeps_template_order() {
        let params = sample();
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, [("id", "42"), ("slug", "hello")]);
    }
}
