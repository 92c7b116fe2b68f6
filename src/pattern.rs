use std::sync::Arc;

use regex::Regex;
use tracing::error;

use crate::error::BuildPathError;
use crate::params::Params;

/// Inline regex flags applied to every compiled pattern.
///
/// Matching is case-insensitive, and `.` in custom constraints may match `\n`.
/// See the docs under: https://docs.rs/regex/1/regex/#grouping-and-flags
const REGEX_FLAGS: &str = "(?is-m)";

/// Constraint applied to a dynamic segment that does not declare its own.
const DEFAULT_CONSTRAINT: &str = r"[a-zA-Z0-9_\-]+";

/// A compiled route path template.
///
/// A template is a string of literal text interleaved with dynamic segments
/// written as `{name}` or `{name:regex}`. The compiled form is an anchored,
/// case-insensitive regular expression with one named capture group per
/// dynamic segment, plus the segment list needed to build concrete paths in
/// reverse.
///
/// Templates without dynamic segments skip the regex engine entirely and are
/// compared as plain strings.
///
/// # Matching modes
/// A pattern compiled with [`new`](Self::new) must match a path from start to
/// end. A pattern compiled with [`prefix`](Self::prefix) only requires the
/// path to start with it; route groups use this mode for their accumulated
/// prefixes.
///
/// # Examples
/// ```
/// use clear_router::PathPattern;
///
/// let pattern = PathPattern::new("/post/{id:[0-9]+}-{slug}");
/// assert!(pattern.is_match("/post/42-hello-world"));
/// assert!(!pattern.is_match("/post/abc-hello"));
///
/// let params = pattern.capture("/post/42-hello-world").unwrap();
/// assert_eq!(params.get("id").unwrap(), "42");
/// assert_eq!(params.get("slug").unwrap(), "hello-world");
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// Template string the pattern was compiled from.
    template: String,

    is_prefix: bool,

    kind: PatternKind,

    /// Ordered literal/parameter parts used by the reverse builder.
    segments: Vec<PatternSegment>,
}

#[derive(Debug, Clone)]
enum PatternKind {
    /// No dynamic segments; matched by string comparison.
    Static(String),

    /// Compiled template regex and dynamic segment names, in order.
    Dynamic(Regex, Vec<Arc<str>>),
}

#[derive(Debug, Clone)]
enum PatternSegment {
    Literal(String),

    Param {
        name: Arc<str>,
        /// Anchored form of the segment's constraint, used to validate values
        /// supplied to the reverse builder.
        check: Regex,
    },
}

impl PathPattern {
    /// Compiles a template that must match a path in full.
    ///
    /// # Panics
    /// Panics if the template is malformed: unbalanced braces, an empty,
    /// duplicate, or non-identifier parameter name, or a constraint that is
    /// not a valid regular expression.
    ///
    /// # Examples
    /// ```
    /// use clear_router::PathPattern;
    ///
    /// let pattern = PathPattern::new("/user/{id}");
    /// assert!(pattern.is_match("/user/123"));
    /// assert!(!pattern.is_match("/user/123/stars"));
    /// assert!(!pattern.is_match("/foo"));
    /// ```
    pub fn new(template: impl Into<String>) -> Self {
        Self::compile(template.into(), false)
    }

    /// Compiles a template that matches any path starting with it.
    ///
    /// No segment-boundary requirement is imposed on the remainder; a prefix
    /// pattern `/api` matches `/api`, `/api/v1` and also `/apifoo`. Leaf
    /// routes still have to match in full, so a textual prefix hit that leads
    /// nowhere is harmless to dispatch.
    ///
    /// # Panics
    /// Same conditions as [`new`](Self::new).
    pub fn prefix(template: impl Into<String>) -> Self {
        Self::compile(template.into(), true)
    }

    /// Returns the template string this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns `true` if the pattern was compiled in prefix mode.
    pub fn is_prefix(&self) -> bool {
        self.is_prefix
    }

    /// Returns the dynamic segment names, in template order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            PatternSegment::Param { name, .. } => Some(&**name),
            PatternSegment::Literal(_) => None,
        })
    }

    /// Returns `true` if `path` matches this pattern.
    ///
    /// # Examples
    /// ```
    /// use clear_router::PathPattern;
    ///
    /// let pattern = PathPattern::new("/status");
    /// assert!(pattern.is_match("/status"));
    /// assert!(pattern.is_match("/STATUS"));
    /// assert!(!pattern.is_match("/status/x"));
    ///
    /// let pattern = PathPattern::prefix("/api");
    /// assert!(pattern.is_match("/api/v1/status"));
    /// ```
    pub fn is_match(&self, path: &str) -> bool {
        match &self.kind {
            PatternKind::Static(pattern) => {
                if self.is_prefix {
                    starts_with_ignore_case(path, pattern)
                } else {
                    path.eq_ignore_ascii_case(pattern)
                }
            }
            PatternKind::Dynamic(re, _) => re.is_match(path),
        }
    }

    /// Matches `path` and collects dynamic segment values.
    ///
    /// Returns `None` if the path does not match. For static patterns the
    /// returned [`Params`] is empty.
    pub fn capture(&self, path: &str) -> Option<Params> {
        match &self.kind {
            PatternKind::Static(_) => self.is_match(path).then(Params::new),

            PatternKind::Dynamic(re, names) => {
                let captures = re.captures(path)?;
                let mut params = Params::with_capacity(names.len());

                for name in names {
                    match captures.name(name) {
                        Some(m) => params.push(Arc::clone(name), m.as_str().to_owned()),
                        None => {
                            error!("pattern matched but segment was not captured: {}", name);
                            return None;
                        }
                    }
                }

                Some(params)
            }
        }
    }

    /// Builds a concrete path by substituting `values` into the template.
    ///
    /// Each dynamic segment takes the first value with a matching name; the
    /// value must satisfy the segment's constraint. Extra entries in `values`
    /// are ignored.
    ///
    /// # Errors
    /// [`BuildPathError::MissingParameter`] if a segment has no value, and
    /// [`BuildPathError::InvalidParameter`] if a value violates its segment's
    /// constraint.
    ///
    /// # Examples
    /// ```
    /// use clear_router::PathPattern;
    ///
    /// let pattern = PathPattern::new("/user/{id:[0-9]+}/post/{title}");
    /// let path = pattern.build_path(&[("id", "123"), ("title", "my-post")]).unwrap();
    /// assert_eq!(path, "/user/123/post/my-post");
    ///
    /// assert!(pattern.build_path(&[("id", "abc"), ("title", "my-post")]).is_err());
    /// ```
    pub fn build_path<K, V>(&self, values: &[(K, V)]) -> Result<String, BuildPathError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut path = String::with_capacity(self.template.len());

        for segment in &self.segments {
            match segment {
                PatternSegment::Literal(lit) => path.push_str(lit),
                PatternSegment::Param { name, check } => {
                    let value = values
                        .iter()
                        .find(|(key, _)| key.as_ref() == &**name)
                        .map(|(_, value)| value.as_ref())
                        .ok_or_else(|| BuildPathError::MissingParameter(name.to_string()))?;

                    if !check.is_match(value) {
                        return Err(BuildPathError::InvalidParameter(name.to_string()));
                    }

                    path.push_str(value);
                }
            }
        }

        Ok(path)
    }

    fn compile(template: String, is_prefix: bool) -> Self {
        if !template.contains('{') {
            return PathPattern {
                segments: vec![PatternSegment::Literal(template.clone())],
                kind: PatternKind::Static(template.clone()),
                template,
                is_prefix,
            };
        }

        let mut segments = Vec::new();
        let mut names: Vec<Arc<str>> = Vec::new();
        let mut re = format!("{}^", REGEX_FLAGS);
        let mut unprocessed = template.as_str();

        while let Some(idx) = unprocessed.find('{') {
            let (literal, rem) = unprocessed.split_at(idx);

            if !literal.is_empty() {
                segments.push(PatternSegment::Literal(literal.to_owned()));
                re.push_str(&regex::escape(literal));
            }

            let (name, constraint, rem) = parse_param(&template, rem);

            if names.iter().any(|n| **n == *name) {
                panic!(
                    r#"pattern "{}" declares parameter "{}" more than once"#,
                    template, name
                );
            }

            let check = match Regex::new(&format!("{}^(?:{})$", REGEX_FLAGS, constraint)) {
                Ok(re) => re,
                Err(err) => panic!(
                    r#"pattern "{}" has invalid constraint for "{}": {}"#,
                    template, name, err
                ),
            };

            let name: Arc<str> = Arc::from(name);
            re.push_str(&format!("(?P<{}>{})", name, constraint));
            segments.push(PatternSegment::Param {
                name: Arc::clone(&name),
                check,
            });
            names.push(name);

            unprocessed = rem;
        }

        if !unprocessed.is_empty() {
            segments.push(PatternSegment::Literal(unprocessed.to_owned()));
            re.push_str(&regex::escape(unprocessed));
        }

        if !is_prefix {
            re.push('$');
        }

        let re = match Regex::new(&re) {
            Ok(re) => re,
            Err(err) => panic!(r#"wrong path pattern "{}": {}"#, template, err),
        };

        PathPattern {
            template,
            is_prefix,
            kind: PatternKind::Dynamic(re, names),
            segments,
        }
    }
}

/// Parses one `{name}` / `{name:regex}` token.
///
/// `rem` starts at the opening brace. Returns the parameter name, its
/// constraint source, and the rest of the template after the closing brace.
/// Braces inside the constraint are allowed as long as they are balanced, so
/// counted repetitions such as `{id:\d{6}}` parse correctly.
fn parse_param<'t>(template: &str, rem: &'t str) -> (&'t str, &'t str, &'t str) {
    let mut nesting = 0usize;
    let close_idx = rem
        .find(|c| match c {
            '{' => {
                nesting += 1;
                false
            }
            '}' => {
                nesting -= 1;
                nesting == 0
            }
            _ => false,
        })
        .unwrap_or_else(|| {
            panic!(
                r#"pattern "{}" contains malformed dynamic segment"#,
                template
            )
        });

    let (param, rem) = rem.split_at(close_idx + 1);

    // remove outer curly brackets
    let param = &param[1..param.len() - 1];

    let (name, constraint) = match param.find(':') {
        Some(idx) => (&param[..idx], &param[idx + 1..]),
        None => (param, DEFAULT_CONSTRAINT),
    };

    let valid_name = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_name {
        panic!(
            r#"pattern "{}" has invalid parameter name "{}""#,
            template, name
        );
    }

    (name, constraint, rem)
}

fn starts_with_ignore_case(path: &str, prefix: &str) -> bool {
    path.len() >= prefix.len()
        && path.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
