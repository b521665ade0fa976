//! Locators for objects: a resource part and an optional fragment.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A resource URI with an optional `#fragment` addressing an object inside it.
///
/// The resource part is opaque here: no scheme validation, normalization,
/// or relative resolution. Equality is exact string equality of both parts.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Uri {
    resource: String,
    fragment: Option<String>,
}

impl Uri {
    /// Split a string at its first `#`.
    ///
    /// ```rust
    /// use objgraph_core::Uri;
    ///
    /// let uri = Uri::parse("library.model#//@books.2");
    /// assert_eq!(uri.resource(), "library.model");
    /// assert_eq!(uri.fragment(), Some("//@books.2"));
    /// assert_eq!(uri.to_string(), "library.model#//@books.2");
    /// ```
    pub fn parse(s: &str) -> Self {
        match s.split_once('#') {
            Some((resource, fragment)) => Self {
                resource: resource.to_string(),
                fragment: Some(fragment.to_string()),
            },
            None => Self {
                resource: s.to_string(),
                fragment: None,
            },
        }
    }

    /// A URI naming a whole resource.
    pub fn resource_uri(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            fragment: None,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn has_fragment(&self) -> bool {
        self.fragment.is_some()
    }

    /// The same URI without its fragment.
    pub fn trim_fragment(&self) -> Self {
        Self::resource_uri(self.resource.clone())
    }

    /// The same resource with `fragment` replacing any existing fragment.
    pub fn with_fragment(&self, fragment: impl Into<String>) -> Self {
        Self {
            resource: self.resource.clone(),
            fragment: Some(fragment.into()),
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource)?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

impl FromStr for Uri {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.to_string()
    }
}
