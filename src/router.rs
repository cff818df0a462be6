use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DETAIL_PREFIX: &str = "/detail/";

/// The two locations the client can be at: `/` and `/detail/<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Listing,
    Detail(String),
}

#[derive(Debug, Error, PartialEq)]
#[error("no route matches '{0}' (expected '/' or '/detail/<id>')")]
pub struct UnknownRoute(pub String);

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Listing => write!(f, "/"),
            Route::Detail(id) => write!(f, "{DETAIL_PREFIX}{id}"),
        }
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path.is_empty() || path == "/" {
            return Ok(Route::Listing);
        }
        match path.strip_prefix(DETAIL_PREFIX) {
            Some(id) if !id.is_empty() => Ok(Route::Detail(id.to_string())),
            _ => Err(UnknownRoute(path.to_string())),
        }
    }
}
