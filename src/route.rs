//! Navigation locations the views bind to.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Dashboard,
    /// `/details/{lotId}`
    Details { lot_id: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no view for path `{0}`")]
    Unknown(String),
    #[error("missing lot id in `{0}`")]
    MissingLot(String),
}

impl Route {
    pub fn details(lot_id: impl Into<String>) -> Self {
        Route::Details {
            lot_id: lot_id.into(),
        }
    }

    /// The lot id parameter, if this route carries one.
    pub fn lot_id(&self) -> Option<&str> {
        match self {
            Route::Dashboard => None,
            Route::Details { lot_id } => Some(lot_id),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let trimmed = trimmed.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Ok(Route::Dashboard),
            ["details"] => Err(RouteError::MissingLot(path.to_string())),
            ["details", lot_id] => Ok(Route::details(*lot_id)),
            _ => Err(RouteError::Unknown(path.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Dashboard => f.write_str("/"),
            Route::Details { lot_id } => write!(f, "/details/{lot_id}"),
        }
    }
}
