pub mod auth;
pub mod contact;
pub mod convert;
pub mod dossiers;
pub mod error;
pub mod extract;
pub mod filter;
pub mod geocode;
pub mod items;
pub mod mailer;
pub mod middleware;
pub mod probe;
pub mod routes;
pub mod state;
pub mod uploads;
pub mod validate;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};
