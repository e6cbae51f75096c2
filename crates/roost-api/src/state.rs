use std::sync::Arc;

use tracing::error;

use roost_db::Database;

use crate::contact::ContactRelay;
use crate::error::ApiError;
use crate::geocode::Geocoder;
use crate::probe::UrlProbe;
use crate::uploads::ImageStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub images: ImageStore,
    pub geocoder: Arc<dyn Geocoder>,
    pub probe: Arc<dyn UrlProbe>,
    pub contact: Arc<ContactRelay>,
}

impl AppStateInner {
    /// Run blocking DB work off the async runtime.
    pub async fn with_db<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(e.into())
            })?
    }
}
