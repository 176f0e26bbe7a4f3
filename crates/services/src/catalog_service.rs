use std::sync::Arc;

use course_core::Catalog;
use storage::repository::CatalogSource;
use tokio::sync::OnceCell;

use crate::error::LoadError;

/// Process-scoped catalog cache.
///
/// The catalog is fetched on the first successful `load_catalog` and kept for
/// the lifetime of the service. Failed loads are not cached, so the next call
/// retries the source.
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    cached: OnceCell<Arc<Catalog>>,
}

impl CatalogService {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            cached: OnceCell::new(),
        }
    }

    /// Return the cached catalog, fetching it first if needed.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Source` if the source cannot be read and
    /// `LoadError::Invalid` if it yields duplicate module or video ids.
    pub async fn load_catalog(&self) -> Result<Arc<Catalog>, LoadError> {
        let catalog = self
            .cached
            .get_or_try_init(|| async {
                let modules = self.source.fetch_modules().await?;
                let catalog = Catalog::new(modules).map_err(course_core::Error::from)?;
                tracing::info!(modules = catalog.len(), "catalog loaded");
                Ok::<_, LoadError>(Arc::new(catalog))
            })
            .await?;
        Ok(Arc::clone(catalog))
    }

    /// The catalog if it has already been loaded.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<Catalog>> {
        self.cached.get().cloned()
    }
}
