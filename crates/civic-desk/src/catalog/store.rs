use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::info;

use super::domain::{Service, ServiceCategory, ServiceDefinitionError};
use super::standard;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("service '{0}' not found")]
    NotFound(String),
    #[error("unknown service category '{0}'")]
    UnknownCategory(String),
    #[error(transparent)]
    Definition(#[from] ServiceDefinitionError),
}

/// In-process service catalog that staff configure through the admin API.
#[derive(Debug)]
pub struct ServiceCatalog {
    categories: Vec<ServiceCategory>,
    services: RwLock<BTreeMap<String, Service>>,
}

impl ServiceCatalog {
    pub fn new(categories: Vec<ServiceCategory>) -> Self {
        Self {
            categories,
            services: RwLock::new(BTreeMap::new()),
        }
    }

    /// Catalog seeded with the office's stock services.
    pub fn standard() -> Self {
        let catalog = Self::new(standard::categories());
        {
            let mut guard = catalog.services.write().expect("catalog lock poisoned");
            for service in standard::services() {
                guard.insert(service.slug.clone(), service);
            }
        }
        catalog
    }

    pub fn categories(&self) -> &[ServiceCategory] {
        &self.categories
    }

    pub fn get(&self, slug: &str) -> Result<Service, CatalogError> {
        let guard = self.services.read().expect("catalog lock poisoned");
        guard
            .get(slug)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
    }

    /// Services sorted by slug, optionally limited to one category.
    pub fn list(&self, category: Option<&str>) -> Vec<Service> {
        let guard = self.services.read().expect("catalog lock poisoned");
        guard
            .values()
            .filter(|service| category.map_or(true, |slug| service.category == slug))
            .cloned()
            .collect()
    }

    /// Insert or replace a service definition. Returns `true` when it replaced one.
    pub fn upsert(&self, service: Service) -> Result<bool, CatalogError> {
        service.check_definition()?;
        if !self
            .categories
            .iter()
            .any(|category| category.slug == service.category)
        {
            return Err(CatalogError::UnknownCategory(service.category.clone()));
        }

        let mut guard = self.services.write().expect("catalog lock poisoned");
        let slug = service.slug.clone();
        let replaced = guard.insert(slug.clone(), service).is_some();
        info!(%slug, replaced, "catalog service saved");
        Ok(replaced)
    }

    pub fn remove(&self, slug: &str) -> Result<Service, CatalogError> {
        let mut guard = self.services.write().expect("catalog lock poisoned");
        let removed = guard
            .remove(slug)
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))?;
        info!(%slug, "catalog service removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_lists_by_category() {
        let catalog = ServiceCatalog::standard();
        assert_eq!(catalog.list(None).len(), 5);

        let registry = catalog.list(Some(standard::CIVIL_REGISTRY));
        let slugs: Vec<&str> = registry.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec!["birth-certificate", "death-certificate", "marriage-certificate"]
        );
    }

    #[test]
    fn upsert_replaces_and_validates() {
        let catalog = ServiceCatalog::standard();
        let mut passport = catalog.get("passport").expect("passport seeded");
        passport.variants[0].price_cents = 55_000;

        assert!(catalog.upsert(passport).expect("upsert succeeds"));
        assert_eq!(
            catalog.get("passport").expect("present").variants[0].price_cents,
            55_000
        );

        let mut orphan = standard::passport();
        orphan.slug = "visa".to_string();
        orphan.category = "consular".to_string();
        assert!(matches!(
            catalog.upsert(orphan),
            Err(CatalogError::UnknownCategory(_))
        ));
    }

    #[test]
    fn remove_reports_missing_services() {
        let catalog = ServiceCatalog::standard();
        catalog.remove("death-certificate").expect("removed");
        assert!(matches!(
            catalog.remove("death-certificate"),
            Err(CatalogError::NotFound(_))
        ));
    }
}
