use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::orders::domain::{Customer, CustomerSummary};
use crate::orders::repository::{CustomerDirectory, RepositoryError};
use crate::orders::service::{CUSTOMER_SEARCH_LIMIT, MIN_SEARCH_CHARS};

/// Search-as-you-type over the customer directory.
///
/// Each call waits out the debounce window and only queries if no newer call arrived in the
/// meantime. A superseded call resolves to `Ok(None)`; callers drop it.
pub struct DebouncedSearch<C> {
    directory: Arc<C>,
    debounce: Duration,
    limit: usize,
    generation: AtomicU64,
}

impl<C> DebouncedSearch<C>
where
    C: CustomerDirectory + 'static,
{
    pub fn new(directory: Arc<C>, debounce: Duration) -> Self {
        Self {
            directory,
            debounce,
            limit: CUSTOMER_SEARCH_LIMIT,
            generation: AtomicU64::new(0),
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Supersede any pending search.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn search(
        &self,
        term: &str,
    ) -> Result<Option<Vec<CustomerSummary>>, RepositoryError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Some(Vec::new()));
        }

        tokio::time::sleep(self.debounce).await;
        if !self.is_current(ticket) {
            debug!(term, "customer search superseded");
            return Ok(None);
        }

        let customers = self.directory.search(term, self.limit)?;
        if !self.is_current(ticket) {
            return Ok(None);
        }
        Ok(Some(customers.iter().map(Customer::summary).collect()))
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::domain::{CustomerId, SubjectProfile};
    use crate::orders::memory::InMemoryCustomerDirectory;
    use chrono::Utc;

    fn directory() -> Arc<InMemoryCustomerDirectory> {
        let directory = Arc::new(InMemoryCustomerDirectory::default());
        let people = [
            ("CUS-1", "Karim Adel"),
            ("CUS-2", "Karima Fathy"),
            ("CUS-3", "Mona Zaki"),
        ];
        for (id, name) in people {
            directory
                .insert(Customer {
                    id: CustomerId(id.to_string()),
                    full_name: name.to_string(),
                    national_id: None,
                    phone: None,
                    address: None,
                    profile: SubjectProfile::default(),
                    dependents: Vec::new(),
                    created_at: Utc::now(),
                })
                .expect("inserted");
        }
        directory
    }

    #[tokio::test(start_paused = true)]
    async fn newer_input_supersedes_pending_search() {
        let search = DebouncedSearch::new(directory(), Duration::from_millis(300));

        let (first, second) = tokio::join!(search.search("ka"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            search.search("karima").await
        });

        assert_eq!(first.expect("no storage error"), None);
        let names: Vec<String> = second
            .expect("no storage error")
            .expect("latest search completes")
            .into_iter()
            .map(|customer| customer.full_name)
            .collect();
        assert_eq!(names, vec!["Karima Fathy".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_input_returns_matches() {
        let search = DebouncedSearch::new(directory(), Duration::from_millis(300)).with_limit(1);
        let results = search
            .search(" kar ")
            .await
            .expect("no storage error")
            .expect("not superseded");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].full_name, "Karim Adel");
    }

    #[tokio::test(start_paused = true)]
    async fn short_terms_skip_the_directory() {
        let search = DebouncedSearch::new(directory(), Duration::from_millis(300));
        assert_eq!(search.search("k").await.expect("ok"), Some(Vec::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_search() {
        let search = DebouncedSearch::new(directory(), Duration::from_millis(300));
        let (pending, ()) = tokio::join!(search.search("mona"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            search.cancel();
        });
        assert_eq!(pending.expect("ok"), None);
    }
}
