//! Identity resolution: hardware id -> client policy

use mycel_api::ClientPolicy;
use mycel_host_api::{Directory, IdentityError};
use mycel_util::{HardwareId, RetryPolicy};
use std::sync::Arc;

pub struct IdentityResolver {
    directory: Arc<dyn Directory>,
    retry: RetryPolicy,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn Directory>, retry: RetryPolicy) -> Self {
        Self { directory, retry }
    }

    /// One directory lookup
    pub async fn resolve(&self, hardware_id: &HardwareId) -> Result<ClientPolicy, IdentityError> {
        self.directory.lookup(hardware_id).await
    }

    /// Look up until the directory gives a definite answer.
    ///
    /// Transient failures are retried forever; the result is either the
    /// policy or a fatal error.
    pub async fn resolve_until_registered(
        &self,
        hardware_id: &HardwareId,
    ) -> Result<ClientPolicy, IdentityError> {
        let mut attempt: u32 = 0;
        loop {
            match self.resolve(hardware_id).await {
                Ok(policy) => {
                    tracing::info!(
                        hardware_id = %hardware_id,
                        client_id = %policy.id,
                        name = %policy.name,
                        "Client identified"
                    );
                    return Ok(policy);
                }
                Err(IdentityError::Transient(reason)) => {
                    tracing::warn!(
                        hardware_id = %hardware_id,
                        attempt,
                        error = %reason,
                        "Directory unavailable, retrying"
                    );
                    attempt = attempt.saturating_add(1);
                    self.retry.wait().await;
                }
                Err(fatal) => {
                    tracing::error!(hardware_id = %hardware_id, error = %fatal, "Identification failed");
                    return Err(fatal);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycel_host_api::MockDirectory;
    use mycel_util::ClientId;

    fn policy() -> ClientPolicy {
        ClientPolicy {
            id: ClientId::new(12),
            name: "Hovedbiblioteket 12".into(),
            screen_resolution: None,
            short_time: false,
            options: Default::default(),
            printers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let directory = Arc::new(MockDirectory::with_policy(policy()));
        for _ in 0..3 {
            directory.push_lookup(Err(IdentityError::Transient("503".into())));
        }

        let resolver = IdentityResolver::new(directory.clone(), RetryPolicy::immediate());
        let resolved = resolver
            .resolve_until_registered(&HardwareId::new("aa:bb"))
            .await
            .unwrap();

        assert_eq!(resolved.id, ClientId::new(12));
        assert_eq!(directory.lookup_calls(), 4);
    }

    #[tokio::test]
    async fn test_not_registered_is_final() {
        let directory = Arc::new(MockDirectory::new());
        directory.push_lookup(Err(IdentityError::Transient("timeout".into())));

        let resolver = IdentityResolver::new(directory.clone(), RetryPolicy::immediate());
        let hw = HardwareId::new("aa:bb");
        let result = resolver.resolve_until_registered(&hw).await;

        assert_eq!(result, Err(IdentityError::NotRegistered(hw)));
        assert_eq!(directory.lookup_calls(), 2);
    }

    #[tokio::test]
    async fn test_decode_error_is_final() {
        let directory = Arc::new(MockDirectory::with_policy(policy()));
        directory.push_lookup(Err(IdentityError::Decode("missing field `id`".into())));

        let resolver = IdentityResolver::new(directory.clone(), RetryPolicy::immediate());
        let result = resolver.resolve_until_registered(&HardwareId::new("aa:bb")).await;

        assert!(matches!(result, Err(IdentityError::Decode(_))));
        assert_eq!(directory.lookup_calls(), 1);
    }
}
