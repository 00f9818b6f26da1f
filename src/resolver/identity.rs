//! Account identity lookup.
//!
//! Policy ARNs need the account id. It is looked up through
//! [`IdentityProvider`] at most once per run and only when a policy actually
//! needs it.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{IdentityError, Result, TfImportError};

/// Returns the account id of the current caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Looks up the account id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn account_id(&self) -> Result<String>;
}

/// Looks up the account id with STS `GetCallerIdentity`.
#[derive(Debug, Clone, Default)]
pub struct StsIdentityProvider {
    region: Option<String>,
}

impl StsIdentityProvider {
    /// Creates a provider using the default AWS credential chain.
    #[must_use]
    pub const fn new(region: Option<String>) -> Self {
        Self { region }
    }
}

#[async_trait]
impl IdentityProvider for StsIdentityProvider {
    async fn account_id(&self) -> Result<String> {
        info!("Looking up caller identity");

        let config = if let Some(region) = &self.region {
            aws_config::from_env()
                .region(aws_config::Region::new(region.clone()))
                .load()
                .await
        } else {
            aws_config::load_from_env().await
        };
        let client = aws_sdk_sts::Client::new(&config);

        let response = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| IdentityError::lookup(e.to_string()))?;

        let account = response
            .account()
            .map(str::to_string)
            .ok_or(IdentityError::MissingAccount)?;
        debug!("Caller account: {account}");
        Ok(account)
    }
}

/// A fixed account id, from configuration or the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(pub String);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn account_id(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Caches the first successful lookup of an [`IdentityProvider`].
#[derive(Debug)]
pub struct AccountCache<'a, P: IdentityProvider + ?Sized> {
    provider: &'a P,
    account_id: OnceCell<String>,
}

impl<'a, P: IdentityProvider + ?Sized> AccountCache<'a, P> {
    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            account_id: OnceCell::new(),
        }
    }

    /// Returns the account id, looking it up on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or returns an empty id.
    pub async fn get(&self) -> Result<&str> {
        let account_id = self
            .account_id
            .get_or_try_init(|| async {
                let account_id = self.provider.account_id().await?;
                if account_id.trim().is_empty() {
                    return Err(TfImportError::Identity(IdentityError::MissingAccount));
                }
                Ok(account_id)
            })
            .await?;
        Ok(account_id.as_str())
    }

    /// Returns true once an account id has been looked up.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.account_id.initialized()
    }
}
