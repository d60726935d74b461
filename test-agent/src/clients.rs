//! Seams between the scenario and the two node APIs it talks to.

use async_trait::async_trait;
use daemon_graphql_client::{DaemonGraphqlClient, PaymentRequest};
use rosetta_http_client::{
    models::{Block, NetworkIdentifier, NetworkStatusResponse, Transaction, TransactionIdentifier},
    RosettaHttpClient,
};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Mutating side: submits actions to the node.
#[async_trait]
pub trait TransactionClient: Send + Sync {
    async fn disable_staking(&self) -> Result<(), DynError>;

    async fn unlock_account(&self, public_key: &str, password: &str) -> Result<(), DynError>;

    /// Returns the hash of the submitted transaction.
    async fn send_payment(&self, payment: &PaymentRequest) -> Result<String, DynError>;
}

/// Read side: observes the chain through the Rosetta Data API.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn list_networks(&self) -> Result<Vec<NetworkIdentifier>, DynError>;

    async fn network_status(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<NetworkStatusResponse, DynError>;

    async fn mempool(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<Vec<TransactionIdentifier>, DynError>;

    async fn mempool_transaction(
        &self,
        network: &NetworkIdentifier,
        hash: &str,
    ) -> Result<Transaction, DynError>;

    async fn block(
        &self,
        network: &NetworkIdentifier,
        index: i64,
    ) -> Result<Option<Block>, DynError>;
}

#[async_trait]
impl TransactionClient for DaemonGraphqlClient {
    async fn disable_staking(&self) -> Result<(), DynError> {
        let previous = Self::disable_staking(self).await?;
        tracing::debug!(?previous, "staking keys cleared");
        Ok(())
    }

    async fn unlock_account(&self, public_key: &str, password: &str) -> Result<(), DynError> {
        Self::unlock_account(self, public_key, password).await?;
        Ok(())
    }

    async fn send_payment(&self, payment: &PaymentRequest) -> Result<String, DynError> {
        Ok(Self::send_payment(self, payment).await?)
    }
}

#[async_trait]
impl QueryClient for RosettaHttpClient {
    async fn list_networks(&self) -> Result<Vec<NetworkIdentifier>, DynError> {
        Ok(self.network_list().await?)
    }

    async fn network_status(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<NetworkStatusResponse, DynError> {
        Ok(Self::network_status(self, network).await?)
    }

    async fn mempool(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<Vec<TransactionIdentifier>, DynError> {
        Ok(Self::mempool(self, network).await?)
    }

    async fn mempool_transaction(
        &self,
        network: &NetworkIdentifier,
        hash: &str,
    ) -> Result<Transaction, DynError> {
        Ok(Self::mempool_transaction(self, network, hash).await?)
    }

    async fn block(
        &self,
        network: &NetworkIdentifier,
        index: i64,
    ) -> Result<Option<Block>, DynError> {
        Ok(Self::block(self, network, index).await?)
    }
}

#[async_trait]
impl<T: TransactionClient + ?Sized> TransactionClient for &T {
    async fn disable_staking(&self) -> Result<(), DynError> {
        (**self).disable_staking().await
    }

    async fn unlock_account(&self, public_key: &str, password: &str) -> Result<(), DynError> {
        (**self).unlock_account(public_key, password).await
    }

    async fn send_payment(&self, payment: &PaymentRequest) -> Result<String, DynError> {
        (**self).send_payment(payment).await
    }
}

#[async_trait]
impl<Q: QueryClient + ?Sized> QueryClient for &Q {
    async fn list_networks(&self) -> Result<Vec<NetworkIdentifier>, DynError> {
        (**self).list_networks().await
    }

    async fn network_status(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<NetworkStatusResponse, DynError> {
        (**self).network_status(network).await
    }

    async fn mempool(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<Vec<TransactionIdentifier>, DynError> {
        (**self).mempool(network).await
    }

    async fn mempool_transaction(
        &self,
        network: &NetworkIdentifier,
        hash: &str,
    ) -> Result<Transaction, DynError> {
        (**self).mempool_transaction(network, hash).await
    }

    async fn block(
        &self,
        network: &NetworkIdentifier,
        index: i64,
    ) -> Result<Option<Block>, DynError> {
        (**self).block(network, index).await
    }
}
