use daemon_graphql_client::PaymentRequest;
use rosetta_http_client::models::{NetworkIdentifier, Transaction};
use tokio::time::sleep;
use tracing::{Instrument as _, Span};

use crate::{
    clients::{DynError, QueryClient, TransactionClient},
    config::{PaymentSettings, ScenarioSettings},
    error::{AgentError, Step},
    expectation::{match_operations, ExpectedAccount, ExpectedOperation, OperationsMismatch},
    retry::{retry, Attempt, Probe, RetryError, RetryPolicy},
};

const SYNCED_STAGE: &str = "Synced";
const PENDING_STATUS: &str = "Pending";
const SUCCESS_STATUS: &str = "Success";

pub const SYNC_TIMEOUT: &str = "Took too long to sync";
pub const MEMPOOL_TIMEOUT: &str = "Took too long to appear in mempool";
pub const BLOCK_TIMEOUT: &str = "Took too long to be included in a block";

/// Sends a payment through the daemon and follows it through the Rosetta API.
pub struct ScenarioRunner<T, Q> {
    transactions: T,
    query: Q,
    payment: PaymentSettings,
    settings: ScenarioSettings,
    span: Span,
}

impl<T, Q> ScenarioRunner<T, Q>
where
    T: TransactionClient,
    Q: QueryClient,
{
    #[must_use]
    pub const fn new(
        transactions: T,
        query: Q,
        payment: PaymentSettings,
        settings: ScenarioSettings,
        span: Span,
    ) -> Self {
        Self {
            transactions,
            query,
            payment,
            settings,
            span,
        }
    }

    pub async fn run(&self) -> Result<(), AgentError> {
        self.run_steps().instrument(self.span.clone()).await
    }

    async fn run_steps(&self) -> Result<(), AgentError> {
        let (fee, amount) = self
            .payment
            .signed_amounts()
            .map_err(|source| AgentError::Payment {
                step: Step::SendPayment,
                source,
            })?;

        self.transactions
            .disable_staking()
            .await
            .map_err(AgentError::transport(Step::DisableStaking))?;
        tracing::info!("staking disabled");

        let network = self.resolve_network().await?;
        tracing::info!(
            blockchain = %network.blockchain,
            network = %network.network,
            "using network"
        );

        self.wait_for_sync(&network).await?;
        tracing::info!("node synced");

        self.transactions
            .unlock_account(&self.payment.sender, &self.payment.password)
            .await
            .map_err(AgentError::transport(Step::UnlockAccount))?;
        tracing::info!(account = %self.payment.sender, "account unlocked");

        // The payment can land in any block produced from here on.
        let scan_start = if self.settings.block_inclusion {
            Some(self.chain_tip(&network).await?)
        } else {
            None
        };

        let hash = self
            .transactions
            .send_payment(&self.payment_request())
            .await
            .map_err(AgentError::transport(Step::SendPayment))?;
        tracing::info!(%hash, "payment sent");

        tracing::debug!(step = %Step::SettleDelay, delay = ?self.settings.settle_delay);
        sleep(self.settings.settle_delay).await;

        self.wait_for_mempool(&network, &hash).await?;
        tracing::info!(%hash, "payment visible in mempool");

        let transaction = self
            .query
            .mempool_transaction(&network, &hash)
            .await
            .map_err(AgentError::transport(Step::FetchMempoolTransaction))?;
        verify(
            Step::VerifyOperations,
            &self.expected_operations(PENDING_STATUS, fee, amount),
            &transaction,
        )?;
        tracing::info!(%hash, "mempool operations verified");

        if let Some(start) = scan_start {
            let transaction = self.wait_for_block(&network, &hash, start).await?;
            verify(
                Step::VerifyBlockOperations,
                &self.expected_operations(SUCCESS_STATUS, fee, amount),
                &transaction,
            )?;
            tracing::info!(%hash, "block operations verified");
        }

        Ok(())
    }

    async fn resolve_network(&self) -> Result<NetworkIdentifier, AgentError> {
        self.query
            .list_networks()
            .await
            .map_err(AgentError::transport(Step::ResolveNetwork))?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Shape {
                step: Step::ResolveNetwork,
                detail: "network list is empty".to_owned(),
            })
    }

    async fn wait_for_sync(&self, network: &NetworkIdentifier) -> Result<(), AgentError> {
        let query = &self.query;
        let mut probe = move || async move {
            Ok::<_, AgentError>(match query.network_status(network).await {
                Ok(status) => {
                    tracing::debug!(stage = ?status.sync_stage(), "sync status");
                    Attempt::from(status.sync_stage() == Some(SYNCED_STAGE))
                }
                Err(error) => {
                    tracing::warn!(%error, "sync status unavailable");
                    Attempt::Failed
                }
            })
        };
        poll(Step::WaitForSync, &self.settings.sync, SYNC_TIMEOUT, &mut probe).await
    }

    async fn wait_for_mempool(
        &self,
        network: &NetworkIdentifier,
        hash: &str,
    ) -> Result<(), AgentError> {
        let query = &self.query;
        let mut probe = move || async move {
            Ok::<_, AgentError>(match query.mempool(network).await {
                Ok(transactions) => {
                    Attempt::from(transactions.iter().any(|tx| tx.hash == hash))
                }
                Err(error) => {
                    tracing::warn!(%error, "mempool unavailable");
                    Attempt::Failed
                }
            })
        };
        poll(
            Step::WaitForMempool,
            &self.settings.mempool,
            MEMPOOL_TIMEOUT,
            &mut probe,
        )
        .await
    }

    async fn chain_tip(&self, network: &NetworkIdentifier) -> Result<i64, AgentError> {
        let tip = self
            .query
            .network_status(network)
            .await
            .map_err(AgentError::transport(Step::FetchChainTip))?
            .current_block_identifier
            .index;
        tracing::debug!(tip, "block scan starts at chain tip");
        Ok(tip)
    }

    async fn wait_for_block(
        &self,
        network: &NetworkIdentifier,
        hash: &str,
        start: i64,
    ) -> Result<Transaction, AgentError> {
        let mut search = BlockSearch {
            query: &self.query,
            network,
            hash,
            next_index: start,
            found: None,
        };
        poll(
            Step::WaitForBlock,
            &self.settings.block,
            BLOCK_TIMEOUT,
            &mut search,
        )
        .await?;
        search.found.ok_or_else(|| AgentError::Shape {
            step: Step::WaitForBlock,
            detail: "block search finished without a transaction".to_owned(),
        })
    }

    fn payment_request(&self) -> PaymentRequest {
        PaymentRequest {
            from: self.payment.sender.clone(),
            to: self.payment.receiver.clone(),
            fee: self.payment.fee,
            amount: self.payment.amount,
            memo: self.payment.memo.clone(),
        }
    }

    /// Operations a plain payment decomposes into, in the order they are reported.
    fn expected_operations(
        &self,
        status: &str,
        fee: i64,
        amount: i64,
    ) -> Vec<ExpectedOperation> {
        let account = |public_key: &str| {
            Some(ExpectedAccount {
                public_key: public_key.to_owned(),
                token_id: self.payment.token_id,
            })
        };
        let operation = |amount: i64, public_key: &str, kind: &str| ExpectedOperation {
            amount: Some(amount),
            account: account(public_key),
            status: status.to_owned(),
            kind: kind.to_owned(),
        };
        vec![
            operation(-fee, &self.payment.sender, "fee_payer_dec"),
            operation(-amount, &self.payment.sender, "payment_source_dec"),
            operation(amount, &self.payment.receiver, "payment_receiver_inc"),
        ]
    }
}

/// Scans blocks from `next_index` up to the current tip for `hash`. Blocks
/// already scanned are not fetched again on later attempts.
struct BlockSearch<'a, Q> {
    query: &'a Q,
    network: &'a NetworkIdentifier,
    hash: &'a str,
    next_index: i64,
    found: Option<Transaction>,
}

impl<Q: QueryClient> BlockSearch<'_, Q> {
    async fn scan(&mut self) -> Result<Attempt, DynError> {
        let tip = self
            .query
            .network_status(self.network)
            .await?
            .current_block_identifier
            .index;

        while self.next_index <= tip {
            if let Some(block) = self.query.block(self.network, self.next_index).await? {
                if let Some(transaction) = block.transaction(self.hash) {
                    tracing::info!(
                        index = block.block_identifier.index,
                        block = %block.block_identifier.hash,
                        "payment included"
                    );
                    self.found = Some(transaction.clone());
                    return Ok(Attempt::Succeeded);
                }
            }
            self.next_index += 1;
        }
        Ok(Attempt::Failed)
    }
}

impl<Q: QueryClient> Probe for BlockSearch<'_, Q> {
    type Error = AgentError;

    async fn attempt(&mut self) -> Result<Attempt, AgentError> {
        Ok(self.scan().await.unwrap_or_else(|error| {
            tracing::warn!(%error, next_index = self.next_index, "block scan interrupted");
            Attempt::Failed
        }))
    }
}

async fn poll<P>(
    step: Step,
    policy: &RetryPolicy,
    label: &'static str,
    probe: &mut P,
) -> Result<(), AgentError>
where
    P: Probe<Error = AgentError>,
{
    tracing::info!(%step, max_attempts = policy.max_attempts, "polling");
    retry(policy, label, probe).await.map_err(|error| match error {
        RetryError::Timeout(source) => AgentError::Timeout { step, source },
        RetryError::Probe(error) => error,
    })
}

fn verify(
    step: Step,
    expected: &[ExpectedOperation],
    transaction: &Transaction,
) -> Result<(), AgentError> {
    match_operations(expected, &transaction.operations).map_err(|mismatch| match mismatch {
        OperationsMismatch::Length { .. } => AgentError::Shape {
            step,
            detail: mismatch.to_string(),
        },
        OperationsMismatch::Operation {
            index,
            reason,
            observed,
        } => AgentError::Mismatch {
            step,
            index,
            reason,
            observed,
        },
    })
}
