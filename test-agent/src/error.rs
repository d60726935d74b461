use std::fmt;

use rosetta_http_client::models::Operation;
use thiserror::Error;

use crate::{
    clients::DynError, config::ConfigError, expectation::MismatchReason, retry::RetryTimeout,
};

/// Scenario steps, in execution order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    DisableStaking,
    ResolveNetwork,
    WaitForSync,
    UnlockAccount,
    FetchChainTip,
    SendPayment,
    SettleDelay,
    WaitForMempool,
    FetchMempoolTransaction,
    VerifyOperations,
    WaitForBlock,
    VerifyBlockOperations,
}

impl Step {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DisableStaking => "disable staking",
            Self::ResolveNetwork => "resolve network",
            Self::WaitForSync => "wait for sync",
            Self::UnlockAccount => "unlock account",
            Self::FetchChainTip => "fetch chain tip",
            Self::SendPayment => "send payment",
            Self::SettleDelay => "settle delay",
            Self::WaitForMempool => "wait for mempool",
            Self::FetchMempoolTransaction => "fetch mempool transaction",
            Self::VerifyOperations => "verify mempool operations",
            Self::WaitForBlock => "wait for block inclusion",
            Self::VerifyBlockOperations => "verify block operations",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{step}: {source}")]
    Transport {
        step: Step,
        #[source]
        source: DynError,
    },
    #[error("{step}: {source}")]
    Timeout {
        step: Step,
        #[source]
        source: RetryTimeout,
    },
    #[error("{step}: operation {index} differs on {reason}, observed {observed:?}")]
    Mismatch {
        step: Step,
        index: usize,
        reason: MismatchReason,
        observed: Box<Operation>,
    },
    #[error("{step}: unexpected response shape: {detail}")]
    Shape { step: Step, detail: String },
    /// The configured payment cannot be expressed in Rosetta amounts.
    #[error("{step}: {source}")]
    Payment {
        step: Step,
        #[source]
        source: ConfigError,
    },
}

impl AgentError {
    #[must_use]
    pub const fn step(&self) -> Step {
        match self {
            Self::Transport { step, .. }
            | Self::Timeout { step, .. }
            | Self::Mismatch { step, .. }
            | Self::Shape { step, .. }
            | Self::Payment { step, .. } => *step,
        }
    }

    pub(crate) fn transport(step: Step) -> impl FnOnce(DynError) -> Self {
        move |source| Self::Transport { step, source }
    }
}
