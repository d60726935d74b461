pub mod models;
pub mod paths;

use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Map;

use crate::models::{
    requests::{BlockRequest, MempoolTransactionRequest, MetadataRequest, NetworkRequest},
    ApiError, Block, BlockResponse, MempoolResponse, MempoolTransactionResponse,
    NetworkIdentifier, NetworkListResponse, NetworkStatusResponse, PartialBlockIdentifier,
    Transaction, TransactionIdentifier,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Rosetta API error {}: {}", .0.code, .0.message)]
    Api(ApiError),
    #[error("Unexpected response status {status}: {body}")]
    Server {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Client for the Rosetta Data API. Every endpoint is a JSON `POST`.
#[derive(Clone, Debug)]
pub struct RosettaHttpClient {
    base_url: Url,
    client: Client,
}

impl RosettaHttpClient {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::new_with_client(Client::new(), base_url)
    }

    #[must_use]
    pub const fn new_with_client(client: Client, base_url: Url) -> Self {
        Self { base_url, client }
    }

    pub async fn network_list(&self) -> Result<Vec<NetworkIdentifier>, Error> {
        let body = MetadataRequest {
            metadata: Map::new(),
        };
        let response: NetworkListResponse = self.post(paths::NETWORK_LIST, &body).await?;
        Ok(response.network_identifiers)
    }

    pub async fn network_status(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<NetworkStatusResponse, Error> {
        self.post(
            paths::NETWORK_STATUS,
            &NetworkRequest {
                network_identifier: network,
            },
        )
        .await
    }

    pub async fn mempool(
        &self,
        network: &NetworkIdentifier,
    ) -> Result<Vec<TransactionIdentifier>, Error> {
        let response: MempoolResponse = self
            .post(
                paths::MEMPOOL,
                &NetworkRequest {
                    network_identifier: network,
                },
            )
            .await?;
        Ok(response.transaction_identifiers)
    }

    pub async fn mempool_transaction(
        &self,
        network: &NetworkIdentifier,
        hash: &str,
    ) -> Result<Transaction, Error> {
        let body = MempoolTransactionRequest {
            network_identifier: network,
            transaction_identifier: TransactionIdentifier {
                hash: hash.to_owned(),
            },
        };
        let response: MempoolTransactionResponse =
            self.post(paths::MEMPOOL_TRANSACTION, &body).await?;
        Ok(response.transaction)
    }

    /// Block at `index`; `None` when the node omits it (e.g. orphaned).
    pub async fn block(
        &self,
        network: &NetworkIdentifier,
        index: i64,
    ) -> Result<Option<Block>, Error> {
        let body = BlockRequest {
            network_identifier: network,
            block_identifier: PartialBlockIdentifier {
                index: Some(index),
                hash: None,
            },
        };
        let response: BlockResponse = self.post(paths::BLOCK, &body).await?;
        Ok(response.block)
    }

    async fn post<T, R>(&self, path: &str, body: &T) -> Result<R, Error>
    where
        T: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.join_base(path)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<R>(response: Response) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await?;
        Err(decode_error_body(status, body))
    }

    fn join_base(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

fn decode_error_body(status: reqwest::StatusCode, body: String) -> Error {
    serde_json::from_str::<ApiError>(&body).map_or(Error::Server { status, body }, Error::Api)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn endpoint_urls_keep_base_path() {
        let client = RosettaHttpClient::new(Url::parse("http://localhost:3087/rosetta/").unwrap());
        assert_eq!(
            client.join_base(paths::MEMPOOL_TRANSACTION).unwrap().as_str(),
            "http://localhost:3087/rosetta/mempool/transaction"
        );
    }

    #[test]
    fn rosetta_error_bodies_are_decoded() {
        let error = decode_error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"code": 3, "message": "Transaction not found", "retriable": true}"#.to_owned(),
        );
        assert_eq!(error.to_string(), "Rosetta API error 3: Transaction not found");
        match error {
            Error::Api(api) => assert!(api.retriable),
            other => panic!("expected a Rosetta error object, got {other:?}"),
        }
    }

    #[test]
    fn unknown_error_bodies_keep_status() {
        let error = decode_error_body(StatusCode::BAD_GATEWAY, "upstream down".to_owned());
        let (status, body) = match error {
            Error::Server { status, body } => (status, body),
            other => panic!("expected a raw server error, got {other:?}"),
        };
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, "upstream down");
    }

    #[test]
    fn network_request_body_shape() {
        let network = NetworkIdentifier {
            blockchain: "coda".to_owned(),
            network: "debug".to_owned(),
            sub_network_identifier: None,
        };
        let body = serde_json::to_value(MempoolTransactionRequest {
            network_identifier: &network,
            transaction_identifier: TransactionIdentifier {
                hash: "H1".to_owned(),
            },
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "network_identifier": { "blockchain": "coda", "network": "debug" },
                "transaction_identifier": { "hash": "H1" }
            })
        );
    }
}
