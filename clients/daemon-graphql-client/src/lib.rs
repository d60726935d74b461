//! Client for the daemon's GraphQL endpoint, limited to the mutations needed to
//! drive a payment through a node.

pub mod queries;

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GraphQL request rejected: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    #[error("GraphQL response carried neither data nor errors")]
    MissingData,
    #[error("Failed to decode GraphQL data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Payment parameters as the daemon expects them. Amounts are in nanomina.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentRequest {
    pub from: String,
    pub to: String,
    pub fee: u64,
    pub amount: u64,
    pub memo: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DaemonGraphqlClient {
    url: Url,
    client: Client,
}

impl DaemonGraphqlClient {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self::new_with_client(Client::new(), url)
    }

    #[must_use]
    pub const fn new_with_client(client: Client, url: Url) -> Self {
        Self { url, client }
    }

    /// Clears the daemon's block-producing keys so the agent's payments are
    /// not produced by the node under test.
    pub async fn disable_staking(&self) -> Result<Vec<String>, Error> {
        let data: queries::SetStakingData = self
            .execute(queries::SET_STAKING, json!({ "input": { "publicKeys": [] } }))
            .await?;
        Ok(data.set_staking.last_staking)
    }

    pub async fn unlock_account(&self, public_key: &str, password: &str) -> Result<String, Error> {
        let data: queries::UnlockAccountData = self
            .execute(
                queries::UNLOCK_ACCOUNT,
                json!({ "input": { "publicKey": public_key, "password": password } }),
            )
            .await?;
        Ok(data.unlock_account.public_key)
    }

    /// Submits a payment and returns the transaction hash reported by the daemon.
    pub async fn send_payment(&self, payment: &PaymentRequest) -> Result<String, Error> {
        let data: queries::SendPaymentData = self
            .execute(queries::SEND_PAYMENT, payment_variables(payment))
            .await?;
        Ok(data.send_payment.payment.hash)
    }

    async fn execute<R>(&self, query: &str, variables: Value) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let response: GraphQlResponse = self
            .client
            .post(self.url.clone())
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        extract_data(response)
    }
}

fn payment_variables(payment: &PaymentRequest) -> Value {
    // UInt64 scalars travel as strings.
    let mut input = json!({
        "from": payment.from,
        "to": payment.to,
        "fee": payment.fee.to_string(),
        "amount": payment.amount.to_string(),
    });
    if let Some(memo) = &payment.memo {
        input["memo"] = Value::String(memo.clone());
    }
    json!({ "input": input })
}

fn extract_data<R>(response: GraphQlResponse) -> Result<R, Error>
where
    R: DeserializeOwned,
{
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(Error::GraphQl(
            errors.into_iter().map(|error| error.message).collect(),
        ));
    }
    let data = response.data.ok_or(Error::MissingData)?;
    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> GraphQlResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn payment_hash_is_extracted() {
        let data: queries::SendPaymentData = extract_data(response(
            r#"{"data": {"sendPayment": {"payment": {"hash": "CkpYx"}}}}"#,
        ))
        .unwrap();
        assert_eq!(data.send_payment.payment.hash, "CkpYx");
    }

    #[test]
    fn graphql_errors_win_over_partial_data() {
        let error = extract_data::<queries::UnlockAccountData>(response(
            r#"{
                "data": null,
                "errors": [{"message": "Wrong password"}, {"message": "Account locked"}]
            }"#,
        ))
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "GraphQL request rejected: Wrong password; Account locked"
        );
    }

    #[test]
    fn empty_response_is_rejected() {
        let error = extract_data::<queries::SetStakingData>(response("{}")).unwrap_err();
        assert!(matches!(error, Error::MissingData));
    }

    #[test]
    fn payment_amounts_are_stringified() {
        let variables = payment_variables(&PaymentRequest {
            from: "B62qsender".to_owned(),
            to: "B62qreceiver".to_owned(),
            fee: 2_000_000_000,
            amount: 5_000_000_000,
            memo: None,
        });
        assert_eq!(
            variables,
            json!({
                "input": {
                    "from": "B62qsender",
                    "to": "B62qreceiver",
                    "fee": "2000000000",
                    "amount": "5000000000"
                }
            })
        );
    }
}
