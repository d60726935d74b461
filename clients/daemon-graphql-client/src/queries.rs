use serde::Deserialize;

pub const SET_STAKING: &str = r"mutation ($input: SetStakingInput!) {
  setStaking(input: $input) {
    lastStaking
  }
}";

pub const UNLOCK_ACCOUNT: &str = r"mutation ($input: UnlockInput!) {
  unlockAccount(input: $input) {
    publicKey
  }
}";

pub const SEND_PAYMENT: &str = r"mutation ($input: SendPaymentInput!) {
  sendPayment(input: $input) {
    payment {
      hash
    }
  }
}";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStakingData {
    pub set_staking: SetStakingPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStakingPayload {
    #[serde(default)]
    pub last_staking: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockAccountData {
    pub unlock_account: UnlockPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockPayload {
    pub public_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentData {
    pub send_payment: SendPaymentPayload,
}

#[derive(Debug, Deserialize)]
pub struct SendPaymentPayload {
    pub payment: Payment,
}

#[derive(Debug, Deserialize)]
pub struct Payment {
    pub hash: String,
}
