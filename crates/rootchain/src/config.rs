use std::str::FromStr as _;
use std::sync::Arc;
use std::time::Duration;

use plasma_core::address::Address;
use plasma_core::amount::Amount;
use plasma_core::signer::{ChainId, ChainSigner};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _, Snafu, ensure};

use crate::event::BlockNumber;

pub const DEFAULT_START_BLOCK: BlockNumber = BlockNumber::new(100);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Invalid root chain contract address"))]
    InvalidContractAddress { source: data_encoding::DecodeError },
    #[snafu(display("Invalid contract artifact"))]
    InvalidArtifact { source: serde_json::Error },
    #[snafu(display("Contract abi missing"))]
    MissingAbi,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// JSON interface description of the root chain contract
///
/// Kept as text; decoding logs against it is the event source's job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub struct ContractAbi(Arc<str>);

impl ContractAbi {
    pub fn new(abi: impl Into<Arc<str>>) -> Self {
        Self(abi.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Extract the `abi` member of a compiled contract artifact
    pub fn from_artifact_json(artifact: &str) -> ConfigResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(artifact).context(InvalidArtifactSnafu)?;
        let abi = value.get("abi").context(MissingAbiSnafu)?;

        Ok(Self::new(abi.to_string()))
    }
}

impl From<String> for ContractAbi {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<ContractAbi> for String {
    fn from(value: ContractAbi) -> Self {
        value.0.to_string()
    }
}

/// Settings of the root chain synchronizer
#[derive(Serialize, Deserialize, Debug, Clone, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct RootChainConfig {
    /// Hex, with or without `0x`
    #[builder(into)]
    pub contract_address: String,

    pub contract_abi: ContractAbi,

    /// First root chain block to look at
    #[serde(default = "default_start_block")]
    #[builder(default = DEFAULT_START_BLOCK)]
    pub start_block: BlockNumber,

    #[serde(default = "default_poll_interval", with = "duration_millis")]
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub poll_interval: Duration,

    #[serde(default = "default_query_timeout", with = "duration_millis")]
    #[builder(default = DEFAULT_QUERY_TIMEOUT)]
    pub query_timeout: Duration,

    /// Retries of a failing event query before its stream gives up
    #[serde(default)]
    #[builder(default)]
    pub max_query_retries: usize,

    /// Fee put into every deposit transaction
    #[serde(default = "default_deposit_fee")]
    #[builder(default = default_deposit_fee())]
    pub deposit_fee: Amount,

    #[serde(default = "default_chain_id")]
    #[builder(default = default_chain_id())]
    pub chain_id: ChainId,
}

impl RootChainConfig {
    /// Signing scheme of the child chain this config is for
    pub fn signer(&self) -> ChainSigner {
        ChainSigner::new(self.chain_id)
    }

    pub fn contract(&self) -> ConfigResult<Address> {
        Address::from_str(&self.contract_address).context(InvalidContractAddressSnafu)
    }

    /// Check everything a [`crate::RootChain`] needs from the config
    pub fn validate(&self) -> ConfigResult<Address> {
        ensure!(!self.contract_abi.is_empty(), MissingAbiSnafu);
        self.contract()
    }
}

fn default_start_block() -> BlockNumber {
    DEFAULT_START_BLOCK
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_query_timeout() -> Duration {
    DEFAULT_QUERY_TIMEOUT
}

fn default_deposit_fee() -> Amount {
    Amount::from(1u64)
}

fn default_chain_id() -> ChainId {
    ChainId::new(1)
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use plasma_core::address::Address;
    use plasma_core::amount::Amount;
    use plasma_core::signer::{ChainId, ChainSigner};

    use super::{ConfigError, ContractAbi, RootChainConfig};
    use crate::event::BlockNumber;

    const ARTIFACT: &str = r#"{
        "contractName": "RootChain",
        "abi": [{"type": "event", "name": "Deposit"}],
        "bytecode": "0x00"
    }"#;

    #[test]
    fn abi_from_artifact() {
        let abi = ContractAbi::from_artifact_json(ARTIFACT).unwrap();
        let value: serde_json::Value = serde_json::from_str(abi.as_str()).unwrap();

        assert_eq!(value[0]["name"], "Deposit");
        assert_matches!(
            ContractAbi::from_artifact_json(r#"{"bytecode": "0x00"}"#),
            Err(ConfigError::MissingAbi)
        );
        assert_matches!(
            ContractAbi::from_artifact_json("not json"),
            Err(ConfigError::InvalidArtifact { .. })
        );
    }

    #[test]
    fn defaults_match_between_builder_and_serde() {
        let built = RootChainConfig::builder()
            .contract_address("0x2222222222222222222222222222222222222222")
            .contract_abi(ContractAbi::new("[]"))
            .build();
        let parsed: RootChainConfig = serde_json::from_str(
            r#"{
                "contract_address": "2222222222222222222222222222222222222222",
                "contract_abi": "[]"
            }"#,
        )
        .unwrap();

        for config in [built, parsed] {
            assert_eq!(config.start_block, BlockNumber::new(100));
            assert_eq!(config.poll_interval, Duration::from_secs(2));
            assert_eq!(config.query_timeout, Duration::from_secs(30));
            assert_eq!(config.max_query_retries, 0);
            assert_eq!(config.deposit_fee, Amount::from(1u64));
            assert_eq!(config.chain_id.to_number(), 1);
            assert_eq!(config.validate().unwrap(), Address::from_bytes([0x22; 20]));
        }
    }

    #[test]
    fn rejects_bad_address_and_empty_abi() {
        let config = RootChainConfig::builder()
            .contract_address("0x1234")
            .contract_abi(ContractAbi::new("[]"))
            .build();
        assert_matches!(
            config.validate(),
            Err(ConfigError::InvalidContractAddress { .. })
        );

        let config = RootChainConfig::builder()
            .contract_address("0x2222222222222222222222222222222222222222")
            .contract_abi(ContractAbi::new(" "))
            .build();
        assert_matches!(config.validate(), Err(ConfigError::MissingAbi));
    }

    #[test]
    fn durations_are_millis() {
        let config: RootChainConfig = serde_json::from_str(
            r#"{
                "contract_address": "0x2222222222222222222222222222222222222222",
                "contract_abi": "[]",
                "start_block": 5,
                "poll_interval": 250,
                "max_query_retries": 3,
                "deposit_fee": "0"
            }"#,
        )
        .unwrap();

        assert_eq!(config.start_block, BlockNumber::new(5));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_query_retries, 3);
        assert!(config.deposit_fee.is_zero());
    }

    #[test]
    fn signer_follows_chain_id() {
        let config: RootChainConfig = serde_json::from_str(
            r#"{
                "contract_address": "0x2222222222222222222222222222222222222222",
                "contract_abi": "[]",
                "chain_id": 7
            }"#,
        )
        .unwrap();

        assert_eq!(config.signer(), ChainSigner::new(ChainId::new(7)));
        assert_ne!(config.signer(), ChainSigner::new(ChainId::new(1)));
    }
}
