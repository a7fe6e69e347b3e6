//! Unsigned registry submission transactions.
//!
//! The builder lays out a programmable transaction the wallet signs as-is:
//!
//! ```text
//! inputs:   [registry, name, metadata hash, fee, clock]
//! commands: [SplitCoins(gas, [fee]),
//!            MoveCall(<pkg>::game_registry::submit_*, [registry, name, hash, coin, clock])]
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Serialize, Serializer};

use crate::{
    config::ContractConfig,
    constants::{OCT_BASE_UNITS, REGISTRY_MODULE},
    error::{AppError, Result},
    models::SubmissionKind,
};

const OBJECT_ID_HEX_LEN: usize = 64;

fn serialize_base64<T, S>(bytes: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CallArg {
    #[serde(rename_all = "camelCase")]
    Object { object_id: String },
    /// BCS-encoded value, base64 on the wire.
    Pure {
        #[serde(serialize_with = "serialize_base64")]
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Command {
    SplitCoins {
        coin: Argument,
        amounts: Vec<Argument>,
    },
    MoveCall {
        package: String,
        module: String,
        function: String,
        arguments: Vec<Argument>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionTransaction {
    pub kind: SubmissionKind,
    pub target: String,
    pub fee: u64,
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

impl SubmissionTransaction {
    pub fn fee_in_oct(&self) -> f64 {
        self.fee as f64 / OCT_BASE_UNITS as f64
    }
}

/// Left-pads an object id to 32 bytes and checks it is hex.
pub fn normalize_object_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > OBJECT_ID_HEX_LEN {
        return Err(AppError::BadRequest(format!("Invalid object id '{}'", raw)));
    }
    let padded = format!("{:0>width$}", digits.to_ascii_lowercase(), width = OBJECT_ID_HEX_LEN);
    hex::decode(&padded).map_err(|e| AppError::BadRequest(format!("Invalid object id '{}': {}", raw, e)))?;
    Ok(format!("0x{}", padded))
}

/// Canonical length-prefixed encoding of a `vector<u8>` argument.
pub fn encode_bytes(text: &str) -> Result<Vec<u8>> {
    bcs::to_bytes(text.as_bytes())
        .map_err(|e| AppError::Internal(format!("BCS encoding failed: {}", e)))
}

pub struct TransactionBuilder {
    contract: ContractConfig,
}

impl TransactionBuilder {
    pub fn new(contract: ContractConfig) -> Self {
        Self { contract }
    }

    pub fn fee_for(&self, kind: SubmissionKind) -> u64 {
        match kind {
            SubmissionKind::Game => self.contract.game_fee,
            SubmissionKind::Project => self.contract.project_fee,
        }
    }

    pub fn build(&self, kind: SubmissionKind, ipfs_hash: &str, name: &str) -> Result<SubmissionTransaction> {
        let (Some(package_id), Some(registry_id)) =
            (self.contract.package_id(), self.contract.registry_id())
        else {
            return Err(AppError::ContractNotConfigured);
        };

        let name = name.trim();
        let ipfs_hash = ipfs_hash.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        if ipfs_hash.is_empty() {
            return Err(AppError::BadRequest("IPFS hash is required".to_string()));
        }

        let package = normalize_object_id(package_id)?;
        let fee = self.fee_for(kind);
        let fee_bytes = bcs::to_bytes(&fee)
            .map_err(|e| AppError::Internal(format!("BCS encoding failed: {}", e)))?;

        let inputs = vec![
            CallArg::Object {
                object_id: normalize_object_id(registry_id)?,
            },
            CallArg::Pure {
                bytes: encode_bytes(name)?,
            },
            CallArg::Pure {
                bytes: encode_bytes(ipfs_hash)?,
            },
            CallArg::Pure { bytes: fee_bytes },
            CallArg::Object {
                object_id: normalize_object_id(&self.contract.clock_id)?,
            },
        ];

        let commands = vec![
            Command::SplitCoins {
                coin: Argument::GasCoin,
                amounts: vec![Argument::Input(3)],
            },
            Command::MoveCall {
                package: package.clone(),
                module: REGISTRY_MODULE.to_string(),
                function: kind.entry_function().to_string(),
                arguments: vec![
                    Argument::Input(0),
                    Argument::Input(1),
                    Argument::Input(2),
                    Argument::NestedResult(0, 0),
                    Argument::Input(4),
                ],
            },
        ];

        tracing::debug!(
            "Built {} submission for '{}' (hash={}, fee={})",
            kind.label(),
            name,
            ipfs_hash,
            fee
        );

        Ok(SubmissionTransaction {
            kind,
            target: format!("{}::{}::{}", package, REGISTRY_MODULE, kind.entry_function()),
            fee,
            inputs,
            commands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::constants::{GAME_SUBMISSION_FEE, PROJECT_SUBMISSION_FEE};

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new(test_config().contract())
    }

    #[test]
    fn bytes_are_uleb128_length_prefixed() {
        assert_eq!(encode_bytes("abc").unwrap(), vec![3, b'a', b'b', b'c']);
        let long = "x".repeat(200);
        let encoded = encode_bytes(&long).unwrap();
        assert_eq!(&encoded[..2], &[0xc8, 0x01]);
        assert_eq!(encoded.len(), 202);
    }

    #[test]
    fn game_submission_layout() {
        let tx = builder().build(SubmissionKind::Game, "QmHash", "Cosmic Clash").unwrap();

        let package = normalize_object_id("0xabc").unwrap();
        assert_eq!(tx.target, format!("{}::game_registry::submit_game", package));
        assert_eq!(tx.fee, GAME_SUBMISSION_FEE);
        assert!((tx.fee_in_oct() - 0.1).abs() < 1e-9);

        assert_eq!(
            tx.inputs[0],
            CallArg::Object {
                object_id: normalize_object_id("0xdef").unwrap()
            }
        );
        assert_eq!(
            tx.inputs[1],
            CallArg::Pure {
                bytes: encode_bytes("Cosmic Clash").unwrap()
            }
        );
        assert_eq!(
            tx.inputs[2],
            CallArg::Pure {
                bytes: encode_bytes("QmHash").unwrap()
            }
        );
        assert_eq!(
            tx.inputs[3],
            CallArg::Pure {
                bytes: GAME_SUBMISSION_FEE.to_le_bytes().to_vec()
            }
        );
        assert_eq!(
            tx.inputs[4],
            CallArg::Object {
                object_id: format!("0x{}6", "0".repeat(63))
            }
        );
        assert!(matches!(
            &tx.commands[1],
            Command::MoveCall { arguments, .. } if arguments[3] == Argument::NestedResult(0, 0)
        ));
    }

    #[test]
    fn project_submission_uses_its_own_entry_point_and_fee() {
        let tx = builder().build(SubmissionKind::Project, "QmHash", "Forge").unwrap();
        assert!(tx.target.ends_with("::game_registry::submit_project"));
        assert_eq!(tx.fee, PROJECT_SUBMISSION_FEE);
        assert_ne!(tx.fee, builder().fee_for(SubmissionKind::Game));
    }

    #[test]
    fn unconfigured_contract_is_rejected() {
        let mut contract = test_config().contract();
        contract.package_id = None;
        let err = TransactionBuilder::new(contract)
            .build(SubmissionKind::Game, "QmHash", "Name")
            .unwrap_err();
        assert!(matches!(err, AppError::ContractNotConfigured));
    }

    #[test]
    fn blank_inputs_are_rejected() {
        assert!(matches!(
            builder().build(SubmissionKind::Game, "QmHash", "  "),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            builder().build(SubmissionKind::Game, "", "Name"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn object_ids_are_validated() {
        assert!(normalize_object_id("0xzz").is_err());
        assert!(normalize_object_id("").is_err());
        assert_eq!(normalize_object_id("0X6").unwrap().len(), 66);
    }

    #[test]
    fn pure_bytes_serialize_as_base64() {
        let value = serde_json::to_value(CallArg::Pure {
            bytes: vec![3, b'a', b'b', b'c'],
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({ "kind": "pure", "bytes": "A2FiYw==" }));
    }
}
