use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Envelope returned for every `db.*` call made over HTTP.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub result: serde_json::Value,
}

/// Names of the operations a registry exposes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OperationList {
    pub operations: Vec<String>,
}
