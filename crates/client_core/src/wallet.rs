use anyhow::Result;
use async_trait::async_trait;
use shared::protocol::{ConnectionState, MintCall, WalletResponse};

/// Browser-extension style wallet: reports its connection and signs the mint call.
#[async_trait]
pub trait WalletCollaborator: Send + Sync {
    fn connection_state(&self) -> ConnectionState;

    fn account_address(&self) -> Option<String>;

    async fn sign_and_submit(&self, call: MintCall) -> Result<WalletResponse>;
}

pub struct DisconnectedWallet;

#[async_trait]
impl WalletCollaborator for DisconnectedWallet {
    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Disconnected
    }

    fn account_address(&self) -> Option<String> {
        None
    }

    async fn sign_and_submit(&self, _call: MintCall) -> Result<WalletResponse> {
        Err(anyhow::anyhow!("wallet is not connected"))
    }
}

/// Short form of an account address, e.g. `0x1234...abcd`.
pub fn display_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
