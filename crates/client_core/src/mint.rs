use serde::Serialize;
use shared::{
    domain::{ContentId, NftMetadata, TransactionId},
    protocol::{ConnectionState, MintCall},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    error::{MintError, PreconditionError, TransactionError},
    upload::gateway_url,
    wallet::WalletCollaborator,
    ClientEvent,
};

const NO_TRANSACTION_ID: &str = "wallet returned no transaction id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MintState {
    #[default]
    Idle,
    Minting,
    Success {
        transaction_id: TransactionId,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MintReceipt {
    pub transaction_id: TransactionId,
    pub call: MintCall,
    /// Anything the wallet reported next to the transaction id.
    pub diagnostics: Option<String>,
}

/// Builds the contract call for a finalized submission and drives it through the
/// wallet, one attempt at a time.
pub struct MintDispatcher {
    gateway_base: String,
    state: Mutex<MintState>,
    events: broadcast::Sender<ClientEvent>,
}

impl MintDispatcher {
    pub fn new(gateway_base: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self::with_events(gateway_base, events)
    }

    pub fn with_events(
        gateway_base: impl Into<String>,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            gateway_base: gateway_base.into(),
            state: Mutex::new(MintState::Idle),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> MintState {
        self.state.lock().await.clone()
    }

    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        self.transition(&mut state, MintState::Idle);
    }

    pub fn build_call(&self, metadata: &NftMetadata, content_id: &ContentId) -> MintCall {
        MintCall::new(
            metadata.name.clone(),
            metadata.description.clone(),
            gateway_url(&self.gateway_base, content_id),
            metadata.emotion,
            metadata.animal.clone(),
        )
    }

    pub async fn mint(
        &self,
        metadata: &NftMetadata,
        content_id: Option<&ContentId>,
        wallet: &dyn WalletCollaborator,
    ) -> Result<MintReceipt, MintError> {
        let call = {
            let mut state = self.state.lock().await;
            match &*state {
                MintState::Minting => return Err(MintError::AlreadyInFlight),
                MintState::Success { transaction_id } => {
                    return Err(MintError::AlreadyMinted(transaction_id.clone()))
                }
                MintState::Idle | MintState::Failed { .. } => {}
            }

            if wallet.connection_state() != ConnectionState::Connected {
                return Err(PreconditionError::WalletNotConnected.into());
            }
            let content_id = content_id
                .filter(|id| !id.is_blank())
                .ok_or(PreconditionError::MissingContentId)?;

            let call = self.build_call(metadata, content_id);
            self.transition(&mut state, MintState::Minting);
            let account = wallet.account_address();
            info!(
                content_id = %content_id,
                emotion = %call.emotion_tag,
                account = account.as_deref().unwrap_or("unknown"),
                "mint: submitting to wallet"
            );
            call
        };

        let outcome = wallet.sign_and_submit(call.clone()).await;

        let mut state = self.state.lock().await;
        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                let reason = format!("{error:#}");
                warn!(%reason, "mint: wallet call failed");
                self.transition(
                    &mut state,
                    MintState::Failed {
                        reason: reason.clone(),
                    },
                );
                return Err(TransactionError {
                    diagnostics: reason,
                }
                .into());
            }
        };

        let diagnostics = response.diagnostic_text();
        match response.transaction_id() {
            Some(transaction_id) => {
                if let Some(diagnostics) = diagnostics.as_deref() {
                    warn!(
                        transaction_id = %transaction_id,
                        diagnostics,
                        "mint: accepted transaction that also reported diagnostics"
                    );
                }
                info!(transaction_id = %transaction_id, "mint: succeeded");
                self.transition(
                    &mut state,
                    MintState::Success {
                        transaction_id: transaction_id.clone(),
                    },
                );
                Ok(MintReceipt {
                    transaction_id,
                    call,
                    diagnostics,
                })
            }
            None => {
                let reason = diagnostics.unwrap_or_else(|| NO_TRANSACTION_ID.to_string());
                warn!(%reason, "mint: wallet returned no transaction id");
                self.transition(
                    &mut state,
                    MintState::Failed {
                        reason: reason.clone(),
                    },
                );
                Err(TransactionError {
                    diagnostics: reason,
                }
                .into())
            }
        }
    }

    fn transition(&self, state: &mut MintState, next: MintState) {
        if *state == next {
            return;
        }
        *state = next.clone();
        let _ = self.events.send(ClientEvent::MintStateChanged(next));
    }
}

#[cfg(test)]
#[path = "tests/mint_tests.rs"]
mod tests;
