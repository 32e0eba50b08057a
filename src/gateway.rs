use crate::{
    history::GameEvent,
    node::{
        GameState,
        GameStateDto,
        NodeClient,
        NodeError,
        TransactionStatus,
    },
    wallet::{
        AccountAddress,
        EntryFunctionPayload,
        SignerError,
        WalletSigner,
    },
};
use std::{
    fmt,
    time::Duration,
};
use tokio::time::{
    Instant,
    sleep,
};
use tracing::debug;

pub const MODULE_NAME: &str = "rock_paper_scissors";
pub const ENTRY_INITIALIZE_GAME: &str = "initialize_game";
pub const ENTRY_PLAY_GAME: &str = "play_game";
const GAME_STATE_STRUCT: &str = "GameState";
const EVENT_HANDLE_STRUCT: &str = "GameEventHandle";
const EVENT_FIELD: &str = "game_events";

const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);
const CONFIRMATION_DEADLINE: Duration = Duration::from_secs(60);

/// Address of the deployed game module plus the qualified-name helpers for
/// its entry points, resource and event handle.
#[derive(Clone, Debug)]
pub struct ModuleId {
    address: AccountAddress,
}

impl ModuleId {
    pub fn new(address: AccountAddress) -> Self {
        ModuleId { address }
    }

    pub fn entry_function(&self, entry: &str) -> String {
        format!("{}::{}::{}", self.address, MODULE_NAME, entry)
    }

    pub fn game_state_type(&self) -> String {
        format!("{}::{}::{}", self.address, MODULE_NAME, GAME_STATE_STRUCT)
    }

    pub fn event_handle_type(&self) -> String {
        format!("{}::{}::{}", self.address, MODULE_NAME, EVENT_HANDLE_STRUCT)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no wallet identity connected")]
    NotConnected,
    #[error("submission failed: {0}")]
    Submission(#[from] SignerError),
    #[error("transaction was not confirmed in time")]
    ConfirmationTimeout,
    #[error("chain rejected the transaction: {vm_status}")]
    ConfirmationRejected { vm_status: String },
    #[error("game resource not found for this account")]
    ResourceNotFound,
    #[error("event query failed: {reason}")]
    EventQuery { reason: String },
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error("another action is still in flight")]
    Busy,
}

impl GatewayError {
    /// Not-yet-initialized and a failed event fetch both map to empty view
    /// state on passive refresh instead of surfacing to the player.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            GatewayError::ResourceNotFound | GatewayError::EventQuery { .. }
        )
    }
}

/// The three primitive chain interactions plus the typed reads built on
/// them. The production impl talks to the wallet daemon and full node; the
/// test impl is scripted in memory.
pub trait ContractGateway {
    fn connected_account(
        &self,
    ) -> impl Future<Output = Result<Option<AccountAddress>, GatewayError>>;

    fn submit_action(
        &self,
        entry: &str,
        args: Vec<serde_json::Value>,
    ) -> impl Future<Output = Result<TxHash, GatewayError>>;

    fn await_confirmation(
        &self,
        tx: &TxHash,
    ) -> impl Future<Output = Result<(), GatewayError>>;

    fn read_game_state(
        &self,
        account: &AccountAddress,
    ) -> impl Future<Output = Result<GameState, GatewayError>>;

    fn read_game_events(
        &self,
        account: &AccountAddress,
    ) -> impl Future<Output = Result<Vec<GameEvent>, GatewayError>>;

    fn read_coin_balance(
        &self,
        account: &AccountAddress,
    ) -> impl Future<Output = Result<Option<u64>, GatewayError>>;
}

pub struct NodeGateway<S> {
    node: NodeClient,
    signer: S,
    module: ModuleId,
}

impl<S> NodeGateway<S> {
    pub fn new(node: NodeClient, signer: S, module: ModuleId) -> Self {
        NodeGateway {
            node,
            signer,
            module,
        }
    }
}

impl<S: WalletSigner> ContractGateway for NodeGateway<S> {
    async fn connected_account(
        &self,
    ) -> Result<Option<AccountAddress>, GatewayError> {
        Ok(self.signer.connected_account().await?)
    }

    async fn submit_action(
        &self,
        entry: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<TxHash, GatewayError> {
        if self.signer.connected_account().await?.is_none() {
            return Err(GatewayError::NotConnected);
        }
        let payload = EntryFunctionPayload::entry_function(
            self.module.entry_function(entry),
            args,
        );
        let hash = self.signer.sign_and_submit(&payload).await?;
        debug!(%entry, %hash, "submitted transaction");
        Ok(TxHash(hash))
    }

    async fn await_confirmation(&self, tx: &TxHash) -> Result<(), GatewayError> {
        let deadline = Instant::now() + CONFIRMATION_DEADLINE;
        loop {
            match self.node.transaction_by_hash(&tx.0).await? {
                Some(TransactionStatus::Committed { success: true, .. }) => {
                    debug!(hash = %tx, "transaction confirmed");
                    return Ok(());
                }
                Some(TransactionStatus::Committed {
                    success: false,
                    vm_status,
                }) => {
                    return Err(GatewayError::ConfirmationRejected { vm_status });
                }
                // A 404 just means the hash is not indexed yet.
                Some(TransactionStatus::Pending) | None => {}
            }
            if Instant::now() >= deadline {
                return Err(GatewayError::ConfirmationTimeout);
            }
            sleep(CONFIRMATION_POLL_INTERVAL).await;
        }
    }

    async fn read_game_state(
        &self,
        account: &AccountAddress,
    ) -> Result<GameState, GatewayError> {
        let dto: Option<GameStateDto> = self
            .node
            .resource(account, &self.module.game_state_type())
            .await?;
        let dto = dto.ok_or(GatewayError::ResourceNotFound)?;
        Ok(GameState::try_from(dto)?)
    }

    async fn read_game_events(
        &self,
        account: &AccountAddress,
    ) -> Result<Vec<GameEvent>, GatewayError> {
        let dtos = self
            .node
            .events(account, &self.module.event_handle_type(), EVENT_FIELD)
            .await
            .map_err(|e| GatewayError::EventQuery {
                reason: e.to_string(),
            })?;
        dtos.into_iter()
            .map(|dto| {
                GameEvent::try_from(dto).map_err(|e| GatewayError::EventQuery {
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn read_coin_balance(
        &self,
        account: &AccountAddress,
    ) -> Result<Option<u64>, GatewayError> {
        Ok(self.node.coin_balance(account).await?)
    }
}
