use crate::{
    client::AppController,
    gateway::{
        ContractGateway,
        ENTRY_INITIALIZE_GAME,
        ENTRY_PLAY_GAME,
        GatewayError,
        TxHash,
    },
    history::{
        GameEvent,
        GameResult,
        Move,
    },
    node::{
        GameState,
        NodeError,
    },
    wallet::{
        AccountAddress,
        SignerError,
    },
};
use std::sync::{
    Arc,
    Mutex,
};

pub const TEST_ACCOUNT: &str = "0xa11ce";
pub const TEST_BALANCE_OCTAS: u64 = 250_000_000;

/// In-memory chain double. Entry points take effect at submit time;
/// confirmation is a formality unless scripted to fail. Clones share the
/// same chain so tests can keep a handle after handing one to the
/// controller.
#[derive(Clone)]
pub struct FakeGateway {
    inner: Arc<Mutex<FakeChain>>,
}

struct FakeChain {
    account: Option<AccountAddress>,
    resource: Option<GameState>,
    events: Vec<GameEvent>,
    scripted_rounds: Vec<(Move, GameResult)>,
    submissions: Vec<(String, Vec<serde_json::Value>)>,
    fail_submit: bool,
    reject_confirmation: Option<String>,
    fail_state_read: bool,
    fail_event_read: bool,
    next_tx: u64,
}

impl FakeGateway {
    pub fn disconnected() -> Self {
        FakeGateway {
            inner: Arc::new(Mutex::new(FakeChain {
                account: None,
                resource: None,
                events: Vec::new(),
                scripted_rounds: Vec::new(),
                submissions: Vec::new(),
                fail_submit: false,
                reject_confirmation: None,
                fail_state_read: false,
                fail_event_read: false,
                next_tx: 0,
            })),
        }
    }

    pub fn connected() -> Self {
        let gateway = Self::disconnected();
        gateway.connect();
        gateway
    }

    pub fn with_initialized_game() -> Self {
        let gateway = Self::connected();
        gateway.set_state(GameState::default());
        gateway
    }

    pub fn connect(&self) {
        self.inner.lock().unwrap().account =
            Some(AccountAddress::parse(TEST_ACCOUNT).unwrap());
    }

    pub fn disconnect(&self) {
        self.inner.lock().unwrap().account = None;
    }

    pub fn set_state(&self, state: GameState) {
        self.inner.lock().unwrap().resource = Some(state);
    }

    pub fn push_event(&self, event: GameEvent) {
        self.inner.lock().unwrap().events.push(event);
    }

    /// Queues the AI move and result the contract will use for the next
    /// `play_game` submission.
    pub fn script_round(&self, ai_move: Move, result: GameResult) {
        self.inner
            .lock()
            .unwrap()
            .scripted_rounds
            .push((ai_move, result));
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.inner.lock().unwrap().fail_submit = fail;
    }

    pub fn set_reject_confirmation(&self, vm_status: Option<String>) {
        self.inner.lock().unwrap().reject_confirmation = vm_status;
    }

    pub fn set_fail_state_read(&self, fail: bool) {
        self.inner.lock().unwrap().fail_state_read = fail;
    }

    pub fn set_fail_event_read(&self, fail: bool) {
        self.inner.lock().unwrap().fail_event_read = fail;
    }

    pub fn submissions(&self) -> Vec<(String, Vec<serde_json::Value>)> {
        self.inner.lock().unwrap().submissions.clone()
    }
}

impl FakeChain {
    fn apply_entry(&mut self, entry: &str, args: &[serde_json::Value]) {
        match entry {
            ENTRY_INITIALIZE_GAME => {
                self.resource = Some(GameState::default());
            }
            ENTRY_PLAY_GAME => {
                let player_code = args
                    .first()
                    .and_then(serde_json::Value::as_u64)
                    .unwrap_or(0);
                let player = Move::try_from(player_code).unwrap_or(Move::Rock);
                let (ai_move, result) = if self.scripted_rounds.is_empty() {
                    (player, GameResult::Draw)
                } else {
                    self.scripted_rounds.remove(0)
                };

                let mut state = self.resource.unwrap_or_default();
                match result {
                    GameResult::PlayerWins => state.player_wins += 1,
                    GameResult::AiWins => state.ai_wins += 1,
                    GameResult::Draw => state.draws += 1,
                }
                state.games_played += 1;
                self.resource = Some(state);

                let sequence_number = self
                    .events
                    .last()
                    .map(|event| event.sequence_number + 1)
                    .unwrap_or(1);
                self.events.push(GameEvent {
                    player_choice: player,
                    ai_choice: ai_move,
                    result,
                    sequence_number,
                });
            }
            _ => {}
        }
    }
}

impl ContractGateway for FakeGateway {
    async fn connected_account(
        &self,
    ) -> Result<Option<AccountAddress>, GatewayError> {
        Ok(self.inner.lock().unwrap().account.clone())
    }

    async fn submit_action(
        &self,
        entry: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<TxHash, GatewayError> {
        let mut chain = self.inner.lock().unwrap();
        if chain.account.is_none() {
            return Err(GatewayError::NotConnected);
        }
        if chain.fail_submit {
            return Err(GatewayError::Submission(SignerError::Rejected {
                reason: String::from("scripted rejection"),
            }));
        }
        chain.submissions.push((entry.to_owned(), args.clone()));
        if chain.reject_confirmation.is_none() {
            chain.apply_entry(entry, &args);
        }
        chain.next_tx += 1;
        Ok(TxHash(format!("0xfake{}", chain.next_tx)))
    }

    async fn await_confirmation(&self, _tx: &TxHash) -> Result<(), GatewayError> {
        let chain = self.inner.lock().unwrap();
        match &chain.reject_confirmation {
            Some(vm_status) => Err(GatewayError::ConfirmationRejected {
                vm_status: vm_status.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn read_game_state(
        &self,
        _account: &AccountAddress,
    ) -> Result<GameState, GatewayError> {
        let chain = self.inner.lock().unwrap();
        if chain.fail_state_read {
            return Err(GatewayError::Node(NodeError::InvalidPayload(
                String::from("scripted state read failure"),
            )));
        }
        chain.resource.ok_or(GatewayError::ResourceNotFound)
    }

    async fn read_game_events(
        &self,
        _account: &AccountAddress,
    ) -> Result<Vec<GameEvent>, GatewayError> {
        let chain = self.inner.lock().unwrap();
        if chain.fail_event_read {
            return Err(GatewayError::EventQuery {
                reason: String::from("scripted event read failure"),
            });
        }
        Ok(chain.events.clone())
    }

    async fn read_coin_balance(
        &self,
        _account: &AccountAddress,
    ) -> Result<Option<u64>, GatewayError> {
        Ok(Some(TEST_BALANCE_OCTAS))
    }
}

pub struct TestContext {
    pub chain: FakeGateway,
}

impl TestContext {
    /// Wallet connected, game never initialized.
    pub fn new() -> Self {
        TestContext {
            chain: FakeGateway::connected(),
        }
    }

    /// Wallet connected, zeroed game resource already on-chain.
    pub fn with_initialized_game() -> Self {
        TestContext {
            chain: FakeGateway::with_initialized_game(),
        }
    }

    pub fn controller(&self) -> AppController<FakeGateway> {
        AppController::new(self.chain.clone(), None, "local")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
