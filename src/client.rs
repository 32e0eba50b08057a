use crate::{
    cache::HistoryCache,
    gateway::{
        ContractGateway,
        ENTRY_INITIALIZE_GAME,
        ENTRY_PLAY_GAME,
        GatewayError,
    },
    history::{
        self,
        HistoryEntry,
        Move,
        RoundOutcome,
    },
    node::GameState,
    ui,
    wallet::AccountAddress,
};
use color_eyre::eyre::Result;
use std::time::Duration;
use tokio::time;
use tracing::{
    error,
    info,
    warn,
};

pub const DEFAULT_TESTNET_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com";
pub const DEFAULT_DEVNET_NODE_URL: &str = "https://fullnode.devnet.aptoslabs.com";
pub const DEFAULT_LOCAL_NODE_URL: &str = "http://localhost:8080";
pub const DEFAULT_WALLET_URL: &str = "http://localhost:8585";
pub const DEFAULT_MODULE_ADDRESS: &str =
    "0x62283b2652e2675341f3803e78e628712676d0d02e5671a39ca72d16f1543e0b";

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);
const ERROR_LOG_DEPTH: usize = 50;
const ERRORS_SHOWN: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    Disconnected,
    Uninitialized,
    Initialized,
}

#[derive(Clone, Debug)]
pub enum NetworkTarget {
    Testnet { url: String },
    Devnet { url: String },
    LocalNode { url: String },
}

impl NetworkTarget {
    pub fn url(&self) -> &str {
        match self {
            NetworkTarget::Testnet { url }
            | NetworkTarget::Devnet { url }
            | NetworkTarget::LocalNode { url } => url,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NetworkTarget::Testnet { .. } => "testnet",
            NetworkTarget::Devnet { .. } => "devnet",
            NetworkTarget::LocalNode { .. } => "local",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub network: NetworkTarget,
    pub wallet_url: String,
    pub module_address: String,
    pub cache_dir: Option<String>,
    pub use_cache: bool,
}

/// View state republished to the UI by value after every refresh.
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub phase: SessionPhase,
    pub network: String,
    pub account: Option<AccountAddress>,
    pub balance_octas: Option<u64>,
    pub game_state: GameState,
    pub history: Vec<HistoryEntry>,
    pub last_round: Option<RoundOutcome>,
    pub selected_move: Move,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController<G> {
    gateway: G,
    cache: Option<HistoryCache>,
    network: String,
    phase: SessionPhase,
    account: Option<AccountAddress>,
    balance_octas: Option<u64>,
    game_state: GameState,
    history: Vec<HistoryEntry>,
    last_round: Option<RoundOutcome>,
    selected_move: Move,
    status: String,
    errors: Vec<String>,
    action_in_flight: bool,
}

impl<G: ContractGateway> AppController<G> {
    pub fn new(
        gateway: G,
        cache: Option<HistoryCache>,
        network: impl Into<String>,
    ) -> Self {
        // Warm first paint from the mirror; the next refresh replaces it
        // with a fresh read.
        let history = cache.as_ref().map(HistoryCache::load).unwrap_or_default();
        AppController {
            gateway,
            cache,
            network: network.into(),
            phase: SessionPhase::Disconnected,
            account: None,
            balance_octas: None,
            game_state: GameState::default(),
            history,
            last_round: None,
            selected_move: Move::Rock,
            status: String::from("Waiting for wallet"),
            errors: Vec::new(),
            action_in_flight: false,
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            phase: self.phase,
            network: self.network.clone(),
            account: self.account.clone(),
            balance_octas: self.balance_octas,
            game_state: self.game_state,
            history: self.history.clone(),
            last_round: self.last_round,
            selected_move: self.selected_move,
            status: self.status.clone(),
            errors: self
                .errors
                .iter()
                .rev()
                .take(ERRORS_SHOWN)
                .cloned()
                .collect(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn selected_move(&self) -> Move {
        self.selected_move
    }

    pub fn set_selected_move(&mut self, mv: Move) {
        self.selected_move = mv;
    }

    pub fn select_next_move(&mut self) {
        let idx = self.selected_move.index() as usize;
        self.selected_move = Move::ALL[(idx + 1) % Move::ALL.len()];
    }

    pub fn select_prev_move(&mut self) {
        let idx = self.selected_move.index() as usize;
        self.selected_move = Move::ALL[(idx + Move::ALL.len() - 1) % Move::ALL.len()];
    }

    pub fn clear_last_round(&mut self) {
        self.last_round = None;
    }

    /// Periodic drive: polls the wallet for the connected identity, then
    /// refreshes the on-chain view. Skipped while an action is in flight
    /// so a tick can never interleave with a submit/confirm cycle.
    pub async fn tick(&mut self) {
        if self.action_in_flight {
            return;
        }
        let account = match self.gateway.connected_account().await {
            Ok(account) => account,
            Err(e) => {
                warn!(error = %e, "wallet identity poll failed");
                None
            }
        };
        match (account, self.account.clone()) {
            (Some(new), Some(current)) if new == current => {
                self.refresh_view().await;
            }
            (Some(new), _) => {
                self.connect(new).await;
            }
            (None, Some(_)) => {
                self.disconnect();
            }
            (None, None) => {}
        }
    }

    async fn connect(&mut self, account: AccountAddress) {
        info!(account = %account, "wallet connected");
        self.status = format!("Connected as {}", account.short());
        self.account = Some(account);
        self.phase = SessionPhase::Uninitialized;
        self.refresh_view().await;
    }

    /// Identity removed: back to the initial state, nothing from the old
    /// session may linger on screen.
    fn disconnect(&mut self) {
        info!("wallet disconnected");
        self.phase = SessionPhase::Disconnected;
        self.account = None;
        self.balance_octas = None;
        self.game_state = GameState::default();
        self.history.clear();
        self.last_round = None;
        self.selected_move = Move::Rock;
        self.status = String::from("Waiting for wallet");
        self.errors.clear();
    }

    /// Passive refresh: a missing resource or a failed event query
    /// degrades to empty view state, anything else surfaces an error and
    /// keeps the prior snapshot.
    async fn refresh_view(&mut self) {
        let Some(account) = self.account.clone() else {
            return;
        };

        match self.gateway.read_game_state(&account).await {
            Ok(state) => {
                if !state.is_consistent() {
                    warn!(
                        games_played = state.games_played,
                        player_wins = state.player_wins,
                        ai_wins = state.ai_wins,
                        draws = state.draws,
                        "game state counters do not add up"
                    );
                }
                self.game_state = state;
                self.phase = SessionPhase::Initialized;
            }
            Err(GatewayError::ResourceNotFound) => {
                self.phase = SessionPhase::Uninitialized;
                self.game_state = GameState::default();
                self.history.clear();
            }
            Err(e) => {
                self.push_error(format!("state refresh failed: {e}"));
            }
        }

        if self.phase == SessionPhase::Initialized {
            match self.gateway.read_game_events(&account).await {
                Ok(events) => {
                    self.history = history::reconcile(&events);
                    self.store_cache();
                }
                Err(e) if e.is_benign() => {
                    warn!(error = %e, "event query failed, showing empty history");
                    self.history.clear();
                }
                Err(e) => {
                    self.push_error(format!("history refresh failed: {e}"));
                }
            }
        }

        match self.gateway.read_coin_balance(&account).await {
            Ok(balance) => self.balance_octas = balance,
            Err(e) => warn!(error = %e, "balance read failed"),
        }
    }

    pub async fn initialize_game(&mut self) -> Result<(), GatewayError> {
        if self.phase != SessionPhase::Uninitialized {
            return Ok(());
        }
        if self.action_in_flight {
            return Err(GatewayError::Busy);
        }
        self.action_in_flight = true;
        let result = self.do_initialize().await;
        self.action_in_flight = false;
        match &result {
            Ok(()) => {
                self.status = String::from("Game initialized");
            }
            Err(e) => {
                self.status = String::from("Failed to initialize game");
                self.push_error(format!("initialize_game: {e}"));
            }
        }
        result
    }

    async fn do_initialize(&mut self) -> Result<(), GatewayError> {
        let account = self.account.clone().ok_or(GatewayError::NotConnected)?;
        let tx = self
            .gateway
            .submit_action(ENTRY_INITIALIZE_GAME, Vec::new())
            .await?;
        self.gateway.await_confirmation(&tx).await?;
        let state = self.gateway.read_game_state(&account).await?;
        self.game_state = state;
        self.phase = SessionPhase::Initialized;
        Ok(())
    }

    /// Submits the move, waits for finality, then refreshes state and
    /// history as a unit: nothing on screen changes unless both re-reads
    /// succeed.
    pub async fn play_game(&mut self, mv: Move) -> Result<RoundOutcome, GatewayError> {
        match self.phase {
            SessionPhase::Disconnected => return Err(GatewayError::NotConnected),
            SessionPhase::Uninitialized => return Err(GatewayError::ResourceNotFound),
            SessionPhase::Initialized => {}
        }
        if self.action_in_flight {
            return Err(GatewayError::Busy);
        }
        self.action_in_flight = true;
        let result = self.do_play(mv).await;
        self.action_in_flight = false;
        match &result {
            Ok(outcome) => {
                self.status =
                    format!("You played {}: {}", outcome.player_move, outcome.result);
            }
            Err(e) => {
                self.status = format!("Failed to play {mv}");
                self.push_error(format!("play_game: {e}"));
            }
        }
        result
    }

    async fn do_play(&mut self, mv: Move) -> Result<RoundOutcome, GatewayError> {
        let account = self.account.clone().ok_or(GatewayError::NotConnected)?;
        let tx = self
            .gateway
            .submit_action(ENTRY_PLAY_GAME, vec![serde_json::json!(mv.index())])
            .await?;
        self.gateway.await_confirmation(&tx).await?;

        // Fetch both before committing either.
        let state = self.gateway.read_game_state(&account).await?;
        let events = self.gateway.read_game_events(&account).await?;
        let outcome = history::latest_event(&events)
            .map(RoundOutcome::from)
            .ok_or_else(|| GatewayError::EventQuery {
                reason: String::from("no game events after a confirmed play"),
            })?;

        if !state.is_consistent() {
            warn!(
                games_played = state.games_played,
                "game state counters do not add up"
            );
        }
        self.game_state = state;
        self.history = history::reconcile(&events);
        self.store_cache();
        self.last_round = Some(outcome);
        Ok(outcome)
    }

    fn store_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.store(&self.history);
        }
    }

    fn push_error(&mut self, message: String) {
        error!("{message}");
        self.errors.push(message);
        if self.errors.len() > ERROR_LOG_DEPTH {
            let drain = self.errors.len() - ERROR_LOG_DEPTH;
            self.errors.drain(0..drain);
        }
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    use crate::{
        gateway::{
            ModuleId,
            NodeGateway,
        },
        node::NodeClient,
        wallet::ExternalWallet,
    };

    let node = NodeClient::new(config.network.url())?;
    let wallet = ExternalWallet::new(config.wallet_url.as_str())?;
    let module = ModuleId::new(AccountAddress::parse(&config.module_address)?);
    let gateway = NodeGateway::new(node, wallet, module);
    let cache = if config.use_cache {
        let dir = crate::cache::resolve_config_dir(config.cache_dir.as_deref())?;
        Some(HistoryCache::new(&dir))
    } else {
        None
    };
    let mut controller = AppController::new(gateway, cache, config.network.name());

    let mut ui_state = ui::UiState::default();
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<G: ContractGateway>(
    controller: &mut AppController<G>,
    ui_state: &mut ui::UiState,
) -> Result<()> {
    let mut ticker = time::interval(REFRESH_INTERVAL);
    controller.tick().await;
    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                controller.tick().await;
                ui::draw(ui_state, &controller.snapshot())?;
            }
            ev = ui::next_event() => {
                match ev? {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::NextMove => controller.select_next_move(),
                    ui::UserEvent::PrevMove => controller.select_prev_move(),
                    ui::UserEvent::SelectMove(mv) => controller.set_selected_move(mv),
                    ui::UserEvent::Initialize => {
                        let _ = controller.initialize_game().await;
                    }
                    ui::UserEvent::Play => {
                        let mv = controller.selected_move();
                        let _ = controller.play_game(mv).await;
                    }
                    ui::UserEvent::CloseModal => controller.clear_last_round(),
                    ui::UserEvent::Redraw => {}
                }
                ui::draw(ui_state, &controller.snapshot())?;
            }
        }
    }
    Ok(())
}
