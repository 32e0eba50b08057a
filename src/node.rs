use crate::{
    history::{
        GameEvent,
        GameResult,
        Move,
    },
    wallet::AccountAddress,
};
use reqwest::StatusCode;
use serde::{
    Deserialize,
    de::DeserializeOwned,
};
use std::fmt;
use url::Url;

pub const COIN_STORE_TYPE: &str =
    "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";
pub const OCTAS_PER_COIN: u64 = 100_000_000;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("node request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("node responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid node payload: {0}")]
    InvalidPayload(String),
    #[error("invalid node url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// REST client for the chain full node. All quantities arrive as decimal
/// strings and are parsed here; callers only see typed values.
#[derive(Clone)]
pub struct NodeClient {
    base_url: String,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, NodeError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(|source| NodeError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;
        Ok(NodeClient {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    /// Fetches a typed resource snapshot for the account. `None` means the
    /// account has never created the resource.
    pub async fn resource<T: DeserializeOwned>(
        &self,
        address: &AccountAddress,
        resource_type: &str,
    ) -> Result<Option<T>, NodeError> {
        let url = format!(
            "{}/v1/accounts/{}/resource/{}",
            self.base_url, address, resource_type
        );
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = res.bytes().await?;
        if !status.is_success() {
            return Err(NodeError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        let dto: ResourceDto<T> = serde_json::from_slice(&bytes)
            .map_err(|e| NodeError::InvalidPayload(e.to_string()))?;
        Ok(Some(dto.data))
    }

    /// Fetches every event ever emitted under the handle, in emission
    /// order.
    pub async fn events(
        &self,
        address: &AccountAddress,
        event_handle: &str,
        field_name: &str,
    ) -> Result<Vec<EventDto>, NodeError> {
        let url = format!(
            "{}/v1/accounts/{}/events/{}/{}",
            self.base_url, address, event_handle, field_name
        );
        let res = self.http.get(url).send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        if !status.is_success() {
            return Err(NodeError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| NodeError::InvalidPayload(e.to_string()))
    }

    /// Looks up a submitted transaction. `None` means the node has not
    /// indexed the hash yet, which counts as still pending.
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionStatus>, NodeError> {
        let url = format!("{}/v1/transactions/by_hash/{}", self.base_url, hash);
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = res.bytes().await?;
        if !status.is_success() {
            return Err(NodeError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        let dto: TransactionDto = serde_json::from_slice(&bytes)
            .map_err(|e| NodeError::InvalidPayload(e.to_string()))?;
        Ok(Some(dto.into()))
    }

    /// Native-coin balance in octas; `None` when the account has no coin
    /// store.
    pub async fn coin_balance(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<u64>, NodeError> {
        let store: Option<CoinStoreDto> =
            self.resource(address, COIN_STORE_TYPE).await?;
        store
            .map(|dto| parse_u64("coin.value", &dto.coin.value))
            .transpose()
    }
}

impl fmt::Display for NodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

/// Score counters owned by the contract; read-only on this side.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GameState {
    pub player_wins: u64,
    pub ai_wins: u64,
    pub draws: u64,
    pub games_played: u64,
}

impl GameState {
    /// The contract maintains `games_played == player_wins + ai_wins +
    /// draws`; a mismatch points at a stale or corrupt read.
    pub fn is_consistent(&self) -> bool {
        self.games_played == self.player_wins + self.ai_wins + self.draws
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.player_wins as f64 / self.games_played as f64
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransactionStatus {
    Pending,
    Committed { success: bool, vm_status: String },
}

fn parse_u64(field: &str, raw: &str) -> Result<u64, NodeError> {
    raw.parse().map_err(|_| {
        NodeError::InvalidPayload(format!("{field} is not a u64: {raw:?}"))
    })
}

#[derive(Deserialize)]
struct ResourceDto<T> {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    resource_type: String,
    data: T,
}

#[derive(Clone, Deserialize)]
pub struct GameStateDto {
    player_wins: String,
    ai_wins: String,
    draws: String,
    games_played: String,
}

impl TryFrom<GameStateDto> for GameState {
    type Error = NodeError;

    fn try_from(dto: GameStateDto) -> Result<Self, Self::Error> {
        Ok(GameState {
            player_wins: parse_u64("player_wins", &dto.player_wins)?,
            ai_wins: parse_u64("ai_wins", &dto.ai_wins)?,
            draws: parse_u64("draws", &dto.draws)?,
            games_played: parse_u64("games_played", &dto.games_played)?,
        })
    }
}

#[derive(Clone, Deserialize)]
pub struct EventDto {
    sequence_number: String,
    data: GameEventDataDto,
}

#[derive(Clone, Deserialize)]
struct GameEventDataDto {
    player_choice: String,
    ai_choice: String,
    result: String,
}

impl TryFrom<EventDto> for GameEvent {
    type Error = NodeError;

    fn try_from(dto: EventDto) -> Result<Self, Self::Error> {
        let player_choice =
            Move::try_from(parse_u64("player_choice", &dto.data.player_choice)?)
                .map_err(|e| NodeError::InvalidPayload(e.to_string()))?;
        let ai_choice = Move::try_from(parse_u64("ai_choice", &dto.data.ai_choice)?)
            .map_err(|e| NodeError::InvalidPayload(e.to_string()))?;
        let result = GameResult::try_from(parse_u64("result", &dto.data.result)?)
            .map_err(|e| NodeError::InvalidPayload(e.to_string()))?;
        Ok(GameEvent {
            player_choice,
            ai_choice,
            result,
            sequence_number: parse_u64("sequence_number", &dto.sequence_number)?,
        })
    }
}

#[derive(Clone, Deserialize)]
struct CoinStoreDto {
    coin: CoinDto,
}

#[derive(Clone, Deserialize)]
struct CoinDto {
    value: String,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum TransactionDto {
    #[serde(rename = "pending_transaction")]
    Pending {},
    #[serde(rename = "user_transaction")]
    User { success: bool, vm_status: String },
}

impl From<TransactionDto> for TransactionStatus {
    fn from(dto: TransactionDto) -> Self {
        match dto {
            TransactionDto::Pending {} => TransactionStatus::Pending,
            TransactionDto::User { success, vm_status } => {
                TransactionStatus::Committed { success, vm_status }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_state_dto__parses_string_counters() {
        let dto: GameStateDto = serde_json::from_str(
            r#"{
                "player_wins": "3",
                "ai_wins": "2",
                "draws": "1",
                "games_played": "6"
            }"#,
        )
        .unwrap();

        let state = GameState::try_from(dto).unwrap();

        assert_eq!(
            state,
            GameState {
                player_wins: 3,
                ai_wins: 2,
                draws: 1,
                games_played: 6,
            }
        );
        assert!(state.is_consistent());
    }

    #[test]
    fn game_state_dto__rejects_non_numeric_counters() {
        let dto: GameStateDto = serde_json::from_str(
            r#"{
                "player_wins": "three",
                "ai_wins": "0",
                "draws": "0",
                "games_played": "0"
            }"#,
        )
        .unwrap();

        assert!(GameState::try_from(dto).is_err());
    }

    #[test]
    fn event_dto__parses_codes_and_sequence_number() {
        let dto: EventDto = serde_json::from_str(
            r#"{
                "version": "1912",
                "guid": {"creation_number": "4", "account_address": "0x1"},
                "sequence_number": "7",
                "type": "0x62::rock_paper_scissors::GameEvent",
                "data": {
                    "player_choice": "0",
                    "ai_choice": "1",
                    "result": "1"
                }
            }"#,
        )
        .unwrap();

        let event = GameEvent::try_from(dto).unwrap();

        assert_eq!(event.player_choice, Move::Rock);
        assert_eq!(event.ai_choice, Move::Paper);
        assert_eq!(event.result, GameResult::AiWins);
        assert_eq!(event.sequence_number, 7);
    }

    #[test]
    fn event_dto__rejects_out_of_range_codes() {
        let dto: EventDto = serde_json::from_str(
            r#"{
                "sequence_number": "0",
                "data": {
                    "player_choice": "5",
                    "ai_choice": "1",
                    "result": "1"
                }
            }"#,
        )
        .unwrap();

        assert!(GameEvent::try_from(dto).is_err());
    }

    #[test]
    fn transaction_dto__distinguishes_pending_from_committed() {
        let pending: TransactionDto = serde_json::from_str(
            r#"{"type": "pending_transaction", "hash": "0xabc"}"#,
        )
        .unwrap();
        let committed: TransactionDto = serde_json::from_str(
            r#"{
                "type": "user_transaction",
                "hash": "0xabc",
                "success": true,
                "vm_status": "Executed successfully"
            }"#,
        )
        .unwrap();

        assert_eq!(TransactionStatus::from(pending), TransactionStatus::Pending);
        assert_eq!(
            TransactionStatus::from(committed),
            TransactionStatus::Committed {
                success: true,
                vm_status: "Executed successfully".to_owned(),
            }
        );
    }

    #[test]
    fn coin_store_dto__parses_octa_balance() {
        let dto: CoinStoreDto = serde_json::from_str(
            r#"{"coin": {"value": "250000000"}}"#,
        )
        .unwrap();

        assert_eq!(parse_u64("coin.value", &dto.coin.value).unwrap(), 250_000_000);
    }

    #[test]
    fn win_rate__is_zero_before_any_game() {
        assert_eq!(GameState::default().win_rate(), 0.0);
    }
}
