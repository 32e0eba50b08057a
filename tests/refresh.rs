use rps_client::{
    cache::HistoryCache,
    client::{
        AppController,
        SessionPhase,
    },
    history::{
        GameEvent,
        GameResult,
        Move,
    },
    node::GameState,
    test_helpers::{
        TEST_BALANCE_OCTAS,
        TestContext,
    },
};

#[tokio::test]
async fn tick__refresh_populates_balance_and_stats() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();

    // when
    controller.tick().await;

    // then
    let snap = controller.snapshot();
    assert_eq!(snap.phase, SessionPhase::Initialized);
    assert_eq!(snap.balance_octas, Some(TEST_BALANCE_OCTAS));
    assert_eq!(snap.game_state, GameState::default());
}

#[tokio::test]
async fn tick__disconnect_clears_all_view_state() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;
    ctx.chain.script_round(Move::Scissors, GameResult::PlayerWins);
    controller.play_game(Move::Rock).await.unwrap();

    // when
    ctx.chain.disconnect();
    controller.tick().await;

    // then
    let snap = controller.snapshot();
    assert_eq!(snap.phase, SessionPhase::Disconnected);
    assert_eq!(snap.game_state, GameState::default());
    assert!(snap.history.is_empty());
    assert!(snap.last_round.is_none());
    assert_eq!(snap.balance_octas, None);
    assert_eq!(snap.status, "Waiting for wallet");
}

#[tokio::test]
async fn tick__event_failure_degrades_to_empty_history() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;
    ctx.chain.script_round(Move::Paper, GameResult::AiWins);
    controller.play_game(Move::Rock).await.unwrap();

    // when
    ctx.chain.set_fail_event_read(true);
    controller.tick().await;

    // then
    let snap = controller.snapshot();
    assert!(snap.history.is_empty());
    assert!(snap.errors.is_empty());
    assert_eq!(snap.phase, SessionPhase::Initialized);
}

#[tokio::test]
async fn tick__scores_stay_consistent_across_rounds() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;
    let rounds = [
        (Move::Scissors, GameResult::PlayerWins),
        (Move::Paper, GameResult::AiWins),
        (Move::Rock, GameResult::Draw),
    ];

    // when
    for (ai_move, result) in rounds {
        ctx.chain.script_round(ai_move, result);
        controller.play_game(Move::Rock).await.unwrap();
        assert!(controller.snapshot().game_state.is_consistent());
    }

    // then
    let snap = controller.snapshot();
    assert_eq!(snap.game_state.player_wins, 1);
    assert_eq!(snap.game_state.ai_wins, 1);
    assert_eq!(snap.game_state.draws, 1);
    assert_eq!(snap.game_state.games_played, 3);
}

#[tokio::test]
async fn tick__connect_projects_existing_events() {
    // given
    let ctx = TestContext::with_initialized_game();
    ctx.chain.set_state(GameState {
        player_wins: 1,
        ai_wins: 0,
        draws: 0,
        games_played: 1,
    });
    ctx.chain.push_event(GameEvent {
        player_choice: Move::Rock,
        ai_choice: Move::Scissors,
        result: GameResult::PlayerWins,
        sequence_number: 1,
    });
    let mut controller = ctx.controller();

    // when
    controller.tick().await;

    // then
    let snap = controller.snapshot();
    assert_eq!(snap.history.len(), 1);
    assert_eq!(snap.history[0].player_move, Move::Rock);
    assert_eq!(snap.history[0].result, GameResult::PlayerWins);
}

#[tokio::test]
async fn cache__mirror_prepopulates_the_next_session() {
    // given
    let dir = std::env::temp_dir()
        .join("rps-client-refresh-tests")
        .join(format!("mirror-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let ctx = TestContext::with_initialized_game();
    let mut controller = AppController::new(
        ctx.chain.clone(),
        Some(HistoryCache::new(&dir)),
        "local",
    );
    controller.tick().await;
    ctx.chain.script_round(Move::Paper, GameResult::AiWins);
    controller.play_game(Move::Rock).await.unwrap();

    // when
    let restarted = AppController::new(
        ctx.chain.clone(),
        Some(HistoryCache::new(&dir)),
        "local",
    );

    // then
    let snap = restarted.snapshot();
    assert_eq!(snap.history.len(), 1);
    assert_eq!(snap.history[0].ai_move, Move::Paper);
}

#[tokio::test]
async fn tick__reconnect_starts_a_fresh_session_from_chain_truth() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;
    ctx.chain.script_round(Move::Scissors, GameResult::PlayerWins);
    controller.play_game(Move::Rock).await.unwrap();
    ctx.chain.disconnect();
    controller.tick().await;

    // when
    ctx.chain.connect();
    controller.tick().await;

    // then
    let snap = controller.snapshot();
    assert_eq!(snap.phase, SessionPhase::Initialized);
    assert_eq!(snap.game_state.games_played, 1);
    assert_eq!(snap.history.len(), 1);
}
