use rps_client::{
    history::{
        GameResult,
        Move,
    },
    test_helpers::TestContext,
};

#[tokio::test]
async fn play_game__reports_round_from_latest_event() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;
    ctx.chain.script_round(Move::Paper, GameResult::AiWins);

    // when
    let outcome = controller.play_game(Move::Rock).await.unwrap();

    // then
    assert_eq!(outcome.player_move, Move::Rock);
    assert_eq!(outcome.ai_move, Move::Paper);
    assert_eq!(outcome.result, GameResult::AiWins);
    let snap = controller.snapshot();
    assert_eq!(snap.history.len(), 1);
    assert_eq!(snap.history[0].sequence_number, 1);
    assert_eq!(snap.game_state.ai_wins, 1);
    assert_eq!(snap.game_state.games_played, 1);
    assert_eq!(snap.last_round.unwrap().result, GameResult::AiWins);
}

#[tokio::test]
async fn play_game__submits_the_move_index() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;

    // when
    controller.play_game(Move::Scissors).await.unwrap();

    // then
    let submissions = ctx.chain.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].0, "play_game");
    assert_eq!(submissions[0].1, vec![serde_json::json!(2)]);
}

#[tokio::test]
async fn play_game__event_read_failure_is_all_or_nothing() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;
    ctx.chain.script_round(Move::Paper, GameResult::AiWins);
    controller.play_game(Move::Rock).await.unwrap();
    ctx.chain.set_fail_event_read(true);
    ctx.chain.script_round(Move::Rock, GameResult::Draw);

    // when
    let result = controller.play_game(Move::Rock).await;

    // then
    assert!(result.is_err());
    let snap = controller.snapshot();
    assert_eq!(snap.game_state.games_played, 1);
    assert_eq!(snap.history.len(), 1);
    assert_eq!(snap.last_round.unwrap().result, GameResult::AiWins);
    assert!(!snap.errors.is_empty());
}

#[tokio::test]
async fn play_game__state_read_failure_is_all_or_nothing() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;
    ctx.chain.script_round(Move::Paper, GameResult::AiWins);
    controller.play_game(Move::Rock).await.unwrap();
    ctx.chain.set_fail_state_read(true);
    ctx.chain.script_round(Move::Rock, GameResult::Draw);

    // when
    let result = controller.play_game(Move::Paper).await;

    // then
    assert!(result.is_err());
    let snap = controller.snapshot();
    assert_eq!(snap.game_state.games_played, 1);
    assert_eq!(snap.history.len(), 1);
}

#[tokio::test]
async fn play_game__requires_an_initialized_session() {
    // given
    let ctx = TestContext::new();
    let mut controller = ctx.controller();
    controller.tick().await;

    // when
    let result = controller.play_game(Move::Rock).await;

    // then
    assert!(result.is_err());
    assert!(ctx.chain.submissions().is_empty());
}

#[tokio::test]
async fn play_game__history_stays_bounded_and_newest_first() {
    // given
    let ctx = TestContext::with_initialized_game();
    let mut controller = ctx.controller();
    controller.tick().await;

    // when
    for _ in 0..7 {
        ctx.chain.script_round(Move::Rock, GameResult::Draw);
        controller.play_game(Move::Rock).await.unwrap();
    }

    // then
    let snap = controller.snapshot();
    let sequences: Vec<_> = snap
        .history
        .iter()
        .map(|entry| entry.sequence_number)
        .collect();
    assert_eq!(sequences, vec![7, 6, 5, 4, 3]);
    assert_eq!(snap.game_state.games_played, 7);
    assert!(snap.game_state.is_consistent());
}
