//! Whole-game tests.
//!
//! These tests load JSON game definitions and run them to completion:
//! - A dice race with per-player turns, input and an End-Game winner
//! - Views rendered before every input
//! - Seeded runs are reproducible

use rust_tabletop::core::{Location, PlayerId, Variable};
use rust_tabletop::flow::{Answers, ScriptedCollector};
use rust_tabletop::views::RecordingViewRenderer;
use rust_tabletop::{EngineConfig, Game, GameDefinition, GameResult};

const RACE: &str = r#"{
    "globalVariables": {"Target": 3, "Roll": 0},
    "playerVariables": {"Score": 0},
    "playerCount": {"min": 2, "max": 4},
    "views": {
        "board": [{"label": "Total", "expression": "=sum(map(players, 'score'))"}]
    },
    "phases": {
        "turn": {
            "repetition": "forEachPlayer",
            "view": "board",
            "blocks": [
                {"type": "input", "form": [{"type": "number", "name": "Roll", "label": "How far?"}]},
                {"type": "event", "eventType": "setVariable", "variable": "current.score", "expression": "=current.score + roll"},
                {"type": "condition", "expression": "=current.score >= target", "whenTrue": [
                    {"type": "event", "eventType": "endGame", "winners": "=[current]"}
                ]}
            ]
        }
    },
    "flow": [
        {"type": "phase", "name": "Rounds", "repetition": "forever", "blocks": [
            {"type": "phase", "phase": "turn"}
        ]}
    ]
}"#;

const DEAL: &str = r#"{
    "globalVariables": {
        "Deck": {"collection": [{"Value": 1}, {"Value": 2}, {"Value": 3}, {"Value": 4}, {"Value": 5}, {"Value": 6}]}
    },
    "playerVariables": {"Hand": {"collection": []}},
    "playerCount": {"min": 3, "max": 3},
    "flow": [
        {"type": "event", "eventType": "shuffle", "stack": "deck"},
        {"type": "phase", "name": "Deal", "repetition": "forEachPlayer", "blocks": [
            {"type": "event", "eventType": "moveComponent", "source": "=deck", "pickMethod": "draw", "destination": "=current.hand"}
        ]}
    ]
}"#;

fn rolls(values: &[i32]) -> ScriptedCollector {
    values
        .iter()
        .map(|&roll| [("roll", Variable::from(roll))].into_iter().collect::<Answers>())
        .collect()
}

fn load(json: &str) -> GameDefinition {
    serde_json::from_str(json).unwrap()
}

/// Test a full race: player 2 reaches the target on the second round.
#[test]
fn test_race_to_target() {
    let game = Game::new(load(RACE), EngineConfig::new().with_seed(5)).unwrap();
    let mut collector = rolls(&[1, 2, 1, 2]);
    let report = game.run(&mut collector).unwrap();

    assert_eq!(report.result, GameResult::Winners(vec!["Player 2".to_string()]));
    assert_eq!(collector.remaining(), 0);
    assert_eq!(collector.requests().len(), 4);
    assert_eq!(
        report.state.player(PlayerId::new(1)).unwrap().get("score"),
        Some(&Variable::from(2))
    );
    assert_eq!(
        report.state.player(PlayerId::new(2)).unwrap().get("score"),
        Some(&Variable::from(4))
    );
}

/// Test the phase view is rendered before every input.
#[test]
fn test_race_renders_board() {
    let game = Game::new(load(RACE), EngineConfig::new()).unwrap();
    let mut collector = rolls(&[1, 2, 1, 2]);
    let mut renderer = RecordingViewRenderer::new();
    game.run_with_renderer(&mut collector, &mut renderer).unwrap();

    let totals: Vec<_> = renderer
        .rendered()
        .iter()
        .map(|(name, values)| {
            assert_eq!(name, "board");
            values[0].1.clone()
        })
        .collect();
    assert_eq!(
        totals,
        vec![Variable::from(0), Variable::from(1), Variable::from(3), Variable::from(4)]
    );
    assert!(collector.requests().iter().all(|r| r.view.as_deref() == Some("board")));
}

/// Test running out of answers aborts the game.
#[test]
fn test_race_without_answers_fails() {
    let game = Game::new(load(RACE), EngineConfig::new()).unwrap();
    let mut collector = rolls(&[1]);
    let err = game.run(&mut collector).unwrap_err();
    assert_eq!(err.to_string(), "answer collector failed: no scripted answers left");
}

/// Test a deal with the same seed gives the same hands, and every card
/// ends up somewhere.
#[test]
fn test_seeded_deal_is_reproducible() {
    let config = EngineConfig::new().with_seed(42);
    let first = Game::new(load(DEAL), config.clone()).unwrap().run(&mut ScriptedCollector::new()).unwrap();
    let second = Game::new(load(DEAL), config).unwrap().run(&mut ScriptedCollector::new()).unwrap();

    assert_eq!(first.result, GameResult::Incomplete);
    assert_eq!(first.state, second.state);
    assert_eq!(first.rng, second.rng);
    assert_eq!(first.rng.seed, 42);

    let mut seen = Vec::new();
    for id in PlayerId::all(3) {
        let hand = first.state.player(id).unwrap().get("hand").unwrap();
        let Variable::Location(Location::Collection(cards)) = hand else {
            panic!("expected a collection, found {hand:?}");
        };
        assert_eq!(cards.len(), 1);
        seen.extend(cards.iter().filter_map(|c| c.get("value").and_then(Variable::as_number)));
    }
    let Some(Variable::Location(Location::Collection(deck))) = first.state.get("deck") else {
        panic!("deck is not a collection");
    };
    assert_eq!(deck.len(), 3);
    seen.extend(deck.iter().filter_map(|c| c.get("value").and_then(Variable::as_number)));
    seen.sort_by(f64::total_cmp);
    assert_eq!(seen, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

/// Test the player count comes from the config when it is in range.
#[test]
fn test_player_count_from_config() {
    let game = Game::new(load(RACE), EngineConfig::new().with_player_count(4)).unwrap();
    assert_eq!(game.player_count(), 4);
    assert_eq!(game.initial_state().player_count(), 4);
    assert!(Game::new(load(RACE), EngineConfig::new().with_player_count(1)).is_err());
}
