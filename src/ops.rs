use crate::gateway::escape_str;
use crate::types::{Axis, ShipPlacement};

// Every user-supplied string is routed through `escape_str` here, at the
// single place where request text is assembled. Callers never format
// GraphQL documents themselves.

pub fn create_room(host_name: &str) -> String {
    format!(
        r#"mutation {{ createRoom(hostName: "{}") }}"#,
        escape_str(host_name)
    )
}

pub fn join_room(host_chain_id: &str, player_name: &str) -> String {
    format!(
        r#"mutation {{ joinRoom(hostChainId: "{}", playerName: "{}") }}"#,
        escape_str(host_chain_id),
        escape_str(player_name)
    )
}

/// Enqueue on the matchmaker chain; the orchestrator pairs queued players
/// and the resulting room shows up in a later snapshot.
pub fn search_player(orchestrator_chain_id: &str, player_name: &str) -> String {
    format!(
        r#"mutation {{ searchPlayer(orchestratorChainId: "{}", playerName: "{}") }}"#,
        escape_str(orchestrator_chain_id),
        escape_str(player_name)
    )
}

pub fn submit_board(ships: &[ShipPlacement]) -> String {
    let items = ships
        .iter()
        .map(|s| {
            format!(
                "{{row: {}, col: {}, length: {}, axis: {}}}",
                s.row,
                s.col,
                s.length,
                axis_keyword(s.axis)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("mutation {{ submitBoard(ships: [{items}]) }}")
}

pub fn start_game() -> String {
    "mutation { startGame }".to_string()
}

pub fn attack(row: u32, col: u32) -> String {
    format!("mutation {{ attack(row: {row}, col: {col}) }}")
}

pub fn leave_room() -> String {
    "mutation { leaveRoom }".to_string()
}

/// Matchmaker-side counters, polled by the harness against the
/// orchestrator chain.
pub fn matchmaker_stats() -> String {
    "query { matchmakingQueueLength pendingMatchCount }".to_string()
}

fn axis_keyword(axis: Axis) -> &'static str {
    match axis {
        Axis::Horiz => "HORIZ",
        Axis::Vert => "VERT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_arguments_pass_through() {
        assert_eq!(
            create_room("Ada"),
            r#"mutation { createRoom(hostName: "Ada") }"#
        );
        assert_eq!(
            join_room("chain1", "Bob"),
            r#"mutation { joinRoom(hostChainId: "chain1", playerName: "Bob") }"#
        );
        assert_eq!(attack(3, 7), "mutation { attack(row: 3, col: 7) }");
    }

    #[test]
    fn hostile_names_are_escaped() {
        let text = create_room("Ada \"the\\admiral\"\r\n");
        assert_eq!(
            text,
            "mutation { createRoom(hostName: \"Ada \\\"the\\\\admiral\\\"\\r\\n\") }"
        );
        // No raw quote or control character survives into the literal.
        let literal = &text["mutation { createRoom(hostName: \"".len()..text.len() - "\") }".len()];
        assert!(!literal.contains('\n'));
        assert!(!literal.contains('\r'));
    }

    #[test]
    fn board_submission_renders_input_objects() {
        let ships = vec![
            ShipPlacement { row: 0, col: 0, length: 4, axis: Axis::Horiz },
            ShipPlacement { row: 2, col: 5, length: 2, axis: Axis::Vert },
        ];
        assert_eq!(
            submit_board(&ships),
            "mutation { submitBoard(ships: [{row: 0, col: 0, length: 4, axis: HORIZ}, \
             {row: 2, col: 5, length: 2, axis: VERT}]) }"
        );
    }
}
