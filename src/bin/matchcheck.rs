// Matchmaking harness. Drives two player chains and an orchestrator chain
// through one full pairing round against a live deployment and exits
// non-zero if any stage fails to converge inside the timeout.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;

use broadside::gateway::NodeClient;
use broadside::ops;
use broadside::snapshot;
use broadside::types::GameSnapshot;
use broadside::waiter::wait_until;

const DEFAULT_RPC_TIMEOUT_MS: u64 = 8000;

fn env_required(name: &str) -> Result<String> {
    let v = env::var(name).with_context(|| format!("missing required env: {name}"))?;
    if v.trim().is_empty() {
        bail!("required env {name} is empty");
    }
    Ok(v)
}

fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse_u64(name: &str, default: u64) -> Result<u64> {
    match env_optional(name) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("invalid {name}: {v}")),
        None => Ok(default),
    }
}

struct Peer {
    label: &'static str,
    name: String,
    chain_id: String,
    client: NodeClient,
}

impl Peer {
    async fn snapshot(&self) -> Result<GameSnapshot> {
        snapshot::fetch(&self.client, &self.chain_id)
            .await
            .with_context(|| format!("{} snapshot fetch failed", self.label))
    }
}

#[derive(Debug, Clone, Copy)]
struct MatchmakerStats {
    queued: u64,
    pending: u64,
}

/// Counters on the orchestrator chain. Absent fields read as zero.
async fn read_stats(client: &NodeClient, chain_id: &str) -> Result<MatchmakerStats> {
    let data = client
        .query(chain_id, &ops::matchmaker_stats())
        .await
        .context("matchmaker stats query failed")?;
    Ok(MatchmakerStats {
        queued: data["matchmakingQueueLength"].as_u64().unwrap_or(0),
        pending: data["pendingMatchCount"].as_u64().unwrap_or(0),
    })
}

/// Some(roomId) once both snapshots carry the same room and its players
/// are exactly the two searchers, in either order.
fn matched_room(
    host: &GameSnapshot,
    guest: &GameSnapshot,
    host_name: &str,
    guest_name: &str,
) -> Option<String> {
    let a = host.room.as_ref()?;
    let b = guest.room.as_ref()?;
    if a.room_id != b.room_id {
        return None;
    }
    for room in [a, b] {
        if room.players.len() != 2 {
            return None;
        }
        let names: Vec<&str> = room.players.iter().map(|p| p.name.as_str()).collect();
        if !names.contains(&host_name) || !names.contains(&guest_name) {
            return None;
        }
    }
    Some(a.room_id.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let shared_node = env_optional("NODE_URL");
    let host_node = env_optional("HOST_NODE_URL")
        .or_else(|| shared_node.clone())
        .context("set NODE_URL or HOST_NODE_URL")?;
    let guest_node = env_optional("GUEST_NODE_URL")
        .or_else(|| shared_node.clone())
        .context("set NODE_URL or GUEST_NODE_URL")?;
    let app_id = env_required("APP_ID")?;
    let matchmaker_chain = env_required("MATCHMAKER_CHAIN_ID")?;
    let timeout = Duration::from_millis(env_parse_u64("WAIT_TIMEOUT_MS", 60_000)?);
    let interval = Duration::from_millis(env_parse_u64("WAIT_INTERVAL_MS", 500)?);

    let host = Peer {
        label: "host",
        name: env_optional("HOST_NAME").unwrap_or_else(|| "Host-1".to_string()),
        chain_id: env_required("HOST_CHAIN_ID")?,
        client: NodeClient::new(&host_node, &app_id, DEFAULT_RPC_TIMEOUT_MS),
    };
    let guest = Peer {
        label: "guest",
        name: env_optional("GUEST_NAME").unwrap_or_else(|| "Guest-1".to_string()),
        chain_id: env_required("GUEST_CHAIN_ID")?,
        client: NodeClient::new(&guest_node, &app_id, DEFAULT_RPC_TIMEOUT_MS),
    };

    info!(
        "matchcheck: host={} guest={} matchmaker={}",
        host.chain_id, guest.chain_id, matchmaker_chain
    );

    // Stage 1: host enqueues.
    host.client
        .query(&host.chain_id, &ops::search_player(&matchmaker_chain, &host.name))
        .await
        .context("host searchPlayer mutation failed")?;
    info!("host queued as {:?}", host.name);

    // Stage 2: the orchestrator sees the first entry. Its counters live on
    // the matchmaker chain, read here through the host-side node.
    let stats_client = &host.client;
    let mm_chain = matchmaker_chain.as_str();
    let stats = wait_until(
        "matchmaker queue to show the host",
        move || async move {
            let s = read_stats(stats_client, mm_chain).await?;
            Ok((s.queued >= 1).then_some(s))
        },
        timeout,
        interval,
    )
    .await?;
    info!("matchmaker queue length {}", stats.queued);

    // Stage 3: guest enqueues.
    guest
        .client
        .query(&guest.chain_id, &ops::search_player(&matchmaker_chain, &guest.name))
        .await
        .context("guest searchPlayer mutation failed")?;
    info!("guest queued as {:?}", guest.name);

    // Stage 4: both chains converge on the same room with both players.
    let host_ref = &host;
    let guest_ref = &guest;
    let room_id = wait_until(
        "both chains to report the same room",
        move || async move {
            let host_snap = host_ref.snapshot().await?;
            let guest_snap = guest_ref.snapshot().await?;
            Ok(matched_room(
                &host_snap,
                &guest_snap,
                &host_ref.name,
                &guest_ref.name,
            ))
        },
        timeout,
        interval,
    )
    .await?;
    info!("paired into room {room_id}");

    // Stage 5: the queue and the pending-match ledger drain back to zero.
    wait_until(
        "matchmaker counters to drain",
        move || async move {
            let s = read_stats(stats_client, mm_chain).await?;
            Ok((s.queued == 0 && s.pending == 0).then_some(()))
        },
        timeout,
        interval,
    )
    .await?;

    info!(
        "matchcheck passed: {:?} and {:?} share room {room_id}, matchmaker drained",
        host.name, guest.name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadside::types::{GameState, PlayerInfo, Room, RoomStatus};

    fn snap(room_id: &str, names: &[&str]) -> GameSnapshot {
        GameSnapshot {
            room: Some(Room {
                room_id: room_id.to_string(),
                host_chain_id: "aaaa".to_string(),
                status: RoomStatus::Active,
                game_state: GameState::PlacingBoards,
                players: names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| PlayerInfo {
                        chain_id: format!("chain-{i}"),
                        name: n.to_string(),
                        board_submitted: false,
                    })
                    .collect(),
                current_attacker: None,
                pending_attack: None,
                winner_chain_id: None,
            }),
            ..GameSnapshot::default()
        }
    }

    #[test]
    fn pairing_is_order_independent() {
        let a = snap("r1", &["Host-1", "Guest-1"]);
        let b = snap("r1", &["Guest-1", "Host-1"]);
        assert_eq!(
            matched_room(&a, &b, "Host-1", "Guest-1"),
            Some("r1".to_string())
        );
    }

    #[test]
    fn divergent_rooms_do_not_count() {
        let a = snap("r1", &["Host-1", "Guest-1"]);
        let b = snap("r2", &["Host-1", "Guest-1"]);
        assert_eq!(matched_room(&a, &b, "Host-1", "Guest-1"), None);
    }

    #[test]
    fn a_half_filled_room_keeps_waiting() {
        let a = snap("r1", &["Host-1"]);
        let b = snap("r1", &["Host-1", "Guest-1"]);
        assert_eq!(matched_room(&a, &b, "Host-1", "Guest-1"), None);
        assert_eq!(matched_room(&b, &a, "Host-1", "Guest-1"), None);
    }

    #[test]
    fn wrong_names_keep_waiting() {
        let a = snap("r1", &["Host-1", "Somebody-Else"]);
        assert_eq!(matched_room(&a, &a, "Host-1", "Guest-1"), None);
    }

    #[test]
    fn roomless_snapshots_keep_waiting() {
        let empty = GameSnapshot::default();
        let full = snap("r1", &["Host-1", "Guest-1"]);
        assert_eq!(matched_room(&empty, &full, "Host-1", "Guest-1"), None);
    }
}
