//! A scripted game night against the in-memory backend.
//!
//! Plays one full night: a host sets up a session, four players land on
//! two random teams, two games get played and scored, and the final
//! standings are printed. Every fan-out announcement is echoed the way
//! a connected client would receive it.
//!
//! Run with `RUST_LOG=debug` to see the engine's structured logs
//! between the lines of the script.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use parlor::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(BroadcastSink::new(64));
    let manager = SessionManager::new(Arc::clone(&store), Arc::clone(&sink));
    let scoreboard = Scoreboard::new(Arc::clone(&store), Arc::clone(&sink));

    // Echo every announcement as the JSON a subscribed client gets.
    let mut rx = sink.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok((topic, event)) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => println!("    [{topic}] {json}"),
                Err(error) => eprintln!("    [{topic}] unprintable event: {error}"),
            }
        }
    });

    // -- Setting up -------------------------------------------------------

    let host = manager.create_host("Quinn").await?;
    let trivia = manager
        .create_game(NewGame {
            name: "Trivia".into(),
            kind: "trivia".into(),
            rules: Some("three rounds, no phones".into()),
            rounds: Some(3),
        })
        .await?;
    let charades = manager
        .create_game(NewGame {
            name: "Charades".into(),
            kind: "party".into(),
            rules: None,
            rounds: None,
        })
        .await?;

    let session = manager
        .create_session(host.id, "Friday game night", vec![trivia.id, charades.id])
        .await?;
    println!(
        "session {} is open, join code {}",
        session.id,
        session.join_code.as_deref().unwrap_or("?")
    );

    let players = manager
        .assign_players(
            session.id,
            host.id,
            vec!["Ada".into(), "Bo".into(), "Cy".into(), "Dee".into()],
        )
        .await?;
    manager.form_random_teams(session.id, host.id, 2).await?;

    let detail = manager.find_session(session.id, host.id).await?;
    for team in &detail.teams {
        let names: Vec<&str> =
            team.members.iter().map(|p| p.name.as_str()).collect();
        println!("{}: {}", team.team.name, names.join(", "));
    }

    // -- Playing ----------------------------------------------------------

    manager.start_session(session.id, host.id).await?;

    scoreboard
        .award_points_to_player(players[0].id, trivia.id, 10)
        .await?;
    scoreboard
        .award_points_to_player(players[1].id, trivia.id, 7)
        .await?;
    scoreboard
        .award_points_to_player(players[0].id, trivia.id, -2)
        .await?;
    if let Some(first_team) = detail.teams.first() {
        scoreboard
            .award_points_to_team(first_team.team.id, trivia.id, 5)
            .await?;
    }

    println!("\n{} leaderboard:", trivia.name);
    let rows = scoreboard.game_leaderboard(session.id, trivia.id).await?;
    for (place, row) in rows.iter().enumerate() {
        println!("  {}. {} with {} pts", place + 1, row.name, row.total_points);
    }

    manager.next_game(session.id, host.id).await?;
    scoreboard
        .award_points_to_player(players[2].id, charades.id, 8)
        .await?;

    // -- Wrapping up ------------------------------------------------------

    manager.end_session(session.id, host.id).await?;

    let aggregate = scoreboard.session_aggregate(session.id).await?;
    println!("\nfinal standings:");
    for row in &aggregate.players {
        println!("  {} with {} pts", row.name, row.total_points);
    }
    for row in &aggregate.teams {
        println!("  {} (team) with {} pts", row.name, row.total_points);
    }

    // Dropping every sink handle ends the printer's stream.
    drop(manager);
    drop(scoreboard);
    drop(sink);
    printer.await?;
    Ok(())
}
