//! Score Ledger
//!
//! Runs a short demonstration epoch against the in-memory token and agent
//! registry. With `LEDGER_SCORE_SIGNER` and `LEDGER_TREASURY` set, the
//! environment configuration is used; otherwise a demo signer is generated.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use score_ledger::{
    core::{Address, SessionId, TokenAmount},
    external::{Clock, InMemoryAgentRegistry, InMemoryTokenLedger, ManualClock, TokenLedger},
    settlement::ConfigError,
    EngineConfig, LedgerService, LedgerStore, RuntimeConfig, ScoreSigner, ScoreSubmission, VERSION,
};

/// Seed for the demo signer. Never use outside the demo.
const DEMO_SIGNER_SEED: [u8; 32] = [0x5C; 32];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Score Ledger v{}", VERSION);

    let demo_signer = ScoreSigner::from_seed(DEMO_SIGNER_SEED);
    let runtime = match RuntimeConfig::from_env() {
        Ok(runtime) => runtime,
        Err(ConfigError::Missing(var)) => {
            warn!("{} not set, running with the demo signer", var);
            RuntimeConfig {
                engine: EngineConfig {
                    score_signer: demo_signer.address(),
                    ..Default::default()
                },
                max_supply: score_ledger::core::constants::DEFAULT_MAX_SUPPLY,
                state_path: std::env::var("LEDGER_STATE_PATH").ok().map(Into::into),
            }
        }
        Err(e) => return Err(e).context("reading configuration"),
    };

    demo_epoch(runtime, &demo_signer).await
}

/// Play one epoch: two humans and an agent submit, then the epoch settles.
async fn demo_epoch(runtime: RuntimeConfig, signer: &ScoreSigner) -> Result<()> {
    info!("=== Starting Demo Epoch ===");

    let config = runtime.engine;
    let duration = config.epoch_duration_secs;
    let domain_id = config.domain_id;

    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let agent = Address::from_label("agent-007");

    let mut token = InMemoryTokenLedger::new(runtime.max_supply);
    for player in [alice, bob, agent] {
        fund(&mut token, &player, &config.vault, 100)?;
    }
    let mut agents = InMemoryAgentRegistry::new();
    agents.register_agent(agent);

    let clock = Arc::new(ManualClock::new(chrono::Utc::now().timestamp().max(0) as u64));
    let store = runtime.state_path.map(LedgerStore::new);
    if let Some(store) = &store {
        info!("Persisting to {}", store.path().display());
    }

    let (service, _admin) = LedgerService::open(
        config,
        store,
        Box::new(token),
        Box::new(agents),
        clock.clone(),
    )
    .context("opening ledger")?;

    let mut events = service.subscribe();
    let logger = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.to_json() {
                Ok(json) => info!("event {}", json),
                Err(e) => warn!("unencodable event {}: {}", event.name(), e),
            }
        }
    });

    let plays: [(Address, u64, u64, u64); 4] = [
        (alice, 1_200, 12, 4),
        (bob, 900, 8, 6),
        (agent, 1_500, 21, 9),
        (alice, 1_350, 14, 5),
    ];

    let epoch_start = service.current_epoch().await.start_time;
    for (n, (player, score, round, kills)) in plays.into_iter().enumerate() {
        let mut session = [0u8; 32];
        session[..8].copy_from_slice(&epoch_start.to_le_bytes());
        session[8] = n as u8;

        let unsigned = ScoreSubmission::unsigned(
            player, score, round, kills, SessionId::new(session), clock.now(),
        );
        match service.submit_score(signer.sign(unsigned, domain_id)).await {
            Ok(receipt) => info!(
                "{} scored {}: reward {}, rank {:?}",
                player.short(),
                score,
                receipt.reward,
                receipt.insertion.rank()
            ),
            Err(e) => warn!("{} rejected: {}", player.short(), e),
        }
        clock.advance(60);
    }

    info!("Epoch ends in {}s, fast-forwarding", service.time_until_epoch_end().await);
    clock.advance(duration);

    let receipt = service.settle_epoch().await.context("settling epoch")?;
    info!(
        "Epoch {} settled: human prize {}, agent prize {}, burned {}, treasury {}",
        receipt.settled.id, receipt.human_prize, receipt.agent_prize, receipt.burned, receipt.treasury
    );

    info!("=== Leaderboards ===");
    for (label, is_agent) in [("human", false), ("agent", true)] {
        for (rank, entry) in service.leaderboard_entries(is_agent).await.iter().enumerate() {
            info!("{} #{}: {} - {}", label, rank + 1, entry.player.short(), entry.score);
        }
    }
    for player in [alice, bob, agent] {
        info!("{} balance {}", player.short(), service.balance_of(player).await);
    }

    drop(service);
    let _ = logger.await;
    Ok(())
}

/// Mint starting funds and approve the vault to collect fees.
fn fund(
    token: &mut InMemoryTokenLedger,
    player: &Address,
    vault: &Address,
    amount: TokenAmount,
) -> Result<()> {
    token.mint(player, amount)?;
    token.approve(player, vault, amount);
    Ok(())
}
