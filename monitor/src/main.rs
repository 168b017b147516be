//! Percolator Liquidation Monitor
//!
//! Off-chain service that polls a market slab, ranks every open account by
//! margin ratio, and optionally submits liquidations for accounts below
//! the maintenance margin.

mod config;
mod risk_queue;

use anyhow::{Context, Result};
use config::Config;
use percolator_client::abi::{self, well_known, LiquidateAtOracleArgs};
use percolator_client::health::compute_health;
use percolator_client::slab;
use percolator_client::tx::{
    classify_send_error, submit_instruction, SubmitOptions, TransactionSender,
};
use percolator_client::units;
use risk_queue::{AccountRisk, RiskQueue};
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    message::Message,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::time::Duration;
use tokio::time;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Percolator Liquidation Monitor");

    // Load configuration
    let config = Config::load().unwrap_or_else(|_| {
        log::warn!("Failed to load config, using default devnet config");
        Config::default_devnet()
    });

    log::info!("Connected to RPC: {}", config.rpc_url);
    log::info!("Monitoring slab: {}", config.slab);

    // Initialize RPC client
    let client =
        RpcClient::new_with_commitment(config.rpc_url.clone(), CommitmentConfig::confirmed());

    // Load monitor wallet
    let wallet = load_keypair(&config.keypair_path)?;
    log::info!("Monitor wallet: {}", wallet.pubkey());

    // Initialize risk queue
    let mut queue = RiskQueue::new();

    log::info!(
        "Monitor started. Liquidation {}",
        if config.liquidation_enabled {
            "enabled"
        } else {
            "disabled (observe only)"
        }
    );

    // Main event loop
    let mut interval = time::interval(Duration::from_secs(config.poll_interval_secs));

    loop {
        interval.tick().await;

        if let Err(e) = run_cycle(&mut queue, &client, &config, &wallet).await {
            log::error!("Poll cycle failed: {}", e);
        }
    }
}

/// One poll cycle: snapshot the slab, recompute every account's margin
/// ratio, then work the liquidatable set.
async fn run_cycle(
    queue: &mut RiskQueue,
    client: &RpcClient,
    config: &Config,
    wallet: &Keypair,
) -> Result<()> {
    let data = client
        .get_account_data(&config.slab)
        .context("Failed to fetch slab account")?;

    // A short buffer means the account is mid-write or not yet
    // initialized; skip the cycle and re-fetch.
    let market = match slab::decode(&data) {
        Ok(market) => market,
        Err(e) => {
            log::warn!("Slab snapshot not decodable, skipping cycle: {}", e);
            return Ok(());
        }
    };

    if market.header.resolved {
        log::info!("Market is resolved; nothing to monitor");
        return Ok(());
    }

    let mark_price_e6 = mark_price(&market.config);
    if mark_price_e6 == 0 {
        log::warn!("No usable mark price yet");
        return Ok(());
    }

    log::debug!(
        "mark {} | funding 8h {} | open interest {}",
        units::format_e6(mark_price_e6 as i128),
        units::funding_rate_8h_percent(market.engine.funding_rate_bps_per_slot_last as i128),
        market.engine.total_open_interest,
    );

    // Snapshot semantics: slot indices are reused once vacated, so the
    // queue is rebuilt from scratch rather than patched across polls.
    queue.clear();
    let maint = market.params.maintenance_margin_bps;
    for (idx, account) in market.accounts.iter_used() {
        let health = compute_health(account, mark_price_e6, config.mark_decimals, maint);
        queue.push(AccountRisk {
            idx,
            owner: account.owner,
            health,
            position_size: account.position_size,
            capital: account.capital,
        });
    }

    log::debug!("Tracking {} open accounts", queue.len());
    for risk in queue.at_risk() {
        log::info!(
            "[{}] account {} owner {} margin {} position {}",
            risk.health.risk_level.as_str(),
            risk.idx,
            risk.owner,
            units::bps_to_percent(risk.health.margin_ratio_bps as i128),
            risk.position_size,
        );
    }

    if config.liquidation_enabled {
        process_liquidations(queue, client, config, wallet)?;
    }

    Ok(())
}

/// Select the mark price: last effective trade price when one exists,
/// otherwise the authority-pushed price.
fn mark_price(config: &slab::MarketConfig) -> u64 {
    if config.last_effective_price_e6 > 0 {
        config.last_effective_price_e6
    } else {
        config.authority_price_e6.max(0) as u64
    }
}

/// Submit liquidations for the worst accounts in the queue
fn process_liquidations(
    queue: &mut RiskQueue,
    client: &RpcClient,
    config: &Config,
    wallet: &Keypair,
) -> Result<()> {
    let liquidatable = queue.liquidatable();

    if liquidatable.is_empty() {
        log::debug!("No accounts need liquidation");
        return Ok(());
    }

    log::info!("Found {} liquidatable accounts", liquidatable.len());

    for risk in liquidatable.iter().take(config.max_liquidations_per_cycle) {
        log::info!(
            "Liquidating account {} (margin {})",
            risk.idx,
            units::bps_to_percent(risk.health.margin_ratio_bps as i128),
        );

        match execute_liquidation(client, config, wallet, risk.idx) {
            Ok(signature) => {
                log::info!("Liquidation submitted: {}", signature);
                queue.remove(risk.idx);
            }
            Err(e) => {
                // Expired means unknown outcome; the next snapshot shows
                // whether the position is still open.
                log::error!("Failed to liquidate account {}: {}", risk.idx, e);
            }
        }
    }

    Ok(())
}

/// Build, sign, submit, and confirm one LiquidateAtOracle instruction
fn execute_liquidation(
    client: &RpcClient,
    config: &Config,
    wallet: &Keypair,
    target_idx: u16,
) -> Result<Signature> {
    let data = abi::encode_liquidate_at_oracle(&LiquidateAtOracleArgs { target_idx });
    let keys = [
        wallet.pubkey(),
        config.slab,
        well_known::CLOCK_SYSVAR,
        config.oracle,
    ];
    let metas = abi::build_account_metas(abi::ACCOUNTS_LIQUIDATE_AT_ORACLE, &keys)?;
    let instruction = abi::build_instruction(&config.program_id, metas, data);

    let sender = WalletSender { client, wallet };
    let signature = submit_instruction(
        client,
        &sender,
        &wallet.pubkey(),
        &[],
        instruction,
        &SubmitOptions::default(),
    )?;
    Ok(signature)
}

/// Signs with the local wallet and broadcasts over the shared RPC client
struct WalletSender<'a> {
    client: &'a RpcClient,
    wallet: &'a Keypair,
}

impl TransactionSender for WalletSender<'_> {
    fn sign_and_send(&self, message: Message) -> percolator_client::Result<Signature> {
        let blockhash = message.recent_blockhash;
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(&[self.wallet], blockhash)
            .map_err(|e| percolator_client::ClientError::SubmissionRejected {
                message: format!("signing failed: {}", e),
            })?;
        self.client
            .send_transaction(&tx)
            .map_err(classify_send_error)
    }
}

/// Load wallet keypair from file
fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded_path = shellexpand::tilde(path);
    let bytes = std::fs::read(expanded_path.as_ref())
        .context(format!("Failed to read keypair from {}", path))?;

    let keypair = if bytes.first() == Some(&b'[') {
        // JSON format
        let json_data: Vec<u8> =
            serde_json::from_slice(&bytes).context("Failed to parse keypair JSON")?;
        Keypair::try_from(&json_data[..]).context("Failed to create keypair from bytes")?
    } else {
        // Binary format
        Keypair::try_from(&bytes[..]).context("Failed to create keypair from bytes")?
    };

    Ok(keypair)
}
