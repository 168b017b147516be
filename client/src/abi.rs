//! Instruction encoding and account specs
//!
//! Wire format: one tag byte identifying the instruction, followed by the
//! little-endian, fixed-order concatenation of its arguments — integers at
//! declared width, pubkeys at 32 bytes, no padding, no length prefixes.
//! Each instruction also carries a constant ordered account spec; callers
//! supply pubkeys 1:1 in that order via [`build_account_metas`].
//!
//! Encoders accept already-typed values and perform no semantic validation;
//! numeric-string parsing and range checks belong to the caller.

use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::error::{ClientError, Result};

// Instruction tags, shared with the program dispatcher.
pub const TAG_INIT_USER: u8 = 1;
pub const TAG_INIT_LP: u8 = 2;
pub const TAG_DEPOSIT_COLLATERAL: u8 = 3;
pub const TAG_WITHDRAW_COLLATERAL: u8 = 4;
pub const TAG_KEEPER_CRANK: u8 = 5;
pub const TAG_TRADE_NO_CPI: u8 = 6;
pub const TAG_LIQUIDATE_AT_ORACLE: u8 = 7;
pub const TAG_CLOSE_ACCOUNT: u8 = 8;
pub const TAG_TOP_UP_INSURANCE: u8 = 9;
pub const TAG_SET_RISK_THRESHOLD: u8 = 11;
pub const TAG_UPDATE_ADMIN: u8 = 12;
pub const TAG_UPDATE_CONFIG: u8 = 14;
pub const TAG_SET_MAINTENANCE_FEE: u8 = 15;
pub const TAG_SET_ORACLE_AUTHORITY: u8 = 16;
pub const TAG_PUSH_ORACLE_PRICE: u8 = 17;
pub const TAG_SET_ORACLE_PRICE_CAP: u8 = 18;
pub const TAG_RESOLVE_MARKET: u8 = 19;
pub const TAG_WITHDRAW_INSURANCE: u8 = 20;

/// Sentinel `caller_idx` for a permissionless crank (no caller account).
pub const CRANK_NO_CALLER: u16 = u16::MAX;

/// Well-known program and sysvar addresses used in account lists.
pub mod well_known {
    use solana_sdk::pubkey;
    use solana_sdk::pubkey::Pubkey;

    pub const TOKEN_PROGRAM: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
    pub const CLOCK_SYSVAR: Pubkey = pubkey!("SysvarC1ock11111111111111111111111111111111");
    pub const RENT_SYSVAR: Pubkey = pubkey!("SysvarRent111111111111111111111111111111111");
    pub const SYSTEM_PROGRAM: Pubkey = pubkey!("11111111111111111111111111111111");
}

// ---------------------------------------------------------------------------
// Argument structs and encoders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitUserArgs {
    pub fee_payment: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitLpArgs {
    pub matcher_program: Pubkey,
    pub matcher_context: Pubkey,
    pub fee_payment: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositCollateralArgs {
    pub user_idx: u16,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawCollateralArgs {
    pub user_idx: u16,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeeperCrankArgs {
    pub caller_idx: u16,
    pub allow_panic: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeNoCpiArgs {
    pub lp_idx: u16,
    pub user_idx: u16,
    pub size: i128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidateAtOracleArgs {
    pub target_idx: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseAccountArgs {
    pub user_idx: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopUpInsuranceArgs {
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetRiskThresholdArgs {
    pub new_threshold: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateAdminArgs {
    pub new_admin: Pubkey,
}

/// Funding + threshold control parameters, in config order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateConfigArgs {
    pub funding_horizon_slots: u64,
    pub funding_k_bps: u64,
    pub funding_inv_scale_notional_e6: u128,
    pub funding_max_premium_bps: i64,
    pub funding_max_bps_per_slot: i64,
    pub thresh_floor: u128,
    pub thresh_risk_bps: u64,
    pub thresh_update_interval_slots: u64,
    pub thresh_step_bps: u64,
    pub thresh_alpha_bps: u64,
    pub thresh_min: u128,
    pub thresh_max: u128,
    pub thresh_min_step: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetMaintenanceFeeArgs {
    pub new_fee: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOracleAuthorityArgs {
    pub new_authority: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOraclePriceArgs {
    pub price_e6: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOraclePriceCapArgs {
    /// In 0.01 bps units (1_000_000 = 100%). 0 = disabled.
    pub max_change_e2bps: u64,
}

/// Instruction data writer with sequential little-endian appends.
struct IxWriter {
    data: Vec<u8>,
}

impl IxWriter {
    fn new(tag: u8) -> Self {
        Self { data: vec![tag] }
    }

    fn u8(mut self, v: u8) -> Self {
        self.data.push(v);
        self
    }

    fn u16(mut self, v: u16) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u64(mut self, v: u64) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i64(mut self, v: i64) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u128(mut self, v: u128) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i128(mut self, v: i128) -> Self {
        self.data.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn key(mut self, k: &Pubkey) -> Self {
        self.data.extend_from_slice(k.as_ref());
        self
    }
}

pub fn encode_init_user(args: &InitUserArgs) -> Vec<u8> {
    IxWriter::new(TAG_INIT_USER).u64(args.fee_payment).data
}

pub fn encode_init_lp(args: &InitLpArgs) -> Vec<u8> {
    IxWriter::new(TAG_INIT_LP)
        .key(&args.matcher_program)
        .key(&args.matcher_context)
        .u64(args.fee_payment)
        .data
}

pub fn encode_deposit_collateral(args: &DepositCollateralArgs) -> Vec<u8> {
    IxWriter::new(TAG_DEPOSIT_COLLATERAL)
        .u16(args.user_idx)
        .u64(args.amount)
        .data
}

pub fn encode_withdraw_collateral(args: &WithdrawCollateralArgs) -> Vec<u8> {
    IxWriter::new(TAG_WITHDRAW_COLLATERAL)
        .u16(args.user_idx)
        .u64(args.amount)
        .data
}

pub fn encode_keeper_crank(args: &KeeperCrankArgs) -> Vec<u8> {
    IxWriter::new(TAG_KEEPER_CRANK)
        .u16(args.caller_idx)
        .u8(args.allow_panic)
        .data
}

pub fn encode_trade_no_cpi(args: &TradeNoCpiArgs) -> Vec<u8> {
    IxWriter::new(TAG_TRADE_NO_CPI)
        .u16(args.lp_idx)
        .u16(args.user_idx)
        .i128(args.size)
        .data
}

pub fn encode_liquidate_at_oracle(args: &LiquidateAtOracleArgs) -> Vec<u8> {
    IxWriter::new(TAG_LIQUIDATE_AT_ORACLE)
        .u16(args.target_idx)
        .data
}

pub fn encode_close_account(args: &CloseAccountArgs) -> Vec<u8> {
    IxWriter::new(TAG_CLOSE_ACCOUNT).u16(args.user_idx).data
}

pub fn encode_top_up_insurance(args: &TopUpInsuranceArgs) -> Vec<u8> {
    IxWriter::new(TAG_TOP_UP_INSURANCE).u64(args.amount).data
}

pub fn encode_set_risk_threshold(args: &SetRiskThresholdArgs) -> Vec<u8> {
    IxWriter::new(TAG_SET_RISK_THRESHOLD)
        .u128(args.new_threshold)
        .data
}

pub fn encode_update_admin(args: &UpdateAdminArgs) -> Vec<u8> {
    IxWriter::new(TAG_UPDATE_ADMIN).key(&args.new_admin).data
}

pub fn encode_update_config(args: &UpdateConfigArgs) -> Vec<u8> {
    IxWriter::new(TAG_UPDATE_CONFIG)
        .u64(args.funding_horizon_slots)
        .u64(args.funding_k_bps)
        .u128(args.funding_inv_scale_notional_e6)
        .i64(args.funding_max_premium_bps)
        .i64(args.funding_max_bps_per_slot)
        .u128(args.thresh_floor)
        .u64(args.thresh_risk_bps)
        .u64(args.thresh_update_interval_slots)
        .u64(args.thresh_step_bps)
        .u64(args.thresh_alpha_bps)
        .u128(args.thresh_min)
        .u128(args.thresh_max)
        .u128(args.thresh_min_step)
        .data
}

pub fn encode_set_maintenance_fee(args: &SetMaintenanceFeeArgs) -> Vec<u8> {
    IxWriter::new(TAG_SET_MAINTENANCE_FEE)
        .u128(args.new_fee)
        .data
}

pub fn encode_set_oracle_authority(args: &SetOracleAuthorityArgs) -> Vec<u8> {
    IxWriter::new(TAG_SET_ORACLE_AUTHORITY)
        .key(&args.new_authority)
        .data
}

pub fn encode_push_oracle_price(args: &PushOraclePriceArgs) -> Vec<u8> {
    IxWriter::new(TAG_PUSH_ORACLE_PRICE)
        .u64(args.price_e6)
        .i64(args.timestamp)
        .data
}

pub fn encode_set_oracle_price_cap(args: &SetOraclePriceCapArgs) -> Vec<u8> {
    IxWriter::new(TAG_SET_ORACLE_PRICE_CAP)
        .u64(args.max_change_e2bps)
        .data
}

pub fn encode_resolve_market() -> Vec<u8> {
    IxWriter::new(TAG_RESOLVE_MARKET).data
}

pub fn encode_withdraw_insurance() -> Vec<u8> {
    IxWriter::new(TAG_WITHDRAW_INSURANCE).data
}

// ---------------------------------------------------------------------------
// Account specs
// ---------------------------------------------------------------------------

/// One position in an instruction's ordered account list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountRole {
    pub name: &'static str,
    pub signer: bool,
    pub writable: bool,
}

const fn role(name: &'static str, signer: bool, writable: bool) -> AccountRole {
    AccountRole {
        name,
        signer,
        writable,
    }
}

const ADMIN_SLAB: &[AccountRole] = &[role("admin", true, false), role("slab", false, true)];

pub const ACCOUNTS_INIT_USER: &[AccountRole] = &[
    role("user", true, false),
    role("slab", false, true),
    role("user_ata", false, true),
    role("vault", false, true),
    role("token_program", false, false),
];

pub const ACCOUNTS_INIT_LP: &[AccountRole] = &[
    role("user", true, false),
    role("slab", false, true),
    role("user_ata", false, true),
    role("vault", false, true),
    role("token_program", false, false),
];

pub const ACCOUNTS_DEPOSIT_COLLATERAL: &[AccountRole] = &[
    role("user", true, false),
    role("slab", false, true),
    role("user_ata", false, true),
    role("vault", false, true),
    role("token_program", false, false),
    role("clock", false, false),
];

pub const ACCOUNTS_WITHDRAW_COLLATERAL: &[AccountRole] = &[
    role("user", true, false),
    role("slab", false, true),
    role("vault", false, true),
    role("user_ata", false, true),
    role("vault_authority", false, false),
    role("token_program", false, false),
    role("clock", false, false),
    role("oracle", false, false),
];

pub const ACCOUNTS_KEEPER_CRANK: &[AccountRole] = &[
    role("caller", true, false),
    role("slab", false, true),
    role("clock", false, false),
    role("oracle", false, false),
];

pub const ACCOUNTS_TRADE_NOCPI: &[AccountRole] = &[
    role("user", true, false),
    role("lp", true, false),
    role("slab", false, true),
    role("clock", false, false),
    role("oracle", false, false),
];

pub const ACCOUNTS_LIQUIDATE_AT_ORACLE: &[AccountRole] = &[
    role("caller", true, false),
    role("slab", false, true),
    role("clock", false, false),
    role("oracle", false, false),
];

pub const ACCOUNTS_CLOSE_ACCOUNT: &[AccountRole] = &[
    role("user", true, false),
    role("slab", false, true),
    role("vault", false, true),
    role("user_ata", false, true),
    role("vault_authority", false, false),
    role("token_program", false, false),
    role("clock", false, false),
    role("oracle", false, false),
];

pub const ACCOUNTS_TOPUP_INSURANCE: &[AccountRole] = &[
    role("user", true, false),
    role("slab", false, true),
    role("user_ata", false, true),
    role("vault", false, true),
    role("token_program", false, false),
];

pub const ACCOUNTS_SET_RISK_THRESHOLD: &[AccountRole] = ADMIN_SLAB;
pub const ACCOUNTS_UPDATE_ADMIN: &[AccountRole] = ADMIN_SLAB;
pub const ACCOUNTS_UPDATE_CONFIG: &[AccountRole] = ADMIN_SLAB;
pub const ACCOUNTS_SET_MAINTENANCE_FEE: &[AccountRole] = ADMIN_SLAB;
pub const ACCOUNTS_SET_ORACLE_AUTHORITY: &[AccountRole] = ADMIN_SLAB;
pub const ACCOUNTS_SET_ORACLE_PRICE_CAP: &[AccountRole] = ADMIN_SLAB;
pub const ACCOUNTS_RESOLVE_MARKET: &[AccountRole] = ADMIN_SLAB;

pub const ACCOUNTS_PUSH_ORACLE_PRICE: &[AccountRole] =
    &[role("authority", true, false), role("slab", false, true)];

pub const ACCOUNTS_WITHDRAW_INSURANCE: &[AccountRole] = &[
    role("admin", true, false),
    role("slab", false, true),
    role("admin_ata", false, true),
    role("vault", false, true),
    role("token_program", false, false),
    role("vault_authority", false, false),
];

/// Pair supplied pubkeys with an instruction's account spec, in order.
///
/// A length mismatch is a [`ClientError::MalformedInstruction`], raised
/// before any network call.
pub fn build_account_metas(spec: &[AccountRole], keys: &[Pubkey]) -> Result<Vec<AccountMeta>> {
    if keys.len() != spec.len() {
        return Err(ClientError::MalformedInstruction {
            expected: spec.len(),
            got: keys.len(),
        });
    }
    Ok(spec
        .iter()
        .zip(keys)
        .map(|(r, key)| {
            if r.writable {
                AccountMeta::new(*key, r.signer)
            } else {
                AccountMeta::new_readonly(*key, r.signer)
            }
        })
        .collect())
}

/// Assemble a ready-to-submit instruction from encoded data and metas.
pub fn build_instruction(
    program_id: &Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}
