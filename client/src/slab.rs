//! Slab account decoding
//!
//! The slab is a single on-chain account whose byte contents hold a
//! market's entire packed state: header, market config, engine state, risk
//! params, and the account table. The offsets below are a versioned wire
//! contract with the program (layout v1) — fixed, little-endian, and never
//! inferred dynamically. Pubkeys are opaque 32-byte values.
//!
//! Decoding performs length/bounds checks only. Value-level validation is
//! the program's responsibility, not this layer's. Every view is built from
//! an immutable buffer snapshot; a new snapshot is always decoded fresh.

use solana_sdk::pubkey::Pubkey;

use crate::error::{ClientError, Result};

/// "PERCOLAT"
pub const MAGIC: u64 = 0x5045_5243_4f4c_4154;
pub const LAYOUT_VERSION: u32 = 1;

pub const HEADER_OFF: usize = 0;
pub const HEADER_LEN: usize = 48;
pub const CONFIG_OFF: usize = 48;
pub const CONFIG_LEN: usize = 272;
pub const ENGINE_OFF: usize = 320;
pub const ENGINE_LEN: usize = 88;
pub const PARAMS_OFF: usize = 408;
pub const PARAMS_LEN: usize = 144;
/// Start of the used-index bitmap; account records follow it.
pub const ACCOUNTS_OFF: usize = 552;
pub const ACCOUNT_RECORD_LEN: usize = 160;

/// Header flags byte (absolute offset 13), bit 0 = resolved.
const FLAGS_OFF: usize = 13;
const FLAG_RESOLVED: u8 = 1;

/// Market header. Written once at market creation; `resolved` flips
/// false→true exactly once and never reverts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabHeader {
    pub magic: u64,
    pub version: u32,
    pub bump: u8,
    pub resolved: bool,
    pub admin: Pubkey,
}

/// Funding-rate control parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingParams {
    pub horizon_slots: u64,
    pub k_bps: u64,
    pub inv_scale_notional_e6: u128,
    pub max_premium_bps: i64,
    pub max_bps_per_slot: i64,
}

/// Risk-reduction threshold control-loop parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdParams {
    pub floor: u128,
    pub risk_bps: u64,
    pub update_interval_slots: u64,
    pub step_bps: u64,
    pub alpha_bps: u64,
    pub min: u128,
    pub max: u128,
    pub min_step: u128,
}

/// Market configuration. Immutable until changed by the admin.
///
/// `oracle_authority` all-zero means the authority oracle is disabled.
/// `oracle_price_cap_e2bps == 0` means uncapped; the raw value is exposed
/// unmodified and the zero-as-sentinel interpretation is left to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
    pub collateral_mint: Pubkey,
    pub vault_pubkey: Pubkey,
    pub invert: bool,
    pub unit_scale: u32,
    pub oracle_authority: Pubkey,
    pub authority_price_e6: i64,
    pub oracle_price_cap_e2bps: u64,
    pub last_effective_price_e6: u64,
    pub funding: FundingParams,
    pub thresh: ThresholdParams,
}

/// Insurance fund balances, in native units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsuranceFund {
    pub balance: u128,
    pub fee_revenue: u128,
}

/// Mutable runtime state. Written only by the program; read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
    pub vault: u128,
    pub insurance_fund: InsuranceFund,
    pub total_open_interest: u128,
    pub num_used_accounts: u64,
    pub last_crank_slot: u64,
    pub funding_rate_bps_per_slot_last: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParams {
    pub maintenance_margin_bps: u64,
    pub initial_margin_bps: u64,
    pub trading_fee_bps: u64,
    pub liquidation_fee_bps: u64,
    pub liquidation_buffer_bps: u64,
    pub liquidation_fee_cap: u128,
    pub min_liquidation_abs: u128,
    pub max_accounts: u64,
    pub new_account_fee: u128,
    pub risk_reduction_threshold: u128,
    pub maintenance_fee_per_slot: u128,
    pub max_crank_staleness_slots: u64,
    pub warmup_period_slots: u64,
}

/// Account kind. LP accounts reference an external pricing-strategy
/// ("matcher") program and context account; user accounts do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountKind {
    User,
    Lp {
        matcher_program: Pubkey,
        matcher_context: Pubkey,
    },
}

/// One slot in the account table. Slots are reused by index once vacated;
/// always re-read by index rather than caching identity across polls.
///
/// `position_size == 0` means `entry_price_e6` and `pnl` are not meaningful
/// for margin purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub kind: AccountKind,
    pub owner: Pubkey,
    pub capital: u128,
    pub position_size: i128,
    pub entry_price_e6: u64,
    pub pnl: i128,
}

/// The fixed-capacity account table: a used-index bitmap followed by
/// `max_accounts` fixed-size records. Capacity is a protocol constant, so
/// the table never grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountsTable {
    capacity: u64,
    slots: Vec<Option<Account>>,
}

impl AccountsTable {
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The account at `idx`, or `None` if the slot is vacant or out of range.
    pub fn get(&self, idx: u16) -> Option<&Account> {
        self.slots.get(idx as usize).and_then(|s| s.as_ref())
    }

    /// Occupied slots, in index order.
    pub fn iter_used(&self) -> impl Iterator<Item = (u16, &Account)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|a| (i as u16, a)))
    }

    pub fn num_used(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// All five typed views over one slab snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    pub header: SlabHeader,
    pub config: MarketConfig,
    pub engine: EngineState,
    pub params: RiskParams,
    pub accounts: AccountsTable,
}

impl Slab {
    /// Convenience lookup mirroring [`AccountsTable::get`].
    pub fn account(&self, idx: u16) -> Option<&Account> {
        self.accounts.get(idx)
    }
}

// ---------------------------------------------------------------------------
// Field readers. Callers bounds-check the enclosing region once; these then
// read at fixed relative offsets, so the slice indexing cannot fail.
// ---------------------------------------------------------------------------

fn region<'a>(data: &'a [u8], off: usize, len: usize, reason: &'static str) -> Result<&'a [u8]> {
    if data.len() < off + len {
        return Err(ClientError::MalformedSlab { reason });
    }
    Ok(&data[off..off + len])
}

fn le_u32(r: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(r[off..off + 4].try_into().unwrap())
}

fn le_u64(r: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(r[off..off + 8].try_into().unwrap())
}

fn le_i64(r: &[u8], off: usize) -> i64 {
    i64::from_le_bytes(r[off..off + 8].try_into().unwrap())
}

fn le_u128(r: &[u8], off: usize) -> u128 {
    u128::from_le_bytes(r[off..off + 16].try_into().unwrap())
}

fn le_i128(r: &[u8], off: usize) -> i128 {
    i128::from_le_bytes(r[off..off + 16].try_into().unwrap())
}

fn key32(r: &[u8], off: usize) -> Pubkey {
    Pubkey::new_from_array(r[off..off + 32].try_into().unwrap())
}

// ---------------------------------------------------------------------------
// Region decoders
// ---------------------------------------------------------------------------

pub fn decode_header(data: &[u8]) -> Result<SlabHeader> {
    let r = region(data, HEADER_OFF, HEADER_LEN, "buffer shorter than header")?;
    Ok(SlabHeader {
        magic: le_u64(r, 0),
        version: le_u32(r, 8),
        bump: r[12],
        resolved: r[FLAGS_OFF] & FLAG_RESOLVED != 0,
        admin: key32(r, 16),
    })
}

pub fn decode_config(data: &[u8]) -> Result<MarketConfig> {
    let r = region(data, CONFIG_OFF, CONFIG_LEN, "buffer shorter than config")?;
    Ok(MarketConfig {
        collateral_mint: key32(r, 0),
        vault_pubkey: key32(r, 32),
        invert: r[64] != 0,
        unit_scale: le_u32(r, 68),
        oracle_authority: key32(r, 72),
        authority_price_e6: le_i64(r, 104),
        oracle_price_cap_e2bps: le_u64(r, 112),
        last_effective_price_e6: le_u64(r, 120),
        funding: FundingParams {
            horizon_slots: le_u64(r, 128),
            k_bps: le_u64(r, 136),
            inv_scale_notional_e6: le_u128(r, 144),
            max_premium_bps: le_i64(r, 160),
            max_bps_per_slot: le_i64(r, 168),
        },
        thresh: ThresholdParams {
            floor: le_u128(r, 176),
            risk_bps: le_u64(r, 192),
            update_interval_slots: le_u64(r, 200),
            step_bps: le_u64(r, 208),
            alpha_bps: le_u64(r, 216),
            min: le_u128(r, 224),
            max: le_u128(r, 240),
            min_step: le_u128(r, 256),
        },
    })
}

pub fn decode_engine(data: &[u8]) -> Result<EngineState> {
    let r = region(data, ENGINE_OFF, ENGINE_LEN, "buffer shorter than engine")?;
    Ok(EngineState {
        vault: le_u128(r, 0),
        insurance_fund: InsuranceFund {
            balance: le_u128(r, 16),
            fee_revenue: le_u128(r, 32),
        },
        total_open_interest: le_u128(r, 48),
        num_used_accounts: le_u64(r, 64),
        last_crank_slot: le_u64(r, 72),
        funding_rate_bps_per_slot_last: le_i64(r, 80),
    })
}

pub fn decode_params(data: &[u8]) -> Result<RiskParams> {
    let r = region(data, PARAMS_OFF, PARAMS_LEN, "buffer shorter than params")?;
    Ok(RiskParams {
        maintenance_margin_bps: le_u64(r, 0),
        initial_margin_bps: le_u64(r, 8),
        trading_fee_bps: le_u64(r, 16),
        liquidation_fee_bps: le_u64(r, 24),
        liquidation_buffer_bps: le_u64(r, 32),
        liquidation_fee_cap: le_u128(r, 40),
        min_liquidation_abs: le_u128(r, 56),
        max_accounts: le_u64(r, 72),
        new_account_fee: le_u128(r, 80),
        risk_reduction_threshold: le_u128(r, 96),
        maintenance_fee_per_slot: le_u128(r, 112),
        max_crank_staleness_slots: le_u64(r, 128),
        warmup_period_slots: le_u64(r, 136),
    })
}

// ---------------------------------------------------------------------------
// Account table
// ---------------------------------------------------------------------------

/// Geometry of the account table region for a given capacity.
struct TableShape {
    capacity: usize,
    bitmap_len: usize,
    records_off: usize,
}

fn table_shape(data: &[u8]) -> Result<TableShape> {
    let params = decode_params(data)?;
    // Index type on the wire is u16, so capacity above that is nonsense.
    if params.max_accounts > u16::MAX as u64 + 1 {
        return Err(ClientError::MalformedSlab {
            reason: "max_accounts exceeds index range",
        });
    }
    let capacity = params.max_accounts as usize;
    let bitmap_len = capacity.div_ceil(8);
    let records_off = ACCOUNTS_OFF + bitmap_len;
    let need = records_off + capacity * ACCOUNT_RECORD_LEN;
    if data.len() < need {
        return Err(ClientError::MalformedSlab {
            reason: "accounts table inconsistent with max_accounts",
        });
    }
    Ok(TableShape {
        capacity,
        bitmap_len,
        records_off,
    })
}

fn bit_set(bitmap: &[u8], idx: usize) -> bool {
    bitmap[idx / 8] >> (idx % 8) & 1 != 0
}

fn decode_record(data: &[u8], off: usize) -> Result<Account> {
    let r = &data[off..off + ACCOUNT_RECORD_LEN];
    let kind = match r[0] {
        0 => AccountKind::User,
        1 => AccountKind::Lp {
            matcher_program: key32(r, 96),
            matcher_context: key32(r, 128),
        },
        _ => {
            return Err(ClientError::MalformedSlab {
                reason: "unknown account kind",
            })
        }
    };
    Ok(Account {
        kind,
        owner: key32(r, 8),
        capital: le_u128(r, 40),
        position_size: le_i128(r, 56),
        entry_price_e6: le_u64(r, 72),
        pnl: le_i128(r, 80),
    })
}

/// Occupied slot indices only, without materializing any record. Cost is
/// proportional to capacity/8 bytes of bitmap, not to record decoding.
pub fn decode_used_indices(data: &[u8]) -> Result<Vec<u16>> {
    let shape = table_shape(data)?;
    let bitmap = &data[ACCOUNTS_OFF..ACCOUNTS_OFF + shape.bitmap_len];
    Ok((0..shape.capacity)
        .filter(|&i| bit_set(bitmap, i))
        .map(|i| i as u16)
        .collect())
}

/// Decode exactly one record. `Ok(None)` for a vacant slot; `MalformedSlab`
/// if `idx` is outside the table.
pub fn decode_account(data: &[u8], idx: u16) -> Result<Option<Account>> {
    let shape = table_shape(data)?;
    if idx as usize >= shape.capacity {
        return Err(ClientError::MalformedSlab {
            reason: "account index out of range",
        });
    }
    let bitmap = &data[ACCOUNTS_OFF..ACCOUNTS_OFF + shape.bitmap_len];
    if !bit_set(bitmap, idx as usize) {
        return Ok(None);
    }
    let off = shape.records_off + idx as usize * ACCOUNT_RECORD_LEN;
    decode_record(data, off).map(Some)
}

/// Decode the full snapshot: all five typed views.
pub fn decode(data: &[u8]) -> Result<Slab> {
    let header = decode_header(data)?;
    let config = decode_config(data)?;
    let engine = decode_engine(data)?;
    let params = decode_params(data)?;
    let shape = table_shape(data)?;

    let bitmap = &data[ACCOUNTS_OFF..ACCOUNTS_OFF + shape.bitmap_len];
    let mut slots = Vec::with_capacity(shape.capacity);
    for i in 0..shape.capacity {
        if bit_set(bitmap, i) {
            let off = shape.records_off + i * ACCOUNT_RECORD_LEN;
            slots.push(Some(decode_record(data, off)?));
        } else {
            slots.push(None);
        }
    }

    Ok(Slab {
        header,
        config,
        engine,
        params,
        accounts: AccountsTable {
            capacity: params.max_accounts,
            slots,
        },
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Test-side slab encoding at the documented offsets.

    use super::*;

    pub struct SlabWriter {
        pub data: Vec<u8>,
    }

    impl SlabWriter {
        pub fn new(max_accounts: u64) -> Self {
            let bitmap_len = (max_accounts as usize).div_ceil(8);
            let len = ACCOUNTS_OFF + bitmap_len + max_accounts as usize * ACCOUNT_RECORD_LEN;
            let mut w = Self {
                data: vec![0u8; len],
            };
            w.put_u64(0, MAGIC);
            w.put_u32(8, LAYOUT_VERSION);
            w.put_u64(PARAMS_OFF + 72, max_accounts);
            w
        }

        pub fn put_u8(&mut self, off: usize, v: u8) {
            self.data[off] = v;
        }

        pub fn put_u32(&mut self, off: usize, v: u32) {
            self.data[off..off + 4].copy_from_slice(&v.to_le_bytes());
        }

        pub fn put_u64(&mut self, off: usize, v: u64) {
            self.data[off..off + 8].copy_from_slice(&v.to_le_bytes());
        }

        pub fn put_i64(&mut self, off: usize, v: i64) {
            self.data[off..off + 8].copy_from_slice(&v.to_le_bytes());
        }

        pub fn put_u128(&mut self, off: usize, v: u128) {
            self.data[off..off + 16].copy_from_slice(&v.to_le_bytes());
        }

        pub fn put_i128(&mut self, off: usize, v: i128) {
            self.data[off..off + 16].copy_from_slice(&v.to_le_bytes());
        }

        pub fn put_key(&mut self, off: usize, k: &Pubkey) {
            self.data[off..off + 32].copy_from_slice(k.as_ref());
        }

        fn max_accounts(&self) -> usize {
            le_u64(&self.data[PARAMS_OFF..PARAMS_OFF + PARAMS_LEN], 72) as usize
        }

        fn records_off(&self) -> usize {
            ACCOUNTS_OFF + self.max_accounts().div_ceil(8)
        }

        pub fn mark_used(&mut self, idx: usize) {
            self.data[ACCOUNTS_OFF + idx / 8] |= 1 << (idx % 8);
        }

        /// Write one account record and mark its slot used.
        pub fn put_account(&mut self, idx: usize, account: &Account) {
            self.mark_used(idx);
            let off = self.records_off() + idx * ACCOUNT_RECORD_LEN;
            match &account.kind {
                AccountKind::User => self.put_u8(off, 0),
                AccountKind::Lp {
                    matcher_program,
                    matcher_context,
                } => {
                    self.put_u8(off, 1);
                    let (p, c) = (*matcher_program, *matcher_context);
                    self.put_key(off + 96, &p);
                    self.put_key(off + 128, &c);
                }
            }
            let owner = account.owner;
            self.put_key(off + 8, &owner);
            self.put_u128(off + 40, account.capital);
            self.put_i128(off + 56, account.position_size);
            self.put_u64(off + 72, account.entry_price_e6);
            self.put_i128(off + 80, account.pnl);
        }
    }

    /// A fully-populated fixture with distinct values in every field, one
    /// User account at slot 0 and one LP account at slot 5.
    pub fn sample_slab() -> (SlabWriter, Slab) {
        let admin = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let vault = Pubkey::new_unique();
        let oracle_auth = Pubkey::new_unique();
        let user_owner = Pubkey::new_unique();
        let lp_owner = Pubkey::new_unique();
        let matcher_prog = Pubkey::new_unique();
        let matcher_ctx = Pubkey::new_unique();

        let mut w = SlabWriter::new(16);

        // Header
        w.put_u8(12, 254);
        w.put_u8(13, 1); // resolved
        w.put_key(16, &admin);

        // Config
        w.put_key(CONFIG_OFF, &mint);
        w.put_key(CONFIG_OFF + 32, &vault);
        w.put_u8(CONFIG_OFF + 64, 1);
        w.put_u32(CONFIG_OFF + 68, 1_000);
        w.put_key(CONFIG_OFF + 72, &oracle_auth);
        w.put_i64(CONFIG_OFF + 104, 150_000_000);
        w.put_u64(CONFIG_OFF + 112, 10_000);
        w.put_u64(CONFIG_OFF + 120, 149_500_000);
        w.put_u64(CONFIG_OFF + 128, 500);
        w.put_u64(CONFIG_OFF + 136, 100);
        w.put_u128(CONFIG_OFF + 144, 1_000_000_000_000);
        w.put_i64(CONFIG_OFF + 160, 500);
        w.put_i64(CONFIG_OFF + 168, -5);
        w.put_u128(CONFIG_OFF + 176, 7);
        w.put_u64(CONFIG_OFF + 192, 200);
        w.put_u64(CONFIG_OFF + 200, 10);
        w.put_u64(CONFIG_OFF + 208, 2_000);
        w.put_u64(CONFIG_OFF + 216, 5_000);
        w.put_u128(CONFIG_OFF + 224, 1);
        w.put_u128(CONFIG_OFF + 240, 10_000_000_000_000_000_000);
        w.put_u128(CONFIG_OFF + 256, 3);

        // Engine
        w.put_u128(ENGINE_OFF, 9_000_000_000);
        w.put_u128(ENGINE_OFF + 16, 1_234_567);
        w.put_u128(ENGINE_OFF + 32, 42);
        w.put_u128(ENGINE_OFF + 48, 500_000_000);
        w.put_u64(ENGINE_OFF + 64, 2);
        w.put_u64(ENGINE_OFF + 72, 123_456_789);
        w.put_i64(ENGINE_OFF + 80, -3);

        // Params (max_accounts written by SlabWriter::new)
        w.put_u64(PARAMS_OFF, 500);
        w.put_u64(PARAMS_OFF + 8, 1_000);
        w.put_u64(PARAMS_OFF + 16, 10);
        w.put_u64(PARAMS_OFF + 24, 50);
        w.put_u64(PARAMS_OFF + 32, 100);
        w.put_u128(PARAMS_OFF + 40, 1_000_000);
        w.put_u128(PARAMS_OFF + 56, 10_000);
        w.put_u128(PARAMS_OFF + 80, 100_000);
        w.put_u128(PARAMS_OFF + 96, 77_000_000_000);
        w.put_u128(PARAMS_OFF + 112, 9);
        w.put_u64(PARAMS_OFF + 128, 600);
        w.put_u64(PARAMS_OFF + 136, 1_200);

        let user = Account {
            kind: AccountKind::User,
            owner: user_owner,
            capital: 1_000_000_000,
            position_size: -500_000_000,
            entry_price_e6: 140_000_000,
            pnl: -25_000,
        };
        let lp = Account {
            kind: AccountKind::Lp {
                matcher_program: matcher_prog,
                matcher_context: matcher_ctx,
            },
            owner: lp_owner,
            capital: 5_000_000_000,
            position_size: 500_000_000,
            entry_price_e6: 140_000_000,
            pnl: 25_000,
        };
        w.put_account(0, &user);
        w.put_account(5, &lp);

        let mut slots: Vec<Option<Account>> = vec![None; 16];
        slots[0] = Some(user);
        slots[5] = Some(lp);

        let expected = Slab {
            header: SlabHeader {
                magic: MAGIC,
                version: LAYOUT_VERSION,
                bump: 254,
                resolved: true,
                admin,
            },
            config: MarketConfig {
                collateral_mint: mint,
                vault_pubkey: vault,
                invert: true,
                unit_scale: 1_000,
                oracle_authority: oracle_auth,
                authority_price_e6: 150_000_000,
                oracle_price_cap_e2bps: 10_000,
                last_effective_price_e6: 149_500_000,
                funding: FundingParams {
                    horizon_slots: 500,
                    k_bps: 100,
                    inv_scale_notional_e6: 1_000_000_000_000,
                    max_premium_bps: 500,
                    max_bps_per_slot: -5,
                },
                thresh: ThresholdParams {
                    floor: 7,
                    risk_bps: 200,
                    update_interval_slots: 10,
                    step_bps: 2_000,
                    alpha_bps: 5_000,
                    min: 1,
                    max: 10_000_000_000_000_000_000,
                    min_step: 3,
                },
            },
            engine: EngineState {
                vault: 9_000_000_000,
                insurance_fund: InsuranceFund {
                    balance: 1_234_567,
                    fee_revenue: 42,
                },
                total_open_interest: 500_000_000,
                num_used_accounts: 2,
                last_crank_slot: 123_456_789,
                funding_rate_bps_per_slot_last: -3,
            },
            params: RiskParams {
                maintenance_margin_bps: 500,
                initial_margin_bps: 1_000,
                trading_fee_bps: 10,
                liquidation_fee_bps: 50,
                liquidation_buffer_bps: 100,
                liquidation_fee_cap: 1_000_000,
                min_liquidation_abs: 10_000,
                max_accounts: 16,
                new_account_fee: 100_000,
                risk_reduction_threshold: 77_000_000_000,
                maintenance_fee_per_slot: 9,
                max_crank_staleness_slots: 600,
                warmup_period_slots: 1_200,
            },
            accounts: AccountsTable {
                capacity: 16,
                slots,
            },
        };

        (w, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_slab;
    use super::*;

    #[test]
    fn round_trips_every_field() {
        let (w, expected) = sample_slab();
        let slab = decode(&w.data).unwrap();
        assert_eq!(slab, expected);
    }

    #[test]
    fn round_trips_both_account_kinds() {
        let (w, expected) = sample_slab();

        let user = decode_account(&w.data, 0).unwrap().unwrap();
        assert_eq!(&user, expected.account(0).unwrap());
        assert_eq!(user.kind, AccountKind::User);

        let lp = decode_account(&w.data, 5).unwrap().unwrap();
        assert_eq!(&lp, expected.account(5).unwrap());
        assert!(matches!(lp.kind, AccountKind::Lp { .. }));
    }

    #[test]
    fn vacant_slot_is_none() {
        let (w, _) = sample_slab();
        assert_eq!(decode_account(&w.data, 1).unwrap(), None);
        assert_eq!(decode_account(&w.data, 15).unwrap(), None);
    }

    #[test]
    fn index_out_of_range_is_malformed() {
        let (w, _) = sample_slab();
        assert!(matches!(
            decode_account(&w.data, 16),
            Err(ClientError::MalformedSlab { .. })
        ));
    }

    #[test]
    fn used_indices_match_bitmap() {
        let (mut w, _) = sample_slab();
        assert_eq!(decode_used_indices(&w.data).unwrap(), vec![0, 5]);
        w.mark_used(9);
        assert_eq!(decode_used_indices(&w.data).unwrap(), vec![0, 5, 9]);
    }

    #[test]
    fn short_buffer_is_malformed_at_every_region() {
        let (w, _) = sample_slab();
        for len in [0, 10, HEADER_LEN, ENGINE_OFF - 1, PARAMS_OFF + 3, w.data.len() - 1] {
            let truncated = &w.data[..len];
            assert!(
                matches!(decode(truncated), Err(ClientError::MalformedSlab { .. })),
                "len {len} should be malformed"
            );
        }
    }

    #[test]
    fn table_shorter_than_max_accounts_is_malformed() {
        let (mut w, _) = sample_slab();
        // Claim a bigger table than the buffer holds.
        w.put_u64(PARAMS_OFF + 72, 64);
        assert!(matches!(
            decode(&w.data),
            Err(ClientError::MalformedSlab { .. })
        ));
        // Region decoders that don't touch the table still succeed.
        assert!(decode_header(&w.data).is_ok());
        assert!(decode_engine(&w.data).is_ok());
    }

    #[test]
    fn unknown_kind_byte_is_malformed() {
        let (mut w, _) = sample_slab();
        let records_off = ACCOUNTS_OFF + 2; // 16 slots -> 2 bitmap bytes
        w.put_u8(records_off, 7);
        assert!(matches!(
            decode_account(&w.data, 0),
            Err(ClientError::MalformedSlab { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_tolerated() {
        let (mut w, expected) = sample_slab();
        w.data.extend_from_slice(&[0xAA; 32]);
        assert_eq!(decode(&w.data).unwrap(), expected);
    }
}
