use clap::{CommandFactory, Parser, Subcommand};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use solana_sdk::{hash::hash, pubkey::Pubkey};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use il_guard::{
    math::valuation,
    units::{format_units, parse_pubkey, parse_signed_units, parse_units},
    Claim, ClaimCreated, EventLog, FixedPriceOracle, HookConfig, HookListener, InsuranceHook,
    LiquidityEventRecorded, LiquidityHook, ManualClock, PoolKey, PriceMode, SwapPhase, U256,
};

// ─── Host constants ───────────────────────────────────────────────────────────

/// Host AMM program whose pool PDAs the replay derives by default (A2A-Swap).
const HOST_PROGRAM_ID: &str = "8XJfG4mHqRZjByAd7HxHdEALfB8jVtJVQsdhGEmysTFq";
const POOL_SEED: &[u8]      = b"pool";

// ─── Token symbol registry (mainnet-beta) ────────────────────────────────────

const KNOWN_TOKENS: &[(&str, &str)] = &[
    ("SOL",  "So11111111111111111111111111111111111111112"),
    ("USDC", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
    ("USDT", "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB"),
];

/// Resolve a symbol (SOL, USDC, USDT) or raw base-58 mint address to a Pubkey.
fn resolve_mint(symbol_or_address: &str) -> Result<Pubkey> {
    let upper = symbol_or_address.to_uppercase();
    for (sym, addr) in KNOWN_TOKENS {
        if upper == *sym {
            return Ok(Pubkey::from_str(addr)?);
        }
    }
    Pubkey::from_str(symbol_or_address)
        .map_err(|_| anyhow!(
            "Unknown token '{}'. Use a built-in symbol ({}) or a base-58 mint address.",
            symbol_or_address,
            KNOWN_TOKENS.iter().map(|(s, _)| *s).collect::<Vec<_>>().join(", ")
        ))
}

/// Reverse-lookup: mint address → symbol, or shortened address for unknowns.
fn resolve_symbol(mint: &Pubkey) -> String {
    let addr = mint.to_string();
    for (sym, known) in KNOWN_TOKENS {
        if addr == *known {
            return sym.to_string();
        }
    }
    short(mint)
}

fn short(key: &Pubkey) -> String {
    let addr = key.to_string();
    format!("{}…{}", &addr[..4], &addr[addr.len() - 4..])
}

/// A base-58 address, or any other label hashed into a stable identity.
fn resolve_user(label: &str) -> Pubkey {
    parse_pubkey(label)
        .unwrap_or_else(|_| Pubkey::new_from_array(hash(label.as_bytes()).to_bytes()))
}

fn parse_pair(pair: &str) -> Result<(Pubkey, Pubkey)> {
    let parts: Vec<&str> = pair.splitn(2, '-').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(anyhow!(
            "pair must be TOKEN_A-TOKEN_B (e.g. SOL-USDC or <mintA>-<mintB>). Got: '{}'",
            pair
        ));
    }
    let mint_a = resolve_mint(parts[0]).context("pair: token A")?;
    let mint_b = resolve_mint(parts[1]).context("pair: token B")?;
    if mint_a == mint_b {
        return Err(anyhow!("Token A and token B in a pair must be different."));
    }
    Ok((mint_a, mint_b))
}

/// Pool key for a pair: the host's pool PDA plus both mints.
fn pool_for_pair(pair: &str, host_program: &Pubkey) -> Result<PoolKey> {
    let (mint_a, mint_b) = parse_pair(pair)?;
    let (id, _) = Pubkey::find_program_address(
        &[POOL_SEED, mint_a.as_ref(), mint_b.as_ref()], host_program);
    Ok(PoolKey::new(id, mint_a, mint_b))
}

fn amount(flag: &str, value: &str) -> Result<U256> {
    parse_units(value).with_context(|| format!("{flag}: expected a decimal amount"))
}

// ─── Scenario file ────────────────────────────────────────────────────────────

/// Ordered host callbacks to replay. Amounts are human decimals (18 decimals
/// are implied); signs follow host convention but only magnitudes matter.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    config: Option<HookConfig>,
    /// Clock value before the first step.
    #[serde(default)]
    start_time: i64,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Add {
        user: String,
        pair: String,
        amount_a: String,
        amount_b: String,
        #[serde(default)]
        timestamp: Option<i64>,
    },
    Remove {
        user: String,
        pair: String,
        amount_a: String,
        amount_b: String,
        #[serde(default)]
        timestamp: Option<i64>,
    },
    Swap {
        pair: String,
        /// Omit to count both phases, as a full host swap does.
        #[serde(default)]
        phase: Option<SwapPhase>,
    },
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read scenario '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Malformed scenario '{}'", path.display()))
}

/// Echoes notifications to stderr for `--verbose`.
struct StderrListener {
    labels: BTreeMap<Pubkey, String>,
}

impl StderrListener {
    fn name(&self, user: &Pubkey) -> String {
        self.labels.get(user).cloned().unwrap_or_else(|| short(user))
    }
}

impl HookListener for StderrListener {
    fn on_liquidity_event(&self, e: &LiquidityEventRecorded) {
        eprintln!(
            "[ledger] {} {}  a={}  b={}  t={}",
            if e.is_add { "add   " } else { "remove" },
            self.name(&e.user),
            format_units(e.amount_a),
            format_units(e.amount_b),
            e.timestamp
        );
    }

    fn on_claim_created(&self, e: &ClaimCreated) {
        eprintln!(
            "[claim]  {}  hold={}  pool={}  shortfall={}",
            self.name(&e.user),
            format_units(e.claim.value_hold),
            format_units(e.claim.value_pool),
            format_units(e.claim.insurance_amount())
        );
    }
}

// ─── Version banner ───────────────────────────────────────────────────────────

/// Print the IL-Guard banner to stdout.
fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    println!();
    println!("  IL-Guard  v{ver}  |  impermanent-loss insurance ledger for AMM hooks");
    println!("  {}", "─".repeat(62));
    println!("  Host      {HOST_PROGRAM_ID}");
    println!("  Scale     18 decimals (amounts and prices)");
    println!("  Oracle    fixed stub, 10 / 20 by default");
    println!();
}

// ─── CLI definition ───────────────────────────────────────────────────────────

/// IL-Guard: replay AMM liquidity callbacks and inspect IL insurance claims.
///
/// Every command supports --json for machine-readable output.
#[derive(Parser)]
#[command(
    name        = "il-guard",
    version     = env!("CARGO_PKG_VERSION"),
    author      = "IL-Guard",
    about       = "Liquidity-event ledger and impermanent-loss insurance calculator for AMM hooks.",
    after_help  = "\
ENVIRONMENT:
  IL_GUARD_PRICE_MODE       legacy | oracle  [default: scenario config, else legacy]
  IL_GUARD_ORACLE_PRICE_A   Stub oracle price for token A  [default: 10]
  IL_GUARD_ORACLE_PRICE_B   Stub oracle price for token B  [default: 20]
  IL_GUARD_HOST_PROGRAM     Host AMM program for pool PDAs

QUICK START:
  il-guard replay demos/scenario.json
  il-guard value --added-a 100 --added-b 100 --withdrawn-a 90 --withdrawn-b 90
  il-guard oracle --asset-a SOL --asset-b USDC"
)]
struct Cli {
    /// Which prices go into ledger entries: legacy placeholders or the oracle
    #[arg(long, global = true, value_name = "MODE", env = "IL_GUARD_PRICE_MODE")]
    price_mode: Option<String>,

    /// Stub oracle price for token A (human decimal)
    #[arg(long, global = true, value_name = "PRICE", default_value = "10", env = "IL_GUARD_ORACLE_PRICE_A")]
    oracle_price_a: String,

    /// Stub oracle price for token B (human decimal)
    #[arg(long, global = true, value_name = "PRICE", default_value = "20", env = "IL_GUARD_ORACLE_PRICE_B")]
    oracle_price_b: String,

    /// Host AMM program id used to derive pool PDAs from pairs
    #[arg(long, global = true, value_name = "PUBKEY", default_value = HOST_PROGRAM_ID, env = "IL_GUARD_HOST_PROGRAM")]
    host_program: String,

    /// Output machine-readable JSON instead of human-readable text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario of host callbacks and report every claim
    ///
    /// The scenario is a JSON file of add / remove / swap steps. Each
    /// removal is valued against everything the LP ever deposited.
    #[command(
        after_help = "\
EXAMPLES:
  il-guard replay demos/scenario.json
  il-guard replay demos/scenario.json --verbose
  il-guard replay demos/scenario.json --price-mode oracle --json

SCENARIO FORMAT:
  {
    \"config\":     { \"price_mode\": \"legacy\" },
    \"start_time\": 1700000000,
    \"steps\": [
      { \"action\": \"add\",    \"user\": \"alice\", \"pair\": \"SOL-USDC\", \"amount_a\": \"-100\", \"amount_b\": \"-100\" },
      { \"action\": \"swap\",   \"pair\": \"SOL-USDC\" },
      { \"action\": \"remove\", \"user\": \"alice\", \"pair\": \"SOL-USDC\", \"amount_a\": \"90\",   \"amount_b\": \"90\" }
    ]
  }

NOTES:
  Users may be base-58 addresses or plain labels (hashed into an identity).
  Steps without a timestamp advance the clock by one second."
    )]
    Replay {
        /// Path to the scenario JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Echo every ledger append and claim to stderr as it happens
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },

    /// Compare hold value and pool value for a single removal
    ///
    /// Stateless preview of the claim math: no ledger is involved.
    #[command(
        after_help = "\
EXAMPLES:
  il-guard value --added-a 100 --added-b 100 --withdrawn-a 90 --withdrawn-b 90
  il-guard value --added-a 100 --added-b 100 --withdrawn-a 80 --withdrawn-b 110 --json"
    )]
    Value {
        /// Cumulative token A deposited
        #[arg(long, value_name = "AMOUNT")]
        added_a: String,

        /// Cumulative token B deposited
        #[arg(long, value_name = "AMOUNT")]
        added_b: String,

        /// Token A returned by the removal
        #[arg(long, value_name = "AMOUNT")]
        withdrawn_a: String,

        /// Token B returned by the removal
        #[arg(long, value_name = "AMOUNT")]
        withdrawn_b: String,

        /// Valuation price of token A; defaults to the oracle price
        #[arg(long, value_name = "PRICE")]
        price_a: Option<String>,

        /// Valuation price of token B; defaults to the oracle price
        #[arg(long, value_name = "PRICE")]
        price_b: Option<String>,
    },

    /// Print the stub oracle's prices for an asset pair
    #[command(
        after_help = "\
EXAMPLES:
  il-guard oracle --asset-a SOL --asset-b USDC
  il-guard oracle --asset-a <mintA> --asset-b <mintB> --json"
    )]
    Oracle {
        /// Token A symbol or mint address
        #[arg(long, value_name = "TOKEN")]
        asset_a: String,

        /// Token B symbol or mint address
        #[arg(long, value_name = "TOKEN")]
        asset_b: String,
    },
}

impl Cli {
    fn oracle(&self) -> Result<FixedPriceOracle> {
        Ok(FixedPriceOracle::new(
            amount("--oracle-price-a", &self.oracle_price_a)?,
            amount("--oracle-price-b", &self.oracle_price_b)?,
        ))
    }

    fn price_mode_override(&self) -> Result<Option<PriceMode>> {
        self.price_mode
            .as_deref()
            .map(|m| PriceMode::from_str(m).context("--price-mode"))
            .transpose()
    }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // When invoked with no arguments, show banner + full help and exit cleanly.
    if std::env::args().len() == 1 {
        print_banner();
        Cli::command().print_long_help().ok();
        println!();
        return Ok(());
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Replay { file, verbose } => {
            cmd_replay(&cli, file, *verbose)?;
        }
        Commands::Value { added_a, added_b, withdrawn_a, withdrawn_b, price_a, price_b } => {
            cmd_value(
                &cli,
                added_a, added_b, withdrawn_a, withdrawn_b,
                price_a.as_deref(), price_b.as_deref(),
            )?;
        }
        Commands::Oracle { asset_a, asset_b } => {
            cmd_oracle(&cli, asset_a, asset_b)?;
        }
    }

    Ok(())
}

// ─── replay ──────────────────────────────────────────────────────────────────

/// Everything a replay produced, ready for either output format.
struct ReplayReport {
    hook:   InsuranceHook<FixedPriceOracle, Arc<ManualClock>>,
    log:    EventLog,
    labels: BTreeMap<Pubkey, String>,
    pools:  BTreeMap<Pubkey, String>,
    steps:  usize,
}

fn run_scenario(
    scenario:      &Scenario,
    mode_override: Option<PriceMode>,
    oracle:        FixedPriceOracle,
    host_program:  &Pubkey,
    verbose:       bool,
) -> Result<ReplayReport> {
    let mut config = scenario.config.unwrap_or_default();
    if let Some(mode) = mode_override {
        config.price_mode = mode;
    }

    let clock = Arc::new(ManualClock::new(scenario.start_time));
    let mut hook = InsuranceHook::new(config, oracle, clock.clone());
    let log = EventLog::new();
    hook.subscribe(Arc::new(log.clone()));

    let mut labels = BTreeMap::new();
    let mut pools = BTreeMap::new();
    for step in &scenario.steps {
        match step {
            Step::Add { user, .. } | Step::Remove { user, .. } => {
                labels.insert(resolve_user(user), user.clone());
            }
            Step::Swap { .. } => {}
        }
    }
    if verbose {
        hook.subscribe(Arc::new(StderrListener { labels: labels.clone() }));
    }

    for (i, step) in scenario.steps.iter().enumerate() {
        let n = i + 1;
        match step {
            Step::Add { user, pair, amount_a, amount_b, timestamp }
            | Step::Remove { user, pair, amount_a, amount_b, timestamp } => {
                match timestamp {
                    Some(ts) => clock.set(*ts),
                    None => clock.advance(1),
                }
                let pool = pool_for_pair(pair, host_program)
                    .with_context(|| format!("step {n}"))?;
                pools.insert(pool.id, pair.clone());
                let delta_a = parse_signed_units(amount_a)
                    .with_context(|| format!("step {n}: amount_a"))?;
                let delta_b = parse_signed_units(amount_b)
                    .with_context(|| format!("step {n}: amount_b"))?;
                let lp = resolve_user(user);

                if matches!(step, Step::Add { .. }) {
                    hook.on_add(lp, &pool, delta_a, delta_b)
                        .with_context(|| format!("step {n}: add"))?;
                } else {
                    hook.on_remove(lp, &pool, delta_a, delta_b)
                        .with_context(|| format!("step {n}: remove"))?;
                }
            }
            Step::Swap { pair, phase } => {
                let pool = pool_for_pair(pair, host_program)
                    .with_context(|| format!("step {n}"))?;
                pools.insert(pool.id, pair.clone());
                match phase {
                    Some(p) => hook.on_swap(&pool, *p),
                    None => {
                        hook.on_swap(&pool, SwapPhase::Before);
                        hook.on_swap(&pool, SwapPhase::After);
                    }
                }
            }
        }
    }

    Ok(ReplayReport { hook, log, labels, pools, steps: scenario.steps.len() })
}

fn claim_json(claim: &Claim) -> serde_json::Value {
    json!({
        "value_hold":       format_units(claim.value_hold),
        "value_pool":       format_units(claim.value_pool),
        "shortfall":        format_units(claim.insurance_amount()),
        "total_added_a":    format_units(claim.total_added_a),
        "total_added_b":    format_units(claim.total_added_b),
        "withdrawn_a":      format_units(claim.withdrawn_a),
        "withdrawn_b":      format_units(claim.withdrawn_b),
        "price_a":          format_units(claim.price_a),
        "price_b":          format_units(claim.price_b),
        "timestamp":        claim.timestamp,
        "raw":              claim,
    })
}

fn cmd_replay(cli: &Cli, file: &Path, verbose: bool) -> Result<()> {
    let scenario = load_scenario(file)?;
    let host_program = parse_pubkey(&cli.host_program).context("--host-program")?;
    let report = run_scenario(
        &scenario,
        cli.price_mode_override()?,
        cli.oracle()?,
        &host_program,
        verbose,
    )?;
    let hook = &report.hook;
    let mode = hook.config().price_mode;

    if cli.json {
        let mut users = Vec::new();
        for (key, label) in &report.labels {
            let summary = hook.total_insurance(key)?;
            let claims: Vec<_> = hook.engine().claims(key).iter().map(claim_json).collect();
            users.push(json!({
                "user":             label,
                "address":          key.to_string(),
                "events":           hook.events(key).len(),
                "claims":           claims,
                "total_insurance":  format_units(summary.total_insurance),
                "total_loss_count": summary.total_loss_count,
                "eligible":         hook.is_eligible_for_insurance(key)?.eligible,
            }));
        }
        let pools: Vec<_> = report.pools.iter().map(|(id, pair)| {
            json!({ "pair": pair, "pool": id.to_string(), "counters": hook.pool_counters(id) })
        }).collect();
        println!("{}", json!({
            "status":        "ok",
            "command":       "replay",
            "scenario":      file.display().to_string(),
            "steps":         report.steps,
            "price_mode":    mode,
            "notifications": report.log.notifications().len(),
            "users":         users,
            "pools":         pools,
        }));
        return Ok(());
    }

    println!("─── Replay ───────────────────────────────────────────────────────");
    println!("  Scenario         {}", file.display());
    println!("  Steps            {}", report.steps);
    println!("  Price mode       {}", match mode {
        PriceMode::Legacy => "legacy (ledger placeholders, oracle valuation)",
        PriceMode::Oracle => "oracle (one price for ledger and valuation)",
    });
    println!("  Notifications    {}", report.log.notifications().len());

    for (key, label) in &report.labels {
        let claims = hook.engine().claims(key);
        let summary = hook.total_insurance(key)?;
        println!();
        println!("─── LP: {label} ─────────────────────────────────────────────");
        println!("  Address          {key}");
        println!("  Events           {:>20}", hook.events(key).len());
        println!("  Claims           {:>20}", claims.len());
        for (i, c) in claims.iter().enumerate() {
            println!("  ─── Claim #{i} ────────────────────────────────────");
            println!("    Hold value     {:>20}", format_units(c.value_hold));
            println!("    Pool value     {:>20}", format_units(c.value_pool));
            println!("    Shortfall      {:>20}", format_units(c.insurance_amount()));
            println!("    Prices         {} / {}", format_units(c.price_a), format_units(c.price_b));
            println!("    Timestamp      {:>20}", c.timestamp);
        }
        println!("  Total insurance  {:>20}", format_units(summary.total_insurance));
        println!("  Eligible         {:>20}", summary.total_loss_count > 0);
    }

    if !report.pools.is_empty() {
        println!();
        println!("─── Pools ────────────────────────────────────────────────────────");
        for (id, pair) in &report.pools {
            let c = hook.pool_counters(id);
            println!("  {pair:<16} {}", short(id));
            println!("    swaps before/after   {} / {}", c.before_swap, c.after_swap);
            println!("    adds / removes       {} / {}", c.add_liquidity, c.remove_liquidity);
        }
    }
    Ok(())
}

// ─── value ───────────────────────────────────────────────────────────────────

fn cmd_value(
    cli:         &Cli,
    added_a:     &str,
    added_b:     &str,
    withdrawn_a: &str,
    withdrawn_b: &str,
    price_a:     Option<&str>,
    price_b:     Option<&str>,
) -> Result<()> {
    let oracle = cli.oracle()?;
    let price_a = match price_a {
        Some(p) => amount("--price-a", p)?,
        None => oracle.price_a,
    };
    let price_b = match price_b {
        Some(p) => amount("--price-b", p)?,
        None => oracle.price_b,
    };

    let v = valuation(
        amount("--added-a", added_a)?,
        amount("--added-b", added_b)?,
        amount("--withdrawn-a", withdrawn_a)?,
        amount("--withdrawn-b", withdrawn_b)?,
        price_a,
        price_b,
    )?;
    let shortfall = v.shortfall();

    if cli.json {
        println!("{}", json!({
            "status":      "ok",
            "command":     "value",
            "price_a":     format_units(price_a),
            "price_b":     format_units(price_b),
            "value_hold":  format_units(v.value_hold),
            "value_pool":  format_units(v.value_pool),
            "il_detected": shortfall.is_some(),
            "shortfall":   format_units(shortfall.unwrap_or_else(U256::zero)),
        }));
    } else {
        println!("─── Valuation ────────────────────────────────────────────────────");
        println!("  Prices           {} / {}", format_units(price_a), format_units(price_b));
        println!("  Hold value       {:>20}", format_units(v.value_hold));
        println!("  Pool value       {:>20}", format_units(v.value_pool));
        match shortfall {
            Some(s) => println!("  Shortfall        {:>20}  (claim would be recorded)", format_units(s)),
            None => println!("  Shortfall        {:>20}  (no claim)", "-"),
        }
    }
    Ok(())
}

// ─── oracle ──────────────────────────────────────────────────────────────────

fn cmd_oracle(cli: &Cli, asset_a: &str, asset_b: &str) -> Result<()> {
    use il_guard::PriceOracle;

    let mint_a = resolve_mint(asset_a).context("--asset-a")?;
    let mint_b = resolve_mint(asset_b).context("--asset-b")?;
    let (price_a, price_b) = cli.oracle()?.get_price(&mint_a, &mint_b)?;

    if cli.json {
        println!("{}", json!({
            "status":  "ok",
            "command": "oracle",
            "asset_a": { "symbol": resolve_symbol(&mint_a), "mint": mint_a.to_string(), "price": format_units(price_a) },
            "asset_b": { "symbol": resolve_symbol(&mint_b), "mint": mint_b.to_string(), "price": format_units(price_b) },
            "source":  "fixed",
        }));
    } else {
        println!("─── Oracle ───────────────────────────────────────────────────────");
        println!("  {:<16} {:>20}", resolve_symbol(&mint_a), format_units(price_a));
        println!("  {:<16} {:>20}", resolve_symbol(&mint_b), format_units(price_b));
        println!("  Source           fixed stub");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> Pubkey {
        Pubkey::from_str(HOST_PROGRAM_ID).unwrap()
    }

    fn scenario(json: &str) -> Scenario {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn labels_and_addresses_resolve_to_stable_users() {
        assert_eq!(resolve_user("alice"), resolve_user("alice"));
        assert_ne!(resolve_user("alice"), resolve_user("bob"));
        let sol = Pubkey::from_str(KNOWN_TOKENS[0].1).unwrap();
        assert_eq!(resolve_user(KNOWN_TOKENS[0].1), sol);
    }

    #[test]
    fn pairs_resolve_symbols_and_reject_duplicates() {
        let pool = pool_for_pair("SOL-USDC", &host()).unwrap();
        assert_eq!(resolve_symbol(&pool.mint_a), "SOL");
        assert_eq!(resolve_symbol(&pool.mint_b), "USDC");
        assert!(pool_for_pair("SOL-SOL", &host()).is_err());
        assert!(pool_for_pair("SOL", &host()).is_err());
    }

    #[test]
    fn replay_produces_the_reference_claim() {
        let s = scenario(r#"{
            "start_time": 100,
            "steps": [
                { "action": "add",    "user": "alice", "pair": "SOL-USDC", "amount_a": "-100", "amount_b": "-100" },
                { "action": "swap",   "pair": "SOL-USDC" },
                { "action": "remove", "user": "alice", "pair": "SOL-USDC", "amount_a": "90", "amount_b": "90", "timestamp": 500 }
            ]
        }"#);
        let report = run_scenario(&s, None, FixedPriceOracle::default(), &host(), false).unwrap();
        let alice = resolve_user("alice");
        let hook = &report.hook;

        assert_eq!(hook.claim_count(&alice), 1);
        let claim = hook.claim(&alice, 0).unwrap();
        assert_eq!(format_units(claim.value_hold), "3000");
        assert_eq!(format_units(claim.value_pool), "2700");
        assert_eq!(claim.timestamp, 500);
        assert_eq!(hook.events(&alice)[0].timestamp, 101);

        let pool = pool_for_pair("SOL-USDC", &host()).unwrap();
        let counters = hook.pool_counters(&pool.id);
        assert_eq!((counters.before_swap, counters.after_swap), (1, 1));
        assert_eq!(report.log.notifications().len(), 3);
    }

    #[test]
    fn cli_price_mode_overrides_scenario_config() {
        let s = scenario(r#"{
            "config": { "price_mode": "legacy" },
            "steps": [
                { "action": "add", "user": "bob", "pair": "SOL-USDT", "amount_a": "-1", "amount_b": "-1" }
            ]
        }"#);
        let report = run_scenario(&s, Some(PriceMode::Oracle), FixedPriceOracle::default(), &host(), false)
            .unwrap();
        let event = report.hook.events(&resolve_user("bob"))[0];
        assert_eq!(format_units(event.price_a), "10");
        assert_eq!(format_units(event.price_b), "20");
    }

    #[test]
    fn malformed_steps_are_rejected() {
        let bad_action = r#"{ "steps": [ { "action": "burn", "pair": "SOL-USDC" } ] }"#;
        assert!(serde_json::from_str::<Scenario>(bad_action).is_err());

        let s = scenario(r#"{
            "steps": [ { "action": "add", "user": "carol", "pair": "SOL-USDC", "amount_a": "x", "amount_b": "1" } ]
        }"#);
        assert!(run_scenario(&s, None, FixedPriceOracle::default(), &host(), false).is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
