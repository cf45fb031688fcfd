// Tick and timing
pub const TICK_INTERVAL_MS: u64 = 1000;
pub const FAST_TICK_INTERVAL_MS: u64 = 10;
pub const DEATH_RECOVERY_TICKS: u32 = 3;
pub const AUTOSAVE_INTERVAL_SECONDS: u64 = 30;

// Combat rolls
pub const CRIT_CHANCE: f64 = 0.15;
pub const CRIT_MULTIPLIER: f64 = 1.5;
pub const DAMAGE_VARIANCE_MIN: f64 = 0.8;
pub const DAMAGE_VARIANCE_MAX: f64 = 1.2;
pub const DODGE_CHANCE: f64 = 0.10;

// Enemy scaling
pub const ENEMY_TIER_LEVEL_DIVISOR: u32 = 10;
pub const ENEMY_LEVEL_JITTER: u32 = 5;
pub const MAX_ENEMY_LEVEL_JITTER: u32 = 1_000;
pub const ENEMY_LEVEL_SCALING: f64 = 0.1;
pub const ENEMY_DEFENSE_RATIO: f64 = 0.3;

// Character defaults
pub const STARTING_LEVEL: u32 = 1;
pub const STARTING_GOLD: u64 = 100;
pub const STARTING_HEALTH: u32 = 100;
pub const STARTING_ATTACK: u32 = 10;
pub const STARTING_DEFENSE: u32 = 5;

// Leveling
pub const EXP_PER_LEVEL: u64 = 100;
pub const LEVEL_UP_MAX_HEALTH: u32 = 20;
pub const LEVEL_UP_ATTACK: u32 = 5;
pub const LEVEL_UP_DEFENSE: u32 = 3;
pub const LEVEL_UP_GOLD: u64 = 50;

// Rewards and penalties
pub const LOOT_DROP_CHANCE: f64 = 0.3;
pub const DEATH_GOLD_LOSS_RATIO: f64 = 0.1;
pub const DEATH_HEALTH_RATIO: f64 = 0.5;

// Upgrades
pub const UPGRADE_COST: u64 = 50;
pub const UPGRADE_ATTACK: u32 = 5;
pub const UPGRADE_DEFENSE: u32 = 3;
pub const UPGRADE_MAX_HEALTH: u32 = 30;

// Skills
pub const SKILL_BUFF_RATIO: f64 = 0.5;
pub const SKILL_HEAL_RATIO: f64 = 0.3;
pub const CRIT_SKILL_BONUS: f64 = 0.25;
pub const CRIT_SKILL_ROUNDS: u32 = 3;

// Logs and history
pub const BATTLE_LOG_CAPACITY: usize = 50;
pub const BATTLE_HISTORY_CAPACITY: usize = 20;

// Persistence
pub const SAVE_VERSION_MAGIC: u64 = 0x49444C4542544C00; // "IDLEBTL\0"
pub const SAVE_RETRY_ATTEMPTS: u32 = 5;
pub const SAVE_RETRY_BASE_MS: u64 = 100;
pub const DATA_DIR_NAME: &str = ".idlebattle";
