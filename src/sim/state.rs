//! Game state and core simulation types
//!
//! All state that must be persisted for pause/resume and determinism lives here.
//! `GameState` is the entity registry: the spawner, resolver and boss controller
//! all mutate its collections in place, in the fixed order driven by `tick`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::BossState;
use super::difficulty::DifficultyState;
use super::effects::StatusEffects;
use super::spawn::SpawnScheduler;
use crate::consts::SIM_DT;
use crate::highscores::ScoreStore;
use crate::tuning::{Abilities, Tuning};

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused; no timers advance
    Paused,
    /// Run ended (life points reached zero)
    GameOver,
}

/// Hostile movement behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Re-aims at the player every tick
    Pursuer,
    /// Fixed heading, reflects off walls
    Wanderer,
}

/// Boss projectile sub-kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Radial ring shot; removed on wall contact
    Wave,
    /// Shard shed by a charge impact; bounces, knockback only
    Charge,
}

/// A hostile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostile {
    pub id: u32,
    pub pos: Vec2,
    /// Unit heading
    pub dir: Vec2,
    pub speed: f32,
    pub radius: f32,
    pub variant: Variant,
    /// Set for boss-fired projectiles
    #[serde(default)]
    pub projectile: Option<ProjectileKind>,
    /// Remaining lifetime for expiring projectiles
    #[serde(default)]
    pub ttl_ticks: Option<u32>,
}

impl Hostile {
    pub fn new(id: u32, pos: Vec2, dir: Vec2, speed: f32, radius: f32, variant: Variant) -> Self {
        Self {
            id,
            pos,
            dir,
            speed,
            radius,
            variant,
            projectile: None,
            ttl_ticks: None,
        }
    }

    /// Build a boss projectile heading along `dir`
    pub fn projectile(id: u32, pos: Vec2, dir: Vec2, speed: f32, radius: f32, kind: ProjectileKind) -> Self {
        Self {
            projectile: Some(kind),
            ..Self::new(id, pos, dir, speed, radius, Variant::Wanderer)
        }
    }

    #[inline]
    pub fn is_boss_projectile(&self) -> bool {
        self.projectile.is_some()
    }

    /// Speed this hostile should have for a given base speed
    pub fn speed_for_base(variant: Variant, base_speed: f32) -> f32 {
        match variant {
            Variant::Pursuer => base_speed * 0.5,
            Variant::Wanderer => base_speed,
        }
    }
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    /// +1 life point
    Heart,
    /// Destroys hostiles around it
    Bomb,
    /// Slows time
    Hourglass,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [PickupKind::Heart, PickupKind::Bomb, PickupKind::Hourglass];
}

/// A pickup entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub radius: f32,
}

/// What a telegraph becomes once it matures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelegraphTarget {
    Hostile(Variant),
    Pickup(PickupKind),
}

/// A pending spawn with a pulsing warning indicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telegraph {
    pub id: u32,
    pub pos: Vec2,
    /// Tick at which this telegraph converts into its target
    pub mature_tick: u64,
    pub target: TelegraphTarget,
    pub indicator_radius: f32,
    /// +1 growing, -1 shrinking
    pub pulse_dir: f32,
}

impl Telegraph {
    /// Advance the indicator one tick, bouncing between the pulse bounds
    pub fn pulse(&mut self, tuning: &Tuning) {
        self.indicator_radius += self.pulse_dir * tuning.pulse_speed * SIM_DT;
        if self.indicator_radius >= tuning.pulse_max_radius {
            self.indicator_radius = tuning.pulse_max_radius;
            self.pulse_dir = -1.0;
        } else if self.indicator_radius <= tuning.pulse_min_radius {
            self.indicator_radius = tuning.pulse_min_radius;
            self.pulse_dir = 1.0;
        }
        self.indicator_radius = self.indicator_radius.max(0.0);
    }

    #[inline]
    pub fn is_mature(&self, now: u64) -> bool {
        now >= self.mature_tick
    }
}

/// Explosion source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionKind {
    Bomb,
    BossFinale,
}

/// An expanding explosion (visual; damage is applied when registered)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: ExplosionKind,
    pub start_tick: u64,
    pub ttl_ticks: u64,
}

impl Explosion {
    /// Animation progress in [0, 1]
    pub fn progress(&self, now: u64) -> f32 {
        let elapsed = now.saturating_sub(self.start_tick) as f32;
        (elapsed / self.ttl_ticks.max(1) as f32).min(1.0)
    }

    pub fn is_finished(&self, now: u64) -> bool {
        now.saturating_sub(self.start_tick) >= self.ttl_ticks
    }
}

/// The player-controlled point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub lives: u8,
    /// Contacts before this tick are ignored
    pub invulnerable_until: u64,
}

/// Things that happened during a tick, for audio/presentation hosts
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    HostileSpawned { id: u32, variant: Variant },
    PickupSpawned { id: u32, kind: PickupKind },
    PickupCollected { kind: PickupKind },
    PlayerHit { lives_left: u8 },
    Knockback,
    Explosion { pos: Vec2, radius: f32, destroyed: u32 },
    SpeedBump { base_speed: f32 },
    BossBanner,
    BossArrived,
    BossPhaseChanged { phase: super::boss::BossPhase },
    BossWallHit { charge: u32 },
    LevelUp { level: u32 },
    RunEnded { score: u64 },
}

/// Monotonic entity ID allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    /// Allocate a new entity ID
    pub fn next(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Random source for spawn positions, variants and boss jitter
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub abilities: Abilities,
    pub phase: GamePhase,
    /// Simulation tick counter (the clock for every timer)
    pub time_ticks: u64,
    pub score: u64,
    /// 1 before the first boss, +1 after each boss encounter
    pub level: u32,
    pub player: Player,
    /// Active hostiles (sorted by id for determinism)
    pub hostiles: Vec<Hostile>,
    /// Pending spawns (sorted by id for determinism)
    pub telegraphs: Vec<Telegraph>,
    /// Active pickups (sorted by id for determinism)
    pub pickups: Vec<Pickup>,
    pub explosions: Vec<Explosion>,
    pub effects: StatusEffects,
    pub difficulty: DifficultyState,
    pub spawner: SpawnScheduler,
    pub boss: BossState,
    /// Tick at which the pre-fight banner ends and the boss spawns
    pub banner_until: Option<u64>,
    pub ids: EntityIds,
    /// Events produced since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new run with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, Tuning::default(), Abilities::default())
    }

    /// Create a new run with explicit balance and ability levels
    pub fn with_config(seed: u64, tuning: Tuning, abilities: Abilities) -> Self {
        let arena = Vec2::new(tuning.arena_width, tuning.arena_height);
        let player = Player {
            pos: arena / 2.0,
            radius: tuning.player_radius,
            lives: tuning.starting_lives,
            invulnerable_until: 0,
        };
        log::info!("New run (seed {seed})");

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            difficulty: DifficultyState::new(&tuning),
            spawner: SpawnScheduler::new(&tuning),
            boss: BossState::default(),
            tuning,
            abilities,
            phase: GamePhase::Playing,
            time_ticks: 0,
            score: 0,
            level: 1,
            player,
            hostiles: Vec::new(),
            telegraphs: Vec::new(),
            pickups: Vec::new(),
            explosions: Vec::new(),
            effects: StatusEffects::default(),
            banner_until: None,
            ids: EntityIds::default(),
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn arena_size(&self) -> Vec2 {
        Vec2::new(self.tuning.arena_width, self.tuning.arena_height)
    }

    #[inline]
    pub fn arena_center(&self) -> Vec2 {
        self.arena_size() / 2.0
    }

    /// Whether player contacts are currently ignored
    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.time_ticks < self.player.invulnerable_until
    }

    /// Boss fight running or about to start; all spawning is suppressed
    #[inline]
    pub fn boss_engaged(&self) -> bool {
        self.boss.active || self.banner_until.is_some()
    }

    /// Number of boss-tagged projectiles still alive
    pub fn boss_projectiles_alive(&self) -> usize {
        self.hostiles.iter().filter(|h| h.is_boss_projectile()).count()
    }

    /// Remove every hostile, telegraph and pickup
    pub fn clear_field(&mut self) {
        self.hostiles.clear();
        self.telegraphs.clear();
        self.pickups.clear();
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Submit the final score of an ended run. Returns true on a new personal best.
    pub fn finish_run(&self, store: &mut dyn ScoreStore, user: &str) -> Option<bool> {
        if self.phase != GamePhase::GameOver {
            return None;
        }
        Some(store.record_final_score(user, self.score, self.level))
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.hostiles.sort_by_key(|h| h.id);
        self.telegraphs.sort_by_key(|t| t.id);
        self.pickups.sort_by_key(|p| p.id);
    }
}
