//! Crowd profiling harness
//!
//! Spawns a large, seeded population of agents on the current mesh and
//! keeps them moving so the crowd simulation's per-frame cost can be
//! measured. Agents come in three flavours: mobs wander around where they
//! are, villagers stay inside their home zone and travellers move between
//! zones. The simulation itself is an external service behind
//! [`CrowdSimulation`].

use super::{EditTool, ToolKind};
use crate::nav_mesh::{NavMeshQuery, TilePayload};
use crate::session::NavMeshSession;
use glam::Vec3;
use navmesh_common::{dist_sqr_2d, Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::any::Any;
use std::time::Duration;
use web_time::Instant;

/// Attempts at finding a random on-mesh point before giving up
const MAX_POINT_ATTEMPTS: usize = 16;

/// Attempts at placing a zone far enough from the others
const MAX_ZONE_ATTEMPTS: usize = 100;

/// Parameters for a crowd agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentParams {
    pub radius: f32,
    pub height: f32,
    pub max_acceleration: f32,
    pub max_speed: f32,
    pub collision_query_range: f32,
    pub path_optimization_range: f32,
    pub separation_weight: f32,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            radius: 0.6,
            height: 2.0,
            max_acceleration: 8.0,
            max_speed: 3.5,
            collision_query_range: 12.0,
            path_optimization_range: 30.0,
            separation_weight: 2.0,
        }
    }
}

/// Crowd simulation service driven by the profiling harness
pub trait CrowdSimulation<T> {
    /// Points the simulation at a mesh, dropping all agents
    fn bind(&mut self, query: &NavMeshQuery<T>, max_agents: usize) -> Result<()>;

    /// Adds an agent and returns its index
    fn add_agent(&mut self, position: Vec3, params: &AgentParams) -> Result<usize>;

    fn request_move_target(&mut self, agent: usize, target: Vec3) -> Result<()>;

    fn update(&mut self, dt: f32) -> Result<()>;

    fn agent_position(&self, agent: usize) -> Option<Vec3>;

    fn agent_count(&self) -> usize;

    fn clear(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrowdProfilingConfig {
    pub agent_count: usize,
    pub random_seed: u64,
    pub zone_count: usize,
    pub zone_radius: f32,
    /// Share of agents that are mobs, in percent
    pub percent_mobs: f32,
    /// Share of the remaining agents that are travellers, in percent
    pub percent_travellers: f32,
    /// Distance at which an agent counts as arrived
    pub arrival_radius: f32,
    pub agent: AgentParams,
}

impl Default for CrowdProfilingConfig {
    fn default() -> Self {
        Self {
            agent_count: 1000,
            random_seed: 270,
            zone_count: 4,
            zone_radius: 20.0,
            percent_mobs: 80.0,
            percent_travellers: 15.0,
            arrival_radius: 1.0,
            agent: AgentParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentType {
    Mob,
    Villager,
    Traveller,
}

#[derive(Debug, Clone)]
struct ProfiledAgent {
    id: usize,
    kind: AgentType,
    home_zone: usize,
    target: Vec3,
}

/// Timing of the crowd updates since the run started
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfilingStats {
    pub frames: u64,
    pub last_update: Duration,
    pub total_update: Duration,
    pub max_update: Duration,
    pub agent_count: usize,
}

impl ProfilingStats {
    pub fn average_update(&self) -> Duration {
        if self.frames == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.total_update.as_secs_f64() / self.frames as f64)
        }
    }

    fn record(&mut self, elapsed: Duration, agent_count: usize) {
        self.frames += 1;
        self.last_update = elapsed;
        self.total_update += elapsed;
        self.max_update = self.max_update.max(elapsed);
        self.agent_count = agent_count;
    }
}

/// Agent-profiling harness tool
#[derive(Debug)]
pub struct CrowdProfilingTool<T, C> {
    crowd: C,
    config: CrowdProfilingConfig,
    query: Option<NavMeshQuery<T>>,
    rng: ChaCha8Rng,
    zones: Vec<Vec3>,
    agents: Vec<ProfiledAgent>,
    stats: ProfilingStats,
    running: bool,
}

impl<T, C> CrowdProfilingTool<T, C>
where
    T: TilePayload,
    C: CrowdSimulation<T>,
{
    pub fn new(crowd: C, config: CrowdProfilingConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.random_seed);
        Self {
            crowd,
            config,
            query: None,
            rng,
            zones: Vec::new(),
            agents: Vec::new(),
            stats: ProfilingStats::default(),
            running: false,
        }
    }

    pub fn config(&self) -> &CrowdProfilingConfig {
        &self.config
    }

    /// Takes effect on the next [`start`](Self::start)
    pub fn set_config(&mut self, config: CrowdProfilingConfig) {
        self.config = config;
    }

    pub fn crowd(&self) -> &C {
        &self.crowd
    }

    pub fn stats(&self) -> &ProfilingStats {
        &self.stats
    }

    pub fn zones(&self) -> &[Vec3] {
        &self.zones
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of spawned agents of each type, as (mobs, villagers, travellers)
    pub fn population(&self) -> (usize, usize, usize) {
        self.agents
            .iter()
            .fold((0, 0, 0), |(m, v, t), agent| match agent.kind {
                AgentType::Mob => (m + 1, v, t),
                AgentType::Villager => (m, v + 1, t),
                AgentType::Traveller => (m, v, t + 1),
            })
    }

    /// Spawns the configured population on the current mesh.
    ///
    /// Returns the number of agents spawned.
    pub fn start(&mut self) -> Result<usize> {
        let query = self
            .query
            .clone()
            .ok_or_else(|| Error::Crowd("no navigation mesh to profile on".to_string()))?;

        self.stop();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.random_seed);
        self.crowd.bind(&query, self.config.agent_count)?;
        self.zones = self.place_zones(&query);
        if self.zones.is_empty() {
            return Err(Error::Crowd("navigation mesh has no walkable surface".to_string()));
        }

        for _ in 0..self.config.agent_count {
            let kind = self.pick_agent_type();
            let home_zone = self.rng.gen_range(0..self.zones.len());
            let position = match kind {
                AgentType::Mob => {
                    let zone = self.zones[home_zone];
                    self.random_point_around(&query, zone, self.config.zone_radius)
                }
                AgentType::Villager | AgentType::Traveller => {
                    let zone = self.zones[home_zone];
                    self.random_point_around(&query, zone, self.config.zone_radius * 0.5)
                }
            };

            let id = self.crowd.add_agent(position, &self.config.agent)?;
            let mut agent = ProfiledAgent {
                id,
                kind,
                home_zone,
                target: position,
            };
            self.retarget(&query, &mut agent)?;
            self.agents.push(agent);
        }

        self.running = true;
        log::info!(
            "Crowd profiling started: {} agents in {} zones",
            self.agents.len(),
            self.zones.len()
        );
        Ok(self.agents.len())
    }

    /// Ends the current run and removes its agents
    pub fn stop(&mut self) {
        if self.running {
            log::info!(
                "Crowd profiling stopped after {} frames, avg update {:.2} ms",
                self.stats.frames,
                self.stats.average_update().as_secs_f64() * 1000.0
            );
        }
        self.crowd.clear();
        self.agents.clear();
        self.zones.clear();
        self.stats = ProfilingStats::default();
        self.running = false;
    }

    fn pick_agent_type(&mut self) -> AgentType {
        if self.rng.gen::<f32>() * 100.0 < self.config.percent_mobs {
            AgentType::Mob
        } else if self.rng.gen::<f32>() * 100.0 < self.config.percent_travellers {
            AgentType::Traveller
        } else {
            AgentType::Villager
        }
    }

    fn place_zones(&mut self, query: &NavMeshQuery<T>) -> Vec<Vec3> {
        let separation = self.config.zone_radius * self.config.zone_radius * 16.0;
        let mut zones: Vec<Vec3> = Vec::with_capacity(self.config.zone_count);

        for _ in 0..self.config.zone_count {
            let mut candidate = None;
            for _ in 0..MAX_ZONE_ATTEMPTS {
                let Some(p) = query.find_random_point(&mut self.rng) else {
                    break;
                };
                candidate = Some(p);
                if zones.iter().all(|z| dist_sqr_2d(*z, p) >= separation) {
                    break;
                }
            }
            // Small meshes cannot keep zones apart; take the last candidate.
            if let Some(p) = candidate {
                zones.push(p);
            }
        }
        zones
    }

    /// Random point on the mesh within `radius` of `center`, or `center`
    fn random_point_around(&mut self, query: &NavMeshQuery<T>, center: Vec3, radius: f32) -> Vec3 {
        for _ in 0..MAX_POINT_ATTEMPTS {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let dist = radius * self.rng.gen::<f32>().sqrt();
            let p = center + Vec3::new(angle.cos() * dist, 0.0, angle.sin() * dist);
            if let Some(tile) = query.find_tile(p) {
                return Vec3::new(p.x, p.y.clamp(tile.bounds.bmin.y, tile.bounds.bmax.y), p.z);
            }
        }
        center
    }

    fn retarget(&mut self, query: &NavMeshQuery<T>, agent: &mut ProfiledAgent) -> Result<()> {
        let radius = self.config.zone_radius;
        agent.target = match agent.kind {
            AgentType::Mob => {
                let position = self.crowd.agent_position(agent.id).unwrap_or(agent.target);
                self.random_point_around(query, position, radius)
            }
            AgentType::Villager => {
                let zone = self.zones[agent.home_zone];
                self.random_point_around(query, zone, radius)
            }
            AgentType::Traveller => {
                let mut next = self.rng.gen_range(0..self.zones.len());
                if next == agent.home_zone && self.zones.len() > 1 {
                    next = (next + 1) % self.zones.len();
                }
                agent.home_zone = next;
                let zone = self.zones[next];
                self.random_point_around(query, zone, radius * 0.5)
            }
        };
        self.crowd.request_move_target(agent.id, agent.target)
    }
}

impl<T, C> EditTool<T> for CrowdProfilingTool<T, C>
where
    T: TilePayload + 'static,
    C: CrowdSimulation<T> + 'static,
{
    fn kind(&self) -> ToolKind {
        ToolKind::CrowdProfiling
    }

    fn attach(&mut self, session: &mut NavMeshSession<T>) -> Result<()> {
        self.on_session_changed(session)
    }

    fn on_session_changed(&mut self, session: &NavMeshSession<T>) -> Result<()> {
        self.stop();
        self.query = session.query().cloned();
        if let Some(query) = &self.query {
            self.crowd.bind(query, self.config.agent_count)?;
        }
        Ok(())
    }

    fn on_click(
        &mut self,
        _session: &mut NavMeshSession<T>,
        _origin: Vec3,
        _point: Vec3,
        _shift: bool,
    ) -> Result<()> {
        Ok(())
    }

    fn on_update(&mut self, _session: &mut NavMeshSession<T>, dt: f32) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        let Some(query) = self.query.clone() else {
            return Ok(());
        };

        let start = Instant::now();
        self.crowd.update(dt)?;
        self.stats.record(start.elapsed(), self.crowd.agent_count());

        let arrival = self.config.arrival_radius * self.config.arrival_radius;
        let mut agents = std::mem::take(&mut self.agents);
        let result = agents.iter_mut().try_for_each(|agent| {
            let arrived = self
                .crowd
                .agent_position(agent.id)
                .is_some_and(|pos| dist_sqr_2d(pos, agent.target) < arrival);
            if arrived {
                self.retarget(&query, agent)
            } else {
                Ok(())
            }
        });
        self.agents = agents;
        result
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
